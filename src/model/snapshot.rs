use super::environment::*;
use super::facility::*;
use super::player::*;
use super::unit::*;
use serde::{Deserialize, Serialize};

/// Facility list for a tick: either a full replacement or "keep what you have".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum FacilitiesUpdate {
    #[default]
    Unchanged,
    Replace(Vec<Facility>),
}

/// Everything the host sends for one tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TickSnapshot {
    pub tick: u32,
    #[serde(default)]
    pub random_seed: u64,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub new_units: Vec<Unit>,
    #[serde(default)]
    pub unit_updates: Vec<UnitUpdate>,
    #[serde(default)]
    pub facilities: FacilitiesUpdate,
    /// Present on the first tick only.
    #[serde(default)]
    pub environment: Option<EnvironmentGrid>,
}

impl TickSnapshot {
    pub fn me(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.me)
    }

    pub fn opponent(&self) -> Option<&Player> {
        self.players.iter().find(|p| !p.me)
    }

    pub fn from_json(data: &str) -> Result<TickSnapshot, String> {
        serde_json::from_str(data).map_err(|err| format!("Failed to parse tick snapshot: {}", err))
    }
}
