use super::unit::*;
use crate::geometry::*;
use serde::{Deserialize, Serialize};

/// Per-player state received each tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub me: bool,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub remaining_action_cooldown_ticks: u32,
    #[serde(default)]
    pub remaining_nuclear_strike_cooldown_ticks: u32,
    /// Unit highlighting the pending strike, if a strike is in flight.
    #[serde(default)]
    pub next_nuclear_strike_unit_id: Option<UnitId>,
    #[serde(default)]
    pub next_nuclear_strike_tick: Option<u32>,
    #[serde(default)]
    pub next_nuclear_strike_position: Option<Point>,
}

impl Player {
    pub fn has_pending_strike(&self) -> bool {
        self.next_nuclear_strike_unit_id.is_some() && self.next_nuclear_strike_position.is_some()
    }

    pub fn strike_ready(&self) -> bool {
        self.remaining_nuclear_strike_cooldown_ticks == 0
    }
}
