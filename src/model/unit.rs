use crate::geometry::*;
use serde::{Deserialize, Serialize};

pub type UnitId = u64;
pub type PlayerId = u64;
pub type GroupId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitType {
    /// Armoured repair vehicle. Heals nearby friendly units.
    Arrv,
    Fighter,
    Helicopter,
    Ifv,
    Tank,
}

impl UnitType {
    pub const ALL: [UnitType; 5] = [
        UnitType::Arrv,
        UnitType::Fighter,
        UnitType::Helicopter,
        UnitType::Ifv,
        UnitType::Tank,
    ];

    pub fn is_aerial(self) -> bool {
        matches!(self, UnitType::Fighter | UnitType::Helicopter)
    }

    pub fn is_ground(self) -> bool {
        !self.is_aerial()
    }

    pub fn name(self) -> &'static str {
        match self {
            UnitType::Arrv => "arrv",
            UnitType::Fighter => "fighter",
            UnitType::Helicopter => "helicopter",
            UnitType::Ifv => "ifv",
            UnitType::Tank => "tank",
        }
    }
}

/// A vehicle as known to the board.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub position: Point,
    pub radius: f64,
    pub player_id: PlayerId,
    pub unit_type: UnitType,
    pub durability: u32,
    pub max_durability: u32,
    pub max_speed: f64,
    pub vision_range: f64,
    #[serde(default)]
    pub ground_attack_range: f64,
    #[serde(default)]
    pub aerial_attack_range: f64,
    #[serde(default)]
    pub ground_damage: u32,
    #[serde(default)]
    pub aerial_damage: u32,
    #[serde(default)]
    pub attack_cooldown_ticks: u32,
    #[serde(default)]
    pub remaining_attack_cooldown_ticks: u32,
    #[serde(default)]
    pub groups: Vec<GroupId>,
    #[serde(default)]
    pub selected: bool,
}

impl Unit {
    pub fn is_alive(&self) -> bool {
        self.durability > 0
    }

    pub fn is_aerial(&self) -> bool {
        self.unit_type.is_aerial()
    }

    pub fn relative_health(&self) -> f64 {
        if self.max_durability == 0 {
            0.0
        } else {
            self.durability as f64 / self.max_durability as f64
        }
    }

    pub fn in_group(&self, group: GroupId) -> bool {
        self.groups.contains(&group)
    }

    pub fn is_ungrouped(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn distance_to(&self, point: Point) -> f64 {
        self.position.distance_to(point)
    }

    /// Apply a delta record. Returns the squared displacement of the unit.
    pub fn apply_update(&mut self, update: &UnitUpdate) -> f64 {
        let mut displacement = 0.0;

        if let Some(position) = update.position {
            displacement = self.position.squared_distance_to(position);
            self.position = position;
        }
        if let Some(durability) = update.durability {
            self.durability = durability;
        }
        if let Some(cooldown) = update.remaining_attack_cooldown_ticks {
            self.remaining_attack_cooldown_ticks = cooldown;
        }
        if let Some(selected) = update.selected {
            self.selected = selected;
        }
        if let Some(groups) = &update.groups {
            self.groups = groups.clone();
        }

        displacement
    }
}

/// Incremental change to a known unit. Absent fields keep their previous value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitUpdate {
    pub id: UnitId,
    #[serde(default)]
    pub position: Option<Point>,
    #[serde(default)]
    pub durability: Option<u32>,
    #[serde(default)]
    pub remaining_attack_cooldown_ticks: Option<u32>,
    #[serde(default)]
    pub selected: Option<bool>,
    #[serde(default)]
    pub groups: Option<Vec<GroupId>>,
}

impl UnitUpdate {
    pub fn moved(id: UnitId, position: Point) -> UnitUpdate {
        UnitUpdate {
            id,
            position: Some(position),
            ..Default::default()
        }
    }

    pub fn damaged(id: UnitId, durability: u32) -> UnitUpdate {
        UnitUpdate {
            id,
            durability: Some(durability),
            ..Default::default()
        }
    }
}
