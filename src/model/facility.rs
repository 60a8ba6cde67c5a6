use super::unit::*;
use crate::geometry::*;
use serde::{Deserialize, Serialize};

pub type FacilityId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacilityType {
    ControlCenter,
    VehicleFactory,
}

/// A capturable map structure. `left`/`top` is the corner of its footprint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: FacilityId,
    pub facility_type: FacilityType,
    pub owner_player_id: Option<PlayerId>,
    pub left: f64,
    pub top: f64,
    #[serde(default)]
    pub capture_points: f64,
    #[serde(default)]
    pub vehicle_type: Option<UnitType>,
    #[serde(default)]
    pub production_progress: u32,
}

impl Facility {
    pub fn center(&self, width: f64, height: f64) -> Point {
        Point::new(self.left + width / 2.0, self.top + height / 2.0)
    }

    pub fn bounds(&self, width: f64, height: f64) -> Rect {
        Rect::new(self.left, self.top, self.left + width, self.top + height)
    }

    pub fn contains(&self, point: Point, width: f64, height: f64) -> bool {
        self.bounds(width, height).contains(point)
    }

    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner_player_id == Some(player)
    }

    pub fn is_factory(&self) -> bool {
        self.facility_type == FacilityType::VehicleFactory
    }

    pub fn is_control_center(&self) -> bool {
        self.facility_type == FacilityType::ControlCenter
    }
}
