use super::facility::*;
use super::unit::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    #[default]
    None,
    ClearAndSelect,
    AddToSelection,
    Deselect,
    Assign,
    Dismiss,
    Disband,
    Move,
    Rotate,
    Scale,
    SetupVehicleProduction,
    TacticalNuclearStrike,
}

/// One outgoing order record. Unset fields are left out of the serialized form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub action: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<UnitType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility_id: Option<FacilityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<UnitId>,
}

impl Order {
    pub fn new(action: ActionKind) -> Order {
        Order {
            action,
            ..Default::default()
        }
    }

    /// Copy the action and every present field of `other` onto this slot.
    pub fn merge_from(&mut self, other: &Order) {
        fn set<T: Copy>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        self.action = other.action;
        set(&mut self.group, other.group);
        set(&mut self.left, other.left);
        set(&mut self.top, other.top);
        set(&mut self.right, other.right);
        set(&mut self.bottom, other.bottom);
        set(&mut self.x, other.x);
        set(&mut self.y, other.y);
        set(&mut self.angle, other.angle);
        set(&mut self.factor, other.factor);
        set(&mut self.max_speed, other.max_speed);
        set(&mut self.vehicle_type, other.vehicle_type);
        set(&mut self.facility_id, other.facility_id);
        set(&mut self.vehicle_id, other.vehicle_id);
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string(self).map_err(|err| format!("Failed to serialize order: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_are_not_emitted() {
        let order = Order {
            action: ActionKind::Scale,
            x: Some(10.0),
            y: Some(20.0),
            factor: Some(0.5),
            ..Default::default()
        };

        let json = order.to_json().unwrap();
        assert_eq!(json, r#"{"action":"Scale","x":10.0,"y":20.0,"factor":0.5}"#);
    }

    #[test]
    fn merge_keeps_slot_fields_that_are_absent_in_source() {
        let mut slot = Order {
            group: Some(3),
            ..Default::default()
        };

        slot.merge_from(&Order {
            action: ActionKind::Move,
            x: Some(1.0),
            y: Some(2.0),
            ..Default::default()
        });

        assert_eq!(slot.action, ActionKind::Move);
        assert_eq!(slot.group, Some(3));
        assert_eq!(slot.x, Some(1.0));
        assert_eq!(slot.factor, None);
    }
}
