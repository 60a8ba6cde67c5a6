use crate::geometry::*;
use crate::model::*;
use lerp::*;

/// Area strike with damage falling off linearly from the epicentre.
///
/// - Distance 0: `max_damage`
/// - Distance 0..radius: linear falloff to 0
/// - Beyond `radius`: no damage
///
/// Damage to a unit never exceeds its remaining durability.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlastModel {
    pub radius: f64,
    pub max_damage: f64,
}

impl BlastModel {
    pub fn new(radius: f64, max_damage: f64) -> BlastModel {
        BlastModel { radius, max_damage }
    }

    pub fn from_rules(rules: &GameRules) -> BlastModel {
        BlastModel::new(rules.tactical_nuclear_strike_radius, rules.max_tactical_nuclear_strike_damage)
    }

    pub fn damage_at_range(&self, range: f64) -> f64 {
        if range > self.radius || self.radius <= 0.0 {
            return 0.0;
        }

        self.max_damage.lerp_bounded(0.0, range / self.radius)
    }

    pub fn damage_to(&self, unit: &Unit, epicentre: Point) -> f64 {
        if !unit.is_alive() {
            return 0.0;
        }

        self.damage_at_range(unit.distance_to(epicentre)).min(unit.durability as f64)
    }

    pub fn total_damage<'a, I: IntoIterator<Item = &'a Unit>>(&self, units: I, epicentre: Point) -> f64 {
        units.into_iter().map(|unit| self.damage_to(unit, epicentre)).sum()
    }
}
