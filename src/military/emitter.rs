use crate::geometry::*;
use lerp::*;
use serde::{Deserialize, Serialize};

/// Value returned by a safe-distance emitter inside its preferred band's lower edge.
pub const BELOW_BAND_PENALTY: f64 = -10.0;
/// Band narrowing applied while a friendly strike is about to come off cooldown.
pub const STRIKE_READY_BAND_NARROWING: f64 = 10.0;

/// Shape of an emitter's contribution over distance.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Falloff {
    /// `max * (1 - d / radius)`.
    Linear,
    /// `max * 2^(-d / exponent) + bias`.
    Exponential { exponent: f64, bias: f64 },
    /// Rewards staying `band ± variation` away from the source.
    SafeDistance { band: f64, variation: f64 },
}

/// State of the querying squadron that perturbs safe-distance bands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldContext {
    pub lost_formation: bool,
    pub strike_almost_ready: bool,
}

/// A point source of the potential field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Emitter {
    pub location: Point,
    pub effect_radius: f64,
    pub max_value: f64,
    pub falloff: Falloff,
}

impl Emitter {
    pub fn linear(location: Point, max_value: f64, effect_radius: f64) -> Emitter {
        Emitter {
            location,
            effect_radius,
            max_value,
            falloff: Falloff::Linear,
        }
    }

    pub fn exponential(location: Point, max_value: f64, exponent: f64, effect_radius: f64) -> Emitter {
        Emitter::exponential_with_bias(location, max_value, exponent, 0.0, effect_radius)
    }

    pub fn exponential_with_bias(location: Point, max_value: f64, exponent: f64, bias: f64, effect_radius: f64) -> Emitter {
        Emitter {
            location,
            effect_radius,
            max_value,
            falloff: Falloff::Exponential { exponent, bias },
        }
    }

    pub fn safe_distance(location: Point, max_value: f64, effect_radius: f64, band: f64, variation: f64) -> Emitter {
        Emitter {
            location,
            effect_radius,
            max_value,
            falloff: Falloff::SafeDistance { band, variation },
        }
    }

    pub fn within_range(&self, point: Point) -> bool {
        self.location.distance_to(point) <= self.effect_radius
    }

    pub fn value_at(&self, point: Point, context: &FieldContext) -> f64 {
        self.value_at_distance(self.location.distance_to(point), context)
    }

    pub fn value_at_distance(&self, distance: f64, context: &FieldContext) -> f64 {
        if distance < 0.0 || distance > self.effect_radius {
            return 0.0;
        }

        match self.falloff {
            Falloff::Linear => {
                if self.effect_radius <= 0.0 {
                    self.max_value
                } else {
                    self.max_value.lerp_bounded(0.0, distance / self.effect_radius)
                }
            }
            Falloff::Exponential { exponent, bias } => self.max_value * 2f64.powf(-distance / exponent) + bias,
            Falloff::SafeDistance { band, variation } => {
                let mut band = band;
                if context.lost_formation {
                    band *= 2.0;
                }
                if context.strike_almost_ready {
                    band -= STRIKE_READY_BAND_NARROWING;
                }

                if distance < band - variation {
                    BELOW_BAND_PENALTY
                } else if distance <= band + variation {
                    self.max_value
                } else if self.effect_radius > band {
                    self.max_value * (1.0 - (distance - band) / (self.effect_radius - band))
                } else {
                    0.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Point {
        Point::new(0.0, 0.0)
    }

    #[test]
    fn linear_endpoints_and_monotonicity() {
        let emitter = Emitter::linear(origin(), 40.0, 200.0);
        let context = FieldContext::default();

        assert_eq!(emitter.value_at_distance(0.0, &context), 40.0);
        assert_eq!(emitter.value_at_distance(200.0, &context), 0.0);
        assert_eq!(emitter.value_at_distance(201.0, &context), 0.0);

        let mut previous = f64::INFINITY;
        for step in 0..=200 {
            let value = emitter.value_at_distance(step as f64, &context);
            assert!(value <= previous, "value rose at d={step}");
            previous = value;
        }
    }

    #[test]
    fn exponential_halves_every_exponent() {
        let emitter = Emitter::exponential_with_bias(origin(), 1000.0, 50.0, 5.0, 1024.0);
        let context = FieldContext::default();

        assert!((emitter.value_at_distance(0.0, &context) - 1005.0).abs() < 1e-9);
        assert!((emitter.value_at_distance(50.0, &context) - 505.0).abs() < 1e-9);
        assert!((emitter.value_at_distance(100.0, &context) - 255.0).abs() < 1e-9);
        assert_eq!(emitter.value_at_distance(1025.0, &context), 0.0);
    }

    #[test]
    fn safe_distance_band_values() {
        let emitter = Emitter::safe_distance(origin(), 50.0, 350.0, 100.0, 10.0);
        let context = FieldContext::default();

        assert!((emitter.value_at_distance(50.0, &context) - BELOW_BAND_PENALTY).abs() < 1e-9);
        assert_eq!(emitter.value_at_distance(90.0, &context), 50.0);
        assert_eq!(emitter.value_at_distance(100.0, &context), 50.0);
        assert_eq!(emitter.value_at_distance(105.0, &context), 50.0);
        assert!(emitter.value_at_distance(111.0, &context) < 50.0);
        assert!(emitter.value_at_distance(111.0, &context) > 0.0);
        assert_eq!(emitter.value_at_distance(9999.0, &context), 0.0);
    }

    #[test]
    fn safe_distance_band_reacts_to_context() {
        let emitter = Emitter::safe_distance(origin(), 50.0, 350.0, 100.0, 10.0);

        let scattered = FieldContext {
            lost_formation: true,
            strike_almost_ready: false,
        };
        assert_eq!(emitter.value_at_distance(150.0, &scattered), BELOW_BAND_PENALTY);
        assert_eq!(emitter.value_at_distance(200.0, &scattered), 50.0);

        let striking = FieldContext {
            lost_formation: false,
            strike_almost_ready: true,
        };
        assert_eq!(emitter.value_at_distance(82.0, &striking), 50.0);
        assert!(emitter.value_at_distance(105.0, &striking) < 50.0);
    }

    #[test]
    fn within_range_is_inclusive() {
        let emitter = Emitter::linear(origin(), 1.0, 10.0);
        assert!(emitter.within_range(Point::new(6.0, 8.0)));
        assert!(!emitter.within_range(Point::new(6.0, 8.1)));
    }
}
