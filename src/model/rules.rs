use super::environment::*;
use super::unit::*;
use crate::geometry::{Cell, DEFAULT_CELL_SIZE};
use serde::{Deserialize, Serialize};

/// Static game constants. Supplied by the host; defaults match the stock ruleset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    pub world_width: f64,
    pub world_height: f64,
    pub cell_size: f64,
    pub facility_width: f64,
    pub facility_height: f64,
    pub tactical_nuclear_strike_radius: f64,
    pub max_tactical_nuclear_strike_damage: f64,
    pub tactical_nuclear_strike_delay: u32,
    pub base_action_count: u32,
    pub additional_action_count_per_control_center: u32,
    pub action_detection_interval: u32,
    pub vehicle_production_cost: u32,
    pub plain_terrain_vision_factor: f64,
    pub swamp_terrain_vision_factor: f64,
    pub forest_terrain_vision_factor: f64,
    pub clear_weather_vision_factor: f64,
    pub cloud_weather_vision_factor: f64,
    pub rain_weather_vision_factor: f64,
}

impl Default for GameRules {
    fn default() -> GameRules {
        GameRules {
            world_width: 1024.0,
            world_height: 1024.0,
            cell_size: DEFAULT_CELL_SIZE,
            facility_width: 64.0,
            facility_height: 64.0,
            tactical_nuclear_strike_radius: 50.0,
            max_tactical_nuclear_strike_damage: 99.0,
            tactical_nuclear_strike_delay: 30,
            base_action_count: 12,
            additional_action_count_per_control_center: 3,
            action_detection_interval: 60,
            vehicle_production_cost: 60,
            plain_terrain_vision_factor: 1.0,
            swamp_terrain_vision_factor: 1.0,
            forest_terrain_vision_factor: 0.8,
            clear_weather_vision_factor: 1.0,
            cloud_weather_vision_factor: 0.8,
            rain_weather_vision_factor: 0.6,
        }
    }
}

impl GameRules {
    pub fn columns(&self) -> i32 {
        (self.world_width / self.cell_size).ceil() as i32
    }

    pub fn rows(&self) -> i32 {
        (self.world_height / self.cell_size).ceil() as i32
    }

    pub fn terrain_vision_factor(&self, terrain: TerrainType) -> f64 {
        match terrain {
            TerrainType::Plain => self.plain_terrain_vision_factor,
            TerrainType::Swamp => self.swamp_terrain_vision_factor,
            TerrainType::Forest => self.forest_terrain_vision_factor,
        }
    }

    pub fn weather_vision_factor(&self, weather: WeatherType) -> f64 {
        match weather {
            WeatherType::Clear => self.clear_weather_vision_factor,
            WeatherType::Cloud => self.cloud_weather_vision_factor,
            WeatherType::Rain => self.rain_weather_vision_factor,
        }
    }

    /// Vision multiplier for a unit standing in a cell: aerial units see through weather,
    /// ground units through terrain.
    pub fn vision_factor(&self, unit_type: UnitType, environment: Option<&EnvironmentGrid>, cell: Cell) -> f64 {
        match environment {
            Some(environment) if unit_type.is_aerial() => self.weather_vision_factor(environment.weather_at(cell)),
            Some(environment) => self.terrain_vision_factor(environment.terrain_at(cell)),
            None => 1.0,
        }
    }

    /// Number of orders allowed per detection interval given the control centres held.
    pub fn action_budget(&self, control_centers: usize) -> u32 {
        self.base_action_count + self.additional_action_count_per_control_center * control_centers as u32
    }
}
