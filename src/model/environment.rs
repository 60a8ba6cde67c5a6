use crate::geometry::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainType {
    #[default]
    Plain,
    Swamp,
    Forest,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherType {
    #[default]
    Clear,
    Cloud,
    Rain,
}

/// Static terrain and weather grids, indexed `[x][y]` by cell. Sent once at match start.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentGrid {
    pub terrain: Vec<Vec<TerrainType>>,
    pub weather: Vec<Vec<WeatherType>>,
}

impl EnvironmentGrid {
    pub fn terrain_at(&self, cell: Cell) -> TerrainType {
        lookup(&self.terrain, cell).unwrap_or_default()
    }

    pub fn weather_at(&self, cell: Cell) -> WeatherType {
        lookup(&self.weather, cell).unwrap_or_default()
    }
}

fn lookup<T: Copy>(grid: &[Vec<T>], cell: Cell) -> Option<T> {
    if cell.x < 0 || cell.y < 0 {
        return None;
    }

    grid.get(cell.x as usize)?.get(cell.y as usize).copied()
}
