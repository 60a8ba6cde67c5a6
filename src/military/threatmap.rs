use crate::board::BoardState;
use crate::geometry::*;
use crate::model::*;
use std::collections::HashMap;

/// Enemy unit counts per grid cell, overall and by unit type.
#[derive(Clone, Debug, Default)]
pub struct EnemyDensityMap {
    cell_size: f64,
    by_cell: HashMap<Cell, u32>,
    by_type_by_cell: HashMap<UnitType, HashMap<Cell, u32>>,
}

impl EnemyDensityMap {
    pub fn build(board: &BoardState, cell_size: f64) -> EnemyDensityMap {
        let mut map = EnemyDensityMap {
            cell_size,
            ..Default::default()
        };

        for unit in board.enemy_units().filter(|u| u.is_alive()) {
            let cell = unit.position.to_cell(cell_size);

            *map.by_cell.entry(cell).or_insert(0) += 1;
            *map.by_type_by_cell.entry(unit.unit_type).or_default().entry(cell).or_insert(0) += 1;
        }

        map
    }

    pub fn is_empty(&self) -> bool {
        self.by_cell.is_empty()
    }

    pub fn count(&self, cell: Cell) -> u32 {
        self.by_cell.get(&cell).copied().unwrap_or(0)
    }

    pub fn count_of_type(&self, unit_type: UnitType, cell: Cell) -> u32 {
        self.by_type_by_cell
            .get(&unit_type)
            .and_then(|cells| cells.get(&cell))
            .copied()
            .unwrap_or(0)
    }

    pub fn cells(&self) -> impl Iterator<Item = (&Cell, &u32)> {
        self.by_cell.iter()
    }

    pub fn cells_of_type(&self, unit_type: UnitType) -> impl Iterator<Item = (&Cell, &u32)> {
        self.by_type_by_cell.get(&unit_type).into_iter().flat_map(|cells| cells.iter())
    }

    /// Occupied cell whose centre is nearest to `point`. Ties resolve to the lowest cell.
    pub fn nearest_cell(&self, point: Point) -> Option<Cell> {
        self.by_cell
            .keys()
            .map(|cell| (cell.center(self.cell_size).squared_distance_to(point), *cell))
            .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal).then(a.1.cmp(&b.1)))
            .map(|(_, cell)| cell)
    }
}
