use super::emitter::*;
use crate::geometry::*;
use itertools::Itertools;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Static per-cell bias added to every field evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BasePotentialMap {
    columns: i32,
    rows: i32,
    cell_size: f64,
    values: Vec<f64>,
}

impl BasePotentialMap {
    pub fn flat(columns: i32, rows: i32, cell_size: f64) -> BasePotentialMap {
        BasePotentialMap {
            columns,
            rows,
            cell_size,
            values: vec![0.0; (columns.max(0) * rows.max(0)) as usize],
        }
    }

    /// Map whose cells near the world edge are penalised. The penalty starts at
    /// `edge_value` on the border row and decays linearly to zero `decay_cells` in.
    /// Where two edges overlap the stronger effect wins.
    pub fn with_edge_repulsion(columns: i32, rows: i32, cell_size: f64, edge_value: f64, decay_cells: f64) -> BasePotentialMap {
        let mut map = BasePotentialMap::flat(columns, rows, cell_size);

        for x in 0..columns {
            for y in 0..rows {
                let distances = [x, columns - x - 1, y, rows - y - 1];

                let value = distances
                    .iter()
                    .map(|d| linear_decay(*d as f64, edge_value, decay_cells))
                    .fold(0.0, |strongest: f64, effect| if effect.abs() > strongest.abs() { effect } else { strongest });

                map.set(Cell::new(x, y), value);
            }
        }

        map
    }

    pub fn columns(&self) -> i32 {
        self.columns
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.columns && cell.y < self.rows
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        if self.contains(cell) {
            Some((cell.x * self.rows + cell.y) as usize)
        } else {
            None
        }
    }

    pub fn value(&self, cell: Cell) -> f64 {
        self.index(cell).map(|i| self.values[i]).unwrap_or(0.0)
    }

    pub fn set(&mut self, cell: Cell, value: f64) {
        if let Some(i) = self.index(cell) {
            self.values[i] = value;
        }
    }

    pub fn add(&mut self, cell: Cell, delta: f64) {
        if let Some(i) = self.index(cell) {
            self.values[i] += delta;
        }
    }
}

/// `base * (1 - distance / radius)` on `[0, radius]`, 0 elsewhere.
pub fn linear_decay(distance: f64, base: f64, radius: f64) -> f64 {
    if distance >= 0.0 && distance <= radius && radius > 0.0 {
        base * (1.0 - distance / radius)
    } else {
        0.0
    }
}

/// Outcome of a destination search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldChoice {
    pub cell: Cell,
    pub destination: Point,
    pub value: f64,
    pub candidates: usize,
    pub tied: usize,
}

/// Field value quantised to two decimals so near-equal cells tie.
fn tie_key(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

/// Evaluate the field on every cell whose centre lies strictly within
/// `search_radius` of `origin` and pick uniformly among the best cells.
pub fn choose_destination<R: Rng + ?Sized>(
    origin: Point,
    search_radius: f64,
    base: &BasePotentialMap,
    emitters: &[Emitter],
    context: &FieldContext,
    rng: &mut R,
) -> Option<FieldChoice> {
    let cell_size = base.cell_size();
    let reach = (search_radius / cell_size).ceil() as i32 + 1;
    let origin_cell = origin.to_cell(cell_size);

    let scored: Vec<(i64, Cell, f64)> = (origin_cell.x - reach..=origin_cell.x + reach)
        .cartesian_product(origin_cell.y - reach..=origin_cell.y + reach)
        .map(|(x, y)| Cell::new(x, y))
        .filter(|cell| base.contains(*cell) && cell.center(cell_size).distance_to(origin) < search_radius)
        .filter_map(|cell| {
            let center = cell.center(cell_size);
            let value = emitters
                .iter()
                .filter(|e| e.within_range(center))
                .map(|e| e.value_at(center, context))
                .sum::<f64>()
                + base.value(cell);

            if value.is_finite() {
                Some((tie_key(value), cell, value))
            } else {
                None
            }
        })
        .collect();

    let best = scored.iter().map(|(key, _, _)| *key).max()?;
    let tied: Vec<&(i64, Cell, f64)> = scored.iter().filter(|(key, _, _)| *key == best).collect();
    let (_, cell, _) = **tied.choose(rng)?;

    Some(FieldChoice {
        cell,
        destination: cell.center(cell_size),
        value: best as f64 / 100.0,
        candidates: scored.len(),
        tied: tied.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_repulsion_is_strongest_on_border() {
        let map = BasePotentialMap::with_edge_repulsion(32, 32, 32.0, -150.0, 4.0);

        assert_eq!(map.value(Cell::new(0, 10)), -150.0);
        assert_eq!(map.value(Cell::new(1, 10)), -112.5);
        assert_eq!(map.value(Cell::new(4, 10)), 0.0);
        assert_eq!(map.value(Cell::new(16, 16)), 0.0);
        assert_eq!(map.value(Cell::new(31, 31)), -150.0);
        assert_eq!(map.value(Cell::new(-1, 0)), 0.0);
    }

    #[test]
    fn attractor_pulls_destination() {
        let map = BasePotentialMap::flat(32, 32, 32.0);
        let target = Point::new(600.0, 500.0);
        let emitters = vec![Emitter::exponential(target, 1000.0, 50.0, 1024.0)];
        let mut rng = StdRng::seed_from_u64(1);

        let choice = choose_destination(Point::new(500.0, 500.0), 96.0, &map, &emitters, &FieldContext::default(), &mut rng).unwrap();

        assert_eq!(choice.cell, Cell::new(18, 15));
        assert_eq!(choice.tied, 1);
        assert!(choice.candidates > 1);
    }

    #[test]
    fn flat_field_ties_are_broken_by_rng() {
        let map = BasePotentialMap::flat(32, 32, 32.0);
        let origin = Point::new(512.0, 512.0);

        let choices: Vec<Cell> = (0..20)
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                choose_destination(origin, 96.0, &map, &[], &FieldContext::default(), &mut rng)
                    .unwrap()
                    .cell
            })
            .collect();

        let first = choose_destination(origin, 96.0, &map, &[], &FieldContext::default(), &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(first.tied, first.candidates);
        assert_eq!(choices[0], first.cell);
        assert!(choices.iter().any(|c| *c != choices[0]));
    }

    #[test]
    fn near_ties_collapse_after_rounding() {
        let map = BasePotentialMap::flat(32, 32, 32.0);
        let origin = Point::new(512.0, 512.0);
        let emitters = vec![Emitter::linear(Point::new(0.0, 0.0), 0.001, 2000.0)];

        let choice = choose_destination(origin, 96.0, &map, &emitters, &FieldContext::default(), &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(choice.tied, choice.candidates);
    }

    #[test]
    fn out_of_map_origin_has_no_candidates() {
        let map = BasePotentialMap::flat(4, 4, 32.0);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(choose_destination(Point::new(5000.0, 5000.0), 96.0, &map, &[], &FieldContext::default(), &mut rng).is_none());
    }
}
