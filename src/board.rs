use crate::geometry::*;
use crate::military::damage::BlastModel;
use crate::model::*;
use log::*;
use std::collections::HashMap;

/// Squared displacement below which a unit is considered stationary.
pub const MOVEMENT_EPSILON_SQUARED: f64 = 1e-10;

/// Cached view of every known unit and facility, patched from per-tick deltas.
#[derive(Default)]
pub struct BoardState {
    me: Option<PlayerId>,
    units: HashMap<UnitId, Unit>,
    facilities: Vec<Facility>,
    environment: Option<EnvironmentGrid>,
    /// Number of pending stillness triggers watching each unit.
    watch_counts: HashMap<UnitId, u32>,
    last_moved_at: HashMap<UnitId, u32>,
}

impl BoardState {
    pub fn new() -> BoardState {
        BoardState::default()
    }

    pub fn me(&self) -> Option<PlayerId> {
        self.me
    }

    /// Apply one tick's snapshot. An update naming an unknown unit rejects the
    /// whole message before anything is modified.
    pub fn apply_snapshot(&mut self, snapshot: &TickSnapshot) -> Result<(), String> {
        if let Some(unknown) = snapshot
            .unit_updates
            .iter()
            .find(|update| !self.units.contains_key(&update.id) && !snapshot.new_units.iter().any(|u| u.id == update.id))
        {
            return Err(format!("Update references unknown unit id {}", unknown.id));
        }

        if let Some(me) = snapshot.me() {
            self.me = Some(me.id);
        }

        if self.environment.is_none() {
            if let Some(environment) = &snapshot.environment {
                self.environment = Some(environment.clone());
            }
        }

        for unit in &snapshot.new_units {
            self.units.insert(unit.id, unit.clone());
        }

        for update in &snapshot.unit_updates {
            let unit = self
                .units
                .get_mut(&update.id)
                .ok_or_else(|| format!("Expected unit {}", update.id))?;

            let displacement = unit.apply_update(update);

            if displacement > MOVEMENT_EPSILON_SQUARED && self.watch_counts.get(&update.id).copied().unwrap_or(0) > 0 {
                self.last_moved_at.insert(update.id, snapshot.tick);
            }

            if !unit.is_alive() {
                self.units.remove(&update.id);
                self.last_moved_at.remove(&update.id);
            }
        }

        if let FacilitiesUpdate::Replace(facilities) = &snapshot.facilities {
            self.facilities = facilities.clone();
        }

        Ok(())
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn is_mine(&self, unit: &Unit) -> bool {
        self.me == Some(unit.player_id)
    }

    pub fn my_units(&self) -> impl Iterator<Item = &Unit> {
        let me = self.me;
        self.units.values().filter(move |u| Some(u.player_id) == me)
    }

    pub fn enemy_units(&self) -> impl Iterator<Item = &Unit> {
        let me = self.me;
        self.units.values().filter(move |u| Some(u.player_id) != me)
    }

    pub fn facilities(&self) -> &[Facility] {
        &self.facilities
    }

    pub fn facility(&self, id: FacilityId) -> Option<&Facility> {
        self.facilities.iter().find(|f| f.id == id)
    }

    pub fn my_facilities(&self) -> impl Iterator<Item = &Facility> {
        let me = self.me;
        self.facilities.iter().filter(move |f| me.is_some() && f.owner_player_id == me)
    }

    pub fn foreign_facilities(&self) -> impl Iterator<Item = &Facility> {
        let me = self.me;
        self.facilities.iter().filter(move |f| me.is_none() || f.owner_player_id != me)
    }

    pub fn my_control_center_count(&self) -> usize {
        self.my_facilities().filter(|f| f.is_control_center()).count()
    }

    pub fn environment(&self) -> Option<&EnvironmentGrid> {
        self.environment.as_ref()
    }

    /// Vision range of a unit after terrain and weather modifiers.
    pub fn effective_vision_range(&self, unit: &Unit, rules: &GameRules) -> f64 {
        let cell = unit.position.to_cell(rules.cell_size);

        unit.vision_range * rules.vision_factor(unit.unit_type, self.environment(), cell)
    }

    // ─── Movement watch ─────────────────────────────────────────────────────

    pub fn watch(&mut self, id: UnitId) {
        *self.watch_counts.entry(id).or_insert(0) += 1;
    }

    pub fn unwatch(&mut self, id: UnitId) {
        match self.watch_counts.get_mut(&id) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                self.watch_counts.remove(&id);
                self.last_moved_at.remove(&id);
            }
            None => warn!("[Board] Unwatch of unit {} that was not watched", id),
        }
    }

    pub fn watch_count(&self, id: UnitId) -> u32 {
        self.watch_counts.get(&id).copied().unwrap_or(0)
    }

    /// Tick on which a watched unit last moved, if it moved while watched.
    pub fn last_moved_at(&self, id: UnitId) -> Option<u32> {
        self.last_moved_at.get(&id).copied()
    }

    // ─── Damage estimates ───────────────────────────────────────────────────

    pub fn ally_damage_at(&self, point: Point, blast: &BlastModel) -> f64 {
        blast.total_damage(self.my_units(), point)
    }

    pub fn enemy_damage_at(&self, point: Point, blast: &BlastModel) -> f64 {
        blast.total_damage(self.enemy_units(), point)
    }
}
