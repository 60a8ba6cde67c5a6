use super::brain::*;
use super::emitter::Emitter;
use crate::board::BoardState;
use crate::features::SquadronFeatures;
use crate::geometry::*;
use crate::model::*;
use itertools::Itertools;
use log::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type SquadronId = Uuid;

/// Derived per-tick facts about a squadron, shared with every brain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SquadronSummary {
    pub id: SquadronId,
    pub group: GroupId,
    pub unit_type: Option<UnitType>,
    pub location: Option<Point>,
    pub destination: Option<Point>,
    pub alive_count: usize,
    pub aerial: bool,
    pub healing: bool,
    pub lost_formation: bool,
    pub low_health: bool,
    pub good_health: bool,
    pub speed: f64,
    pub min_speed: f64,
    pub brain: String,
}

impl SquadronSummary {
    pub fn is_alive(&self) -> bool {
        self.alive_count > 0
    }

    pub fn is_ground(&self) -> bool {
        !self.aerial
    }

    pub fn is_healer(&self) -> bool {
        self.unit_type == Some(UnitType::Arrv)
    }

    /// Squadrons of the same domain (air or ground) spread away from each other.
    pub fn keeps_distance_from(&self, other: &SquadronSummary) -> bool {
        self.id != other.id && self.aerial == other.aerial
    }
}

/// A managed group of friendly units sharing one brain.
pub struct Squadron {
    id: SquadronId,
    group: GroupId,
    units: Vec<UnitId>,
    destination: Option<Point>,
    brain: Brain,
    healing: bool,
    compaction_started_at: Option<u32>,
    last_emitters: Vec<Emitter>,
}

impl Squadron {
    pub fn new(group: GroupId, units: Vec<UnitId>, brain: BrainKind) -> Squadron {
        Squadron {
            id: Uuid::new_v4(),
            group,
            units,
            destination: None,
            brain: Brain::new(brain),
            healing: false,
            compaction_started_at: None,
            last_emitters: Vec::new(),
        }
    }

    pub fn id(&self) -> SquadronId {
        self.id
    }

    pub fn group(&self) -> GroupId {
        self.group
    }

    pub fn units(&self) -> &[UnitId] {
        &self.units
    }

    pub fn destination(&self) -> Option<Point> {
        self.destination
    }

    pub fn brain(&self) -> &Brain {
        &self.brain
    }

    pub fn brain_mut(&mut self) -> &mut Brain {
        &mut self.brain
    }

    pub fn healing(&self) -> bool {
        self.healing
    }

    pub fn set_healing(&mut self, healing: bool) {
        self.healing = healing;
    }

    pub fn last_emitters(&self) -> &[Emitter] {
        &self.last_emitters
    }

    /// Replace the brain with a fresh instance of `kind`.
    pub fn switch_brain(&mut self, kind: BrainKind) {
        debug!("[Squadron] {} (group {}) {} -> {}", self.id, self.group, self.brain.kind().name(), kind.name());
        self.brain = Brain::new(kind);
    }

    pub fn alive_units<'a>(&'a self, board: &'a BoardState) -> impl Iterator<Item = &'a Unit> + Clone + 'a {
        self.units.iter().filter_map(move |id| board.unit(*id)).filter(|u| u.is_alive())
    }

    pub fn is_alive(&self, board: &BoardState) -> bool {
        self.alive_units(board).next().is_some()
    }

    pub fn remove_dead_units(&mut self, board: &BoardState) {
        self.units.retain(|id| board.unit(*id).map(|u| u.is_alive()).unwrap_or(false));
    }

    pub fn location(&self, board: &BoardState) -> Option<Point> {
        Point::mean(self.alive_units(board).map(|u| u.position))
    }

    pub fn unit_type(&self, board: &BoardState) -> Option<UnitType> {
        self.alive_units(board).next().map(|u| u.unit_type)
    }

    pub fn is_aerial(&self, board: &BoardState) -> bool {
        self.unit_type(board).map(|t| t.is_aerial()).unwrap_or(false)
    }

    /// Slowest member's top speed.
    pub fn speed(&self, board: &BoardState) -> f64 {
        self.alive_units(board)
            .map(|u| u.max_speed)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or(0.0)
    }

    pub fn relative_health(&self, board: &BoardState) -> f64 {
        let (durability, max_durability) = self
            .alive_units(board)
            .fold((0u64, 0u64), |(d, m), u| (d + u.durability as u64, m + u.max_durability as u64));

        if max_durability == 0 {
            0.0
        } else {
            durability as f64 / max_durability as f64
        }
    }

    /// Any two members further apart than `spread`.
    pub fn lost_formation(&self, board: &BoardState, spread: f64) -> bool {
        let limit = spread * spread;

        self.alive_units(board)
            .tuple_combinations()
            .any(|(a, b): (&Unit, &Unit)| a.position.squared_distance_to(b.position) > limit)
    }

    /// Whether any member can see `point` with terrain and weather applied.
    pub fn sees(&self, point: Point, board: &BoardState, rules: &GameRules) -> bool {
        self.alive_units(board)
            .any(|u| u.distance_to(point) <= board.effective_vision_range(u, rules))
    }

    // ─── Compaction ─────────────────────────────────────────────────────────

    pub fn attempted_compaction(&self, tick: u32, retry_after: u32) -> bool {
        self.compaction_started_at
            .map(|started| started + retry_after > tick)
            .unwrap_or(false)
    }

    /// Queue the rotate/shrink sequence that pulls a scattered squadron together.
    pub fn compact(&mut self, tick: u32, step_cooldown: u32) {
        info!("[Squadron] Compacting group {} at tick {}", self.group, tick);

        for action in [
            ScheduledAction::RotateLeft,
            ScheduledAction::Shrink,
            ScheduledAction::RotateRight,
            ScheduledAction::Shrink,
        ] {
            self.brain.schedule(action, step_cooldown);
        }

        self.compaction_started_at = Some(tick);
    }

    pub fn summary(&self, board: &BoardState, features: &SquadronFeatures) -> SquadronSummary {
        let relative_health = self.relative_health(board);
        let speed = self.speed(board);
        let unit_type = self.unit_type(board);

        SquadronSummary {
            id: self.id,
            group: self.group,
            unit_type,
            location: self.location(board),
            destination: self.destination,
            alive_count: self.alive_units(board).count(),
            aerial: unit_type.map(|t| t.is_aerial()).unwrap_or(false),
            healing: self.healing,
            lost_formation: self.lost_formation(board, features.formation_spread),
            low_health: relative_health <= features.low_health,
            good_health: relative_health >= features.good_health,
            speed,
            min_speed: speed * features.min_speed_factor,
            brain: self.brain.kind().name().to_string(),
        }
    }

    /// Give the brain a turn. Applies whatever the brain decided to the squadron.
    pub fn activate(&mut self, summary: &SquadronSummary, context: &mut BrainContext) -> bool {
        let outcome = self.brain.activate(summary, context);

        if let Some(destination) = outcome.destination {
            self.destination = Some(destination);
        }
        if let Some(healing) = outcome.healing {
            self.healing = healing;
        }
        if let Some(emitters) = outcome.emitters {
            self.last_emitters = emitters;
        }
        if let Some(kind) = outcome.switch_to {
            self.switch_brain(kind);
        }

        outcome.acted
    }
}
