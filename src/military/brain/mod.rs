mod aggressive;
mod capture;
mod follower;
mod hunter;
mod potential;

use super::cluster::ClusterSet;
use super::emitter::*;
use super::potential::BasePotentialMap;
use super::squadron::*;
use super::threatmap::EnemyDensityMap;
use crate::board::BoardState;
use crate::features::Features;
use crate::geometry::*;
use crate::maneuver::Followup;
use crate::model::*;
use crate::pipeline::*;
use log::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

pub use potential::FieldState;

/// Rotation applied by the rotate steps of a formation sequence, in degrees.
const ROTATION_STEP_DEGREES: f64 = 60.0;
/// Scale factor of a shrink step.
const SHRINK_FACTOR: f64 = 0.1;

/// One-shot formation step queued ahead of a brain's normal logic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledAction {
    RotateLeft,
    RotateRight,
    Shrink,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledEntry {
    pub action: ScheduledAction,
    /// Ticks to wait after this step before the next activation.
    pub cooldown: u32,
}

/// Behaviour variants a squadron can run.
#[derive(Clone, Debug, PartialEq)]
pub enum BrainKind {
    /// Never acts.
    Disabled,
    /// Wanders the potential field: attracted to soft targets and enemy
    /// facilities, keeps a safe distance from dangerous clusters.
    Potential(FieldState),
    /// Field follower tuned for engagement: shorter cadence, mixed clusters
    /// held at range, density of exploitable enemies folded into the base map.
    Hunter(FieldState),
    /// Heads for the nearest uncontested facility, or the map centre.
    CaptureFacility,
    /// Tracks another squadron's position.
    Follower { target: SquadronId },
    /// Beelines for the nearest enemy concentration.
    Aggressive,
}

impl BrainKind {
    pub fn potential() -> BrainKind {
        BrainKind::Potential(FieldState::default())
    }

    pub fn hunter() -> BrainKind {
        BrainKind::Hunter(FieldState::default())
    }

    pub fn name(&self) -> &'static str {
        match self {
            BrainKind::Disabled => "disabled",
            BrainKind::Potential(_) => "potential",
            BrainKind::Hunter(_) => "hunter",
            BrainKind::CaptureFacility => "capture",
            BrainKind::Follower { .. } => "follower",
            BrainKind::Aggressive => "aggressive",
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, BrainKind::Disabled)
    }
}

/// Everything a brain may read, plus the few things it may write, for one tick.
pub struct BrainContext<'a> {
    pub tick: u32,
    pub rules: &'a GameRules,
    pub features: &'a Features,
    pub board: &'a BoardState,
    pub clusters: &'a ClusterSet,
    pub density: &'a EnemyDensityMap,
    pub squadrons: &'a [SquadronSummary],
    pub base_map: &'a BasePotentialMap,
    /// A friendly strike comes off cooldown soon.
    pub strike_almost_ready: bool,
    pub pipeline: &'a mut CommandPipeline<Followup>,
    pub rng: &'a mut StdRng,
    /// Facility claimed by each capturing squadron.
    pub capture_targets: &'a mut HashMap<FacilityId, SquadronId>,
}

impl<'a> BrainContext<'a> {
    pub fn field_context(&self, summary: &SquadronSummary) -> FieldContext {
        FieldContext {
            lost_formation: summary.lost_formation,
            strike_almost_ready: self.strike_almost_ready,
        }
    }

    pub fn other_squadrons<'b>(&'b self, summary: &'b SquadronSummary) -> impl Iterator<Item = &'b SquadronSummary> + 'b {
        self.squadrons.iter().filter(move |s| s.id != summary.id && s.is_alive())
    }
}

/// What a variant decided during one activation.
#[derive(Clone, Debug, Default)]
pub struct Decision {
    pub cooldown: u32,
    pub destination: Option<Point>,
    pub healing: Option<bool>,
    pub switch_to: Option<BrainKind>,
    pub emitters: Option<Vec<Emitter>>,
}

impl Decision {
    pub fn wait(cooldown: u32) -> Decision {
        Decision {
            cooldown,
            ..Default::default()
        }
    }
}

/// Result of `Brain::activate`, applied by the owning squadron.
#[derive(Clone, Debug, Default)]
pub struct BrainOutcome {
    pub acted: bool,
    pub destination: Option<Point>,
    pub healing: Option<bool>,
    pub switch_to: Option<BrainKind>,
    pub emitters: Option<Vec<Emitter>>,
}

impl BrainOutcome {
    fn idle() -> BrainOutcome {
        BrainOutcome::default()
    }
}

/// Behaviour attached to exactly one squadron.
#[derive(Clone, Debug)]
pub struct Brain {
    id: Uuid,
    cooldown: u32,
    scheduled: VecDeque<ScheduledEntry>,
    kind: BrainKind,
}

impl Brain {
    pub fn new(kind: BrainKind) -> Brain {
        Brain {
            id: Uuid::new_v4(),
            cooldown: 0,
            scheduled: VecDeque::new(),
            kind,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> &BrainKind {
        &self.kind
    }

    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    pub fn scheduled(&self) -> impl Iterator<Item = &ScheduledEntry> {
        self.scheduled.iter()
    }

    pub fn schedule(&mut self, action: ScheduledAction, cooldown: u32) {
        self.scheduled.push_back(ScheduledEntry { action, cooldown });
    }

    /// Hold off the next activation for `ticks`.
    pub fn wait_for(&mut self, ticks: u32) {
        self.cooldown = ticks;
    }

    /// Run one activation. While the cooldown is positive this only counts it down.
    /// Otherwise one scheduled step runs if any is queued, else the variant logic.
    pub fn activate(&mut self, summary: &SquadronSummary, context: &mut BrainContext) -> BrainOutcome {
        if self.kind.is_disabled() {
            return BrainOutcome::idle();
        }

        if self.cooldown > 0 {
            self.cooldown -= 1;
            return BrainOutcome::idle();
        }

        let location = match summary.location {
            Some(location) if location.is_finite() => location,
            _ => return BrainOutcome::idle(),
        };

        if let Some(entry) = self.scheduled.pop_front() {
            run_scheduled(entry.action, summary.group, location, context.pipeline);
            self.cooldown = entry.cooldown;

            return BrainOutcome {
                acted: true,
                ..Default::default()
            };
        }

        let decision = match &mut self.kind {
            BrainKind::Disabled => return BrainOutcome::idle(),
            BrainKind::Potential(state) => potential::decide(state, summary, location, context),
            BrainKind::Hunter(state) => hunter::decide(state, summary, location, context),
            BrainKind::CaptureFacility => capture::decide(summary, location, context),
            BrainKind::Follower { target } => follower::decide(*target, summary, location, context),
            BrainKind::Aggressive => aggressive::decide(summary, location, context),
        };

        self.cooldown = decision.cooldown;

        BrainOutcome {
            acted: true,
            destination: decision.destination,
            healing: decision.healing,
            switch_to: decision.switch_to,
            emitters: decision.emitters,
        }
    }
}

fn run_scheduled(action: ScheduledAction, group: GroupId, location: Point, pipeline: &mut CommandPipeline<Followup>) {
    trace!("[Brain] Group {} runs scheduled {:?}", group, action);

    pipeline.select_group(group);
    match action {
        ScheduledAction::Shrink => pipeline.scale(location, SHRINK_FACTOR),
        ScheduledAction::RotateLeft => pipeline.rotate(location, -ROTATION_STEP_DEGREES),
        ScheduledAction::RotateRight => pipeline.rotate(location, ROTATION_STEP_DEGREES),
    }
}

/// Select the squadron and move it by `delta`.
fn move_group(pipeline: &mut CommandPipeline<Followup>, group: GroupId, delta: Point, max_speed: Option<f64>) {
    pipeline.select_group(group);
    pipeline.move_by(delta, max_speed);
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::military::cluster::ClusterSet;
    use rand::SeedableRng;

    /// Owns everything a `BrainContext` borrows.
    pub struct Harness {
        pub rules: GameRules,
        pub features: Features,
        pub board: BoardState,
        pub clusters: ClusterSet,
        pub density: EnemyDensityMap,
        pub squadrons: Vec<SquadronSummary>,
        pub base_map: BasePotentialMap,
        pub pipeline: CommandPipeline<Followup>,
        pub rng: StdRng,
        pub capture_targets: HashMap<FacilityId, SquadronId>,
        pub tick: u32,
    }

    impl Harness {
        pub fn new(units: Vec<Unit>, facilities: Vec<Facility>) -> Harness {
            let rules = GameRules::default();
            let mut board = BoardState::new();
            board
                .apply_snapshot(&TickSnapshot {
                    players: vec![
                        Player {
                            id: 1,
                            me: true,
                            ..Default::default()
                        },
                        Player {
                            id: 2,
                            ..Default::default()
                        },
                    ],
                    new_units: units,
                    facilities: FacilitiesUpdate::Replace(facilities),
                    ..Default::default()
                })
                .unwrap();

            let density = EnemyDensityMap::build(&board, rules.cell_size);
            let base_map = BasePotentialMap::flat(rules.columns(), rules.rows(), rules.cell_size);

            Harness {
                rules,
                features: Features::default(),
                board,
                clusters: ClusterSet::default(),
                density,
                squadrons: Vec::new(),
                base_map,
                pipeline: CommandPipeline::default(),
                rng: StdRng::seed_from_u64(11),
                capture_targets: HashMap::new(),
                tick: 0,
            }
        }

        pub fn context(&mut self) -> BrainContext<'_> {
            BrainContext {
                tick: self.tick,
                rules: &self.rules,
                features: &self.features,
                board: &self.board,
                clusters: &self.clusters,
                density: &self.density,
                squadrons: &self.squadrons,
                base_map: &self.base_map,
                strike_almost_ready: false,
                pipeline: &mut self.pipeline,
                rng: &mut self.rng,
                capture_targets: &mut self.capture_targets,
            }
        }

        pub fn drain(&mut self) -> Vec<Order> {
            let mut orders = Vec::new();
            loop {
                let mut slot = Order::default();
                if self.pipeline.run(&mut slot, self.tick).is_none() {
                    break;
                }
                orders.push(slot);
            }
            orders
        }
    }

    pub fn unit(id: UnitId, player_id: PlayerId, x: f64, y: f64, unit_type: UnitType) -> Unit {
        Unit {
            id,
            position: Point::new(x, y),
            radius: 2.0,
            player_id,
            unit_type,
            durability: 100,
            max_durability: 100,
            max_speed: 1.0,
            vision_range: 120.0,
            ground_attack_range: 20.0,
            aerial_attack_range: 20.0,
            ground_damage: 50,
            aerial_damage: 50,
            attack_cooldown_ticks: 60,
            remaining_attack_cooldown_ticks: 0,
            groups: Vec::new(),
            selected: false,
        }
    }

    pub fn summary(group: GroupId, unit_type: UnitType, location: Point) -> SquadronSummary {
        SquadronSummary {
            id: Uuid::new_v4(),
            group,
            unit_type: Some(unit_type),
            location: Some(location),
            destination: None,
            alive_count: 10,
            aerial: unit_type.is_aerial(),
            healing: false,
            lost_formation: false,
            low_health: false,
            good_health: true,
            speed: 1.0,
            min_speed: 0.6,
            brain: "test".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn cooldown_counts_down_before_acting() {
        let mut harness = Harness::new(Vec::new(), Vec::new());
        let me = summary(3, UnitType::Tank, Point::new(500.0, 500.0));
        let mut brain = Brain::new(BrainKind::Aggressive);
        brain.wait_for(2);

        assert!(!brain.activate(&me, &mut harness.context()).acted);
        assert!(!brain.activate(&me, &mut harness.context()).acted);
        assert_eq!(brain.cooldown(), 0);
        assert!(brain.activate(&me, &mut harness.context()).acted);
        assert_eq!(brain.cooldown(), harness.features.brains.aggressive_cooldown);
    }

    #[test]
    fn scheduled_steps_drain_one_per_activation() {
        let mut harness = Harness::new(Vec::new(), Vec::new());
        let me = summary(3, UnitType::Tank, Point::new(500.0, 500.0));
        let mut brain = Brain::new(BrainKind::Aggressive);
        brain.schedule(ScheduledAction::RotateLeft, 0);
        brain.schedule(ScheduledAction::Shrink, 7);

        assert!(brain.activate(&me, &mut harness.context()).acted);
        let orders = harness.drain();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].group, Some(3));
        assert_eq!(orders[1].action, ActionKind::Rotate);
        assert!((orders[1].angle.unwrap() + 60f64.to_radians()).abs() < 1e-9);

        assert!(brain.activate(&me, &mut harness.context()).acted);
        let orders = harness.drain();
        assert_eq!(orders[1].action, ActionKind::Scale);
        assert_eq!(orders[1].factor, Some(SHRINK_FACTOR));
        assert_eq!(brain.cooldown(), 7);
        assert_eq!(brain.scheduled().count(), 0);
    }

    #[test]
    fn disabled_brain_never_acts() {
        let mut harness = Harness::new(Vec::new(), Vec::new());
        let me = summary(3, UnitType::Tank, Point::new(500.0, 500.0));
        let mut brain = Brain::new(BrainKind::Disabled);
        brain.schedule(ScheduledAction::Shrink, 0);

        for _ in 0..5 {
            assert!(!brain.activate(&me, &mut harness.context()).acted);
        }
        assert_eq!(brain.scheduled().count(), 1);
        assert!(harness.pipeline.is_empty());
    }

    #[test]
    fn missing_location_skips_activation() {
        let mut harness = Harness::new(Vec::new(), Vec::new());
        let mut me = summary(3, UnitType::Tank, Point::new(500.0, 500.0));
        me.location = Some(Point::new(f64::NAN, 1.0));
        let mut brain = Brain::new(BrainKind::Aggressive);

        assert!(!brain.activate(&me, &mut harness.context()).acted);
        me.location = None;
        assert!(!brain.activate(&me, &mut harness.context()).acted);
    }
}
