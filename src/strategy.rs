use crate::board::BoardState;
use crate::features::*;
use crate::geometry::*;
use crate::maneuver::*;
use crate::military::brain::*;
use crate::military::cluster::ClusterSet;
use crate::military::dbscan::Dbscan;
use crate::military::potential::BasePotentialMap;
use crate::military::squadron::*;
use crate::military::threatmap::EnemyDensityMap;
use crate::model::*;
use crate::pipeline::*;
use crate::production::ProductionQueue;
use log::*;
use rand::prelude::*;
use std::collections::{HashMap, HashSet};
use timing::Stopwatch;

/// Order in which the opening squadrons are formed.
const INITIAL_FORMATION_ORDER: [UnitType; 5] = [
    UnitType::Fighter,
    UnitType::Ifv,
    UnitType::Helicopter,
    UnitType::Tank,
    UnitType::Arrv,
];

fn every(tick: u32, interval: u32) -> bool {
    interval > 0 && tick % interval == 0
}

// ─── Time budget ────────────────────────────────────────────────────────────

/// Cumulative planning time for the match. Once exhausted the controller goes quiet.
pub struct TimeBudget {
    limit_ms: f64,
    slow_tick_ms: f64,
    spent_ms: f64,
}

impl TimeBudget {
    pub fn new(features: &BudgetFeatures) -> TimeBudget {
        TimeBudget {
            limit_ms: features.total_ms,
            slow_tick_ms: features.slow_tick_ms,
            spent_ms: 0.0,
        }
    }

    pub fn spent_ms(&self) -> f64 {
        self.spent_ms
    }

    pub fn remaining_ms(&self) -> f64 {
        (self.limit_ms - self.spent_ms).max(0.0)
    }

    pub fn exhausted(&self) -> bool {
        self.spent_ms >= self.limit_ms
    }

    pub fn charge(&mut self, tick: u32, elapsed_ms: f64) {
        let was_exhausted = self.exhausted();
        self.spent_ms += elapsed_ms;

        if elapsed_ms >= self.slow_tick_ms {
            warn!("[Budget] Slow tick {}: {:.3}ms", tick, elapsed_ms);
        }

        if !was_exhausted && self.exhausted() {
            error!(
                "[Budget] Planning budget of {:.0}ms spent at tick {}, standing down for the rest of the match",
                self.limit_ms, tick
            );
        }
    }
}

// ─── Controller ─────────────────────────────────────────────────────────────

/// Per-tick driver: folds a snapshot into the board, runs every subsystem in a fixed
/// order and hands back at most one order.
pub struct TacticalController {
    rules: GameRules,
    features: Features,
    tick: u32,
    board: BoardState,
    pipeline: CommandPipeline<Followup>,
    scheduler: DeferredScheduler<Deferred>,
    squadrons: Vec<Squadron>,
    maneuvers: Vec<FormationManeuver>,
    clusters: ClusterSet,
    density: EnemyDensityMap,
    base_map: BasePotentialMap,
    production: ProductionQueue,
    evasion: NukeEvasion,
    last_strike: Option<StrikePlan>,
    capture_targets: HashMap<FacilityId, SquadronId>,
    rng: StdRng,
    seeded: bool,
    hunting: bool,
    /// Ticks left during which planning is paused.
    count_down: u32,
    next_recluster_at: u32,
    budget: TimeBudget,
}

impl TacticalController {
    pub fn new(rules: GameRules, features: Features) -> TacticalController {
        let base_map = BasePotentialMap::with_edge_repulsion(
            rules.columns(),
            rules.rows(),
            rules.cell_size,
            features.field.edge_value,
            features.field.edge_decay_cells,
        );

        let pipeline = CommandPipeline::new(DEFAULT_SOFT_LIMIT).with_window(features.pipeline.warmup_ticks, rules.action_detection_interval);

        TacticalController {
            tick: 0,
            board: BoardState::new(),
            pipeline,
            scheduler: DeferredScheduler::new(),
            squadrons: Vec::new(),
            maneuvers: Vec::new(),
            clusters: ClusterSet::default(),
            density: EnemyDensityMap::default(),
            base_map,
            production: ProductionQueue::new(),
            evasion: NukeEvasion::default(),
            last_strike: None,
            capture_targets: HashMap::new(),
            rng: StdRng::seed_from_u64(0),
            seeded: false,
            hunting: false,
            count_down: 0,
            next_recluster_at: features.clustering.initial_cooldown,
            budget: TimeBudget::new(&features.budget),
            rules,
            features,
        }
    }

    /// Fix the random seed instead of taking it from the first snapshot.
    pub fn with_seed(mut self, seed: u64) -> TacticalController {
        self.rng = StdRng::seed_from_u64(seed);
        self.seeded = true;
        self
    }

    pub fn tick_index(&self) -> u32 {
        self.tick
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn squadrons(&self) -> &[Squadron] {
        &self.squadrons
    }

    pub fn maneuvers(&self) -> &[FormationManeuver] {
        &self.maneuvers
    }

    pub fn clusters(&self) -> &ClusterSet {
        &self.clusters
    }

    pub fn pipeline(&self) -> &CommandPipeline<Followup> {
        &self.pipeline
    }

    pub fn evasion(&self) -> NukeEvasion {
        self.evasion
    }

    pub fn last_strike(&self) -> Option<&StrikePlan> {
        self.last_strike.as_ref()
    }

    pub fn is_hunting(&self) -> bool {
        self.hunting
    }

    pub fn paused_for(&self) -> u32 {
        self.count_down
    }

    pub fn time_budget(&self) -> &TimeBudget {
        &self.budget
    }

    pub fn time_budget_mut(&mut self) -> &mut TimeBudget {
        &mut self.budget
    }

    /// Replace the brain of one squadron. Returns false for unknown squadrons.
    pub fn set_brain(&mut self, id: SquadronId, kind: BrainKind) -> bool {
        match self.squadrons.iter_mut().find(|s| s.id() == id) {
            Some(squadron) => {
                squadron.switch_brain(kind);
                true
            }
            None => false,
        }
    }

    /// Process one game tick. Returns the order to send, if any.
    pub fn tick(&mut self, snapshot: &TickSnapshot) -> Option<Order> {
        if self.budget.exhausted() {
            return None;
        }

        let stopwatch = Stopwatch::start();
        let order = self.run_tick(snapshot);
        self.budget.charge(snapshot.tick, stopwatch.elapsed_ms());

        order
    }

    fn run_tick(&mut self, snapshot: &TickSnapshot) -> Option<Order> {
        #[cfg(feature = "profile")]
        let _span = timing::start_guard("TacticalController::tick");

        if let Err(err) = self.board.apply_snapshot(snapshot) {
            error!("[Controller] Rejected tick {}: {}", snapshot.tick, err);
            return None;
        }

        self.tick = snapshot.tick;

        if self.tick == 0 && !self.seeded {
            self.rng = StdRng::seed_from_u64(snapshot.random_seed);
            self.seeded = true;
        }

        self.maintenance();
        self.handle_tick(snapshot);
        self.update_soft_limit();

        self.emit(snapshot.me())
    }

    // ─── Maintenance ────────────────────────────────────────────────────────

    fn maintenance(&mut self) {
        let tick = self.tick;

        for deferred in self.scheduler.poll(tick, &mut self.board) {
            self.handle_deferred(deferred);
        }

        let maintenance = &self.features.maintenance;

        if every(tick, maintenance.prune_interval) {
            let board = &self.board;

            for squadron in self.squadrons.iter_mut() {
                squadron.remove_dead_units(board);
            }

            let before = self.squadrons.len();
            self.squadrons.retain(|s| s.is_alive(board));
            if self.squadrons.len() != before {
                info!("[Controller] {} squadrons lost", before - self.squadrons.len());
            }

            let alive: HashSet<SquadronId> = self.squadrons.iter().map(|s| s.id()).collect();
            self.capture_targets.retain(|_, squadron| alive.contains(squadron));

            self.density = EnemyDensityMap::build(board, self.rules.cell_size);

            if tick > maintenance.prune_interval {
                self.clusters.reset_centers(board);
            }

            let max_age = maintenance.trigger_max_age;
            let (stale, pending): (Vec<FormationManeuver>, Vec<FormationManeuver>) =
                std::mem::take(&mut self.maneuvers).into_iter().partition(|m| m.is_stale(tick, max_age));
            self.maneuvers = pending;

            for maneuver in stale {
                maneuver.abandon(&mut self.scheduler, &mut self.board);
            }

            for expired in self.scheduler.expire(tick, max_age, &mut self.board) {
                match expired {
                    Deferred::FormationSettled(group) => {
                        warn!("[Controller] Dropped orphaned settle trigger for group {}", group);
                        self.maneuvers.retain(|m| m.group() != group);
                    }
                }
            }
        }

        if every(tick, self.features.maintenance.heal_reset_interval) {
            let good_health = self.features.squadrons.good_health;

            for squadron in self.squadrons.iter_mut() {
                if squadron.healing() && squadron.relative_health(&self.board) >= good_health {
                    squadron.set_healing(false);
                }
            }
        }

        if every(tick, self.features.clustering.mark_interval) {
            self.clusters.mark_positions();
        }
    }

    fn handle_deferred(&mut self, deferred: Deferred) {
        match deferred {
            Deferred::FormationSettled(group) => match self.maneuvers.iter().position(|m| m.group() == group) {
                Some(index) => {
                    let squadron = self.maneuvers.remove(index).into_squadron();
                    self.squadrons.push(squadron);
                }
                None => warn!("[Controller] Settled group {} has no pending formation", group),
            },
        }
    }

    fn handle_followup(&mut self, followup: Followup) {
        match followup {
            Followup::FormationScaled(group) => match self.maneuvers.iter_mut().find(|m| m.group() == group) {
                Some(maneuver) => maneuver.on_scaled(self.tick, self.features.squadrons.settle_delay, &mut self.scheduler, &mut self.board),
                None => warn!("[Controller] Scaled group {} has no pending formation", group),
            },
        }
    }

    // ─── Tick logic ─────────────────────────────────────────────────────────

    fn handle_tick(&mut self, snapshot: &TickSnapshot) {
        let tick = self.tick;

        if tick == 0 {
            self.form_initial_squadrons();
        }

        if tick >= self.next_recluster_at {
            self.recalculate_clusters();
        }

        if every(tick, self.features.squadrons.factory_check_interval) {
            self.form_factory_squadrons();
        }

        if self.features.production.enabled && every(tick, self.features.production.check_interval) {
            self.run_production();
        }

        if self.count_down > 0 {
            self.count_down -= 1;
            return;
        }

        if let Some(pause) = self
            .evasion
            .update(snapshot.opponent(), &self.rules, &self.features.strike, &mut self.pipeline)
        {
            self.count_down = pause;
            return;
        }

        let strike_cooldown = snapshot.me().map(|p| p.remaining_nuclear_strike_cooldown_ticks);

        if strike_cooldown == Some(self.features.strike.recluster_at_cooldown) {
            self.recalculate_clusters();
        }

        if let Some(me) = snapshot.me() {
            if self.try_launch_strike(me) {
                return;
            }
        }

        if tick > 0 && every(tick, self.features.squadrons.mode_switch_interval) {
            self.update_mode();
        }

        let tighten_at = self.features.strike.tighten_band_at_cooldown;
        let strike_almost_ready = matches!(strike_cooldown, Some(cooldown) if cooldown > 0 && cooldown <= tighten_at);

        self.activate_squadrons(strike_almost_ready);
    }

    /// Cluster every living enemy unit and schedule the next run.
    pub fn recalculate_clusters(&mut self) {
        let clustering = &self.features.clustering;

        let enemies: Vec<UnitId> = self.board.enemy_units().filter(|u| u.is_alive()).map(|u| u.id).collect();
        let min_points = ((enemies.len() as f64 / clustering.min_points_divisor.max(1) as f64).ceil() as usize).max(1);

        let mut clusters = ClusterSet::build(&self.board, &enemies, &Dbscan::new(clustering.epsilon, min_points));
        clusters.inherit_history(&self.clusters);
        clusters.log_summary();
        self.clusters = clusters;

        let cooldown = (enemies.len() as u32)
            .saturating_sub(clustering.cooldown_offset)
            .max(clustering.min_cooldown);
        self.next_recluster_at = self.tick + cooldown;
    }

    fn allocate_group(&mut self) -> Option<GroupId> {
        let used: HashSet<GroupId> = self
            .squadrons
            .iter()
            .map(|s| s.group())
            .chain(self.maneuvers.iter().map(|m| m.group()))
            .chain(std::iter::once(self.features.strike.evasion_group))
            .collect();

        let free: Vec<GroupId> = (1..=self.features.squadrons.max_group).filter(|g| !used.contains(g)).collect();
        let group = free.choose(&mut self.rng).copied();

        if group.is_none() {
            warn!("[Controller] No free control group left");
        }

        group
    }

    fn ground_brain(&self) -> BrainKind {
        if self.hunting {
            BrainKind::hunter()
        } else {
            BrainKind::potential()
        }
    }

    fn form_initial_squadrons(&mut self) {
        let frame = Rect::new(0.0, 0.0, self.rules.world_width, self.rules.world_height);

        for unit_type in INITIAL_FORMATION_ORDER {
            let units: Vec<(UnitId, Point)> = self
                .board
                .my_units()
                .filter(|u| u.is_alive() && u.unit_type == unit_type)
                .map(|u| (u.id, u.position))
                .collect();

            let center = match Point::mean(units.iter().map(|(_, p)| *p)) {
                Some(center) => center,
                None => continue,
            };

            let group = match self.allocate_group() {
                Some(group) => group,
                None => return,
            };

            let brain = if unit_type.is_aerial() {
                BrainKind::hunter()
            } else {
                self.ground_brain()
            };

            let maneuver = FormationManeuver::start(
                self.tick,
                group,
                units.into_iter().map(|(id, _)| id).collect(),
                frame,
                Some(unit_type),
                center,
                self.features.squadrons.initial_scale,
                brain,
                &mut self.pipeline,
            );
            self.maneuvers.push(maneuver);
        }
    }

    /// Turn large crowds of fresh, ungrouped units sitting on our factories into squadrons.
    fn form_factory_squadrons(&mut self) {
        let (width, height) = (self.rules.facility_width, self.rules.facility_height);
        let pending: HashSet<UnitId> = self.maneuvers.iter().flat_map(|m| m.units().iter().copied()).collect();
        let min_size = self.features.squadrons.factory_squadron_size;

        let crowds: Vec<(Rect, Point, Vec<UnitId>)> = self
            .board
            .my_facilities()
            .filter(|f| f.is_factory())
            .filter_map(|facility| {
                let units: Vec<UnitId> = self
                    .board
                    .my_units()
                    .filter(|u| u.is_alive() && u.is_ungrouped() && !pending.contains(&u.id))
                    .filter(|u| facility.contains(u.position, width, height))
                    .map(|u| u.id)
                    .collect();

                if units.len() >= min_size {
                    Some((facility.bounds(width, height), facility.center(width, height), units))
                } else {
                    None
                }
            })
            .collect();

        for (frame, center, units) in crowds {
            let group = match self.allocate_group() {
                Some(group) => group,
                None => return,
            };

            let maneuver = FormationManeuver::start(
                self.tick,
                group,
                units,
                frame,
                None,
                center,
                self.features.squadrons.initial_scale,
                BrainKind::hunter(),
                &mut self.pipeline,
            );
            self.maneuvers.push(maneuver);
        }
    }

    fn run_production(&mut self) {
        let tick = self.tick;
        let factories: Vec<FacilityId> = self.board.my_facilities().filter(|f| f.is_factory()).map(|f| f.id).collect();

        self.production.retain_facilities(|id| factories.contains(&id));

        for facility in factories {
            self.production
                .plan(facility, tick, &self.features.production, self.rules.vehicle_production_cost);

            if let Some(request) = self.production.next_ready(facility, tick) {
                debug!("[Production] Facility {} switches to {}", facility, request.unit_type.name());
                self.pipeline.setup_vehicle_production(facility, request.unit_type);
            }
        }
    }

    fn try_launch_strike(&mut self, me: &Player) -> bool {
        let strike = &self.features.strike;

        if !strike.enabled || self.tick < strike.earliest_tick || !every(self.tick, strike.check_interval) || !me.strike_ready() {
            return false;
        }

        if self.clusters.is_empty() || self.clusters.noise_share() > self.features.clustering.minefield_noise_share {
            return false;
        }

        let plan = match plan_strike(&self.board, &self.clusters, &self.squadrons, &self.rules, strike) {
            Some(plan) => plan,
            None => return false,
        };

        info!(
            "[Strike] Launching at {:?} guided by {} (enemy {:.0} vs ally {:.0})",
            plan.target, plan.highlighter, plan.enemy_damage, plan.ally_damage
        );

        self.pipeline.priority(|buffer| {
            buffer.stop_movement();
            buffer.tactical_nuke(plan.target, plan.highlighter);
        });

        self.count_down = self.rules.tactical_nuclear_strike_delay;
        self.last_strike = Some(plan);

        true
    }

    /// Ground squadrons hunt once we hold most facilities and wander the field otherwise.
    fn update_mode(&mut self) {
        let total = self.board.facilities().len();
        let mine = self.board.my_facilities().count();
        let share = if total == 0 { 0.0 } else { mine as f64 / total as f64 };

        let hunting = share >= self.features.squadrons.hunter_facility_share;
        if hunting == self.hunting {
            return;
        }

        info!("[Controller] Holding {}/{} facilities, hunting: {}", mine, total, hunting);
        self.hunting = hunting;

        let kind = self.ground_brain();
        let board = &self.board;

        for squadron in self.squadrons.iter_mut().filter(|s| !s.is_aerial(board)) {
            squadron.switch_brain(kind.clone());
        }
    }

    /// Give squadrons a turn in order until one of them acts.
    fn activate_squadrons(&mut self, strike_almost_ready: bool) {
        let tick = self.tick;
        let squadron_features = &self.features.squadrons;

        let summaries: Vec<SquadronSummary> = self
            .squadrons
            .iter()
            .map(|s| s.summary(&self.board, squadron_features))
            .collect();

        for (squadron, summary) in self.squadrons.iter_mut().zip(summaries.iter()) {
            if !summary.is_alive() {
                continue;
            }

            if every(tick, squadron_features.compaction_check_interval)
                && summary.lost_formation
                && !squadron.attempted_compaction(tick, squadron_features.compaction_retry)
            {
                squadron.compact(tick, squadron_features.compaction_step_cooldown);
            }

            let mut context = BrainContext {
                tick,
                rules: &self.rules,
                features: &self.features,
                board: &self.board,
                clusters: &self.clusters,
                density: &self.density,
                squadrons: &summaries,
                base_map: &self.base_map,
                strike_almost_ready,
                pipeline: &mut self.pipeline,
                rng: &mut self.rng,
                capture_targets: &mut self.capture_targets,
            };

            if squadron.activate(summary, &mut context) {
                break;
            }
        }
    }

    // ─── Output ─────────────────────────────────────────────────────────────

    fn update_soft_limit(&mut self) {
        let budget = self.rules.action_budget(self.board.my_control_center_count());
        let limit = budget.saturating_sub(self.features.pipeline.reserved_actions) as usize;

        if limit != self.pipeline.soft_limit() {
            debug!("[Controller] Soft limit now {}", limit);
            self.pipeline.set_soft_limit(limit);
        }
    }

    fn can_run_commands(&self, me: Option<&Player>) -> bool {
        let cooling_down = me.map(|p| p.remaining_action_cooldown_ticks > 0).unwrap_or(false);

        self.pipeline.has_commands() && !cooling_down && (!self.pipeline.soft_limit_reached(self.tick) || self.evasion.is_evading())
    }

    fn emit(&mut self, me: Option<&Player>) -> Option<Order> {
        if !self.can_run_commands(me) {
            return None;
        }

        let mut order = Order::default();
        let executed = self.pipeline.run(&mut order, self.tick)?;

        trace!("[Controller] Tick {} sends {:?}", self.tick, executed.action);

        if let Some(followup) = executed.on_complete {
            self.handle_followup(followup);
        }

        Some(order)
    }
}
