use super::*;
use crate::military::potential::choose_destination;
use crate::military::unittype::*;

/// Counters carried by the field-following brains between activations.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldState {
    /// Activations whose chosen destination was the current cell.
    pub stuck_activations: u32,
    /// Set once a retreat found no healer to fall back to; retreats stop for good.
    pub healer_lost: bool,
}

const ATTACK_VALUE: f64 = 1000.0;
const ATTACK_EXPONENT: f64 = 50.0;
const AVOID_BAND: f64 = 150.0;
const AVOID_RADIUS: f64 = 350.0;
const AVOID_VARIATION: f64 = 10.0;
const FRIENDLY_REPULSION: f64 = -3500.0;
const FRIENDLY_EXPONENT: f64 = 50.0;
const FRIENDLY_RADIUS: f64 = 100.0;
const HEALER_ATTRACTION: f64 = 15_000.0;
/// Healer squadrons this small are not worth retreating to.
const HEALER_MIN_SIZE: usize = 10;
const FACILITY_ATTRACTION: f64 = 3000.0;
const FACILITY_EXPONENT: f64 = 50.0;
const FACILITY_RADIUS: f64 = 1500.0;
const OWN_FACTORY_REPULSION: f64 = -3000.0;
const OWN_FACTORY_RADIUS: f64 = 40.0;

pub(super) fn decide(state: &mut FieldState, summary: &SquadronSummary, location: Point, context: &mut BrainContext) -> Decision {
    let features = &context.features.brains;
    let cooldown = features.potential_cooldown;

    if state.stuck_activations > features.stuck_limit {
        warn!(
            "[Potential] Group {} stuck for {} activations, disabling",
            summary.group, state.stuck_activations
        );

        return Decision {
            switch_to: Some(BrainKind::Disabled),
            ..Default::default()
        };
    }

    let mut emitters = Vec::new();
    let (retreating, healing) = retreat_emitters(state, summary, context, &mut emitters);

    if !retreating {
        if let Some(my_type) = summary.unit_type {
            cluster_emitters(my_type, context, &mut emitters);
        }
        facility_emitters(summary, context, &mut emitters);
    }
    friendly_emitters(summary, context, FRIENDLY_REPULSION, FRIENDLY_EXPONENT, 0.0, FRIENDLY_RADIUS, &mut emitters);

    let destination = follow_field(state, summary, location, None, &emitters, context);

    Decision {
        cooldown,
        destination,
        healing,
        switch_to: None,
        emitters: Some(emitters),
    }
}

fn cluster_emitters(my_type: UnitType, context: &BrainContext, emitters: &mut Vec<Emitter>) {
    for cluster in context.clusters.iter() {
        let (center, lead) = match (cluster.center(), cluster.lead_type(context.board)) {
            (Some(center), Some(lead)) => (center, lead),
            _ => continue,
        };

        match enemy_category(my_type, lead) {
            EnemyCategory::Attack => {
                emitters.push(Emitter::exponential(center, ATTACK_VALUE, ATTACK_EXPONENT, context.rules.world_width));
            }
            EnemyCategory::Avoid => {
                emitters.push(Emitter::safe_distance(
                    center,
                    cluster.size() as f64,
                    AVOID_RADIUS,
                    AVOID_BAND,
                    AVOID_VARIATION,
                ));
            }
            EnemyCategory::Ignore => {}
        }
    }
}

/// Pull a wounded or healing squadron toward the nearest healer squadron.
/// Returns whether the squadron is retreating and the healing flag to store.
pub(super) fn retreat_emitters(
    state: &mut FieldState,
    summary: &SquadronSummary,
    context: &BrainContext,
    emitters: &mut Vec<Emitter>,
) -> (bool, Option<bool>) {
    let healers = || {
        context
            .other_squadrons(summary)
            .filter(|s| s.is_healer() && s.alive_count > HEALER_MIN_SIZE)
    };

    let wants_retreat = !state.healer_lost && (summary.healing || (summary.aerial && summary.low_health && healers().next().is_some()));
    if !wants_retreat {
        return (false, None);
    }

    let location = summary.location;
    let nearest = healers()
        .filter_map(|s| s.location)
        .min_by(|a, b| {
            let da = location.map(|l| l.squared_distance_to(*a)).unwrap_or(0.0);
            let db = location.map(|l| l.squared_distance_to(*b)).unwrap_or(0.0);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });

    match nearest {
        Some(healer) => {
            emitters.push(Emitter::linear(healer, HEALER_ATTRACTION, context.rules.world_width));
            (true, Some(true))
        }
        None => {
            info!("[Brain] Group {} lost its healers, no more retreats", summary.group);
            state.healer_lost = true;
            (false, Some(false))
        }
    }
}

/// Ground squadrons head for facilities they do not own and stay off their own factories.
pub(super) fn facility_emitters(summary: &SquadronSummary, context: &BrainContext, emitters: &mut Vec<Emitter>) {
    if !summary.is_ground() {
        return;
    }

    let (width, height) = (context.rules.facility_width, context.rules.facility_height);

    for facility in context.board.foreign_facilities() {
        emitters.push(Emitter::exponential(
            facility.center(width, height),
            FACILITY_ATTRACTION,
            FACILITY_EXPONENT,
            FACILITY_RADIUS,
        ));
    }

    for facility in context.board.my_facilities().filter(|f| f.is_factory()) {
        emitters.push(Emitter::exponential(
            facility.center(width, height),
            OWN_FACTORY_REPULSION,
            FACILITY_EXPONENT,
            OWN_FACTORY_RADIUS,
        ));
    }
}

/// Repulsion from the position and destination of every same-domain squadron.
pub(super) fn friendly_emitters(
    summary: &SquadronSummary,
    context: &BrainContext,
    value: f64,
    exponent: f64,
    bias: f64,
    radius: f64,
    emitters: &mut Vec<Emitter>,
) {
    for other in context.other_squadrons(summary).filter(|o| summary.keeps_distance_from(o)) {
        for point in other.location.iter().chain(other.destination.iter()) {
            emitters.push(Emitter::exponential_with_bias(*point, value, exponent, bias, radius));
        }
    }
}

/// Pick the best nearby cell and move there. Consecutive choices that would not
/// move the squadron count toward the stuck limit.
pub(super) fn follow_field(
    state: &mut FieldState,
    summary: &SquadronSummary,
    location: Point,
    base: Option<&BasePotentialMap>,
    emitters: &[Emitter],
    context: &mut BrainContext,
) -> Option<Point> {
    let field_context = context.field_context(summary);
    let base = base.unwrap_or(context.base_map);
    let radius = context.features.field.search_radius_cells * base.cell_size();

    let choice = choose_destination(location, radius, base, emitters, &field_context, &mut *context.rng)?;

    let delta = choice.destination - location;
    let delta = Point::new(delta.x.trunc(), delta.y.trunc());

    if delta.x == 0.0 && delta.y == 0.0 {
        state.stuck_activations += 1;
        trace!("[Brain] Group {} stays put ({} stuck)", summary.group, state.stuck_activations);
        return Some(choice.destination);
    }

    state.stuck_activations = 0;

    trace!(
        "[Brain] Group {} -> {:?} (value {}, {} of {} tied)",
        summary.group,
        choice.destination,
        choice.value,
        choice.tied,
        choice.candidates
    );

    move_group(context.pipeline, summary.group, delta, Some(summary.min_speed));

    Some(choice.destination)
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    #[test]
    fn moves_toward_soft_cluster() {
        let enemies: Vec<Unit> = (0..10).map(|i| unit(100 + i, 2, 800.0 + i as f64, 500.0, UnitType::Arrv)).collect();
        let mut harness = Harness::new(enemies, Vec::new());
        harness.clusters = ClusterSet::build(&harness.board, &(100..110).collect::<Vec<_>>(), &crate::military::dbscan::Dbscan::new(20.0, 3));
        let me = summary(3, UnitType::Tank, Point::new(496.0, 496.0));

        let mut brain = Brain::new(BrainKind::potential());
        let outcome = brain.activate(&me, &mut harness.context());

        assert!(outcome.acted);
        let destination = outcome.destination.unwrap();
        assert!(destination.x > 496.0);
        assert_eq!(outcome.emitters.unwrap().len(), 1);

        let orders = harness.drain();
        assert_eq!(orders[1].action, ActionKind::Move);
        assert_eq!(orders[1].max_speed, Some(0.6));
        assert_eq!(brain.cooldown(), harness.features.brains.potential_cooldown);
    }

    #[test]
    fn stuck_brain_disables_itself() {
        let mut harness = Harness::new(Vec::new(), Vec::new());
        let me = summary(3, UnitType::Tank, Point::new(496.0, 496.0));
        let mut brain = Brain::new(BrainKind::Potential(FieldState {
            stuck_activations: harness.features.brains.stuck_limit + 1,
            healer_lost: false,
        }));

        let outcome = brain.activate(&me, &mut harness.context());
        assert!(outcome.acted);
        assert_eq!(outcome.switch_to, Some(BrainKind::Disabled));
        assert!(harness.pipeline.is_empty());
    }

    fn pinned_at(point: Point) -> Vec<Emitter> {
        vec![Emitter::exponential(point, 1000.0, 50.0, 1024.0)]
    }

    #[test]
    fn movement_resets_stuck_counter() {
        let mut harness = Harness::new(Vec::new(), Vec::new());
        let limit = harness.features.brains.stuck_limit;
        let here = Point::new(496.0, 496.0);
        let me = summary(3, UnitType::Tank, here);
        let stay = pinned_at(here);
        let away = pinned_at(Point::new(800.0, 496.0));
        let mut state = FieldState::default();

        for _ in 0..limit {
            let destination = follow_field(&mut state, &me, here, None, &stay, &mut harness.context());
            assert_eq!(destination, Some(here));
        }
        assert_eq!(state.stuck_activations, limit);
        assert!(harness.pipeline.is_empty());

        let destination = follow_field(&mut state, &me, here, None, &away, &mut harness.context());
        assert!(destination.unwrap().x > 496.0);
        assert_eq!(state.stuck_activations, 0);

        follow_field(&mut state, &me, here, None, &stay, &mut harness.context());
        assert_eq!(state.stuck_activations, 1);

        let mut brain = Brain::new(BrainKind::Potential(state));
        let outcome = brain.activate(&me, &mut harness.context());
        assert!(outcome.acted);
        assert_ne!(outcome.switch_to, Some(BrainKind::Disabled));
    }

    #[test]
    fn consecutive_stalls_disable_brain() {
        let mut harness = Harness::new(Vec::new(), Vec::new());
        let limit = harness.features.brains.stuck_limit;
        let here = Point::new(496.0, 496.0);
        let me = summary(3, UnitType::Tank, here);
        let stay = pinned_at(here);
        let mut state = FieldState::default();

        for _ in 0..=limit {
            follow_field(&mut state, &me, here, None, &stay, &mut harness.context());
        }
        assert_eq!(state.stuck_activations, limit + 1);

        let mut brain = Brain::new(BrainKind::Potential(state));
        let outcome = brain.activate(&me, &mut harness.context());
        assert_eq!(outcome.switch_to, Some(BrainKind::Disabled));
    }

    #[test]
    fn healing_squadron_heads_for_healers() {
        let mut harness = Harness::new(Vec::new(), Vec::new());
        let mut healer = summary(7, UnitType::Arrv, Point::new(900.0, 500.0));
        healer.alive_count = 20;
        let mut me = summary(3, UnitType::Helicopter, Point::new(496.0, 496.0));
        me.low_health = true;
        harness.squadrons = vec![me.clone(), healer];

        let mut brain = Brain::new(BrainKind::potential());
        let outcome = brain.activate(&me, &mut harness.context());

        assert_eq!(outcome.healing, Some(true));
        assert!(outcome.destination.unwrap().x > 496.0);
    }

    #[test]
    fn healing_without_healers_gives_up() {
        let mut harness = Harness::new(Vec::new(), Vec::new());
        let mut me = summary(3, UnitType::Helicopter, Point::new(496.0, 496.0));
        me.healing = true;

        let mut brain = Brain::new(BrainKind::potential());
        let outcome = brain.activate(&me, &mut harness.context());

        assert_eq!(outcome.healing, Some(false));
        match brain.kind() {
            BrainKind::Potential(state) => assert!(state.healer_lost),
            other => panic!("unexpected brain {:?}", other),
        }
    }
}
