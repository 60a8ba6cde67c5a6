use super::potential::*;
use super::*;
use crate::military::unittype::*;

const ATTACK_VALUE: f64 = 1000.0;
const ATTACK_EXPONENT: f64 = 50.0;
const AVOID_VALUE: f64 = -3000.0;
const AVOID_EXPONENT: f64 = 15.0;
const SANDWICH_RADIUS: f64 = 900.0;
const SANDWICH_BAND: f64 = 130.0;
const SANDWICH_VARIATION: f64 = 10.0;
const FRIENDLY_REPULSION: f64 = -500.0;
const FRIENDLY_EXPONENT: f64 = 25.0;
const FRIENDLY_RADIUS: f64 = 200.0;

pub(super) fn decide(state: &mut FieldState, summary: &SquadronSummary, location: Point, context: &mut BrainContext) -> Decision {
    let cooldown = context.features.brains.hunter_cooldown;

    if state.stuck_activations > context.features.brains.stuck_limit {
        warn!(
            "[Hunter] Group {} stuck for {} activations, disabling",
            summary.group, state.stuck_activations
        );

        return Decision {
            switch_to: Some(BrainKind::Disabled),
            ..Default::default()
        };
    }

    let my_type = match summary.unit_type {
        Some(my_type) => my_type,
        None => return Decision::wait(cooldown),
    };

    let mut emitters = Vec::new();
    let (retreating, healing) = retreat_emitters(state, summary, context, &mut emitters);

    if !retreating {
        cluster_emitters(my_type, context, &mut emitters);
        facility_emitters(summary, context, &mut emitters);
    }
    friendly_emitters(
        summary,
        context,
        FRIENDLY_REPULSION,
        FRIENDLY_EXPONENT,
        0.0,
        FRIENDLY_RADIUS,
        &mut emitters,
    );

    let base = density_base_map(my_type, context);
    let destination = follow_field(state, summary, location, Some(&base), &emitters, context);

    Decision {
        cooldown,
        destination,
        healing,
        switch_to: None,
        emitters: Some(emitters),
    }
}

/// Mixed clusters are held at arm's length unless they contain something we lose to.
/// Single-type clusters are chased or fled by matchup.
fn cluster_emitters(my_type: UnitType, context: &BrainContext, emitters: &mut Vec<Emitter>) {
    let world = context.rules.world_width;

    for cluster in context.clusters.iter() {
        let center = match cluster.center() {
            Some(center) => center,
            None => continue,
        };

        if cluster.is_sandwich(context.board) {
            let dangerous = cluster
                .unit_types(context.board)
                .iter()
                .filter_map(single_type)
                .any(|enemy| enemy_category(my_type, enemy) == EnemyCategory::Avoid);

            if dangerous {
                emitters.push(Emitter::exponential(center, AVOID_VALUE, AVOID_EXPONENT, world));
            } else {
                emitters.push(Emitter::safe_distance(
                    center,
                    cluster.size() as f64,
                    SANDWICH_RADIUS,
                    SANDWICH_BAND,
                    SANDWICH_VARIATION,
                ));
            }
            continue;
        }

        let lead = match cluster.lead_type(context.board) {
            Some(lead) => lead,
            None => continue,
        };

        match enemy_category(my_type, lead) {
            EnemyCategory::Attack => emitters.push(Emitter::exponential(center, ATTACK_VALUE, ATTACK_EXPONENT, world)),
            EnemyCategory::Avoid => emitters.push(Emitter::exponential(center, AVOID_VALUE, AVOID_EXPONENT, world)),
            EnemyCategory::Ignore => {}
        }
    }
}

fn single_type(flag: UnitTypes) -> Option<UnitType> {
    UnitType::ALL.iter().copied().find(|t| UnitTypes::from(*t) == flag)
}

/// Base map plus one point per exploitable enemy in a cell, minus one per dangerous enemy.
fn density_base_map(my_type: UnitType, context: &BrainContext) -> BasePotentialMap {
    let mut base = context.base_map.clone();

    for enemy in UnitType::ALL {
        let sign = match enemy_category(my_type, enemy) {
            EnemyCategory::Attack => 1.0,
            EnemyCategory::Avoid => -1.0,
            EnemyCategory::Ignore => continue,
        };

        for (cell, count) in context.density.cells_of_type(enemy) {
            base.add(*cell, sign * *count as f64);
        }
    }

    base
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::military::dbscan::Dbscan;

    #[test]
    fn density_shapes_base_map() {
        let enemies = vec![
            unit(100, 2, 40.0, 40.0, UnitType::Arrv),
            unit(101, 2, 41.0, 40.0, UnitType::Arrv),
            unit(102, 2, 200.0, 40.0, UnitType::Helicopter),
        ];
        let mut harness = Harness::new(enemies, Vec::new());
        let context = harness.context();

        let base = density_base_map(UnitType::Tank, &context);

        assert_eq!(base.value(Cell::new(1, 1)), 2.0);
        assert_eq!(base.value(Cell::new(6, 1)), -1.0);
        assert_eq!(base.value(Cell::new(3, 3)), 0.0);
    }

    #[test]
    fn mixed_cluster_with_danger_repels() {
        let mut enemies: Vec<Unit> = (0..5).map(|i| unit(100 + i, 2, 600.0 + i as f64, 500.0, UnitType::Helicopter)).collect();
        enemies.extend((0..5).map(|i| unit(200 + i, 2, 600.0 + i as f64, 502.0, UnitType::Arrv)));
        let mut harness = Harness::new(enemies, Vec::new());
        let ids: Vec<UnitId> = (100..105).chain(200..205).collect();
        harness.clusters = ClusterSet::build(&harness.board, &ids, &Dbscan::new(20.0, 3));
        assert!(harness.clusters[0].is_sandwich(&harness.board));

        let me = summary(3, UnitType::Tank, Point::new(496.0, 496.0));
        let mut brain = Brain::new(BrainKind::hunter());
        let outcome = brain.activate(&me, &mut harness.context());

        let emitters = outcome.emitters.unwrap();
        assert_eq!(emitters.len(), 1);
        assert!(emitters[0].max_value < 0.0);
        assert!(outcome.destination.unwrap().x < 496.0);
        assert_eq!(brain.cooldown(), harness.features.brains.hunter_cooldown);
    }
}
