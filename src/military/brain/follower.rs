use super::*;

pub(super) fn decide(target: SquadronId, summary: &SquadronSummary, location: Point, context: &mut BrainContext) -> Decision {
    let leader = context
        .squadrons
        .iter()
        .find(|s| s.id == target && s.is_alive())
        .and_then(|s| s.location);

    let leader = match leader {
        Some(leader) => leader,
        None => {
            info!("[Follower] Group {} lost squadron {}, standing down", summary.group, target);
            return Decision {
                switch_to: Some(BrainKind::Disabled),
                ..Default::default()
            };
        }
    };

    move_group(context.pipeline, summary.group, leader - location, None);

    Decision {
        cooldown: context.features.brains.follower_cooldown,
        destination: Some(leader),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    #[test]
    fn follows_leader_position() {
        let mut harness = Harness::new(Vec::new(), Vec::new());
        let leader = summary(5, UnitType::Tank, Point::new(300.0, 200.0));
        let me = summary(3, UnitType::Arrv, Point::new(100.0, 100.0));
        harness.squadrons = vec![leader.clone(), me.clone()];

        let mut brain = Brain::new(BrainKind::Follower { target: leader.id });
        let outcome = brain.activate(&me, &mut harness.context());

        assert_eq!(outcome.destination, Some(Point::new(300.0, 200.0)));
        let orders = harness.drain();
        assert_eq!((orders[1].x, orders[1].y), (Some(200.0), Some(100.0)));
        assert_eq!(brain.cooldown(), harness.features.brains.follower_cooldown);
    }

    #[test]
    fn missing_leader_disables() {
        let mut harness = Harness::new(Vec::new(), Vec::new());
        let me = summary(3, UnitType::Arrv, Point::new(100.0, 100.0));

        let mut brain = Brain::new(BrainKind::Follower { target: Uuid::new_v4() });
        let outcome = brain.activate(&me, &mut harness.context());

        assert_eq!(outcome.switch_to, Some(BrainKind::Disabled));
        assert!(harness.pipeline.is_empty());
    }
}
