use super::*;

pub(super) fn decide(summary: &SquadronSummary, location: Point, context: &mut BrainContext) -> Decision {
    let cooldown = context.features.brains.capture_cooldown;
    let (width, height) = (context.rules.facility_width, context.rules.facility_height);

    let target = match claimed_target(summary, context) {
        Some(target) => Some(target),
        None => claim_nearest(summary, location, context),
    };

    let destination = match target.and_then(|id| context.board.facility(id)) {
        Some(facility) => facility.center(width, height),
        None => {
            let map_center = Point::new(context.rules.world_width / 2.0, context.rules.world_height / 2.0);
            location.towards(map_center, context.features.brains.capture_drift)
        }
    };

    let delta = destination - location;
    if delta.length() > 0.0 {
        move_group(context.pipeline, summary.group, delta, Some(summary.min_speed));
    }

    Decision {
        cooldown,
        destination: Some(destination),
        ..Default::default()
    }
}

/// Facility this squadron already claimed, if it is still worth taking.
fn claimed_target(summary: &SquadronSummary, context: &mut BrainContext) -> Option<FacilityId> {
    let me = context.board.me();

    let (id, _) = context
        .capture_targets
        .iter()
        .find(|(_, squadron)| **squadron == summary.id)
        .map(|(id, squadron)| (*id, *squadron))?;

    let still_foreign = context
        .board
        .facility(id)
        .map(|f| me.map(|me| !f.is_owned_by(me)).unwrap_or(true))
        .unwrap_or(false);

    if still_foreign {
        Some(id)
    } else {
        debug!("[Capture] Group {} finished with facility {}", summary.group, id);
        context.capture_targets.remove(&id);
        None
    }
}

fn claim_nearest(summary: &SquadronSummary, location: Point, context: &mut BrainContext) -> Option<FacilityId> {
    let (width, height) = (context.rules.facility_width, context.rules.facility_height);
    let claimed = &context.capture_targets;

    let nearest = context
        .board
        .foreign_facilities()
        .filter(|f| !claimed.contains_key(&f.id))
        .min_by(|a, b| {
            let da = a.center(width, height).squared_distance_to(location);
            let db = b.center(width, height).squared_distance_to(location);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|f| f.id)?;

    info!("[Capture] Group {} claims facility {}", summary.group, nearest);
    context.capture_targets.insert(nearest, summary.id);

    Some(nearest)
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    fn facility(id: FacilityId, left: f64, top: f64, owner: Option<PlayerId>) -> Facility {
        Facility {
            id,
            facility_type: FacilityType::ControlCenter,
            owner_player_id: owner,
            left,
            top,
            capture_points: 0.0,
            vehicle_type: None,
            production_progress: 0,
        }
    }

    #[test]
    fn claims_nearest_unclaimed_facility() {
        let mut harness = Harness::new(
            Vec::new(),
            vec![facility(1, 100.0, 100.0, None), facility(2, 600.0, 100.0, Some(2)), facility(3, 0.0, 0.0, Some(1))],
        );
        let first = summary(3, UnitType::Ifv, Point::new(150.0, 150.0));
        let second = summary(4, UnitType::Ifv, Point::new(150.0, 150.0));

        let mut brain = Brain::new(BrainKind::CaptureFacility);
        let outcome = brain.activate(&first, &mut harness.context());
        assert_eq!(outcome.destination, Some(Point::new(132.0, 132.0)));
        assert_eq!(harness.capture_targets.get(&1), Some(&first.id));

        let mut other = Brain::new(BrainKind::CaptureFacility);
        let outcome = other.activate(&second, &mut harness.context());
        assert_eq!(outcome.destination, Some(Point::new(632.0, 132.0)));
        assert_eq!(harness.capture_targets.len(), 2);
    }

    #[test]
    fn drifts_to_centre_without_targets() {
        let mut harness = Harness::new(Vec::new(), Vec::new());
        let me = summary(3, UnitType::Ifv, Point::new(112.0, 512.0));

        let mut brain = Brain::new(BrainKind::CaptureFacility);
        let outcome = brain.activate(&me, &mut harness.context());

        assert_eq!(outcome.destination, Some(Point::new(212.0, 512.0)));
        let orders = harness.drain();
        assert_eq!(orders[1].x, Some(100.0));
        assert_eq!(brain.cooldown(), harness.features.brains.capture_cooldown);
    }
}
