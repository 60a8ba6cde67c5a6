use super::*;

pub(super) fn decide(summary: &SquadronSummary, location: Point, context: &mut BrainContext) -> Decision {
    let cooldown = context.features.brains.aggressive_cooldown;

    let target = match context.density.nearest_cell(location) {
        Some(cell) => cell.center(context.rules.cell_size),
        None => return Decision::wait(cooldown),
    };

    move_group(context.pipeline, summary.group, target - location, None);

    Decision {
        cooldown,
        destination: Some(target),
        ..Default::default()
    }
}
