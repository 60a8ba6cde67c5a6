use crate::board::BoardState;
use crate::features::*;
use crate::geometry::*;
use crate::military::brain::BrainKind;
use crate::military::cluster::*;
use crate::military::damage::BlastModel;
use crate::military::squadron::Squadron;
use crate::model::*;
use crate::pipeline::*;
use log::*;
use serde::{Deserialize, Serialize};

/// Completion token carried by pipeline commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Followup {
    /// The scale order of a formation maneuver went out.
    FormationScaled(GroupId),
}

/// Action released by the deferred scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Deferred {
    /// Units of a formation maneuver stopped moving.
    FormationSettled(GroupId),
}

// ─── Formation ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormationStage {
    /// Select, assign and scale are queued.
    Ordered,
    /// Scale went out, waiting for the units to settle.
    Scaled,
}

/// Gathers a set of units into a new group:
/// select -> assign -> scale -> wait for stillness -> squadron.
pub struct FormationManeuver {
    group: GroupId,
    units: Vec<UnitId>,
    brain: BrainKind,
    stage: FormationStage,
    trigger: Option<TriggerId>,
    started_at: u32,
}

impl FormationManeuver {
    /// Queue the orders that pull everything inside `frame` into `group`, scaled about `center`.
    pub fn start(
        tick: u32,
        group: GroupId,
        units: Vec<UnitId>,
        frame: Rect,
        vehicle_type: Option<UnitType>,
        center: Point,
        scale: f64,
        brain: BrainKind,
        pipeline: &mut CommandPipeline<Followup>,
    ) -> FormationManeuver {
        info!(
            "[Formation] Forming group {} from {} units ({})",
            group,
            units.len(),
            vehicle_type.map(|t| t.name()).unwrap_or("mixed")
        );

        pipeline.select(frame, vehicle_type);
        pipeline.assign(group);
        pipeline.push_then(scale_order(center, scale), Followup::FormationScaled(group));

        FormationManeuver {
            group,
            units,
            brain,
            stage: FormationStage::Ordered,
            trigger: None,
            started_at: tick,
        }
    }

    pub fn group(&self) -> GroupId {
        self.group
    }

    pub fn units(&self) -> &[UnitId] {
        &self.units
    }

    pub fn stage(&self) -> FormationStage {
        self.stage
    }

    pub fn started_at(&self) -> u32 {
        self.started_at
    }

    /// Started more than `max_age` ticks ago without settling, whatever the stage.
    pub fn is_stale(&self, tick: u32, max_age: u32) -> bool {
        self.started_at + max_age < tick
    }

    /// Scale order executed: wait for the units to come to rest.
    pub fn on_scaled(&mut self, tick: u32, settle_delay: u32, scheduler: &mut DeferredScheduler<Deferred>, board: &mut BoardState) {
        if self.stage != FormationStage::Ordered {
            warn!("[Formation] Group {} scaled twice", self.group);
            return;
        }

        let condition = TriggerCondition::stillness(self.units.clone(), settle_delay);
        self.trigger = Some(scheduler.register(condition, Deferred::FormationSettled(self.group), tick, board));
        self.stage = FormationStage::Scaled;
    }

    /// Units settled: hand them over to a new squadron.
    pub fn into_squadron(self) -> Squadron {
        info!("[Formation] Group {} settled with {} units", self.group, self.units.len());

        Squadron::new(self.group, self.units, self.brain)
    }

    /// Give up on the formation, disarming the stillness trigger if one was registered.
    pub fn abandon(self, scheduler: &mut DeferredScheduler<Deferred>, board: &mut BoardState) {
        warn!(
            "[Formation] Group {} never settled ({:?} since tick {}), dropping it",
            self.group, self.stage, self.started_at
        );

        if let Some(trigger) = self.trigger {
            scheduler.cancel(trigger, board);
        }
    }
}

// ─── Nuke evasion ───────────────────────────────────────────────────────────

/// Scatter away from an incoming enemy strike and regroup once it lands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum NukeEvasion {
    #[default]
    Idle,
    Evading {
        epicentre: Point,
    },
}

impl NukeEvasion {
    pub fn is_evading(&self) -> bool {
        matches!(self, NukeEvasion::Evading { .. })
    }

    /// Advance on the opponent's strike state. Returns the number of ticks planning
    /// should pause when a maneuver was queued.
    pub fn update(
        &mut self,
        opponent: Option<&Player>,
        rules: &GameRules,
        features: &StrikeFeatures,
        pipeline: &mut CommandPipeline<Followup>,
    ) -> Option<u32> {
        let incoming = opponent
            .filter(|p| p.has_pending_strike())
            .and_then(|p| p.next_nuclear_strike_position);

        match (*self, incoming) {
            (NukeEvasion::Idle, Some(epicentre)) => {
                warn!("[Evasion] Strike incoming at {:?}, scattering", epicentre);

                let frame = Rect::around(epicentre, rules.tactical_nuclear_strike_radius * features.evasion_selection_factor);
                pipeline.priority(|buffer| {
                    buffer.select(frame, None);
                    buffer.assign(features.evasion_group);
                    buffer.scale(epicentre, features.evasion_scale);
                });

                *self = NukeEvasion::Evading { epicentre };

                Some(rules.tactical_nuclear_strike_delay + features.evasion_margin)
            }
            (NukeEvasion::Evading { epicentre }, None) => {
                info!("[Evasion] Strike over, regrouping at {:?}", epicentre);

                pipeline.priority(|buffer| {
                    buffer.select_group(features.evasion_group);
                    buffer.scale(epicentre, 1.0 / features.evasion_scale);
                    buffer.disband(features.evasion_group);
                });

                *self = NukeEvasion::Idle;

                Some(features.restore_pause)
            }
            _ => None,
        }
    }
}

// ─── Strike planning ────────────────────────────────────────────────────────

/// Vision band in which a highlighting unit is preferred: far enough to be safe,
/// close enough to keep sight.
const PREFERRED_HIGHLIGHT_BAND: (f64, f64) = (0.5, 0.8);
const PREFERRED_HIGHLIGHT_WEIGHT: f64 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrikePlan {
    pub cluster: ClusterId,
    pub target: Point,
    pub highlighter: UnitId,
    pub enemy_damage: f64,
    pub ally_damage: f64,
}

/// Pick the cluster where a strike hurts the enemy most relative to friendly losses,
/// and the friendly unit best placed to guide it.
pub fn plan_strike(
    board: &BoardState,
    clusters: &ClusterSet,
    squadrons: &[Squadron],
    rules: &GameRules,
    features: &StrikeFeatures,
) -> Option<StrikePlan> {
    let enemy_count = board.enemy_units().filter(|u| u.is_alive()).count();
    let min_size = enemy_count as f64 * features.min_cluster_share;
    let blast = BlastModel::from_rules(rules);

    let mut candidates: Vec<StrikePlan> = clusters
        .iter()
        .filter(|c| c.size() as f64 >= min_size)
        .filter_map(|cluster| {
            let target = cluster.suggested_strike_point(board, rules.tactical_nuclear_strike_delay)?;

            if !squadrons.iter().any(|s| s.sees(target, board, rules)) {
                return None;
            }

            Some(StrikePlan {
                cluster: cluster.id(),
                target,
                highlighter: 0,
                enemy_damage: board.enemy_damage_at(target, &blast),
                ally_damage: board.ally_damage_at(target, &blast),
            })
        })
        .filter(|plan| plan.enemy_damage > plan.ally_damage)
        .collect();

    candidates.sort_by(|a, b| {
        (a.ally_damage - a.enemy_damage)
            .partial_cmp(&(b.ally_damage - b.enemy_damage))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut plan = candidates.into_iter().next()?;
    plan.highlighter = pick_highlighter(board, plan.target, rules)?;

    Some(plan)
}

/// Friendly unit with the most vision slack over `target`, preferring units that keep
/// some distance. `None` when the best candidate cannot see the target.
fn pick_highlighter(board: &BoardState, target: Point, rules: &GameRules) -> Option<UnitId> {
    let (low, high) = PREFERRED_HIGHLIGHT_BAND;

    let (unit, distance, vision, _) = board
        .my_units()
        .filter(|u| u.is_alive())
        .map(|u| {
            let vision = board.effective_vision_range(u, rules);
            let distance = u.distance_to(target);
            let mut weight = vision - distance;

            if distance >= low * vision && distance <= high * vision {
                weight *= PREFERRED_HIGHLIGHT_WEIGHT;
            }

            (u.id, distance, vision, weight)
        })
        .max_by(|a, b| a.3.partial_cmp(&b.3).unwrap_or(std::cmp::Ordering::Equal))?;

    if distance < vision {
        Some(unit)
    } else {
        None
    }
}
