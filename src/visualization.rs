use crate::geometry::Point;
use crate::maneuver::{NukeEvasion, StrikePlan};
use crate::military::cluster::ClusterId;
use crate::military::emitter::Emitter;
use crate::military::squadron::SquadronSummary;
use crate::strategy::TacticalController;
use serde::*;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SquadronView {
    #[serde(flatten)]
    pub summary: SquadronSummary,
    pub units: usize,
    pub pending_steps: usize,
    pub emitters: Vec<Emitter>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterView {
    pub id: ClusterId,
    pub size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<Point>,
    pub history: Vec<Point>,
}

/// Read-only picture of the controller's state after a tick.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TacticalSummary {
    pub tick: u32,
    pub hunting: bool,
    pub evasion: NukeEvasion,
    pub paused_for: u32,
    pub queued_commands: usize,
    pub forming_groups: Vec<u32>,
    pub squadrons: Vec<SquadronView>,
    pub clusters: Vec<ClusterView>,
    pub noise: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_strike: Option<StrikePlan>,
    pub budget_spent_ms: f64,
}

impl TacticalSummary {
    pub fn from_controller(controller: &TacticalController) -> TacticalSummary {
        let board = controller.board();
        let features = &controller.features().squadrons;

        let squadrons = controller
            .squadrons()
            .iter()
            .map(|squadron| SquadronView {
                summary: squadron.summary(board, features),
                units: squadron.units().len(),
                pending_steps: squadron.brain().scheduled().count(),
                emitters: squadron.last_emitters().to_vec(),
            })
            .collect();

        let clusters = controller
            .clusters()
            .iter()
            .map(|cluster| ClusterView {
                id: cluster.id(),
                size: cluster.size(),
                center: cluster.center(),
                heading: cluster.heading(),
                history: cluster.history().copied().collect(),
            })
            .collect();

        TacticalSummary {
            tick: controller.tick_index(),
            hunting: controller.is_hunting(),
            evasion: controller.evasion(),
            paused_for: controller.paused_for(),
            queued_commands: controller.pipeline().len(),
            forming_groups: controller.maneuvers().iter().map(|m| m.group()).collect(),
            squadrons,
            clusters,
            noise: controller.clusters().noise().len(),
            last_strike: controller.last_strike().copied(),
            budget_spent_ms: controller.time_budget().spent_ms(),
        }
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string(self).map_err(|err| format!("Failed to serialize summary: {}", err))
    }
}
