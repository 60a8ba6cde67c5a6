use crate::model::UnitType;
use serde::{Deserialize, Serialize};

/// Tunables for every subsystem. Loaded from JSON; missing sections and fields
/// fall back to the tuned defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    pub clustering: ClusteringFeatures,
    pub pipeline: PipelineFeatures,
    pub field: FieldFeatures,
    pub brains: BrainFeatures,
    pub squadrons: SquadronFeatures,
    pub strike: StrikeFeatures,
    pub production: ProductionFeatures,
    pub budget: BudgetFeatures,
    pub maintenance: MaintenanceFeatures,
}

impl Features {
    pub fn from_json(data: &str) -> Result<Features, String> {
        serde_json::from_str(data).map_err(|err| format!("Failed to parse features: {}", err))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringFeatures {
    pub epsilon: f64,
    /// `min_points = ceil(enemy_count / min_points_divisor)`.
    pub min_points_divisor: usize,
    pub initial_cooldown: u32,
    pub min_cooldown: u32,
    /// Larger armies recluster less often: `max(enemy_count - offset, min_cooldown)`.
    pub cooldown_offset: u32,
    /// Noise share above which the enemy counts as spread out in a minefield.
    pub minefield_noise_share: f64,
    pub mark_interval: u32,
}

impl Default for ClusteringFeatures {
    fn default() -> ClusteringFeatures {
        ClusteringFeatures {
            epsilon: 15.0,
            min_points_divisor: 50,
            initial_cooldown: 300,
            min_cooldown: 80,
            cooldown_offset: 200,
            minefield_noise_share: 0.7,
            mark_interval: 20,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineFeatures {
    pub warmup_ticks: u32,
    /// Actions held back from the platform budget for emergency maneuvers.
    pub reserved_actions: u32,
}

impl Default for PipelineFeatures {
    fn default() -> PipelineFeatures {
        PipelineFeatures {
            warmup_ticks: 300,
            reserved_actions: 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldFeatures {
    pub search_radius_cells: f64,
    pub edge_value: f64,
    pub edge_decay_cells: f64,
}

impl Default for FieldFeatures {
    fn default() -> FieldFeatures {
        FieldFeatures {
            search_radius_cells: 3.0,
            edge_value: -150.0,
            edge_decay_cells: 4.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainFeatures {
    /// Zero-displacement activations tolerated before a field brain gives up.
    pub stuck_limit: u32,
    pub potential_cooldown: u32,
    pub hunter_cooldown: u32,
    pub capture_cooldown: u32,
    pub follower_cooldown: u32,
    pub aggressive_cooldown: u32,
    /// Distance covered per step while drifting to the map centre.
    pub capture_drift: f64,
}

impl Default for BrainFeatures {
    fn default() -> BrainFeatures {
        BrainFeatures {
            stuck_limit: 100,
            potential_cooldown: 200,
            hunter_cooldown: 50,
            capture_cooldown: 200,
            follower_cooldown: 20,
            aggressive_cooldown: 60,
            capture_drift: 100.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquadronFeatures {
    pub min_speed_factor: f64,
    /// Two members further apart than this mean the formation is lost.
    pub formation_spread: f64,
    pub low_health: f64,
    pub good_health: f64,
    pub compaction_check_interval: u32,
    pub compaction_retry: u32,
    pub compaction_step_cooldown: u32,
    pub initial_scale: f64,
    pub settle_delay: u32,
    pub factory_squadron_size: usize,
    pub factory_check_interval: u32,
    pub mode_switch_interval: u32,
    /// Facility share that turns ground squadrons into hunters.
    pub hunter_facility_share: f64,
    /// Groups handed out to new squadrons are drawn from `1..=max_group`.
    pub max_group: u32,
}

impl Default for SquadronFeatures {
    fn default() -> SquadronFeatures {
        SquadronFeatures {
            min_speed_factor: 0.6,
            formation_spread: 90.0,
            low_health: 0.8,
            good_health: 0.92,
            compaction_check_interval: 200,
            compaction_retry: 600,
            compaction_step_cooldown: 50,
            initial_scale: 0.3,
            settle_delay: 50,
            factory_squadron_size: 99,
            factory_check_interval: 100,
            mode_switch_interval: 500,
            hunter_facility_share: 0.8,
            max_group: 80,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrikeFeatures {
    pub enabled: bool,
    pub earliest_tick: u32,
    pub check_interval: u32,
    /// Clusters smaller than this share of the enemy army are not worth a strike.
    pub min_cluster_share: f64,
    /// Cooldown value at which clusters are refreshed ahead of a strike.
    pub recluster_at_cooldown: u32,
    /// Cooldown value at which safe-distance bands tighten.
    pub tighten_band_at_cooldown: u32,
    pub evasion_group: u32,
    pub evasion_scale: f64,
    pub evasion_selection_factor: f64,
    pub evasion_margin: u32,
    pub restore_pause: u32,
}

impl Default for StrikeFeatures {
    fn default() -> StrikeFeatures {
        StrikeFeatures {
            enabled: true,
            earliest_tick: 300,
            check_interval: 5,
            min_cluster_share: 0.1,
            recluster_at_cooldown: 50,
            tighten_band_at_cooldown: 100,
            evasion_group: 99,
            evasion_scale: 2.0,
            evasion_selection_factor: 1.1,
            evasion_margin: 10,
            restore_pause: 30,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionFeatures {
    pub enabled: bool,
    pub check_interval: u32,
    pub rounds: u32,
    /// Gap between two requests, in multiples of the production cost.
    pub spacing_factor: u32,
    pub cycle: Vec<UnitType>,
}

impl Default for ProductionFeatures {
    fn default() -> ProductionFeatures {
        ProductionFeatures {
            enabled: true,
            check_interval: 10,
            rounds: 3,
            spacing_factor: 11,
            cycle: vec![UnitType::Tank, UnitType::Arrv, UnitType::Ifv],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetFeatures {
    /// Cumulative planning time after which the controller stops for good.
    pub total_ms: f64,
    pub slow_tick_ms: f64,
}

impl Default for BudgetFeatures {
    fn default() -> BudgetFeatures {
        BudgetFeatures {
            total_ms: 200_000.0,
            slow_tick_ms: 50.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceFeatures {
    pub prune_interval: u32,
    pub heal_reset_interval: u32,
    /// Triggers pending longer than this are cancelled.
    pub trigger_max_age: u32,
}

impl Default for MaintenanceFeatures {
    fn default() -> MaintenanceFeatures {
        MaintenanceFeatures {
            prune_interval: 10,
            heal_reset_interval: 20,
            trigger_max_age: 2000,
        }
    }
}
