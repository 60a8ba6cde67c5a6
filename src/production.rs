use crate::features::ProductionFeatures;
use crate::model::*;
use log::*;
use std::collections::{HashMap, VecDeque};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProductionRequest {
    pub unit_type: UnitType,
    /// The request becomes due once the tick passes this value.
    pub ready_at: u32,
}

/// Per-factory queues of timed vehicle production switches.
#[derive(Default)]
pub struct ProductionQueue {
    requests: HashMap<FacilityId, VecDeque<ProductionRequest>>,
}

impl ProductionQueue {
    pub fn new() -> ProductionQueue {
        ProductionQueue::default()
    }

    pub fn is_empty(&self, facility: FacilityId) -> bool {
        self.requests.get(&facility).map(|q| q.is_empty()).unwrap_or(true)
    }

    pub fn pending(&self, facility: FacilityId) -> impl Iterator<Item = &ProductionRequest> {
        self.requests.get(&facility).into_iter().flat_map(|q| q.iter())
    }

    /// Refill an empty factory queue with `rounds` passes over the production cycle.
    /// The first request is due right away, later ones are spaced by a multiple of the
    /// production cost.
    pub fn plan(&mut self, facility: FacilityId, tick: u32, features: &ProductionFeatures, production_cost: u32) {
        if !self.is_empty(facility) || features.cycle.is_empty() {
            return;
        }

        let spacing = features.spacing_factor * production_cost;
        let queue = self.requests.entry(facility).or_default();

        let plan = (0..features.rounds).flat_map(|_| features.cycle.iter().copied());
        for (index, unit_type) in plan.enumerate() {
            queue.push_back(ProductionRequest {
                unit_type,
                ready_at: tick + 1 + index as u32 * spacing,
            });
        }

        debug!("[Production] Planned {} requests for facility {}", queue.len(), facility);
    }

    /// Pop the front request of a factory if it is due.
    pub fn next_ready(&mut self, facility: FacilityId, tick: u32) -> Option<ProductionRequest> {
        let queue = self.requests.get_mut(&facility)?;

        if queue.front()?.ready_at < tick {
            queue.pop_front()
        } else {
            None
        }
    }

    /// Forget queues of factories we no longer hold.
    pub fn retain_facilities<F>(&mut self, mut keep: F)
    where
        F: FnMut(FacilityId) -> bool,
    {
        self.requests.retain(|id, _| keep(*id));
    }
}
