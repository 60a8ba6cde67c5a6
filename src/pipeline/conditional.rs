use crate::board::BoardState;
use crate::model::*;
use log::*;

/// Default delay before a stillness trigger starts checking.
pub const DEFAULT_STILLNESS_DELAY: u32 = 5;
/// Default number of ticks a unit must stay put to count as still.
pub const DEFAULT_STILL_TICKS: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerId(u64);

/// Read-only view handed to trigger predicates.
pub struct TriggerContext<'a> {
    pub tick: u32,
    pub board: &'a BoardState,
}

pub type TriggerPredicate = Box<dyn Fn(&TriggerContext) -> bool>;

/// When a deferred action may run.
pub enum TriggerCondition {
    /// More than `after` ticks since registration; `None` fires on the next poll.
    Timer { after: Option<u32> },
    Custom(TriggerPredicate),
    /// Every sub-condition has held at least once since registration.
    WaitForAll(Vec<(TriggerCondition, bool)>),
    /// Timer elapsed and none of `units` moved within the last `still_for` ticks.
    WaitForStillness { units: Vec<UnitId>, after: u32, still_for: u32 },
}

impl TriggerCondition {
    pub fn after(ticks: u32) -> TriggerCondition {
        TriggerCondition::Timer { after: Some(ticks) }
    }

    pub fn immediately() -> TriggerCondition {
        TriggerCondition::Timer { after: None }
    }

    pub fn custom<F>(predicate: F) -> TriggerCondition
    where
        F: Fn(&TriggerContext) -> bool + 'static,
    {
        TriggerCondition::Custom(Box::new(predicate))
    }

    pub fn all(conditions: Vec<TriggerCondition>) -> TriggerCondition {
        TriggerCondition::WaitForAll(conditions.into_iter().map(|c| (c, false)).collect())
    }

    pub fn stillness(units: Vec<UnitId>, after: u32) -> TriggerCondition {
        TriggerCondition::WaitForStillness {
            units,
            after,
            still_for: DEFAULT_STILL_TICKS,
        }
    }

    fn timer_elapsed(after: Option<u32>, registered_at: u32, tick: u32) -> bool {
        match after {
            Some(after) => registered_at + after < tick,
            None => true,
        }
    }

    fn poll(&mut self, registered_at: u32, context: &TriggerContext) -> bool {
        match self {
            TriggerCondition::Timer { after } => Self::timer_elapsed(*after, registered_at, context.tick),
            TriggerCondition::Custom(predicate) => predicate(context),
            TriggerCondition::WaitForAll(conditions) => {
                for (condition, latched) in conditions.iter_mut() {
                    if !*latched {
                        *latched = condition.poll(registered_at, context);
                    }
                }

                conditions.iter().all(|(_, latched)| *latched)
            }
            TriggerCondition::WaitForStillness { units, after, still_for } => {
                Self::timer_elapsed(Some(*after), registered_at, context.tick)
                    && units.iter().all(|id| match context.board.last_moved_at(*id) {
                        Some(moved_at) => moved_at + *still_for < context.tick,
                        None => true,
                    })
            }
        }
    }

    fn watched_units(&self, units: &mut Vec<UnitId>) {
        match self {
            TriggerCondition::WaitForStillness { units: watched, .. } => units.extend(watched.iter().copied()),
            TriggerCondition::WaitForAll(conditions) => {
                for (condition, _) in conditions {
                    condition.watched_units(units);
                }
            }
            _ => {}
        }
    }
}

struct PendingTrigger<A> {
    id: TriggerId,
    registered_at: u32,
    condition: TriggerCondition,
    action: A,
}

impl<A> PendingTrigger<A> {
    fn release(&self, board: &mut BoardState) {
        let mut units = Vec::new();
        self.condition.watched_units(&mut units);

        for unit in units {
            board.unwatch(unit);
        }
    }
}

/// Deferred actions keyed on tick-polled conditions. Each registered action is
/// returned by `poll` exactly once, on the first tick its condition holds.
pub struct DeferredScheduler<A> {
    next_id: u64,
    pending: Vec<PendingTrigger<A>>,
}

impl<A> Default for DeferredScheduler<A> {
    fn default() -> DeferredScheduler<A> {
        DeferredScheduler {
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<A> DeferredScheduler<A> {
    pub fn new() -> DeferredScheduler<A> {
        DeferredScheduler::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_pending(&self, id: TriggerId) -> bool {
        self.pending.iter().any(|p| p.id == id)
    }

    /// Arm a trigger. Units named by stillness conditions are watched on the board
    /// until the trigger fires or is cancelled.
    pub fn register(&mut self, condition: TriggerCondition, action: A, tick: u32, board: &mut BoardState) -> TriggerId {
        let id = TriggerId(self.next_id);
        self.next_id += 1;

        let mut units = Vec::new();
        condition.watched_units(&mut units);
        for unit in units {
            board.watch(unit);
        }

        self.pending.push(PendingTrigger {
            id,
            registered_at: tick,
            condition,
            action,
        });

        id
    }

    /// Evaluate every pending trigger and return the actions whose condition holds,
    /// in registration order.
    pub fn poll(&mut self, tick: u32, board: &mut BoardState) -> Vec<A> {
        let mut fired = Vec::new();
        let mut index = 0;

        while index < self.pending.len() {
            let ready = {
                let context = TriggerContext { tick, board: &*board };
                let trigger = &mut self.pending[index];
                trigger.condition.poll(trigger.registered_at, &context)
            };

            if ready {
                let trigger = self.pending.remove(index);
                trigger.release(board);
                fired.push(trigger.action);
            } else {
                index += 1;
            }
        }

        fired
    }

    /// Disarm a pending trigger, returning its action if it had not fired yet.
    pub fn cancel(&mut self, id: TriggerId, board: &mut BoardState) -> Option<A> {
        let index = self.pending.iter().position(|p| p.id == id)?;
        let trigger = self.pending.remove(index);
        trigger.release(board);

        debug!("[Scheduler] Cancelled trigger {:?}", id);

        Some(trigger.action)
    }

    /// Disarm every trigger that has been pending for more than `max_age` ticks.
    pub fn expire(&mut self, tick: u32, max_age: u32, board: &mut BoardState) -> Vec<A> {
        let stale: Vec<TriggerId> = self
            .pending
            .iter()
            .filter(|p| p.registered_at + max_age < tick)
            .map(|p| p.id)
            .collect();

        if !stale.is_empty() {
            warn!("[Scheduler] Expiring {} stale triggers", stale.len());
        }

        stale.into_iter().filter_map(|id| self.cancel(id, board)).collect()
    }
}
