use super::command::*;
use crate::model::*;
use log::*;
use std::collections::VecDeque;

/// Before this tick the soft limit never engages.
pub const SOFT_LIMIT_WARMUP_TICKS: u32 = 300;
/// Length of the sliding window the platform counts actions over.
pub const SOFT_LIMIT_WINDOW_TICKS: u32 = 60;
/// Default history capacity.
pub const DEFAULT_SOFT_LIMIT: usize = 12;

/// What `run` wrote out.
#[derive(Clone, Debug, PartialEq)]
pub struct Executed<C> {
    pub action: ActionKind,
    pub on_complete: Option<C>,
}

/// FIFO of pending commands with a sliding-window admission check.
pub struct CommandPipeline<C> {
    queue: VecDeque<Command<C>>,
    history: VecDeque<u32>,
    soft_limit: usize,
    warmup_ticks: u32,
    window_ticks: u32,
}

impl<C> Default for CommandPipeline<C> {
    fn default() -> CommandPipeline<C> {
        CommandPipeline::new(DEFAULT_SOFT_LIMIT)
    }
}

impl<C> CommandPipeline<C> {
    pub fn new(soft_limit: usize) -> CommandPipeline<C> {
        CommandPipeline {
            queue: VecDeque::new(),
            history: VecDeque::with_capacity(soft_limit),
            soft_limit,
            warmup_ticks: SOFT_LIMIT_WARMUP_TICKS,
            window_ticks: SOFT_LIMIT_WINDOW_TICKS,
        }
    }

    pub fn with_window(mut self, warmup_ticks: u32, window_ticks: u32) -> CommandPipeline<C> {
        self.warmup_ticks = warmup_ticks;
        self.window_ticks = window_ticks;
        self
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn has_commands(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = &Command<C>> {
        self.queue.iter()
    }

    pub fn soft_limit(&self) -> usize {
        self.soft_limit
    }

    pub fn set_soft_limit(&mut self, soft_limit: usize) {
        if soft_limit != self.soft_limit {
            debug!("[Pipeline] Soft limit {} -> {}", self.soft_limit, soft_limit);
        }

        self.soft_limit = soft_limit;
        while self.history.len() > soft_limit {
            self.history.pop_front();
        }
    }

    /// Build a block of commands and place it ahead of everything queued,
    /// preserving the block's own order.
    pub fn priority<F>(&mut self, build: F)
    where
        F: FnOnce(&mut CommandBuffer<C>),
    {
        let mut buffer = CommandBuffer::default();
        build(&mut buffer);

        for command in buffer.into_commands().into_iter().rev() {
            self.queue.push_front(command);
        }
    }

    pub fn pop(&mut self) -> Option<Command<C>> {
        self.queue.pop_front()
    }

    /// Pop one command, write it to `slot`, and record it in the history.
    pub fn run(&mut self, slot: &mut Order, tick: u32) -> Option<Executed<C>> {
        let command = self.queue.pop_front()?;

        slot.merge_from(&command.order);
        self.record(tick);

        Some(Executed {
            action: command.order.action,
            on_complete: command.on_complete,
        })
    }

    fn record(&mut self, tick: u32) {
        if self.soft_limit == 0 {
            return;
        }

        while self.history.len() >= self.soft_limit {
            self.history.pop_front();
        }
        self.history.push_back(tick);
    }

    /// True once the history is full and its oldest entry falls inside the
    /// current window. Never true during warm-up.
    pub fn soft_limit_reached(&self, tick: u32) -> bool {
        let oldest = match self.history.front() {
            Some(oldest) => *oldest,
            None => return false,
        };

        if tick < self.warmup_ticks {
            return false;
        }

        self.history.len() >= self.soft_limit && oldest + self.window_ticks > tick
    }
}

impl<C> CommandSink<C> for CommandPipeline<C> {
    fn push_command(&mut self, command: Command<C>) {
        self.queue.push_back(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn tagged(group: GroupId) -> Order {
        Order {
            action: ActionKind::Assign,
            group: Some(group),
            ..Default::default()
        }
    }

    fn drain(pipeline: &mut CommandPipeline<()>, tick: u32) -> Vec<GroupId> {
        let mut groups = Vec::new();
        loop {
            let mut slot = Order::default();
            if pipeline.run(&mut slot, tick).is_none() {
                break;
            }
            groups.extend(slot.group);
        }
        groups
    }

    #[test]
    fn priority_block_jumps_the_queue_in_order() {
        let mut pipeline: CommandPipeline<()> = CommandPipeline::default();
        pipeline.push(tagged(1));
        pipeline.push(tagged(2));
        pipeline.priority(|block| {
            block.push(tagged(3));
            block.push(tagged(4));
        });

        assert_eq!(drain(&mut pipeline, 0), vec![3, 4, 1, 2]);
    }

    #[test]
    fn completion_token_is_returned_after_run() {
        let mut pipeline: CommandPipeline<&'static str> = CommandPipeline::default();
        pipeline.select_group(5);
        pipeline.push_then(tagged(6), "assigned");

        let mut slot = Order::default();
        assert_eq!(pipeline.run(&mut slot, 0).and_then(|e| e.on_complete), None);

        let mut slot = Order::default();
        let executed = pipeline.run(&mut slot, 1).unwrap();
        assert_eq!(executed.action, ActionKind::Assign);
        assert_eq!(executed.on_complete, Some("assigned"));
        assert!(pipeline.run(&mut Order::default(), 2).is_none());
    }

    #[test]
    fn run_emits_only_present_fields() {
        let mut pipeline: CommandPipeline<()> = CommandPipeline::default();
        pipeline.move_by(Point::new(3.0, -4.0), None);

        let mut slot = Order::default();
        pipeline.run(&mut slot, 0);

        assert_eq!(slot.action, ActionKind::Move);
        assert_eq!(slot.x, Some(3.0));
        assert_eq!(slot.max_speed, None);
        assert!(!slot.to_json().unwrap().contains("max_speed"));
    }

    #[test]
    fn soft_limit_engages_only_after_warmup() {
        let mut pipeline: CommandPipeline<()> = CommandPipeline::new(12);

        for i in 0..12 {
            pipeline.push(tagged(i));
            pipeline.run(&mut Order::default(), 100 + i * 5);
        }
        assert!(!pipeline.soft_limit_reached(159));

        for i in 0..12 {
            pipeline.push(tagged(i));
            pipeline.run(&mut Order::default(), 400 + i * 5);
        }
        assert!(pipeline.soft_limit_reached(459));
        assert!(!pipeline.soft_limit_reached(460));
    }

    #[test]
    fn soft_limit_needs_full_history() {
        let mut pipeline: CommandPipeline<()> = CommandPipeline::new(12);
        assert!(!pipeline.soft_limit_reached(500));

        for i in 0..11 {
            pipeline.push(tagged(i));
            pipeline.run(&mut Order::default(), 500);
        }
        assert!(!pipeline.soft_limit_reached(500));

        pipeline.push(tagged(11));
        pipeline.run(&mut Order::default(), 500);
        assert!(pipeline.soft_limit_reached(500));

        pipeline.set_soft_limit(15);
        assert!(!pipeline.soft_limit_reached(500));
    }
}
