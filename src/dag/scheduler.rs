use std::collections::VecDeque;

use crate::dag::spec::TaskId;

/// FIFO queue of tasks that are ready to run.
///
/// No priorities, no fairness: tasks leave in the order they became ready.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: VecDeque<TaskId>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_ready<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = TaskId>,
    {
        self.queue.extend(ids);
    }

    pub fn next(&mut self) -> Option<TaskId> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
