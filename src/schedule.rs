//! Delayed controller work modeled as cancellable tasks.
//!
//! There are three task classes and at most one pending task per class.
//! Nothing runs by itself: the owner calls [`Scheduler::take_due`] with the
//! current time and performs whatever the returned token names.

use std::time::Duration;

use web_time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Post-move animation window before the next side's moves are checked.
    Settle,
    /// Grace period before a side without moves is passed automatically.
    AutoPass,
    /// Computer "thinking" delay before it commits a move.
    AiMove,
}

impl TaskKind {
    const ALL: [TaskKind; 3] = [TaskKind::Settle, TaskKind::AutoPass, TaskKind::AiMove];

    fn slot(self) -> usize {
        match self {
            TaskKind::Settle => 0,
            TaskKind::AutoPass => 1,
            TaskKind::AiMove => 2,
        }
    }
}

/// Identifies one scheduled run. A token stays valid until it is taken,
/// replaced by a newer task of the same kind, or cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskToken {
    pub kind: TaskKind,
    generation: u64,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    token: TaskToken,
    due: Instant,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    slots: [Option<Pending>; 3],
    next_generation: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `kind` to run `delay` after `now`, replacing any pending
    /// task of the same kind.
    pub fn schedule(&mut self, kind: TaskKind, now: Instant, delay: Duration) -> TaskToken {
        self.next_generation += 1;
        let token = TaskToken {
            kind,
            generation: self.next_generation,
        };
        self.slots[kind.slot()] = Some(Pending {
            token,
            due: now + delay,
        });
        token
    }

    pub fn cancel(&mut self, kind: TaskKind) {
        self.slots[kind.slot()] = None;
    }

    pub fn cancel_all(&mut self) {
        self.slots = [None; 3];
    }

    pub fn is_pending(&self, kind: TaskKind) -> bool {
        self.slots[kind.slot()].is_some()
    }

    pub fn is_current(&self, token: TaskToken) -> bool {
        self.slots[token.kind.slot()].is_some_and(|p| p.token == token)
    }

    /// Earliest deadline among pending tasks.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.iter().flatten().map(|p| p.due).min()
    }

    /// Removes and returns the earliest task whose deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<TaskToken> {
        let kind = TaskKind::ALL
            .into_iter()
            .filter_map(|kind| self.slots[kind.slot()].map(|p| (kind, p.due)))
            .filter(|&(_, due)| due <= now)
            .min_by_key(|&(_, due)| due)
            .map(|(kind, _)| kind)?;

        self.slots[kind.slot()].take().map(|p| p.token)
    }
}
