use std::collections::VecDeque;

use crate::types::GameState;

pub const DEFAULT_UNDO_CAPACITY: usize = 3;

/// Bounded snapshot stack. Pushing past capacity silently drops the oldest
/// snapshot; popping hands back the newest and forgets it (no redo).
#[derive(Debug, Clone)]
pub struct UndoStack {
    snapshots: VecDeque<GameState>,
    capacity: usize,
}

impl UndoStack {
    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, snapshot: GameState) {
        if self.capacity == 0 {
            return;
        }
        if self.snapshots.len() == self.capacity {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot);
    }

    pub fn pop(&mut self) -> Option<GameState> {
        self.snapshots.pop_back()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Player;

    fn state_with_passes(passes: u8) -> GameState {
        let mut state = GameState::new(Player::Black);
        state.consecutive_passes = passes;
        state
    }

    #[test]
    fn never_exceeds_capacity_and_drops_oldest() {
        let mut stack = UndoStack::default();
        for i in 0..10 {
            stack.push(state_with_passes(i));
            assert!(stack.len() <= DEFAULT_UNDO_CAPACITY);
        }

        assert_eq!(stack.pop().unwrap().consecutive_passes, 9);
        assert_eq!(stack.pop().unwrap().consecutive_passes, 8);
        assert_eq!(stack.pop().unwrap().consecutive_passes, 7);
        assert!(stack.pop().is_none());
    }

    #[test]
    fn pop_on_empty_stack_is_none() {
        let mut stack = UndoStack::default();

        assert!(stack.is_empty());
        assert!(stack.pop().is_none());
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let mut stack = UndoStack::new(0);
        stack.push(state_with_passes(1));

        assert!(stack.is_empty());
    }
}
