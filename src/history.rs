/// Maximum number of retained snapshots. The oldest entries are evicted
/// first once the undo stack is full.
pub const MAX_DEPTH: usize = 80;

/// Bounded undo/redo over deep state snapshots.
///
/// The undo stack is seeded with the initial state and never drains below
/// that seed, so there is always a state to land on. Any snapshot clears the
/// redo stack; only `undo` itself feeds it.
pub struct History<T: Clone + PartialEq> {
    undo_stack: Vec<T>,
    redo_stack: Vec<T>,
    max_depth: usize,
}

impl<T: Clone + PartialEq> History<T> {
    pub fn new(initial: T) -> Self {
        Self::with_depth(initial, MAX_DEPTH)
    }

    pub fn with_depth(initial: T, max_depth: usize) -> Self {
        Self {
            undo_stack: vec![initial],
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Push a deep copy of `state`. With `dedupe`, a state structurally
    /// identical to the current top is dropped instead of pushed.
    pub fn snapshot(&mut self, state: &T, dedupe: bool) {
        if dedupe && self.undo_stack.last() == Some(state) {
            return;
        }
        self.undo_stack.push(state.clone());
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    /// Step back once. Returns the state to apply, or `None` at the seed.
    pub fn undo(&mut self) -> Option<T> {
        if self.undo_stack.len() <= 1 {
            return None;
        }
        let current = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        self.undo_stack.last().cloned()
    }

    /// Step forward once. Returns the state to apply, or `None` when there
    /// is nothing to redo.
    pub fn redo(&mut self) -> Option<T> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(next.clone());
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.undo_stack.len()
    }
}
