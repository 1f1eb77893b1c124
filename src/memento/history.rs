use log::debug;

use super::Memento;

/// Undo and redo stacks of mementos.
///
/// New user changes go through [`UndoHistory::record`], which clears the redo
/// stack and may fold the change into the memento on top. Undo and redo move
/// inverses between the stacks with `push_undo`/`push_redo`, which leave the
/// other stack alone.
#[derive(Debug, Default)]
pub struct UndoHistory {
    /// Mementos that can be undone, newest last
    undo_stack: Vec<Memento>,
    /// Mementos that can be redone, newest last
    redo_stack: Vec<Memento>,
}

impl UndoHistory {
    /// Creates a new empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a memento for a new change. Returns `true` when it was merged
    /// into the memento on top instead of being pushed.
    pub fn record(&mut self, memento: Memento, allow_merge: bool) -> bool {
        self.redo_stack.clear();
        if allow_merge {
            if let Some(top) = self.undo_stack.last() {
                if top.merge(&memento) {
                    debug!("merged {} memento into the previous one", memento.name());
                    return true;
                }
            }
        }
        self.undo_stack.push(memento);
        false
    }

    pub(crate) fn pop_undo(&mut self) -> Option<Memento> {
        self.undo_stack.pop()
    }

    pub(crate) fn pop_redo(&mut self) -> Option<Memento> {
        self.redo_stack.pop()
    }

    pub(crate) fn push_undo(&mut self, memento: Memento) {
        self.undo_stack.push(memento);
    }

    pub(crate) fn push_redo(&mut self, memento: Memento) {
        self.redo_stack.push(memento);
    }

    /// Returns true if there are changes that can be undone
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns true if there are changes that can be redone
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Name of the change the next undo would revert
    pub fn undo_name(&self) -> Option<&'static str> {
        self.undo_stack.last().map(Memento::name)
    }

    pub fn redo_name(&self) -> Option<&'static str> {
        self.redo_stack.last().map(Memento::name)
    }

    /// Clear the history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ContainerId;
    use egui::Pos2;

    fn target(id: ContainerId, x: f32) -> Memento {
        Memento::Target { container: id, target: Pos2::new(x, 0.0) }
    }

    #[test]
    fn test_merge_keeps_oldest() {
        let id = ContainerId::new();
        let mut history = UndoHistory::new();
        assert!(!history.record(target(id, 1.0), false));
        assert!(history.record(target(id, 2.0), true));
        assert!(history.record(target(id, 3.0), true));
        assert_eq!(history.undo_len(), 1);
        match history.pop_undo() {
            Some(Memento::Target { target, .. }) => assert_eq!(target.x, 1.0),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_first_change_of_gesture_never_merges() {
        let id = ContainerId::new();
        let mut history = UndoHistory::new();
        history.record(target(id, 1.0), false);
        history.record(target(id, 2.0), false);
        assert_eq!(history.undo_len(), 2);
    }

    #[test]
    fn test_record_clears_redo() {
        let id = ContainerId::new();
        let mut history = UndoHistory::new();
        history.push_redo(target(id, 1.0));
        assert!(history.can_redo());
        history.record(target(id, 2.0), false);
        assert!(!history.can_redo());
    }
}
