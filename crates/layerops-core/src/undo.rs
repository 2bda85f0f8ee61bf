//! Undo history with named groups and compression.
//!
//! History is snapshot based: an entry stores the document state from before
//! the change, undo swaps it with the current state and the swapped-out state
//! becomes the redo entry. Groups capture one snapshot when the outermost
//! group opens; pushes inside a group only mark it as changed, so the whole
//! group undoes as one step.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::document::LayerId;

/// Default number of undo steps kept.
pub const DEFAULT_MAX_UNDO_LEVELS: usize = 50;

/// What an undo step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UndoKind {
    ItemResize,
    ItemScale,
    ItemRename,
    ItemVisibility,
    EditPaste,
    LayerAdd,
    LayerRemove,
    LayerReposition,
    LayersMerge,
    LayerOpacity,
    LayerMode,
    LayerLockAlpha,
    LayerAlpha,
    LayerAddMask,
    LayerApplyMask,
    LayerMaskProperties,
    TextLayerModify,
    FloatingToLayer,
    FloatingAnchor,
    SelectionChange,
}

/// One step of history.
#[derive(Debug, Clone)]
pub struct UndoEntry<S> {
    pub kind: UndoKind,
    pub label: String,
    /// The item the step is about, when there is a single one.
    pub item: Option<LayerId>,
    state: S,
}

#[derive(Debug, Clone)]
struct OpenGroup<S> {
    kind: UndoKind,
    label: String,
    item: Option<LayerId>,
    state: S,
    changed: bool,
}

/// Undo/redo stacks over snapshots of type `S`.
#[derive(Debug, Clone)]
pub struct UndoStack<S> {
    undo: VecDeque<UndoEntry<S>>,
    redo: Vec<UndoEntry<S>>,
    group: Option<OpenGroup<S>>,
    depth: usize,
    max_levels: usize,
}

impl<S: Clone> Default for UndoStack<S> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO_LEVELS)
    }
}

impl<S: Clone> UndoStack<S> {
    pub fn new(max_levels: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            group: None,
            depth: 0,
            max_levels: max_levels.max(1),
        }
    }

    /// Open a group. Nested opens only bump the depth; the outermost group
    /// names the step.
    pub fn group_start(&mut self, kind: UndoKind, label: &str, current: &S) {
        self.depth += 1;
        if self.depth == 1 {
            tracing::trace!(?kind, label, "undo group start");
            self.group = Some(OpenGroup {
                kind,
                label: label.to_string(),
                item: None,
                state: current.clone(),
                changed: false,
            });
        }
    }

    /// Close a group. Returns true when a history entry was created, which
    /// only happens when the outermost group closes after a change.
    pub fn group_end(&mut self) -> bool {
        if self.depth == 0 {
            tracing::warn!("undo group end without matching start");
            return false;
        }
        self.depth -= 1;
        if self.depth > 0 {
            return false;
        }

        let Some(group) = self.group.take() else {
            return false;
        };
        tracing::trace!(kind = ?group.kind, label = %group.label, changed = group.changed, "undo group end");
        if !group.changed {
            return false;
        }
        self.record(UndoEntry {
            kind: group.kind,
            label: group.label,
            item: group.item,
            state: group.state,
        });
        true
    }

    /// Record that a change is about to happen. `current` is the state from
    /// before the change.
    pub fn push(&mut self, kind: UndoKind, label: &str, item: Option<LayerId>, current: &S) {
        if let Some(group) = self.group.as_mut() {
            group.changed = true;
            if group.item.is_none() {
                group.item = item;
            }
            return;
        }
        self.record(UndoEntry {
            kind,
            label: label.to_string(),
            item,
            state: current.clone(),
        });
    }

    fn record(&mut self, entry: UndoEntry<S>) {
        self.redo.clear();
        self.undo.push_back(entry);
        while self.undo.len() > self.max_levels {
            self.undo.pop_front();
        }
    }

    /// Whether a change of `kind` to `item` can be folded into the newest
    /// step instead of creating a new one.
    pub fn can_compress(&self, kind: UndoKind, item: LayerId) -> bool {
        if self.group.is_some() || !self.redo.is_empty() {
            return false;
        }
        self.undo
            .back()
            .is_some_and(|entry| entry.kind == kind && entry.item == Some(item))
    }

    /// Step back. Returns the restored state and the step's label.
    pub fn undo(&mut self, current: S) -> Option<(S, String)> {
        if self.group.is_some() {
            return None;
        }
        let entry = self.undo.pop_back()?;
        let label = entry.label.clone();
        let restored = entry.state;
        self.redo.push(UndoEntry {
            kind: entry.kind,
            label: entry.label,
            item: entry.item,
            state: current,
        });
        Some((restored, label))
    }

    /// Step forward again. Returns the restored state and the step's label.
    pub fn redo(&mut self, current: S) -> Option<(S, String)> {
        if self.group.is_some() {
            return None;
        }
        let entry = self.redo.pop()?;
        let label = entry.label.clone();
        let restored = entry.state;
        self.undo.push_back(UndoEntry {
            kind: entry.kind,
            label: entry.label,
            item: entry.item,
            state: current,
        });
        Some((restored, label))
    }

    pub fn is_group_open(&self) -> bool {
        self.depth > 0
    }

    pub fn group_depth(&self) -> usize {
        self.depth
    }

    pub fn can_undo(&self) -> bool {
        self.group.is_none() && !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        self.group.is_none() && !self.redo.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo.len()
    }

    /// The newest step, if any.
    pub fn newest(&self) -> Option<&UndoEntry<S>> {
        self.undo.back()
    }

    /// Labels of all undo steps, most recent first.
    pub fn undo_labels(&self) -> Vec<String> {
        self.undo.iter().rev().map(|e| e.label.clone()).collect()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.group = None;
        self.depth = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_undo_redo() {
        let mut stack = UndoStack::new(10);
        let mut value = 1;

        stack.push(UndoKind::LayerOpacity, "Opacity", Some(LayerId(1)), &value);
        value = 2;

        let (restored, label) = stack.undo(value).unwrap();
        assert_eq!(restored, 1);
        assert_eq!(label, "Opacity");
        value = restored;

        let (restored, _) = stack.redo(value).unwrap();
        assert_eq!(restored, 2);
        assert_eq!(stack.undo_count(), 1);
        assert_eq!(stack.redo_count(), 0);
    }

    #[test]
    fn test_group_collapses_pushes() {
        let mut stack = UndoStack::new(10);
        let mut value = 10;

        stack.group_start(UndoKind::ItemResize, "Crop Layer to Content", &value);
        stack.push(UndoKind::ItemResize, "resize", Some(LayerId(3)), &value);
        value = 11;
        stack.push(UndoKind::LayerAlpha, "alpha", None, &value);
        value = 12;
        assert!(stack.group_end());

        assert_eq!(stack.undo_count(), 1);
        assert_eq!(stack.newest().unwrap().item, Some(LayerId(3)));
        let (restored, label) = stack.undo(value).unwrap();
        assert_eq!(restored, 10);
        assert_eq!(label, "Crop Layer to Content");
    }

    #[test]
    fn test_nested_groups() {
        let mut stack = UndoStack::new(10);
        stack.group_start(UndoKind::LayersMerge, "outer", &0);
        stack.group_start(UndoKind::ItemResize, "inner", &0);
        stack.push(UndoKind::ItemResize, "x", None, &0);
        assert!(!stack.group_end());
        assert!(stack.is_group_open());
        assert!(stack.group_end());
        assert_eq!(stack.undo_labels(), vec!["outer".to_string()]);
    }

    #[test]
    fn test_empty_group_leaves_no_entry() {
        let mut stack = UndoStack::new(10);
        stack.group_start(UndoKind::ItemScale, "Scale Layer", &0);
        assert!(!stack.group_end());
        assert_eq!(stack.undo_count(), 0);
    }

    #[test]
    fn test_unbalanced_end_is_ignored() {
        let mut stack: UndoStack<i32> = UndoStack::new(10);
        assert!(!stack.group_end());
        assert_eq!(stack.group_depth(), 0);
    }

    #[test]
    fn test_undo_blocked_while_group_open() {
        let mut stack = UndoStack::new(10);
        stack.push(UndoKind::LayerAdd, "add", None, &0);
        stack.group_start(UndoKind::ItemResize, "resize", &1);
        assert!(!stack.can_undo());
        assert!(stack.undo(1).is_none());
        stack.group_end();
        assert!(stack.can_undo());
    }

    #[test]
    fn test_compression_rules() {
        let mut stack = UndoStack::new(10);
        stack.push(UndoKind::LayerOpacity, "Opacity", Some(LayerId(1)), &0);

        assert!(stack.can_compress(UndoKind::LayerOpacity, LayerId(1)));
        assert!(!stack.can_compress(UndoKind::LayerOpacity, LayerId(2)));
        assert!(!stack.can_compress(UndoKind::LayerMode, LayerId(1)));

        stack.undo(1);
        assert!(!stack.can_compress(UndoKind::LayerOpacity, LayerId(1)));
    }

    #[test]
    fn test_new_push_clears_redo() {
        let mut stack = UndoStack::new(10);
        stack.push(UndoKind::LayerAdd, "a", None, &0);
        stack.undo(1);
        assert!(stack.can_redo());
        stack.push(UndoKind::LayerAdd, "b", None, &0);
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_max_levels_prunes_oldest() {
        let mut stack = UndoStack::new(3);
        for i in 0..5 {
            stack.push(UndoKind::LayerAdd, &format!("step {i}"), None, &i);
        }
        assert_eq!(stack.undo_count(), 3);
        assert_eq!(stack.undo_labels()[2], "step 2");
    }

    #[test]
    fn test_clear() {
        let mut stack = UndoStack::new(3);
        stack.push(UndoKind::LayerAdd, "a", None, &0);
        stack.group_start(UndoKind::ItemResize, "g", &0);
        stack.clear();
        assert!(!stack.is_group_open());
        assert_eq!(stack.undo_count(), 0);
    }
}
