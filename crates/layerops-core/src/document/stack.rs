//! Layer tree structure: lookup, placement and reordering.
//!
//! These are the raw edits; undo and dirty tracking happen in the
//! `Document` operations built on top of them.

use super::{Content, Layer, LayerId};
use crate::error::CommandError;

/// Where a new layer is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Into the active layer when it is a group, otherwise directly above
    /// the active layer.
    #[default]
    ActiveParent,
    /// Into `parent`, directly above the active layer when the active layer
    /// is one of its children, otherwise on top.
    Parent(Option<LayerId>),
    /// Into `parent` at a sibling position, 0 being the top.
    At {
        parent: Option<LayerId>,
        position: usize,
    },
}

/// Bounds `(x, y, width, height)` in image coordinates.
pub(super) type Bounds = (i32, i32, u32, u32);

impl Content {
    pub(super) fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub(super) fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    pub(super) fn require(&self, id: LayerId) -> Result<&Layer, CommandError> {
        self.layer(id).ok_or(CommandError::NoSuchLayer(id))
    }

    pub(super) fn require_mut(&mut self, id: LayerId) -> Result<&mut Layer, CommandError> {
        self.layer_mut(id).ok_or(CommandError::NoSuchLayer(id))
    }

    fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    pub(super) fn children(&self, parent: Option<LayerId>) -> Vec<LayerId> {
        self.layers
            .iter()
            .filter(|l| l.parent == parent)
            .map(|l| l.id)
            .collect()
    }

    /// All layers below `id` in the tree, depth first.
    pub(super) fn descendants(&self, id: LayerId) -> Vec<LayerId> {
        let mut out = Vec::new();
        let mut pending = self.children(Some(id));
        pending.reverse();
        while let Some(next) = pending.pop() {
            out.push(next);
            let mut children = self.children(Some(next));
            children.reverse();
            pending.extend(children);
        }
        out
    }

    /// Whether `ancestor` is `id` or one of its parents.
    pub(super) fn is_ancestor(&self, ancestor: LayerId, id: LayerId) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            if cur == ancestor {
                return true;
            }
            current = self.layer(cur).and_then(|l| l.parent);
        }
        false
    }

    /// Parent and position among siblings.
    pub(super) fn sibling_position(&self, id: LayerId) -> Option<(Option<LayerId>, usize)> {
        let parent = self.layer(id)?.parent;
        let position = self.children(parent).iter().position(|&c| c == id)?;
        Some((parent, position))
    }

    pub(super) fn resolve_placement(
        &self,
        placement: Placement,
    ) -> Result<(Option<LayerId>, usize), CommandError> {
        let active = self.active_layer.and_then(|id| self.layer(id));
        match placement {
            Placement::ActiveParent => match active {
                Some(layer) if layer.is_group() => Ok((Some(layer.id), 0)),
                Some(layer) => Ok(self.sibling_position(layer.id).unwrap_or((None, 0))),
                None => Ok((None, 0)),
            },
            Placement::Parent(parent) => {
                self.check_group(parent)?;
                let position = active
                    .filter(|l| l.parent == parent)
                    .and_then(|l| self.sibling_position(l.id))
                    .map_or(0, |(_, p)| p);
                Ok((parent, position))
            }
            Placement::At { parent, position } => {
                self.check_group(parent)?;
                Ok((parent, position))
            }
        }
    }

    fn check_group(&self, parent: Option<LayerId>) -> Result<(), CommandError> {
        match parent {
            None => Ok(()),
            Some(id) if self.require(id)?.is_group() => Ok(()),
            Some(id) => Err(CommandError::rejected(format!(
                "Layer {id} is not a layer group."
            ))),
        }
    }

    /// Insert a layer among the children of `parent`. Positions past the
    /// end put it at the bottom.
    pub(super) fn insert(&mut self, mut layer: Layer, parent: Option<LayerId>, position: usize) {
        layer.parent = parent;
        let siblings = self.children(parent);
        match siblings.get(position).and_then(|&s| self.index_of(s)) {
            Some(index) => self.layers.insert(index, layer),
            None => self.layers.push(layer),
        }
    }

    /// Move a layer to a new position among its siblings.
    pub(super) fn reorder(&mut self, id: LayerId, position: usize) -> Result<(), CommandError> {
        let index = self.index_of(id).ok_or(CommandError::NoSuchLayer(id))?;
        let layer = self.layers.remove(index);
        let parent = layer.parent;
        self.insert(layer, parent, position);
        Ok(())
    }

    /// Remove a layer and everything inside it, returning the removed
    /// layers.
    pub(super) fn remove_subtree(&mut self, id: LayerId) -> Vec<Layer> {
        let mut doomed = self.descendants(id);
        doomed.push(id);
        let (removed, kept): (Vec<Layer>, Vec<Layer>) = std::mem::take(&mut self.layers)
            .into_iter()
            .partition(|l| doomed.contains(&l.id));
        self.layers = kept;
        removed
    }

    /// The layer that becomes active when `id` goes away: the sibling
    /// below, else the sibling above, else the parent.
    pub(super) fn successor(&self, id: LayerId) -> Option<LayerId> {
        let (parent, position) = self.sibling_position(id)?;
        let siblings = self.children(parent);
        siblings
            .get(position + 1)
            .copied()
            .or_else(|| position.checked_sub(1).and_then(|p| siblings.get(p).copied()))
            .or(parent)
    }

    /// Whether a child of `parent` other than `except` uses `name`.
    pub(super) fn sibling_has_name(&self, parent: Option<LayerId>, name: &str, except: Option<LayerId>) -> bool {
        self.layers
            .iter()
            .any(|l| l.parent == parent && Some(l.id) != except && l.name == name)
    }

    /// `base`, or `base #n` with the smallest free `n` among the children
    /// of `parent`.
    pub(super) fn unique_name(&self, parent: Option<LayerId>, base: &str) -> String {
        if !self.sibling_has_name(parent, base, None) {
            return base.to_string();
        }
        let stem = strip_number(base);
        (1..)
            .map(|n| format!("{stem} #{n}"))
            .find(|candidate| !self.sibling_has_name(parent, candidate, None))
            .unwrap_or_else(|| base.to_string())
    }

    /// Bounds of a layer. Groups cover their children; an empty group is a
    /// single pixel at its offset.
    pub(super) fn bounds(&self, id: LayerId) -> Option<Bounds> {
        let layer = self.layer(id)?;
        if !layer.is_group() {
            return Some((layer.offset.0, layer.offset.1, layer.width(), layer.height()));
        }

        let mut union: Option<(i64, i64, i64, i64)> = None;
        for child in self.children(Some(id)) {
            let Some((x, y, w, h)) = self.bounds(child) else {
                continue;
            };
            let (x0, y0) = (x as i64, y as i64);
            let (x1, y1) = (x0 + w as i64, y0 + h as i64);
            union = Some(match union {
                None => (x0, y0, x1, y1),
                Some((ux0, uy0, ux1, uy1)) => (ux0.min(x0), uy0.min(y0), ux1.max(x1), uy1.max(y1)),
            });
        }

        Some(match union {
            Some((x0, y0, x1, y1)) => (x0 as i32, y0 as i32, (x1 - x0) as u32, (y1 - y0) as u32),
            None => (layer.offset.0, layer.offset.1, 1, 1),
        })
    }
}

fn strip_number(name: &str) -> &str {
    match name.rsplit_once(" #") {
        Some((stem, n)) if !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()) => stem,
        _ => name,
    }
}
