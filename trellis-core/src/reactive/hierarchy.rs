//! Frame Hierarchy
//!
//! A frame created while another frame is executing becomes its child. The
//! hierarchy keeps two transitive adjacency maps keyed by [`FrameId`]:
//! ancestors (frame -> every frame above it) and descendants (frame -> every
//! frame below it). The two maps are inverses of each other, and since links
//! are only ever made along the live call stack they cannot form a cycle.

use std::collections::HashMap;

use indexmap::IndexSet;
use smallvec::SmallVec;

use super::FrameId;

#[derive(Debug, Default)]
pub(crate) struct Hierarchy {
    ancestors: HashMap<FrameId, IndexSet<FrameId>>,
    descendants: HashMap<FrameId, IndexSet<FrameId>>,
}

impl Hierarchy {
    /// Record `frame` as a child of `parent` (or as top-level).
    ///
    /// The frame becomes a descendant of the parent and of every ancestor of
    /// the parent.
    pub(crate) fn link(&mut self, frame: FrameId, parent: Option<FrameId>) {
        let mut chain: SmallVec<[FrameId; 8]> = SmallVec::new();
        if let Some(parent) = parent {
            chain.push(parent);
            if let Some(above) = self.ancestors.get(&parent) {
                chain.extend(above.iter().copied());
            }
        }

        for &ancestor in &chain {
            self.descendants.entry(ancestor).or_default().insert(frame);
        }
        self.ancestors.insert(frame, chain.into_iter().collect());
    }

    #[cfg(test)]
    pub(crate) fn ancestors(&self, frame: FrameId) -> Option<&IndexSet<FrameId>> {
        self.ancestors.get(&frame)
    }

    #[cfg(test)]
    pub(crate) fn descendants(&self, frame: FrameId) -> Option<&IndexSet<FrameId>> {
        self.descendants.get(&frame)
    }

    /// Add `frame` to `batch` unless one of its ancestors is already there.
    ///
    /// When the frame is added, any of its descendants already in the batch
    /// are dropped: re-running the frame recreates them.
    pub(crate) fn ensure_ancestor(&self, batch: &mut IndexSet<FrameId>, frame: FrameId) {
        let covered = self
            .ancestors
            .get(&frame)
            .is_some_and(|ancestors| ancestors.iter().any(|ancestor| batch.contains(ancestor)));
        if covered {
            return;
        }

        batch.insert(frame);

        if let Some(descendants) = self.descendants.get(&frame) {
            batch.retain(|id| !descendants.contains(id));
        }
    }

    /// Detach every descendant of `frame` from the hierarchy.
    ///
    /// The descendants are removed from the descendant sets of `frame`'s
    /// ancestors and lose their own entries. Returns the detached set, or
    /// `None` if the frame never had children.
    pub(crate) fn prune(&mut self, frame: FrameId) -> Option<IndexSet<FrameId>> {
        let descendants = self.descendants.remove(&frame)?;

        if let Some(ancestors) = self.ancestors.get(&frame) {
            for ancestor in ancestors {
                if let Some(set) = self.descendants.get_mut(ancestor) {
                    set.retain(|id| !descendants.contains(id));
                }
            }
        }

        for id in &descendants {
            self.ancestors.remove(id);
            self.descendants.remove(id);
        }

        Some(descendants)
    }

    /// Number of frames with an ancestor entry, i.e. every linked frame.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.ancestors.len()
    }
}
