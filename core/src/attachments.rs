use serde::{Deserialize, Serialize};

use crate::document::PolaroidId;

/// Ordered stack of polaroid ids attached to a pin.
///
/// Insertion order is stack order; the last id is the topmost card and the
/// one the inspector hydrates. Membership is set-like (no duplicates) but the
/// ordering is load-bearing, so this is an explicit sequence rather than a
/// set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentStack(Vec<PolaroidId>);

impl AttachmentStack {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_ids(ids: Vec<PolaroidId>) -> Self {
        let mut stack = Self::new();
        for id in ids {
            stack.push_unique(id);
        }
        stack
    }

    /// Appends `id` unless it is already present. Returns whether the stack
    /// changed.
    pub fn push_unique(&mut self, id: PolaroidId) -> bool {
        if self.0.contains(&id) {
            return false;
        }
        self.0.push(id);
        true
    }

    /// Removes `id` wherever it sits in the stack. Returns whether the stack
    /// changed.
    pub fn remove(&mut self, id: &PolaroidId) -> bool {
        let before = self.0.len();
        self.0.retain(|item| item != id);
        self.0.len() != before
    }

    /// The topmost (most recently attached) id.
    pub fn active(&self) -> Option<&PolaroidId> {
        self.0.last()
    }

    pub fn contains(&self, id: &PolaroidId) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PolaroidId> {
        self.0.iter()
    }

    /// Stable key over the ordered id list, used to decide whether a pin's
    /// attachment state changed between subscription updates.
    pub fn signature(&self) -> String {
        let mut key = String::new();
        for (idx, id) in self.0.iter().enumerate() {
            if idx > 0 {
                key.push('|');
            }
            key.push_str(id.as_str());
        }
        key
    }
}

impl From<Vec<PolaroidId>> for AttachmentStack {
    fn from(ids: Vec<PolaroidId>) -> Self {
        Self::from_ids(ids)
    }
}
