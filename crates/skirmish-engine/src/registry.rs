//! A registry mapping small numeric ids to content entries.
//!
//! Wire messages carry only the numeric ids, so every participant must
//! build its registries from the same definitions in the same order for
//! the ids to agree.

use std::collections::HashMap;

use crate::ContentError;

/// A content entry with a human-readable stable id.
pub trait ContentItem {
    fn stable_id(&self) -> &str;
}

/// An append-only table of content entries.
///
/// Numeric ids are assigned in registration order, starting at zero.
#[derive(Debug, Clone)]
pub struct Registry<T> {
    items: Vec<T>,
    by_stable_id: HashMap<String, u32>,
}

// A derived Default would demand `T: Default`, which content types have
// no reason to implement. An empty registry needs nothing from `T`.
impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            by_stable_id: HashMap::new(),
        }
    }
}

impl<T: ContentItem> Registry<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            by_stable_id: HashMap::new(),
        }
    }

    /// Registers an entry and returns its numeric id.
    pub fn register(&mut self, item: T) -> Result<u32, ContentError> {
        let stable_id = item.stable_id().to_string();
        if self.by_stable_id.contains_key(&stable_id) {
            return Err(ContentError::DuplicateId(stable_id));
        }
        let id = self.items.len() as u32;
        self.by_stable_id.insert(stable_id, id);
        self.items.push(item);
        Ok(id)
    }

    pub fn get(&self, id: u32) -> Option<&T> {
        self.items.get(id as usize)
    }

    /// Looks an entry up by its stable id.
    pub fn lookup(&self, stable_id: &str) -> Option<(u32, &T)> {
        let id = *self.by_stable_id.get(stable_id)?;
        Some((id, &self.items[id as usize]))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All entries with their numeric ids, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.items.iter().enumerate().map(|(i, item)| (i as u32, item))
    }
}
