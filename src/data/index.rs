use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::Serialize;

/// Records keyed by an exact, case-sensitive string code.
pub trait Coded {
    fn code(&self) -> &str;
}

/// An ordered collection with a code → position index.
///
/// Order is the source order and is what list operations return. When two
/// records share a code the index points at the first one; the later record
/// is still listed but can't be looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indexed<T> {
    items: Vec<T>,
    positions: HashMap<String, usize>,
}

impl<T: Coded> Indexed<T> {
    pub fn new(items: Vec<T>) -> Self {
        let mut indexed = Self {
            items,
            positions: HashMap::new(),
        };
        indexed.reindex();
        indexed
    }

    fn reindex(&mut self) {
        self.positions.clear();
        for (i, item) in self.items.iter().enumerate() {
            match self.positions.entry(item.code().to_string()) {
                Entry::Vacant(e) => {
                    e.insert(i);
                }
                Entry::Occupied(e) => {
                    warn!("duplicate code {:?} at position {}; keeping {}", e.key(), i, e.get())
                }
            }
        }
    }

    pub fn all(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.positions.contains_key(code)
    }

    pub fn find(&self, code: &str) -> Option<&T> {
        self.positions.get(code).map(|&i| &self.items[i])
    }

    /// Mutable access to the record for `code`. The closure must not change
    /// the record's code; use [`Indexed::update`] for that.
    pub fn find_mut(&mut self, code: &str) -> Option<&mut T> {
        let i = *self.positions.get(code)?;
        Some(&mut self.items[i])
    }

    pub fn push(&mut self, item: T) {
        if let Entry::Vacant(e) = self.positions.entry(item.code().to_string()) {
            e.insert(self.items.len());
        }
        self.items.push(item);
    }

    /// Applies `f` to the record for `code`, reindexing afterwards so a
    /// changed code is picked up.
    pub fn update<F>(&mut self, code: &str, f: F) -> Option<&T>
    where
        F: FnOnce(&mut T),
    {
        let i = *self.positions.get(code)?;
        f(&mut self.items[i]);
        if self.items[i].code() != code {
            self.reindex();
        }
        Some(&self.items[i])
    }

    pub fn remove(&mut self, code: &str) -> Option<T> {
        let i = *self.positions.get(code)?;
        let item = self.items.remove(i);
        self.reindex();
        Some(item)
    }
}

impl<T: Coded> Default for Indexed<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: Coded> From<Vec<T>> for Indexed<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

impl<T: Serialize> Serialize for Indexed<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.items.serialize(serializer)
    }
}
