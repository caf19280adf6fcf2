//! Shopping list value type
//!
//! The list is an immutable value: every edit returns a new list and leaves
//! the receiver untouched. The TUI replaces its copy with the returned value
//! on each keypress.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Ordered list of item names. Duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShoppingList {
    items: Vec<String>,
}

impl ShoppingList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new list with `item` appended
    ///
    /// Surrounding whitespace is trimmed. Blank input returns an unchanged copy.
    pub fn add(&self, item: &str) -> Self {
        let item = item.trim();
        debug!(%item, len = self.items.len(), "ShoppingList::add: called");
        let mut items = self.items.clone();
        if item.is_empty() {
            debug!("ShoppingList::add: blank item ignored");
        } else {
            items.push(item.to_string());
        }
        Self { items }
    }

    /// Return a new list without the item at `index`
    ///
    /// An out-of-range index returns an unchanged copy.
    pub fn remove(&self, index: usize) -> Self {
        debug!(index, len = self.items.len(), "ShoppingList::remove: called");
        let mut items = self.items.clone();
        if index < items.len() {
            items.remove(index);
        } else {
            debug!("ShoppingList::remove: index out of range");
        }
        Self { items }
    }

    /// Return an empty list
    pub fn clear(&self) -> Self {
        debug!(len = self.items.len(), "ShoppingList::clear: called");
        Self::new()
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for ShoppingList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), |list, item| list.add(item.as_ref()))
    }
}
