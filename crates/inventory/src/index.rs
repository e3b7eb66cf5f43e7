//! Case-insensitive product lookup over case-sensitive stock keys.

use std::collections::HashMap;

use crate::reconcile::StockLevels;

/// Secondary index: lowercased product name → canonical stored key.
///
/// Stored keys keep the casing they were created with; user input is matched
/// against them without regard to case. When two stored keys differ only by
/// case (possible in hand-edited files) the lexicographically first one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductIndex {
    by_folded: HashMap<String, String>,
}

impl ProductIndex {
    pub fn build(stock: &StockLevels) -> Self {
        let mut index = Self::default();
        for key in stock.keys() {
            index.by_folded.entry(fold(key)).or_insert_with(|| key.clone());
        }
        index
    }

    /// Canonical stored key for `name`, if any key matches case-insensitively.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.by_folded.get(&fold(name)).map(String::as_str)
    }

    pub fn insert(&mut self, key: &str) {
        self.by_folded
            .entry(fold(key))
            .or_insert_with(|| key.to_string());
    }

    pub fn remove(&mut self, key: &str) {
        self.by_folded.remove(&fold(key));
    }

    pub fn len(&self) -> usize {
        self.by_folded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_folded.is_empty()
    }
}

fn fold(name: &str) -> String {
    name.to_lowercase()
}
