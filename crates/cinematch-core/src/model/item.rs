use serde::{Deserialize, Serialize};
use std::fmt;

/// A single catalog entry.
///
/// `index` is the entry's 0-based position in the catalog artifact and is
/// the row/column it owns in the similarity matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    pub index: usize,
    pub title: String,
}

impl Item {
    #[must_use]
    pub fn new(index: usize, title: impl Into<String>) -> Self {
        Self {
            index,
            title: title.into(),
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}
