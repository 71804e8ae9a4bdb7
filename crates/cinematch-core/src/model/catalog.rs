use std::collections::HashMap;

use super::item::Item;

/// The ordered list of items, plus an exact-title lookup.
///
/// Source order is canonical: item `i` owns row `i` of the similarity
/// matrix. When the same title appears more than once, the first
/// occurrence owns the lookup key.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<Item>,
    by_title: HashMap<String, usize>,
    duplicates: usize,
}

impl Catalog {
    /// Build a catalog from titles in canonical order.
    pub fn from_titles<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut items = Vec::new();
        let mut by_title = HashMap::new();
        let mut duplicates = 0;

        for (index, title) in titles.into_iter().enumerate() {
            let title = title.into();
            if by_title.contains_key(&title) {
                duplicates += 1;
            } else {
                by_title.insert(title.clone(), index);
            }
            items.push(Item::new(index, title));
        }

        Self {
            items,
            by_title,
            duplicates,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    /// Number of entries whose title repeats an earlier entry.
    #[must_use]
    pub const fn duplicate_count(&self) -> usize {
        self.duplicates
    }

    /// Look up an item index by exact, case-sensitive title.
    ///
    /// The caller is responsible for any normalisation of `title`.
    #[must_use]
    pub fn index_of(&self, title: &str) -> Option<usize> {
        self.by_title.get(title).copied()
    }

    /// All titles, sorted ascending.
    #[must_use]
    pub fn sorted_titles(&self) -> Vec<&str> {
        let mut titles: Vec<&str> = self.items.iter().map(|item| item.title.as_str()).collect();
        titles.sort_unstable();
        titles
    }

    /// Sorted titles containing `needle`, ignoring case.
    ///
    /// A blank needle matches everything.
    #[must_use]
    pub fn search(&self, needle: &str) -> Vec<&str> {
        let needle = needle.trim().to_lowercase();
        let titles = self.sorted_titles();
        if needle.is_empty() {
            return titles;
        }
        titles
            .into_iter()
            .filter(|title| title.to_lowercase().contains(&needle))
            .collect()
    }
}
