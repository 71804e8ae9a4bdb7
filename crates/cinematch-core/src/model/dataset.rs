use super::{Catalog, SimilarityMatrix};
use crate::error::{Error, Result};
use crate::recommend::{self, Recommendation};

/// A catalog paired with its similarity matrix, validated to line up.
///
/// Immutable once built; share it behind an `Arc` across any number of
/// concurrent queries.
#[derive(Debug, Clone)]
pub struct Dataset {
    catalog: Catalog,
    matrix: SimilarityMatrix,
}

impl Dataset {
    /// Pair a catalog with a matrix, failing if their sizes disagree.
    pub fn new(catalog: Catalog, matrix: SimilarityMatrix) -> Result<Self> {
        if matrix.dim() != catalog.len() {
            return Err(Error::SchemaMismatch(format!(
                "similarity matrix is {dim}x{dim} but the catalog has {} items",
                catalog.len(),
                dim = matrix.dim()
            )));
        }
        Ok(Self { catalog, matrix })
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn matrix(&self) -> &SimilarityMatrix {
        &self.matrix
    }

    /// Titles of the `k` items most similar to `query`.
    pub fn recommend(&self, query: &str, k: usize) -> Result<Vec<String>> {
        recommend::recommend(query, &self.catalog, &self.matrix, k)
    }

    /// Like [`Dataset::recommend`], keeping index and score.
    pub fn recommend_scored(&self, query: &str, k: usize) -> Result<Vec<Recommendation>> {
        recommend::recommend_scored(query, &self.catalog, &self.matrix, k)
    }
}
