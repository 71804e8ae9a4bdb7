//! Top-k similarity lookup.
//!
//! Given a query title, rank every other catalog item by its score in the
//! query's matrix row. Ranking is deterministic: scores descend, and equal
//! scores keep ascending catalog order.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{Catalog, SimilarityMatrix};

/// Number of recommendations returned when the caller does not choose.
pub const DEFAULT_K: usize = 10;

/// One ranked neighbour of the query item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub index: usize,
    pub title: String,
    pub score: f32,
}

/// Titles of the `k` items most similar to `query`, best first.
///
/// `query` is trimmed and then matched exactly (case-sensitive). The query
/// item itself is never part of the result. Fewer than `k` titles come back
/// when the catalog is too small.
///
/// # Errors
///
/// [`Error::ItemNotFound`] when the trimmed title is not in the catalog,
/// [`Error::SchemaMismatch`] when the matrix has no row for the item.
pub fn recommend(
    query: &str,
    catalog: &Catalog,
    matrix: &SimilarityMatrix,
    k: usize,
) -> Result<Vec<String>> {
    Ok(recommend_scored(query, catalog, matrix, k)?
        .into_iter()
        .map(|rec| rec.title)
        .collect())
}

/// Same ranking as [`recommend`], keeping each neighbour's index and score.
///
/// # Errors
///
/// See [`recommend`].
pub fn recommend_scored(
    query: &str,
    catalog: &Catalog,
    matrix: &SimilarityMatrix,
    k: usize,
) -> Result<Vec<Recommendation>> {
    let title = query.trim();
    let query_index = catalog.index_of(title).ok_or_else(|| Error::ItemNotFound {
        title: title.to_string(),
    })?;

    let row = matrix.row(query_index).ok_or_else(|| {
        Error::SchemaMismatch(format!(
            "no similarity row for item {query_index} (matrix dimension {})",
            matrix.dim()
        ))
    })?;

    let mut scored: Vec<(usize, f32)> = row.iter().copied().enumerate().collect();
    // Stable: equal scores stay in ascending index order.
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut out = Vec::with_capacity(k.min(scored.len()));
    for (index, score) in scored {
        if out.len() == k {
            break;
        }
        if index == query_index {
            continue;
        }
        // Row length equals catalog length, enforced by Dataset / loader.
        let Some(item) = catalog.get(index) else {
            continue;
        };
        out.push(Recommendation {
            index,
            title: item.title.clone(),
            score,
        });
    }

    Ok(out)
}
