use crate::error::{Error, Result};

/// A dense, square similarity matrix stored row-major.
///
/// Entry `(i, j)` scores how similar item `j` is to item `i`; higher is
/// more similar. Symmetry is not assumed: queries only ever read row `i`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimilarityMatrix {
    dim: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    /// Build a matrix from rows, rejecting anything that is not square.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let dim = rows.len();
        let mut values = Vec::with_capacity(dim * dim);

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != dim {
                return Err(Error::SchemaMismatch(format!(
                    "similarity row {i} has {} columns, expected {dim}",
                    row.len()
                )));
            }
            values.extend(row);
        }

        Ok(Self { dim, values })
    }

    /// Number of rows (and columns).
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// Row `i`, or `None` when out of range.
    #[must_use]
    pub fn row(&self, i: usize) -> Option<&[f32]> {
        if i >= self.dim {
            return None;
        }
        let start = i * self.dim;
        self.values.get(start..start + self.dim)
    }

    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        self.row(i).and_then(|row| row.get(j).copied())
    }
}
