//! Decoding of the catalog and similarity artifacts.
//!
//! Both artifacts are JSON. The catalog is an array of records with a
//! `Title` column (other columns are ignored):
//! ```json
//! [{"Title": "Dick Johnson Is Dead", "Type": "Movie"}, {"Title": "Blood & Water"}]
//! ```
//! The similarity matrix is an array of rows:
//! ```json
//! [[1.0, 0.02], [0.02, 1.0]]
//! ```
//! Files ending in `.gz` are gunzipped on the fly.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::{Catalog, Dataset, SimilarityMatrix};

pub const CATALOG_ARTIFACT: &str = "catalog";
pub const SIMILARITY_ARTIFACT: &str = "similarity";

#[derive(Debug, Deserialize)]
struct CatalogRecord {
    #[serde(rename = "Title")]
    title: String,
}

/// Decode a catalog from a JSON reader.
pub fn read_catalog(reader: impl Read) -> Result<Catalog> {
    let records: Vec<CatalogRecord> = serde_json::from_reader(reader)
        .map_err(|e| Error::corrupt(CATALOG_ARTIFACT, e))?;
    let catalog = Catalog::from_titles(records.into_iter().map(|r| r.title));

    if catalog.duplicate_count() > 0 {
        log::warn!(
            "Catalog has {} duplicate titles; the first occurrence of each is used",
            catalog.duplicate_count()
        );
    }
    Ok(catalog)
}

/// Decode a similarity matrix from a JSON reader.
///
/// A ragged or non-square payload is a [`Error::SchemaMismatch`].
pub fn read_matrix(reader: impl Read) -> Result<SimilarityMatrix> {
    let rows: Vec<Vec<f32>> = serde_json::from_reader(reader)
        .map_err(|e| Error::corrupt(SIMILARITY_ARTIFACT, e))?;
    SimilarityMatrix::from_rows(rows)
}

/// Read and decode a catalog file.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    read_catalog(open(CATALOG_ARTIFACT, path)?)
}

/// Read and decode a similarity matrix file.
pub fn load_matrix(path: &Path) -> Result<SimilarityMatrix> {
    read_matrix(open(SIMILARITY_ARTIFACT, path)?)
}

/// Read both artifacts and validate that they line up.
pub fn load_dataset(catalog_path: &Path, similarity_path: &Path) -> Result<Dataset> {
    let catalog = load_catalog(catalog_path)?;
    let matrix = load_matrix(similarity_path)?;
    log::info!(
        "Decoded {} catalog items and a {}x{} similarity matrix",
        catalog.len(),
        matrix.dim(),
        matrix.dim()
    );
    Dataset::new(catalog, matrix)
}

fn open(artifact: &str, path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path)
        .map_err(|e| Error::corrupt(artifact, format!("{}: {e}", path.display())))?;
    let reader = BufReader::new(file);

    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(GzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}
