//! Core data model for cinematch.
//!
//! This crate defines the catalog, the precomputed similarity matrix, the
//! JSON artifact decoders, and the deterministic top-k similarity lookup
//! that sits on top of them.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod codec;
pub mod error;
pub mod model;
pub mod recommend;

pub use error::{Error, Result};
pub use model::{Catalog, Dataset, Item, SimilarityMatrix};
pub use recommend::{recommend, recommend_scored, Recommendation, DEFAULT_K};
