//! Artifact sourcing and dataset loading for cinematch.
//!
//! Resolves the catalog and similarity artifacts to local files (reading
//! them in place, or downloading them once into a path or cache
//! directory), then decodes and memoizes the validated dataset.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod provider;

pub use config::Config;
pub use error::{Error, Result};
pub use fetch::{FetchError, FetchResult, Fetcher, HttpFetcher};
pub use loader::DatasetLoader;
pub use provider::{ArtifactProvider, ArtifactSpec, SourcingStrategy};
