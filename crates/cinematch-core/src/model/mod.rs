mod catalog;
mod dataset;
mod item;
mod matrix;

pub use catalog::Catalog;
pub use dataset::Dataset;
pub use item::Item;
pub use matrix::SimilarityMatrix;
