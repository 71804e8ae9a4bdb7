pub mod cache;
pub mod config;
pub mod fetch;
pub mod recommend;
pub mod search;

pub use fetch::run_fetch;
pub use recommend::run_recommend;
pub use search::run_search;
