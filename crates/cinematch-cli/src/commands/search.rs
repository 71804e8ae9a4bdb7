use anyhow::{Context, Result};
use cinematch_artifacts::{Config, DatasetLoader};

/// List catalog titles containing `query` (any case), sorted.
pub async fn run_search(config: &Config, query: Option<&str>, limit: Option<usize>) -> Result<()> {
    let loader = DatasetLoader::from_config(config).context("Failed to create HTTP client")?;
    let dataset = loader.load().await.context("Failed to load dataset")?;

    let matches = dataset.catalog().search(query.unwrap_or_default());
    if matches.is_empty() {
        println!("No titles match {:?}", query.unwrap_or_default());
        return Ok(());
    }

    let shown = limit.unwrap_or(matches.len()).min(matches.len());
    for title in &matches[..shown] {
        println!("{title}");
    }
    if shown < matches.len() {
        println!("... and {} more", matches.len() - shown);
    }

    Ok(())
}
