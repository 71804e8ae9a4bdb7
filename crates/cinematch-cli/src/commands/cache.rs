use anyhow::{Context, Result};
use cinematch_artifacts::{ArtifactProvider, Config};

/// Show the target path of each artifact and whether it is present.
pub fn show_paths(config: &Config) -> Result<()> {
    let provider = ArtifactProvider::from_config(config).context("Failed to create HTTP client")?;

    println!("Strategy:  {}", provider.strategy());
    println!("Cache dir: {}\n", provider.cache_dir().display());

    for spec in [config.catalog_spec(), config.similarity_spec()] {
        let path = provider.target_path(&spec)?;
        let state = if path.is_file() { "present" } else { "missing" };
        println!("  {:<10} {} ({})", spec.name, path.display(), state);
    }

    Ok(())
}

/// Delete downloaded artifacts.
pub async fn clear(config: &Config) -> Result<()> {
    let provider = ArtifactProvider::from_config(config).context("Failed to create HTTP client")?;

    if !provider.strategy().downloads() {
        println!("Nothing to clear: the local_only strategy never downloads.");
        return Ok(());
    }

    for spec in [config.catalog_spec(), config.similarity_spec()] {
        if provider.evict(&spec).await? {
            println!("✓ Removed {}", spec.name);
        } else {
            println!("  {} was not cached", spec.name);
        }
    }

    Ok(())
}
