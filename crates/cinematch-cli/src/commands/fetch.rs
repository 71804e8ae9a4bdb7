use anyhow::{Context, Result};
use cinematch_artifacts::{ArtifactProvider, Config};

/// Resolve both artifacts to local files, downloading what is missing.
pub async fn run_fetch(config: &Config, force: bool) -> Result<()> {
    let provider = ArtifactProvider::from_config(config).context("Failed to create HTTP client")?;

    println!("Strategy: {}", provider.strategy());

    for spec in [config.catalog_spec(), config.similarity_spec()] {
        if force && provider.evict(&spec).await? {
            log::info!("Discarded cached {} before refetch", spec.name);
            println!("  discarded cached {}", spec.name);
        }
        let path = provider
            .resolve(&spec)
            .await
            .with_context(|| format!("Failed to resolve {} artifact", spec.name))?;
        println!("  {:<10} {}", spec.name, path.display());
    }

    Ok(())
}
