use anyhow::Result;
use cinematch_artifacts::{config, Config};

/// Show the current effective configuration.
pub fn show_config(config: &Config) {
    println!("Current Configuration");
    println!("=====================\n");

    println!("Config file: {}", config::config_file_path().display());

    let exists = config::config_file_path().exists();
    println!(
        "File exists: {}\n",
        if exists { "yes" } else { "no (using defaults)" }
    );

    println!("Settings:");
    println!("  strategy: {}", config.strategy);
    println!("  cache_dir: {}", config.effective_cache_dir().display());
    println!("  catalog_path: {}", config.catalog_path.display());
    println!("  similarity_path: {}", config.similarity_path.display());
    println!(
        "  catalog_remote_id: {}",
        config.catalog_remote_id.as_deref().unwrap_or("<not set>")
    );
    println!(
        "  similarity_remote_id: {}",
        config.similarity_remote_id.as_deref().unwrap_or("<not set>")
    );
    println!("  remote_url_template: {}", config.remote_url_template);
    println!("  request_timeout_secs: {}", config.request_timeout_secs);
    println!("  download_retries: {}", config.download_retries);

    println!("\nPriority: CLI args > ENV vars (CINEMATCH_*) > Config file > Defaults");
}

const KEYS: &str = "strategy, cache_dir, catalog_path, similarity_path, catalog_remote_id, \
similarity_remote_id, remote_url_template, request_timeout_secs, download_retries";

/// Print a single config value.
pub fn get_config(config: &Config, key: &str) -> Result<()> {
    let not_set = || String::from("<not set>");
    let value = match key {
        "strategy" => config.strategy.to_string(),
        "cache_dir" => config.effective_cache_dir().display().to_string(),
        "catalog_path" => config.catalog_path.display().to_string(),
        "similarity_path" => config.similarity_path.display().to_string(),
        "catalog_remote_id" => config.catalog_remote_id.clone().unwrap_or_else(not_set),
        "similarity_remote_id" => config.similarity_remote_id.clone().unwrap_or_else(not_set),
        "remote_url_template" => config.remote_url_template.clone(),
        "request_timeout_secs" => config.request_timeout_secs.to_string(),
        "download_retries" => config.download_retries.to_string(),
        _ => anyhow::bail!("Unknown config key: {}\n\nValid keys: {}", key, KEYS),
    };
    println!("{value}");
    Ok(())
}

/// Show the config file path.
pub fn show_path() {
    println!("{}", config::config_file_path().display());
}

/// Show example configuration.
pub fn show_example() {
    print!("{}", config::example_config());
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure cinematch.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
