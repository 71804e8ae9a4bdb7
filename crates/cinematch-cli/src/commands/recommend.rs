use std::process::ExitCode;

use anyhow::{Context, Result};
use cinematch_artifacts::{Config, DatasetLoader};
use cinematch_core::Error as DatasetError;

/// Print the `k` titles most similar to `title`.
///
/// An unknown title is a normal outcome: it prints a message and yields a
/// failing exit code instead of an error.
pub async fn run_recommend(
    config: &Config,
    title: &str,
    k: usize,
    show_scores: bool,
    json: bool,
) -> Result<ExitCode> {
    log::debug!("Recommending {} titles for {:?}", k, title);

    let loader = DatasetLoader::from_config(config).context("Failed to create HTTP client")?;
    let dataset = loader.load().await.context("Failed to load dataset")?;

    let recommendations = match dataset.recommend_scored(title, k) {
        Ok(recs) => recs,
        Err(DatasetError::ItemNotFound { title }) => {
            eprintln!("{}", not_found_message(&title));
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&recommendations)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("Top {} titles to watch after {}:\n", recommendations.len(), title.trim());
    for (rank, rec) in recommendations.iter().enumerate() {
        if show_scores {
            println!("  {:>2}. {}  ({:.4})", rank + 1, rec.title, rec.score);
        } else {
            println!("  {:>2}. {}", rank + 1, rec.title);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// What the user sees when a title has no exact match.
fn not_found_message(title: &str) -> String {
    format!(
        "Movie not found in database.\n\nNo title is exactly {title:?}. \
Run `cinematch search <part of the title>` to find the exact spelling."
    )
}
