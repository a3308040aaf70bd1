use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::backend::{IncludeFields, LanceBackend};
use crate::config::{Config, get_config_dir};
use crate::embeddings::OllamaClient;
use crate::peek::Peeker;
use crate::table::DataTable;

/// List the collections stored in a persistence directory
#[inline]
pub async fn list_collections(path: &Path) -> Result<()> {
    let peeker = open_peeker(path).await?;
    let collections = peeker.collections().await?;

    if collections.is_empty() {
        println!("No collections found in {}", path.display());
        return Ok(());
    }

    println!(
        "Collections in {} ({} total):",
        path.display(),
        collections.len()
    );
    for name in &collections {
        println!("  {}", name);
    }

    Ok(())
}

/// Show the records of one collection as a flat table
#[inline]
pub async fn show_collection(
    path: &Path,
    collection: &str,
    include: IncludeFields,
    json: bool,
) -> Result<()> {
    info!("Showing collection {} from {}", collection, path.display());

    let peeker = open_peeker(path).await?;
    let table = peeker.collection_table(collection, include).await?;

    print_table(&table, json)?;
    if !json {
        println!();
        println!("{} records in {}", table.row_count(), collection);
    }

    Ok(())
}

/// Run a similarity query against one collection and show the matches
#[inline]
pub async fn run_query(
    path: &Path,
    collection: &str,
    text: &str,
    k: usize,
    include: IncludeFields,
    json: bool,
) -> Result<()> {
    info!(
        "Querying collection {} from {} for up to {} matches",
        collection,
        path.display(),
        k
    );

    let peeker = open_peeker(path).await?;
    let table = peeker.query_table(text, collection, k, include).await?;

    if table.is_empty() && !json {
        println!("No matches in {}", collection);
        return Ok(());
    }

    print_table(&table, json)?;

    Ok(())
}

/// Show where configuration is read from, the effective settings, and
/// whether the embedding service is reachable
#[inline]
pub fn show_config() -> Result<()> {
    let config_dir = get_config_dir()?;
    let config = Config::load(&config_dir).context("Failed to load configuration")?;

    println!(
        "Configuration file: {}",
        config_dir.join("config.toml").display()
    );
    println!("Ollama endpoint: {}", config.ollama.ollama_url()?);
    println!("Ollama model: {}", config.ollama.model);
    println!();

    match OllamaClient::new(config.ollama) {
        Ok(client) => match client.health_check() {
            Ok(()) => println!("✅ Ollama: Connected"),
            Err(e) => println!("❌ Ollama: Failed health check - {}", e),
        },
        Err(e) => println!("❌ Ollama: Invalid configuration - {}", e),
    }

    Ok(())
}

async fn open_peeker(path: &Path) -> Result<Peeker<LanceBackend>> {
    let config_dir = get_config_dir()?;
    let config = Config::load(config_dir).context("Failed to load configuration")?;

    let peeker = Peeker::open(path, &config)
        .await
        .with_context(|| format!("Failed to open persistence directory {}", path.display()))?;
    Ok(peeker)
}

fn print_table(table: &DataTable, json: bool) -> Result<()> {
    if json {
        let rendered =
            serde_json::to_string_pretty(table).context("Failed to serialize table to JSON")?;
        println!("{}", rendered);
    } else {
        println!("{}", table.render());
    }
    Ok(())
}
