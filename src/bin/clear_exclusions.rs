//! Clears a viewer's hidden-notification set so every non-deleted
//! notification shows up again on the next load.

use anyhow::{Context, Result, bail};
use clap::Parser;
use notifications::{
    config::{ConfigLoader, VisibilityBackend},
    db,
    visibility::{DatabaseVisibilityStore, VisibilityStore, viewer_key},
};

#[derive(Debug, Parser)]
#[command(about = "Clear the hidden-notification set of one viewer")]
struct Args {
    /// Viewer id as sent in X-Viewer-Id
    #[arg(long)]
    viewer: String,

    /// Override the configured visibility namespace
    #[arg(long)]
    namespace: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigLoader::new()
        .load()
        .context("loading configuration")?;

    if config.aggregator.visibility_backend == VisibilityBackend::Memory {
        bail!("visibility backend is 'memory'; exclusions live in the running process only");
    }

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;

    let namespace = args
        .namespace
        .unwrap_or_else(|| config.aggregator.visibility_namespace.clone());
    let key = viewer_key(&namespace, &args.viewer);

    let removed = DatabaseVisibilityStore::new(db)
        .clear(&key)
        .await
        .with_context(|| format!("clearing exclusions for {}", key))?;

    println!("Cleared {} hidden notification(s) for {}.", removed, key);

    Ok(())
}
