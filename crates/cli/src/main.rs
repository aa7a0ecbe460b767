//! update-products entry point.
//!
//! Crawls a range of product codes against the support site, or merges another
//! database into the main one with `--merge`. Logging goes to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use macmodels_client::{SupportClient, SupportConfig};
use macmodels_core::config::AppConfig;
use macmodels_core::{Crawler, IdRange, merge_file, store};
use tracing_subscriber::EnvFilter;

mod args;

use args::Args;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = AppConfig::load_with(&args).context("invalid configuration")?;

    let mut db = store::load(&config.database)?;
    tracing::info!(path = %config.database.display(), count = db.len(), "database loaded");

    if let Some(other) = &args.merge {
        merge_file(&mut db, &config.database, other)?;
        return Ok(());
    }

    let range = IdRange::parse(&args.start, &args.end)?;
    let client = SupportClient::new(SupportConfig::from(&config))?;
    let mut crawler = Crawler::new(db, &config.database, client, config.crawl_settings());

    let finished = tokio::select! {
        result = crawler.run(&range) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    match finished {
        Some(result) => {
            result?;
        }
        None => {
            tracing::warn!("interrupted, saving database");
            let written = crawler.flush()?;
            tracing::info!(path = %written.display(), "database saved");
        }
    }

    Ok(())
}
