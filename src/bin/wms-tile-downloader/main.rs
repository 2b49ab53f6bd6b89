mod args;
mod validators;

use anyhow::{Context, Result};
use args::Args;
use env_logger::Builder;
use std::{env, process};
use wms_tile_downloader::fetch;

/// Rough size of one tile, used for the dry run estimate.
const APPROX_TILE_BYTES: f64 = 10_000f64;

fn init_logger(loglevel: Option<&str>) {
    let mut builder = Builder::new();
    builder.format_timestamp_millis();

    let rust_log_env = env::var("RUST_LOG");
    let filters = match (loglevel, rust_log_env.as_deref()) {
        (None, Ok(rust_log)) => rust_log,
        (Some("debug"), _) => "debug,hyper=info,reqwest=info",
        (loglevel, _) => loglevel.unwrap_or("info"),
    };
    builder.parse_filters(filters);

    builder.init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.loglevel.as_deref());

    let config = args.config().context("invalid configuration")?;

    if args.dry_run {
        let tile_count = config.tiles().len();

        eprintln!(
            "would download {} tiles (approx {}, assuming 10 kb per tile)",
            tile_count,
            pretty_bytes::converter::convert((tile_count as f64) * APPROX_TILE_BYTES)
        );

        return Ok(());
    }

    let summary = fetch(&config).await?;
    if !summary.is_success() {
        process::exit(1);
    }

    Ok(())
}
