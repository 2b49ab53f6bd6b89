use anyhow::{bail, Context, Result};
use futures::{
    channel::oneshot,
    future::{self, Either},
    pin_mut,
    prelude::*,
    stream,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
    time::Instant,
};
use tokio::fs;

use crate::config::Config;
use crate::layout::write_tile;
use crate::tile::Tile;
use crate::wms::{HttpTileSource, TileSource};

/// Outcome of a download run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FetchSummary {
    /// Number of tiles covering the configured area.
    pub total: usize,
    pub fetched: usize,
    /// Tiles already on disk that were left alone.
    pub skipped: usize,
    pub failed: usize,
    /// Tiles never started because the run was interrupted.
    pub cancelled: usize,
}

impl FetchSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.cancelled == 0
    }
}

impl fmt::Display for FetchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} tiles fetched, {} skipped, {} failed",
            self.fetched, self.total, self.skipped, self.failed
        )?;
        if self.cancelled > 0 {
            write!(f, ", {} cancelled", self.cancelled)?;
        }
        Ok(())
    }
}

enum Outcome {
    Fetched,
    Skipped,
}

#[derive(Default)]
struct Counters {
    fetched: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
}

/// Asynchronously fetch the WMS tiles specified in `cfg` and save them
/// to the file system.
///
/// Creates the required directories recursively. Tiles already on disk are
/// skipped unless the configuration says otherwise. Pressing Ctrl-C stops
/// starting new downloads and waits for the running ones, pressing it again
/// aborts those too.
///
/// # Example
/// ```rust,no_run
/// use wms_tile_downloader::{fetch, BoundingBox, Config};
///
/// # #[tokio::main]
/// # async fn main() {
/// let config = Config::builder()
///     .url("https://wms.example.com/ows")
///     .layer("roads")
///     .zooms(vec![9, 10, 11])
///     .bounding_box(BoundingBox::new(20.499903, 52.017401, 20.742137, 52.168715))
///     .output_folder("./tiles")
///     .build()
///     .expect("invalid configuration");
///
/// let summary = fetch(&config).await.expect("failed fetching tiles");
/// println!("{}", summary);
/// # }
/// ```
pub async fn fetch(cfg: &Config) -> Result<FetchSummary> {
    let source =
        HttpTileSource::new(cfg.timeout()).with_context(|| "failed creating HTTP client")?;

    // without signal support the stream ends and the run can't be interrupted
    let interrupts = stream::unfold((), |()| async {
        tokio::signal::ctrl_c().await.ok().map(|()| ((), ()))
    });

    fetch_interruptible(cfg, &source, interrupts).await
}

/// Runs [`fetch_with`] until `interrupts` yields. The first interrupt stops
/// starting new tiles, the second one drops the downloads still running.
async fn fetch_interruptible<S, I>(
    cfg: &Config,
    source: &S,
    interrupts: I,
) -> Result<FetchSummary>
where
    S: TileSource + ?Sized,
    I: Stream<Item = ()>,
{
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let run = fetch_with(cfg, source, stop_rx.map(|_| ()));
    let watch = async move {
        pin_mut!(interrupts);
        if interrupts.next().await.is_some() {
            warn!("interrupted, waiting for running downloads to finish (press Ctrl-C again to abort)");
            let _ = stop_tx.send(());

            if interrupts.next().await.is_some() {
                return;
            }
        }
        future::pending::<()>().await
    };

    pin_mut!(run, watch);
    match future::select(run, watch).await {
        Either::Left((summary, _)) => summary,
        Either::Right(((), _)) => bail!("interrupted twice, running downloads were aborted"),
    }
}

/// Like [`fetch`], but with an explicit tile source and a `shutdown` future
/// that stops the run once it completes.
///
/// At most [`Config::concurrency`] tiles are in flight at any time. A tile
/// that fails is logged and counted, the remaining tiles are still fetched.
pub async fn fetch_with<S, F>(cfg: &Config, source: &S, shutdown: F) -> Result<FetchSummary>
where
    S: TileSource + ?Sized,
    F: Future<Output = ()>,
{
    let output_folder = cfg.output_folder();
    if output_folder.exists() && !output_folder.is_dir() {
        bail!("output {} must be a directory", output_folder.display());
    }
    fs::create_dir_all(output_folder)
        .await
        .context("failed to create root output directory")?;

    let tiles = cfg.tiles();
    let total = tiles.len();
    info!(
        "{} tiles to fetch from layer {} at zoom levels {:?}",
        total,
        cfg.layer(),
        cfg.zooms()
    );

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:60.cyan/blue} {pos:>7}/{len:7} ETA: {eta} {msg}")
            .context("invalid progress bar template")?
            .progress_chars("##-"),
    );

    let started = Instant::now();
    let counters = Counters::default();

    stream::iter(tiles)
        .take_until(shutdown)
        .for_each_concurrent(cfg.concurrency(), |tile| {
            let (pb, counters) = (&pb, &counters);

            async move {
                match fetch_tile(cfg, source, tile).await {
                    Ok(Outcome::Fetched) => counters.fetched.fetch_add(1, Ordering::Relaxed),
                    Ok(Outcome::Skipped) => counters.skipped.fetch_add(1, Ordering::Relaxed),
                    Err(e) => {
                        pb.suspend(|| warn!("failed fetching tile {}: {:#}", tile, e));
                        counters.failed.fetch_add(1, Ordering::Relaxed)
                    }
                };
                pb.inc(1);
            }
        })
        .await;

    pb.finish_and_clear();

    let fetched = counters.fetched.into_inner();
    let skipped = counters.skipped.into_inner();
    let failed = counters.failed.into_inner();
    let summary = FetchSummary {
        total,
        fetched,
        skipped,
        failed,
        cancelled: total - fetched - skipped - failed,
    };
    info!("{} in {:.1?}", summary, started.elapsed());

    Ok(summary)
}

async fn fetch_tile<S>(cfg: &Config, source: &S, tile: Tile) -> Result<Outcome>
where
    S: TileSource + ?Sized,
{
    let output_file = cfg.tile_path(&tile)?;

    // if the tile's already been downloaded, skip it
    if !cfg.fetch_existing() && output_file.exists() {
        debug!("tile {} exists at {}", tile, output_file.display());
        return Ok(Outcome::Skipped);
    }

    let url = cfg.get_map().tile_url(&tile);
    debug!("fetching tile {} from {}", tile, url);

    let body = source
        .fetch(&url)
        .await
        .with_context(|| format!("failed fetching {}", url))?;

    write_tile(&output_file, &body)
        .await
        .with_context(|| format!("failed writing {}", output_file.display()))?;

    Ok(Outcome::Fetched)
}
