//! Subcommand implementations
//!
//! Results are written to the given writer so they can be captured; progress and logs
//! go to stderr.

use crate::progress;
use crate::settings::{Command, Settings, search_bounds};
use anyhow::Context;
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;
use track_catalog_lib::{
    BoundingBox, GeoSearch, ParallelGeoSearch, SearchProgress, TrackCatalog, TrackIdentity,
    TrackMetrics, deadline,
};

/// One track as printed by the commands
#[derive(Debug, Serialize)]
struct TrackRow<'a> {
    id: &'a str,
    name: &'a str,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    points: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics: Option<TrackMetrics>,
}

impl<'a> TrackRow<'a> {
    fn new(track: &'a TrackIdentity) -> Self {
        Self {
            id: track.id(),
            name: track.name(),
            path: track.path().display().to_string(),
            points: None,
            metrics: None,
        }
    }

    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        write!(out, "{}  {}", self.id, self.name)?;
        if let Some(points) = self.points {
            write!(out, "  {} points", points)?;
        }
        if let Some(metrics) = &self.metrics {
            write!(
                out,
                "  {:.2} km  {:.0} m gain",
                metrics.total_distance_kilometers(),
                metrics.total_elevation_gain_meters
            )?;
        }
        writeln!(out, "  {}", self.path)
    }
}

#[derive(Debug, Serialize)]
struct SearchReport<'a> {
    bounds: BoundingBox,
    cancelled: bool,
    evaluated: usize,
    total: usize,
    tracks: Vec<TrackRow<'a>>,
}

/// Result of a search as seen by the user: a stopped search has no result set
#[derive(Debug)]
pub enum SearchOutcome {
    Completed(Vec<TrackIdentity>),
    Cancelled { evaluated: usize },
}

/// Run `search`, feeding `bar`, and discard partial results if `should_stop` fired
pub fn run_search(
    search: &dyn GeoSearch,
    bounds: &BoundingBox,
    catalog: &TrackCatalog,
    bar: &ProgressBar,
    should_stop: &(dyn Fn() -> bool + Sync),
) -> SearchOutcome {
    let progress = SearchProgress::new(catalog.len());
    let found = search.search(
        bounds,
        catalog,
        &|delta| {
            progress.record(delta);
            bar.inc(delta as u64);
        },
        should_stop,
    );

    if should_stop() {
        tracing::info!(
            "Search stopped after {} of {} tracks",
            progress.completed(),
            progress.total()
        );
        return SearchOutcome::Cancelled {
            evaluated: progress.completed(),
        };
    }

    let mut tracks: Vec<TrackIdentity> = found.into_iter().collect();
    tracks.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.path().cmp(b.path())));
    SearchOutcome::Completed(tracks)
}

/// Configure a catalog from `settings` and execute the selected command
pub fn run(settings: &Settings, out: &mut dyn Write) -> anyhow::Result<()> {
    profiling::scope!("command");
    let catalog = TrackCatalog::new(settings.catalog_config());
    catalog.configure(settings.locations.iter().cloned());

    match &settings.command {
        Command::List { metrics } => {
            list(&catalog, *metrics, settings.threads, settings.json, out)
        }
        Command::Info { id } => info(&catalog, id, settings.json, out),
        Command::Search {
            south,
            west,
            north,
            east,
            timeout_secs,
            no_progress,
        } => {
            let bounds = search_bounds(*south, *west, *north, *east)?;
            let search = if settings.threads == 0 {
                ParallelGeoSearch::new()
            } else {
                ParallelGeoSearch::with_threads(settings.threads)
                    .context("Could not start search threads")?
            };
            let should_stop: Box<dyn Fn() -> bool + Sync> = match timeout_secs {
                Some(secs) => Box::new(deadline(
                    Duration::try_from_secs_f64(*secs).context("Invalid timeout")?,
                )),
                None => Box::new(|| false),
            };
            let bar = if settings.json || *no_progress {
                ProgressBar::hidden()
            } else {
                progress::search_progress(catalog.len() as u64)
            };

            let outcome = run_search(&search, &bounds, &catalog, &bar, should_stop.as_ref());
            write_search(&catalog, &bounds, &outcome, &bar, settings.json, out)
        }
    }
}

/// Metrics of every track, loading tracks in parallel on `threads` workers (0 = one per CPU)
fn load_metrics(
    catalog: &TrackCatalog,
    tracks: &[TrackIdentity],
    threads: usize,
) -> anyhow::Result<Vec<TrackMetrics>> {
    let compute = || {
        tracks
            .par_iter()
            .map(|track| catalog.metrics(track.id()))
            .collect::<Result<Vec<_>, _>>()
    };

    let metrics = if threads == 0 {
        compute()?
    } else {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("track-load-{i}"))
            .build()
            .context("Could not start loader threads")?
            .install(compute)?
    };
    Ok(metrics)
}

fn list(
    catalog: &TrackCatalog,
    with_metrics: bool,
    threads: usize,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let tracks = catalog.list_tracks();
    let mut rows: Vec<TrackRow> = tracks.iter().map(TrackRow::new).collect();
    if with_metrics {
        let metrics = load_metrics(catalog, &tracks, threads)?;
        for (row, metrics) in rows.iter_mut().zip(metrics) {
            row.metrics = Some(metrics);
        }
    }

    if json {
        serde_json::to_writer_pretty(&mut *out, &rows)?;
        writeln!(out)?;
    } else {
        for row in &rows {
            row.write_text(out)?;
        }
        writeln!(out, "{} tracks", rows.len())?;
    }
    Ok(())
}

fn info(catalog: &TrackCatalog, id: &str, json: bool, out: &mut dyn Write) -> anyhow::Result<()> {
    let track = catalog
        .track(id)
        .with_context(|| format!("No track with id {id}"))?;
    let data = catalog.points(id)?;
    let mut row = TrackRow::new(&track);
    row.points = Some(data.len());
    row.metrics = Some(catalog.metrics(id)?);

    if json {
        serde_json::to_writer_pretty(&mut *out, &row)?;
        writeln!(out)?;
    } else {
        row.write_text(out)?;
        if let Some(center) = data.bounding_box().center() {
            writeln!(out, "center {}", center)?;
        }
    }
    Ok(())
}

fn write_search(
    catalog: &TrackCatalog,
    bounds: &BoundingBox,
    outcome: &SearchOutcome,
    bar: &ProgressBar,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let total = catalog.len();
    let (tracks, evaluated, cancelled): (&[TrackIdentity], usize, bool) = match outcome {
        SearchOutcome::Completed(tracks) => {
            progress::finish_success(bar, &format!("{} matching tracks", tracks.len()));
            (tracks.as_slice(), total, false)
        }
        SearchOutcome::Cancelled { evaluated } => {
            progress::finish_cancelled(bar, "cancelled");
            (&[], *evaluated, true)
        }
    };

    if json {
        let report = SearchReport {
            bounds: *bounds,
            cancelled,
            evaluated,
            total,
            tracks: tracks.iter().map(TrackRow::new).collect(),
        };
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
    } else if cancelled {
        writeln!(out, "Search cancelled after {evaluated} of {total} tracks")?;
    } else {
        writeln!(out, "{} of {} tracks pass through the area", tracks.len(), total)?;
        for track in tracks {
            TrackRow::new(track).write_text(out)?;
        }
    }
    Ok(())
}
