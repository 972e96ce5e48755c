//! Geo search: which tracks pass through a bounding box
//!
//! A track matches when at least one of its points lies strictly inside the box. Tracks
//! whose segments merely cross the box, or whose points only touch its edges, do not
//! match.

use crate::{BoundingBox, Result, TrackCatalog, TrackData, TrackIdentity};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Locates the tracks of a catalog that pass through a bounding box
pub trait GeoSearch: Send + Sync {
    /// Scan every track of `catalog` against `bounds`.
    ///
    /// `should_stop` is polled once per track before any work is done for it; once it
    /// returns true the remaining tracks are skipped. `on_progress(1)` is called exactly
    /// once for every track that was actually evaluated, possibly from several threads.
    /// The result holds whatever matched among the evaluated tracks; callers tell a
    /// stopped scan from a completed one by checking their own stop condition.
    fn search(
        &self,
        bounds: &BoundingBox,
        catalog: &TrackCatalog,
        on_progress: &(dyn Fn(usize) + Sync),
        should_stop: &(dyn Fn() -> bool + Sync),
    ) -> HashSet<TrackIdentity>;
}

/// Searches tracks in parallel on a rayon thread pool
#[derive(Debug, Default)]
pub struct ParallelGeoSearch {
    /// Dedicated pool; the global rayon pool is used when None
    pool: Option<rayon::ThreadPool>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl ParallelGeoSearch {
    /// Search on the global rayon pool
    pub fn new() -> Self {
        Self { pool: None }
    }

    /// Search on a dedicated pool of `threads` workers
    pub fn with_threads(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("geo-search-{i}"))
            .build()?;
        Ok(Self { pool: Some(pool) })
    }

    /// True if any point of the track is strictly inside `bounds`
    #[inline]
    pub fn matches(bounds: &BoundingBox, track: &TrackData) -> bool {
        track.points().any(|point| bounds.contains(point))
    }

    fn evaluate(
        bounds: &BoundingBox,
        catalog: &TrackCatalog,
        identity: &TrackIdentity,
        on_progress: &(dyn Fn(usize) + Sync),
        should_stop: &(dyn Fn() -> bool + Sync),
    ) -> bool {
        if should_stop() {
            return false;
        }

        let hit = match catalog.points(identity.id()) {
            Ok(track) => Self::matches(bounds, &track),
            Err(e) => {
                // The catalog was reconfigured while scanning
                tracing::debug!("Track vanished during search: {}", e);
                false
            }
        };
        on_progress(1);
        hit
    }
}

impl GeoSearch for ParallelGeoSearch {
    fn search(
        &self,
        bounds: &BoundingBox,
        catalog: &TrackCatalog,
        on_progress: &(dyn Fn(usize) + Sync),
        should_stop: &(dyn Fn() -> bool + Sync),
    ) -> HashSet<TrackIdentity> {
        #[cfg(feature = "profiling")]
        profiling::scope!("search::parallel");

        let tracks = catalog.list_tracks();
        let total = tracks.len();
        let scan = || -> HashSet<TrackIdentity> {
            tracks
                .into_par_iter()
                .filter(|identity| {
                    Self::evaluate(bounds, catalog, identity, on_progress, should_stop)
                })
                .collect()
        };

        let result = match &self.pool {
            Some(pool) => pool.install(scan),
            None => scan(),
        };
        tracing::debug!("Search matched {} of {} tracks", result.len(), total);
        result
    }
}

/// Thread-safe accumulator of progress deltas
#[derive(Debug, Default)]
pub struct SearchProgress {
    completed: AtomicUsize,
    total: usize,
}

impl SearchProgress {
    pub fn new(total: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
        }
    }

    #[inline]
    pub fn record(&self, delta: usize) {
        self.completed.fetch_add(delta, Ordering::Relaxed);
    }

    #[inline]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Completed fraction in `0.0..=1.0`; 1.0 when there is nothing to do
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.completed() as f64 / self.total as f64).min(1.0)
    }
}

/// Stop predicate that turns true once `timeout` has elapsed from now
pub fn deadline(timeout: Duration) -> impl Fn() -> bool + Send + Sync {
    let end = Instant::now() + timeout;
    move || Instant::now() >= end
}
