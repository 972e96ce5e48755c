//! TrackCatalog - Registry of discovered tracks with lazily loaded, memoized contents
//!
//! Discovery only records identities. Track samples are parsed on first request and
//! metrics are computed on first request, each at most once per track, even when many
//! threads ask at the same time.
//!
//! Every configuration produces a fresh, immutable [`Generation`] of entries. Each entry
//! owns its own `OnceLock` cells, so a slow parse of one track never blocks access to
//! another. Reconfiguring swaps in a new generation; readers holding the old one finish
//! against it undisturbed.

use crate::{
    BoundingBox, CatalogError, GeoPoint, GpxDiscovery, GpxParser, Result, TrackDiscovery,
    TrackMetrics, TrackParser, TrackPoint,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// Configuration for track discovery
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// File extension of track files, matched case-insensitively. Default: `gpx`
    pub file_extension: String,
    /// Follow symbolic links while walking locations. Default: false
    pub follow_links: bool,
    /// Maximum directory depth below each location (None = unlimited)
    pub max_depth: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file_extension: "gpx".to_string(),
            follow_links: false,
            max_depth: None,
        }
    }
}

/// Stable identity of one discovered track.
///
/// Only the `id` takes part in equality and hashing.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackIdentity {
    id: String,
    name: String,
    path: PathBuf,
}

impl TrackIdentity {
    fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            path,
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name, derived from the file name
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PartialEq for TrackIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TrackIdentity {}

impl Hash for TrackIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Outcome of loading a track file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LoadStatus {
    Loaded,
    /// The file could not be read or parsed; the track presents as empty
    Unreadable,
}

/// Raw samples of one track, immutable once loaded
#[derive(Debug, Clone, PartialEq)]
pub struct TrackData {
    samples: Vec<TrackPoint>,
    status: LoadStatus,
}

impl TrackData {
    pub(crate) fn loaded(samples: Vec<TrackPoint>) -> Self {
        Self {
            samples,
            status: LoadStatus::Loaded,
        }
    }

    fn unreadable() -> Self {
        Self {
            samples: Vec::new(),
            status: LoadStatus::Unreadable,
        }
    }

    #[inline]
    pub fn samples(&self) -> &[TrackPoint] {
        &self.samples
    }

    /// Positions in track order
    #[inline]
    pub fn points(&self) -> impl ExactSizeIterator<Item = GeoPoint> + '_ {
        self.samples.iter().map(|s| s.point)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points_seq(self.points())
    }
}

/// Summary of the current catalog state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CatalogInfo {
    /// Number of discovered tracks
    pub track_count: usize,
    /// Tracks whose contents have been loaded so far
    pub loaded_count: usize,
    /// Loaded tracks that turned out unreadable
    pub unreadable_count: usize,
}

/// One track with its single-assignment caches
struct TrackEntry {
    identity: TrackIdentity,
    data: OnceLock<Arc<TrackData>>,
    metrics: OnceLock<TrackMetrics>,
}

/// Immutable identity set built by one `configure` call
#[derive(Default)]
struct Generation {
    locations: Vec<String>,
    /// Entries in discovery order
    entries: Vec<TrackEntry>,
    index: HashMap<String, usize>,
}

impl Generation {
    fn entry(&self, id: &str) -> Result<&TrackEntry> {
        self.index
            .get(id)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| CatalogError::UnknownTrack(id.to_string()))
    }
}

/// Thread-safe catalog of tracks found under a set of locations
///
/// Share it between threads behind an `Arc`; all methods take `&self`.
pub struct TrackCatalog {
    config: Config,
    parser: Arc<dyn TrackParser>,
    discovery: Arc<dyn TrackDiscovery>,
    generation: RwLock<Arc<Generation>>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl TrackCatalog {
    /// Create an empty catalog reading GPX files from disk
    pub fn new(config: Config) -> Self {
        let discovery = GpxDiscovery::new(&config);
        Self::with_collaborators(config, Arc::new(GpxParser), Arc::new(discovery))
    }

    /// Create an empty catalog with custom parsing and discovery
    pub fn with_collaborators(
        config: Config,
        parser: Arc<dyn TrackParser>,
        discovery: Arc<dyn TrackDiscovery>,
    ) -> Self {
        Self {
            config,
            parser,
            discovery,
            generation: RwLock::new(Arc::new(Generation::default())),
        }
    }

    /// Replace the whole identity set with the tracks found under `locations`.
    ///
    /// All cached samples and metrics are dropped, even for files that are found again;
    /// every track gets a fresh id. No track contents are read here.
    pub fn configure<I, S>(&self, locations: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        #[cfg(feature = "profiling")]
        profiling::scope!("catalog::configure");

        let locations: Vec<String> = locations.into_iter().map(Into::into).collect();
        let entries: Vec<TrackEntry> = locations
            .iter()
            .flat_map(|location| self.discovery.list_files(Path::new(location)))
            .map(|path| TrackEntry {
                identity: TrackIdentity::new(path),
                data: OnceLock::new(),
                metrics: OnceLock::new(),
            })
            .collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.identity.id.clone(), i))
            .collect();

        tracing::info!(
            "Catalog configured with {} tracks from {} locations",
            entries.len(),
            locations.len()
        );

        let generation = Arc::new(Generation {
            locations,
            entries,
            index,
        });
        *self
            .generation
            .write()
            .unwrap_or_else(PoisonError::into_inner) = generation;
    }

    /// Copies of all current identities, in discovery order
    pub fn list_tracks(&self) -> Vec<TrackIdentity> {
        self.current()
            .entries
            .iter()
            .map(|entry| entry.identity.clone())
            .collect()
    }

    /// Copy of the identity with the given id
    pub fn track(&self, id: &str) -> Option<TrackIdentity> {
        self.current().entry(id).ok().map(|e| e.identity.clone())
    }

    /// Samples of a track, loading them on first access.
    ///
    /// Unreadable files yield an empty track rather than an error. Every caller gets the
    /// same shared value.
    ///
    /// # Errors
    /// [`CatalogError::UnknownTrack`] if `id` is not in the current configuration.
    pub fn points(&self, id: &str) -> Result<Arc<TrackData>> {
        let generation = self.current();
        let entry = generation.entry(id)?;
        Ok(self.load(entry))
    }

    /// Metrics of a track, computed on first access.
    ///
    /// # Errors
    /// [`CatalogError::UnknownTrack`] if `id` is not in the current configuration.
    pub fn metrics(&self, id: &str) -> Result<TrackMetrics> {
        let generation = self.current();
        let entry = generation.entry(id)?;
        Ok(*entry
            .metrics
            .get_or_init(|| TrackMetrics::compute(self.load(entry).samples())))
    }

    pub fn total_distance_meters(&self, id: &str) -> Result<f64> {
        Ok(self.metrics(id)?.total_distance_meters)
    }

    pub fn total_distance_kilometers(&self, id: &str) -> Result<f64> {
        Ok(self.metrics(id)?.total_distance_kilometers())
    }

    pub fn total_elevation_meters(&self, id: &str) -> Result<f64> {
        Ok(self.metrics(id)?.total_elevation_gain_meters)
    }

    /// Number of tracks in the current configuration
    pub fn len(&self) -> usize {
        self.current().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Locations passed to the last `configure`
    pub fn locations(&self) -> Vec<String> {
        self.current().locations.clone()
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn info(&self) -> CatalogInfo {
        let generation = self.current();
        let loaded = generation.entries.iter().filter_map(|e| e.data.get());
        let (loaded_count, unreadable_count) = loaded.fold((0, 0), |(n, bad), data| {
            let bad = bad + usize::from(data.status() == LoadStatus::Unreadable);
            (n + 1, bad)
        });
        CatalogInfo {
            track_count: generation.entries.len(),
            loaded_count,
            unreadable_count,
        }
    }

    /// Snapshot of the current generation; the lock is released on return
    fn current(&self) -> Arc<Generation> {
        self.generation
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Load an entry's samples exactly once; concurrent callers wait for the first
    fn load(&self, entry: &TrackEntry) -> Arc<TrackData> {
        entry
            .data
            .get_or_init(|| {
                #[cfg(feature = "profiling")]
                profiling::scope!("catalog::load");

                let identity = &entry.identity;
                let data = match self.parser.parse(&identity.path) {
                    Ok(samples) => TrackData::loaded(samples),
                    Err(e) => {
                        tracing::warn!(
                            "Could not load track {} ({}): {}",
                            identity.name,
                            identity.path.display(),
                            e
                        );
                        TrackData::unreadable()
                    }
                };
                tracing::debug!("Loaded track {} with {} points", identity.id, data.len());
                Arc::new(data)
            })
            .clone()
    }
}
