//! In-memory track sources shared by the unit tests

use crate::{CatalogError, GeoPoint, Result, TrackDiscovery, TrackParser, TrackPoint};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Discovery that serves a fixed file list per root
#[derive(Default)]
pub struct FakeDiscovery {
    roots: HashMap<String, Vec<PathBuf>>,
}

impl FakeDiscovery {
    pub fn with_root(mut self, root: &str, files: &[&str]) -> Self {
        self.roots.insert(
            root.to_string(),
            files.iter().map(|f| Path::new(root).join(f)).collect(),
        );
        self
    }
}

impl TrackDiscovery for FakeDiscovery {
    fn list_files(&self, root: &Path) -> Vec<PathBuf> {
        root.to_str()
            .and_then(|r| self.roots.get(r))
            .cloned()
            .unwrap_or_default()
    }
}

/// Parser over canned samples keyed by file name, counting every invocation
#[derive(Default)]
pub struct CountingParser {
    tracks: HashMap<String, Vec<TrackPoint>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    calls_by_file: Mutex<HashMap<String, usize>>,
}

impl CountingParser {
    pub fn with_track(mut self, file: &str, points: &[(f64, f64)]) -> Self {
        let samples = points
            .iter()
            .map(|(lat, lng)| TrackPoint::new(GeoPoint::new(*lat, *lng), None))
            .collect();
        self.tracks.insert(file.to_string(), samples);
        self
    }

    pub fn with_samples(mut self, file: &str, samples: Vec<TrackPoint>) -> Self {
        self.tracks.insert(file.to_string(), samples);
        self
    }

    /// Sleep inside every parse to widen race windows
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, file: &str) -> usize {
        self.calls_by_file
            .lock()
            .unwrap()
            .get(file)
            .copied()
            .unwrap_or(0)
    }
}

impl TrackParser for CountingParser {
    fn parse(&self, locator: &Path) -> Result<Vec<TrackPoint>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let file = locator
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or_default()
            .to_string();
        *self
            .calls_by_file
            .lock()
            .unwrap()
            .entry(file.clone())
            .or_default() += 1;

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        self.tracks
            .get(&file)
            .cloned()
            .ok_or_else(|| CatalogError::NoPointSequence(file))
    }
}
