//! Track sources: discovering candidate files and parsing them into samples
//!
//! The catalog only talks to the [`TrackDiscovery`] and [`TrackParser`] traits, so other
//! formats or in-memory test doubles can be plugged in. The defaults read GPX files.

use crate::{CatalogError, Config, Result, TrackPoint};
use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Parses one track file into its first resolvable point sequence
pub trait TrackParser: Send + Sync {
    fn parse(&self, locator: &Path) -> Result<Vec<TrackPoint>>;
}

/// Lists candidate track files under a root.
///
/// Never fails: an unreadable root or entry yields fewer (possibly zero) results.
pub trait TrackDiscovery: Send + Sync {
    fn list_files(&self, root: &Path) -> Vec<PathBuf>;
}

/// Default parser backed by the `gpx` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct GpxParser;

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl GpxParser {
    /// Extract the first point sequence of a parsed document.
    ///
    /// Routes take precedence over tracks. A track's segments are concatenated.
    /// Any further routes or tracks are ignored.
    pub fn first_sequence(gpx: &gpx::Gpx) -> Option<Vec<TrackPoint>> {
        if let Some(route) = gpx.routes.first() {
            return Some(route.points.iter().map(TrackPoint::from).collect());
        }

        gpx.tracks.first().map(|track| {
            track
                .segments
                .iter()
                .flat_map(|segment| segment.points.iter())
                .map(TrackPoint::from)
                .collect()
        })
    }
}

impl TrackParser for GpxParser {
    fn parse(&self, locator: &Path) -> Result<Vec<TrackPoint>> {
        #[cfg(feature = "profiling")]
        profiling::scope!("source::parse_gpx");

        let file = File::open(locator)?;
        let gpx = gpx::read(BufReader::new(file))?;
        Self::first_sequence(&gpx)
            .ok_or_else(|| CatalogError::NoPointSequence(locator.display().to_string()))
    }
}

/// Default discovery: recursive directory walk filtered by file extension
#[derive(Debug, Clone)]
pub struct GpxDiscovery {
    extension: String,
    follow_links: bool,
    max_depth: Option<usize>,
}

impl Default for GpxDiscovery {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl GpxDiscovery {
    pub fn new(config: &Config) -> Self {
        Self {
            extension: config.file_extension.trim_start_matches('.').to_string(),
            follow_links: config.follow_links,
            max_depth: config.max_depth,
        }
    }

    /// ASCII case-insensitive extension match
    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }
}

impl TrackDiscovery for GpxDiscovery {
    fn list_files(&self, root: &Path) -> Vec<PathBuf> {
        #[cfg(feature = "profiling")]
        profiling::scope!("source::list_files");

        let mut walker = WalkDir::new(root).follow_links(self.follow_links);
        if let Some(depth) = self.max_depth {
            walker = walker.max_depth(depth);
        }

        let mut files: Vec<PathBuf> = walker
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && self.matches(entry.path()))
            .map(|entry| entry.into_path())
            .collect();

        files.sort();
        tracing::debug!("Found {} track files under {}", files.len(), root.display());
        files
    }
}
