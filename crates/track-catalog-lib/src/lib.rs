//! Track Catalog Library - Lazy GPX Track Catalog and Geo Search
//!
//! This library catalogs GPX track files found on disk, exposes derived metrics (distance,
//! elevation gain) and answers "which tracks pass through this bounding box" over a corpus
//! that may be large and slow to parse. Track contents are only read when first asked for.
//!
//! # Architecture
//!
//! - **[`GeoPoint`]** / **[`BoundingBox`]**: Value types for positions and lat/lng rectangles
//! - **[`metrics`]**: Haversine distance and thresholded elevation gain reducers
//! - **[`TrackCatalog`]**: Identity registry with at-most-once, per-track load and metric caches
//! - **[`ParallelGeoSearch`]**: Cancellable parallel containment scan over the catalog
//! - **[`TrackParser`]** / **[`TrackDiscovery`]**: Pluggable file parsing and discovery
//!
//! # Concurrency
//!
//! Every track owns its own single-assignment cells, so concurrent first accesses to
//! different tracks never wait on each other, while concurrent first accesses to the same
//! track run the parser exactly once.

mod catalog;
mod geometry;
pub mod metrics;
mod search;
mod source;
#[cfg(test)]
mod testing;

// Public API exports
pub use catalog::{CatalogInfo, Config, LoadStatus, TrackCatalog, TrackData, TrackIdentity};
pub use geometry::{BoundingBox, GeoPoint};
pub use metrics::{TrackMetrics, TrackPoint};
pub use search::{GeoSearch, ParallelGeoSearch, SearchProgress, deadline};
pub use source::{GpxDiscovery, GpxParser, TrackDiscovery, TrackParser};

/// Error types for the catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Unknown track id: {0}")]
    UnknownTrack(String),

    #[error("GPX parsing error: {0}")]
    GpxParse(#[from] gpx::errors::GpxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No route or track in {0}")]
    NoPointSequence(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
