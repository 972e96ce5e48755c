use clap::{ArgAction, Parser, Subcommand};
use track_catalog_lib::{BoundingBox, Config, GeoPoint};

#[derive(Parser, Debug, Clone)]
#[clap(version, about, long_about = None)]
/// Track Explorer - Catalog GPX tracks and find the ones passing through an area
pub struct Settings {
    /// Directories to search (recursively) for track files
    #[clap(short, long = "location", value_name = "DIR", required = true)]
    pub locations: Vec<String>,

    /// Extension of track files, matched case-insensitively
    #[clap(long, default_value = "gpx")]
    pub extension: String,

    /// Follow symbolic links while searching for tracks
    #[clap(long, default_value = "false")]
    pub follow_links: bool,

    /// Maximum directory depth below each location
    #[clap(long)]
    pub max_depth: Option<usize>,

    /// Worker threads used for searching (0 = one per CPU)
    #[clap(short, long, default_value = "0")]
    pub threads: usize,

    /// Print results as JSON
    #[clap(long, global = true, default_value = "false")]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[clap(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List all discovered tracks
    List {
        /// Also load each track and print its distance and elevation gain
        #[clap(long, default_value = "false")]
        metrics: bool,
    },

    /// Show the point count and metrics of one track
    Info {
        /// Track id, as printed by `list`
        id: String,
    },

    /// Find the tracks with at least one point strictly inside a bounding box
    Search {
        /// Southern latitude of the box
        #[clap(long, allow_negative_numbers = true)]
        south: f64,
        /// Western longitude of the box
        #[clap(long, allow_negative_numbers = true)]
        west: f64,
        /// Northern latitude of the box
        #[clap(long, allow_negative_numbers = true)]
        north: f64,
        /// Eastern longitude of the box
        #[clap(long, allow_negative_numbers = true)]
        east: f64,
        /// Give up after this many seconds, discarding partial results
        #[clap(long, value_name = "SECONDS")]
        timeout_secs: Option<f64>,
        /// Hide the progress bar
        #[clap(long, default_value = "false")]
        no_progress: bool,
    },
}

impl Settings {
    pub fn catalog_config(&self) -> Config {
        Config {
            file_extension: self.extension.clone(),
            follow_links: self.follow_links,
            max_depth: self.max_depth,
        }
    }
}

/// Box spanned by the four search edges; south must lie below north and west below east
pub fn search_bounds(
    south: f64,
    west: f64,
    north: f64,
    east: f64,
) -> anyhow::Result<BoundingBox> {
    anyhow::ensure!(south < north, "--south ({south}) must be less than --north ({north})");
    anyhow::ensure!(west < east, "--west ({west}) must be less than --east ({east})");
    Ok(BoundingBox::new(GeoPoint::new(south, west), GeoPoint::new(north, east)))
}
