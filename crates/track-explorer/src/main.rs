//! Command-line explorer for directories of GPX tracks

mod commands;
mod logging;
mod progress;
mod settings;

use clap::Parser;
use settings::Settings;

fn main() -> anyhow::Result<()> {
    let settings = Settings::parse();
    logging::setup_logging(settings.verbose);
    profiling::register_thread!("main");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::run(&settings, &mut out)
}
