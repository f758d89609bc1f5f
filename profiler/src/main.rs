mod contour;
mod extract;
mod list;
mod options;
mod progress;
mod raster;
mod store;

use anyhow::Result;
use clap::Parser;
use options::Cli;

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli {
        Cli::Extract(extract) => extract.run(),
        Cli::List(list) => list.run(),
    }
}
