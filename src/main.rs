mod app;
mod config;
mod course;
mod input;
mod logging;
mod model;
mod render;
mod sim;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let settings = config::Settings::from(config::Args::parse());
    logging::init(&settings)?;
    app::run(settings)
}
