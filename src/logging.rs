use crate::config::Settings;
use anyhow::Context;
use std::fs::File;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// The game owns the screen, so logs only go to a file when one is asked for.
pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    let Some(path) = &settings.log_file else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("could not create log file {}", path.display()))?;
    let filter = EnvFilter::try_new(&settings.log_level)
        .with_context(|| format!("bad log filter {:?}", settings.log_level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
