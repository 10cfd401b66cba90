use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug, Clone)]
#[command(name = "textdrive")]
#[command(about = "Text-only lane dodge: steer the car between the walls", long_about = None)]
pub(crate) struct Args {
    /// Frame rate cap. The game advances one tick per frame.
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Seed for the course generator (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Glyph set for walls and the car
    #[arg(long, value_enum, default_value_t = GlyphSet::Unicode)]
    glyphs: GlyphSet,

    /// Monochrome output using the terminal's own colors
    #[arg(long, default_value_t = false)]
    no_color: bool,

    /// Write logs to this file (nothing is logged otherwise)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log filter, e.g. "info" or "textdrive=debug"
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum GlyphSet {
    Unicode,
    Ascii,
}

#[derive(Clone, Debug)]
pub(crate) struct Settings {
    pub(crate) fps_cap: u32,
    pub(crate) seed: u64,
    pub(crate) glyphs: GlyphSet,
    pub(crate) enable_color: bool,
    pub(crate) log_file: Option<PathBuf>,
    pub(crate) log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps_cap: 60,
            seed: 0xC0FFEE_u64,
            glyphs: GlyphSet::Unicode,
            enable_color: true,
            log_file: None,
            log_level: "info".to_string(),
        }
    }
}

impl From<Args> for Settings {
    fn from(args: Args) -> Self {
        Self {
            fps_cap: args.fps.clamp(10, 240),
            seed: args.seed.unwrap_or_else(clock_seed),
            glyphs: args.glyphs,
            enable_color: !args.no_color,
            log_file: args.log_file,
            log_level: args.log_level,
        }
    }
}

fn clock_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    nanos ^ Settings::default().seed
}
