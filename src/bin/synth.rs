//! Write synthetic open/closed captures for one subject.
//!
//! The output can be fed straight to `package` and `evaluate`:
//!
//! ```bash
//! synth --raw-dir /tmp/raw && package --raw-dir /tmp/raw && evaluate
//! ```
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use eegmi::{init_logging, HarnessConfig, SyntheticCapture};

#[derive(Parser)]
#[command(name = "synth", about = "Generate synthetic BDF captures")]
struct Args {
    /// Zero-based subject index used in the file names
    #[arg(long, default_value_t = 0)]
    subject: u32,

    /// Output directory (created if missing)
    #[arg(long)]
    raw_dir: Option<PathBuf>,

    /// JSON configuration; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tone frequency for "open" blocks in Hz
    #[arg(long, default_value_t = 10.0)]
    open_hz: f64,

    /// Tone frequency for "closed" blocks in Hz
    #[arg(long, default_value_t = 20.0)]
    closed_hz: f64,

    /// Peak amplitude in microvolts
    #[arg(long, default_value_t = 50.0)]
    amplitude_uv: f64,

    /// Extra seconds recorded after the session window
    #[arg(long, default_value_t = 10.0)]
    tail_secs: f64,

    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    let mut cfg = match &args.config {
        Some(path) => HarnessConfig::from_json_file(path)?,
        None => HarnessConfig::default(),
    };
    if let Some(dir) = args.raw_dir {
        cfg.raw_dir = dir;
    }

    let gen = SyntheticCapture {
        block_hz:    vec![args.open_hz, args.closed_hz],
        amplitude:   args.amplitude_uv * 1e-6,
        with_status: true,
        tail_secs:   args.tail_secs,
    };
    let paths = gen.write_subject(args.subject, &cfg)?;
    println!("Wrote {} captures to {}", paths.len(), cfg.raw_dir.display());
    Ok(())
}
