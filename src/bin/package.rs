//! Package raw session captures into per-subject MAT archives.
//!
//! ```bash
//! # subject 0, captures in ../my_data/, archive written to ./subject_01.mat
//! package
//!
//! # several subjects, custom locations
//! package --subject 0 --subject 1 --raw-dir /data/raw --archive-dir /data/archives
//! ```
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use eegmi::{init_logging, package_subject, HarnessConfig};
use tracing::info;

#[derive(Parser)]
#[command(name = "package", about = "Trim raw EEG captures and write subject archives")]
struct Args {
    /// Zero-based subject index of the capture files (repeatable)
    #[arg(long = "subject", default_values_t = [0u32])]
    subjects: Vec<u32>,

    /// Directory holding s{subject}_{session}.bdf
    #[arg(long)]
    raw_dir: Option<PathBuf>,

    /// Directory the subject_NN.mat archives are written to
    #[arg(long)]
    archive_dir: Option<PathBuf>,

    /// JSON configuration; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

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
    if let Some(dir) = args.archive_dir {
        cfg.archive_dir = dir;
    }

    for &subject in &args.subjects {
        let packaged = package_subject(subject, &cfg)?;
        info!(subject, shape = ?packaged.last_session.dim(), "last session");
        println!("Written → {}", packaged.archive_path.display());
    }
    Ok(())
}
