//! Leave-one-session-out evaluation of a packaged subject.
//!
//! Loads `subject_01.mat`, epochs each session with the motor-imagery
//! paradigm, and trains a linear SVM on all sessions but one, once per
//! session.
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use eegmi::{
    cross_validate_by_session, init_logging, io::write_epochs, mean_accuracy, HarnessConfig,
    FilterMethod, LabelEncoder, LinearSvm, MotorImagery, SubjectArchiveDataset,
};

#[derive(Parser)]
#[command(name = "evaluate", about = "Leave-one-session-out motor-imagery evaluation")]
struct Args {
    /// Directory holding subject_NN.mat
    #[arg(long)]
    archive_dir: Option<PathBuf>,

    /// JSON configuration; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Band-pass lower edge in Hz
    #[arg(long, default_value_t = 8.0)]
    fmin: f64,

    /// Band-pass upper edge in Hz
    #[arg(long, default_value_t = 32.0)]
    fmax: f64,

    /// Band-pass implementation: iir (4th-order Butterworth) or fir
    #[arg(long, default_value = "iir")]
    filter_method: FilterMethod,

    /// Skip the band-pass filter
    #[arg(long)]
    no_filter: bool,

    /// SVM inverse regularisation strength
    #[arg(long, default_value_t = 1.0)]
    c: f64,

    /// SVM training iterations
    #[arg(long, default_value_t = 200)]
    max_iter: usize,

    /// Also write the epoched trials to this safetensors file
    #[arg(long)]
    export: Option<PathBuf>,

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
    if let Some(dir) = args.archive_dir {
        cfg.archive_dir = dir;
    }

    let dataset = SubjectArchiveDataset::new(cfg)?;
    let paradigm = if args.no_filter {
        MotorImagery::unfiltered()
    } else {
        MotorImagery {
            fmin: Some(args.fmin),
            fmax: Some(args.fmax),
            method: args.filter_method,
            ..MotorImagery::default()
        }
    };
    let epochs = paradigm.get_data(&dataset, None)?;
    println!("Epoched {} trials of shape {:?}", epochs.n_trials(), &epochs.x.shape()[1..]);

    let mut encoder = LabelEncoder::default();
    let y = encoder.fit_transform(&epochs.labels)?;
    if let Some(path) = &args.export {
        write_epochs(path, &epochs, &y)?;
        println!("Written → {}", path.display());
    }

    let x = epochs.flatten()?;
    let folds = cross_validate_by_session(x.view(), &y, &epochs.sessions(), || {
        LinearSvm::new(args.c, args.max_iter)
    })?;

    for fold in &folds {
        let predicted = encoder.inverse_transform(&fold.predicted)?;
        let expected = encoder.inverse_transform(&fold.expected)?;
        println!("{}: predicted: {predicted:?}, expected {expected:?}, score: {}", fold.group, fold.accuracy);
    }
    println!("Mean accuracy over {} sessions: {:.3}", folds.len(), mean_accuracy(&folds));
    Ok(())
}
