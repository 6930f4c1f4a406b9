//! # eegmi — EEG motor-imagery experiment harness in pure Rust
//!
//! `eegmi` turns raw multi-session EEG captures into per-subject archives,
//! exposes those archives through a dataset interface, and scores a
//! classifier with leave-one-session-out cross-validation.  File formats
//! (BDF/EDF, MAT-file level 5, safetensors) are read and written natively;
//! the band-pass filters follow [MNE-Python](https://mne.tools)'s IIR and FIR
//! designs.
//!
//! ## Pipeline overview
//!
//! ```text
//! ../my_data/s0_{0..9}.bdf
//!   │
//!   ├─ package::package_subject()   resample to 250 Hz if faster,
//!   │                               trim 10 s, keep 60 s × 8 ch per session
//!   │     └─→ subject_01.mat        fs + x0..x9  [8, 15000] f64
//!   │
//!   ├─ SubjectArchiveDataset        SessionKey(K) → run_1 → RawRecording
//!   │                               12 × 5 s open/closed annotations
//!   ├─ MotorImagery::get_data()     IIR (or FIR) 8–32 Hz, epochs [0, 0.75] s
//!   │     └─→ EpochsData            [n_trials, 8, 189], labels, sessions
//!   │
//!   └─ cv::cross_validate_by_session()
//!         flatten → LabelEncoder → LinearSvm, one fold per session
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use eegmi::{
//!     cross_validate_by_session, mean_accuracy, package_subject, HarnessConfig,
//!     LabelEncoder, LinearSvm, MotorImagery, SubjectArchiveDataset,
//! };
//!
//! let cfg = HarnessConfig::default();
//!
//! // 1. Package subject 0's captures into ./subject_01.mat
//! package_subject(0, &cfg).unwrap();
//!
//! // 2. Epoch every session
//! let dataset = SubjectArchiveDataset::new(cfg).unwrap();
//! let epochs  = MotorImagery::default().get_data(&dataset, None).unwrap();
//!
//! // 3. Leave-one-session-out
//! let x = epochs.flatten().unwrap();
//! let y = LabelEncoder::default().fit_transform(&epochs.labels).unwrap();
//! let folds = cross_validate_by_session(x.view(), &y, &epochs.sessions(), LinearSvm::default).unwrap();
//! println!("mean accuracy {:.3}", mean_accuracy(&folds));
//! ```
//!
//! ## Running individual steps
//!
//! ```no_run
//! use eegmi::bdf::open_raw;
//! use eegmi::filter::{design_bandpass, apply_fir_zero_phase};
//! use eegmi::mat::MatFile;
//! use std::path::Path;
//!
//! // Read a capture without packaging it
//! let raw = open_raw("../my_data/s0_0.bdf").unwrap();
//! let mut data = raw.read_slice(2500, 17_500).unwrap();   // [C, 15000]
//!
//! // Band-pass in place
//! let h = design_bandpass(8.0, 32.0, raw.sfreq()).unwrap();
//! apply_fir_zero_phase(&mut data, &h).unwrap();
//!
//! // Inspect an archive
//! let mat = MatFile::read(Path::new("subject_01.mat")).unwrap();
//! println!("fs = {:?}", mat.get("fs").and_then(|a| a.scalar()));
//! ```

pub mod annotations;
pub mod bdf;
pub mod classify;
pub mod config;
pub mod cv;
pub mod dataset;
pub mod epoch;
pub mod error;
pub mod filter;
pub mod io;
pub mod mat;
pub mod normalize;
pub mod package;
pub mod paradigm;
pub mod recording;
pub mod resample;
pub mod synth;

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

// ── Crate-root re-exports ─────────────────────────────────────────────────

// config / errors
pub use config::{archive_file_name, HarnessConfig};
pub use error::HarnessError;

// recordings
pub use annotations::{Annotation, Annotations};
pub use recording::{ChannelType, RawRecording};

// packaging
pub use package::{package_subject, read_session, trim_capture, PackagedSubject};
pub use resample::resample;

// dataset adapter
pub use dataset::{Dataset, DatasetDescriptor, SessionKey, SubjectArchiveDataset, SubjectData};

// paradigm + epoching
pub use epoch::{epoch_events, events_from_annotations, window_len, Event};
pub use filter::FilterMethod;
pub use paradigm::{EpochsData, MotorImagery, TrialMetadata};

// classification + evaluation
pub use classify::{accuracy, Classifier, LabelEncoder, LinearSvm};
pub use cv::{cross_validate_by_session, mean_accuracy, FoldResult, LeaveOneGroupOut};
pub use normalize::StandardScaler;

// io — safetensors export
pub use io::{write_epochs, StWriter};

// synthetic captures
pub use synth::SyntheticCapture;

/// Install a global `tracing` subscriber at `level`
/// (`trace`, `debug`, `info`, `warn` or `error`; anything else means `info`).
pub fn init_logging(level: &str) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
