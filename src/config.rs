//! Harness configuration.
//!
//! [`HarnessConfig`] holds every layout constant shared by the packager, the
//! dataset adapter and the paradigm: sampling rate, channel count, trim
//! window, session and block lengths, and where files live.  All fields have
//! defaults that match the recording protocol of the open/closed dataset.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

/// Configuration for packaging captures and reading subject archives.
///
/// All fields are `pub` so you can construct one with struct-update syntax:
///
/// ```
/// use eegmi::HarnessConfig;
///
/// let cfg = HarnessConfig {
///     n_sessions: 3,
///     archive_dir: "/tmp/archives".into(),
///     ..HarnessConfig::default()
/// };
/// assert_eq!(cfg.session_samples(), 15_000);
/// ```
///
/// Or load one from JSON, where missing fields keep their defaults, with
/// [`HarnessConfig::from_json_file`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Sampling rate of the captures and of the archived sessions, in Hz.
    ///
    /// Captures sampled faster are resampled to this rate before trimming;
    /// slower captures are rejected.
    ///
    /// Default: `250.0` Hz.
    pub sfreq: f64,

    /// Number of leading capture channels kept; extra channels (e.g. the
    /// BioSemi `Status` channel) are discarded.
    ///
    /// Default: `8`.
    pub n_channels: usize,

    /// Sessions recorded per subject.  Capture files are indexed
    /// `0..n_sessions` and archived as `x0..x{n_sessions-1}`.
    ///
    /// Default: `10`.
    pub n_sessions: usize,

    /// Warm-up interval dropped from the start of each capture, in seconds.
    ///
    /// Default: `10.0` s.
    pub trim_secs: f64,

    /// Length of the kept session window, in seconds.  Everything after
    /// `trim_secs + session_secs` is discarded.
    ///
    /// Default: `60.0` s.
    pub session_secs: f64,

    /// Length of one open/closed block, in seconds.  Must divide
    /// `session_secs` exactly.
    ///
    /// Default: `5.0` s.
    pub block_secs: f64,

    /// Annotation labels, cycled block by block starting at the first.
    ///
    /// Default: `["open", "closed"]`.
    pub block_labels: Vec<String>,

    /// Directory holding the raw captures `s{subject}_{session}.{ext}`.
    ///
    /// Default: `../my_data/`.
    pub raw_dir: PathBuf,

    /// Extension of the raw capture files (`bdf` or `edf`).
    ///
    /// Default: `bdf`.
    pub raw_extension: String,

    /// Directory where `subject_NN.mat` archives are written and read.
    ///
    /// Default: `.` (current working directory).
    pub archive_dir: PathBuf,
}

impl Default for HarnessConfig {
    /// 250 Hz · 8 channels · 10 sessions · 10 s trim · 60 s sessions ·
    /// 5 s open/closed blocks.
    fn default() -> Self {
        Self {
            sfreq: 250.0,
            n_channels: 8,
            n_sessions: 10,
            trim_secs: 10.0,
            session_secs: 60.0,
            block_secs: 5.0,
            block_labels: vec!["open".into(), "closed".into()],
            raw_dir: PathBuf::from("../my_data/"),
            raw_extension: "bdf".into(),
            archive_dir: PathBuf::from("."),
        }
    }
}

impl HarnessConfig {
    /// Load a configuration from a JSON file.  Fields absent from the file
    /// take their [`Default`] values.  The result is validated.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check that the values describe a usable recording layout.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| -> Result<()> {
            Err(HarnessError::InvalidConfig { reason }.into())
        };
        if !(self.sfreq > 0.0) {
            return invalid(format!("sfreq must be positive, got {}", self.sfreq));
        }
        if self.n_channels == 0 {
            return invalid("n_channels must be at least 1".into());
        }
        if self.n_sessions == 0 {
            return invalid("n_sessions must be at least 1".into());
        }
        if self.trim_secs < 0.0 {
            return invalid(format!("trim_secs must not be negative, got {}", self.trim_secs));
        }
        if !(self.session_secs > 0.0) || !(self.block_secs > 0.0) {
            return invalid(format!(
                "session_secs and block_secs must be positive, got {} and {}",
                self.session_secs, self.block_secs
            ));
        }
        let ratio = self.session_secs / self.block_secs;
        if (ratio - ratio.round()).abs() > 1e-9 {
            return invalid(format!(
                "session_secs ({}) is not a multiple of block_secs ({})",
                self.session_secs, self.block_secs
            ));
        }
        if self.block_labels.is_empty() {
            return invalid("block_labels must not be empty".into());
        }
        Ok(())
    }

    /// Samples dropped from the start of each capture (`2500` at defaults).
    pub fn trim_samples(&self) -> usize {
        (self.trim_secs * self.sfreq).round() as usize
    }

    /// Samples per archived session (`15000` at defaults).
    pub fn session_samples(&self) -> usize {
        (self.session_secs * self.sfreq).round() as usize
    }

    /// Minimum capture length that can be trimmed (`17500` at defaults).
    pub fn capture_min_samples(&self) -> usize {
        self.trim_samples() + self.session_samples()
    }

    /// Annotated blocks per session (`12` at defaults).
    pub fn n_blocks(&self) -> usize {
        (self.session_secs / self.block_secs).round() as usize
    }

    /// Path of one raw capture: `raw_dir/s{subject}_{session}.{ext}`.
    ///
    /// `subject` is the zero-based subject index used by the capture files.
    pub fn raw_capture_path(&self, subject: u32, session: usize) -> PathBuf {
        self.raw_dir
            .join(format!("s{subject}_{session}.{}", self.raw_extension))
    }

    /// Archive path for a one-based subject number: `archive_dir/subject_NN.mat`.
    pub fn archive_path(&self, subject_number: u32) -> PathBuf {
        self.archive_dir.join(archive_file_name(subject_number))
    }
}

/// Archive file name for a one-based subject number, zero-padded to two digits.
///
/// ```
/// assert_eq!(eegmi::config::archive_file_name(1), "subject_01.mat");
/// assert_eq!(eegmi::config::archive_file_name(12), "subject_12.mat");
/// ```
pub fn archive_file_name(subject_number: u32) -> String {
    format!("subject_{subject_number:02}.mat")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sample_counts() {
        let cfg = HarnessConfig::default();
        assert_eq!(cfg.trim_samples(), 2500);
        assert_eq!(cfg.session_samples(), 15_000);
        assert_eq!(cfg.capture_min_samples(), 17_500);
        assert_eq!(cfg.n_blocks(), 12);
        cfg.validate().unwrap();
    }

    #[test]
    fn capture_naming() {
        let cfg = HarnessConfig { raw_dir: "/data".into(), ..HarnessConfig::default() };
        assert_eq!(cfg.raw_capture_path(0, 7), PathBuf::from("/data/s0_7.bdf"));
        assert_eq!(cfg.archive_path(1), PathBuf::from("./subject_01.mat"));
    }

    #[test]
    fn rejects_uneven_blocks() {
        let cfg = HarnessConfig { block_secs: 7.0, ..HarnessConfig::default() };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn json_fills_missing_fields() {
        let cfg: HarnessConfig = serde_json::from_str(r#"{ "n_sessions": 4 }"#).unwrap();
        assert_eq!(cfg.n_sessions, 4);
        assert_eq!(cfg.n_channels, 8);
        assert_eq!(cfg.block_labels, vec!["open", "closed"]);
    }
}
