//! Synthetic open/closed captures.
//!
//! Produces BDF files laid out like real recordings: `n_channels` EEG
//! channels plus a BioSemi-style `Status` channel, `trim_secs` of warm-up
//! followed by `session_secs` of alternating blocks.  Each block is a
//! sinusoid whose frequency depends on the block label and whose phase
//! restarts at the block onset, so every trial of one label is the same
//! waveform.
use std::f64::consts::PI;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use ndarray::Array2;
use tracing::debug;

use crate::bdf::{EdfWriter, FileFormat, SignalInfo};
use crate::config::HarnessConfig;

/// Generator settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticCapture {
    /// Tone frequency per block label index (cycled if shorter than the
    /// label list), in Hz.
    pub block_hz:    Vec<f64>,
    /// Peak amplitude of channel 0 in volts; channel `c` is scaled by
    /// `1 + 0.1·c`.
    pub amplitude:   f64,
    /// Append a zero `Status` channel after the EEG channels.
    pub with_status: bool,
    /// Seconds recorded after the session window.
    pub tail_secs:   f64,
}

impl Default for SyntheticCapture {
    fn default() -> Self {
        Self { block_hz: vec![10.0, 20.0], amplitude: 50e-6, with_status: true, tail_secs: 0.0 }
    }
}

impl SyntheticCapture {
    /// Capture samples in volts, `[n_channels (+1), n_times]`, where
    /// `n_times` covers trim, session and tail rounded up to whole seconds.
    pub fn samples(&self, cfg: &HarnessConfig) -> Result<Array2<f64>> {
        let spr = record_samples(cfg)?;
        if self.block_hz.is_empty() {
            bail!("at least one block frequency is required");
        }
        let wanted = cfg.capture_min_samples() + (self.tail_secs * cfg.sfreq).round() as usize;
        let n_times = wanted.div_ceil(spr) * spr;
        let n_rows = cfg.n_channels + usize::from(self.with_status);

        let trim = cfg.trim_samples();
        let block = (cfg.block_secs * cfg.sfreq).round() as usize;
        let n_labels = cfg.block_labels.len();

        let data = Array2::from_shape_fn((n_rows, n_times), |(c, t)| {
            if c >= cfg.n_channels {
                return 0.0;
            }
            // Warm-up and tail continue the block pattern.
            let rel = t as isize - trim as isize;
            let (idx, phase) = if rel < 0 {
                (0, t)
            } else {
                let rel = rel as usize;
                (rel / block, rel % block)
            };
            let hz = self.block_hz[(idx % n_labels) % self.block_hz.len()];
            let amp = self.amplitude * (1.0 + 0.1 * c as f64);
            amp * (2.0 * PI * hz * phase as f64 / cfg.sfreq).sin()
        });
        Ok(data)
    }

    /// Write one capture to `path` as BDF with 1 s records.
    pub fn write(&self, path: &std::path::Path, cfg: &HarnessConfig) -> Result<()> {
        let spr = record_samples(cfg)?;
        let data = self.samples(cfg)?;
        let mut signals: Vec<SignalInfo> = (0..cfg.n_channels)
            .map(|c| SignalInfo::full_scale(FileFormat::Bdf, &format!("EEG{}", c + 1), "uV", spr))
            .collect();
        if self.with_status {
            signals.push(SignalInfo::full_scale(FileFormat::Bdf, "Status", "Boolean", spr));
        }
        EdfWriter::new(FileFormat::Bdf, signals, 1.0)
            .write(path, &data)
            .with_context(|| format!("writing {}", path.display()))
    }

    /// Write every session capture of `subject` under `cfg.raw_dir`.
    pub fn write_subject(&self, subject: u32, cfg: &HarnessConfig) -> Result<Vec<PathBuf>> {
        cfg.validate()?;
        std::fs::create_dir_all(&cfg.raw_dir)
            .with_context(|| format!("creating {}", cfg.raw_dir.display()))?;
        (0..cfg.n_sessions)
            .map(|session| {
                let path = cfg.raw_capture_path(subject, session);
                self.write(&path, cfg)?;
                debug!(subject, session, path = %path.display(), "wrote synthetic capture");
                Ok(path)
            })
            .collect()
    }
}

fn record_samples(cfg: &HarnessConfig) -> Result<usize> {
    if cfg.sfreq.fract() != 0.0 || cfg.sfreq < 1.0 {
        bail!("synthetic captures need an integer sampling rate, got {}", cfg.sfreq);
    }
    Ok(cfg.sfreq as usize)
}
