//! Subject data packager.
//!
//! Reads every session capture of one subject, keeps the first
//! `n_channels` channels and the `session_secs` window after the warm-up
//! trim, and writes all sessions into one `subject_NN.mat` archive:
//!
//! ```text
//! s{subj}_0.bdf … s{subj}_{n-1}.bdf
//!   │  open_raw → check channels / rate / length
//!   │  → read_slice_picks(0..n_channels, trim, trim + len)   (resampled first above sfreq)
//!   ▼
//! subject_{subj+1:02}.mat   { fs, x0, x1, …, x{n-1} }   each [n_channels, session_samples]
//! ```
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ndarray::{s, Array2};
use tracing::{debug, info};

use crate::bdf::open_raw;
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::mat::MatWriter;
use crate::resample::{final_length, resample};

/// Outcome of packaging one subject.
#[derive(Debug, Clone)]
pub struct PackagedSubject {
    /// Archive that was written.
    pub archive_path: PathBuf,
    /// Trimmed data of the last session, `[n_channels, session_samples]`.
    pub last_session: Array2<f64>,
}

/// Package all sessions of `subject` (zero-based capture index) into
/// `archive_dir/subject_{subject+1:02}.mat`.
///
/// Fails on the first capture that cannot be read or does not satisfy the
/// layout in `cfg`; nothing is written in that case.
///
/// # Errors
///
/// * [`HarnessError::MalformedCapture`] — fewer than `n_channels` channels,
///   kept channels at mixed rates or below `sfreq`, or shorter than
///   `trim_secs + session_secs`.
/// * Any I/O or decode failure of a capture, with the file in the context.
pub fn package_subject(subject: u32, cfg: &HarnessConfig) -> Result<PackagedSubject> {
    cfg.validate()?;

    let mut writer = MatWriter::new();
    writer.add_scalar("fs", cfg.sfreq);

    let mut last_session = None;
    for session in 0..cfg.n_sessions {
        let path = cfg.raw_capture_path(subject, session);
        let trimmed = read_session(&path, cfg)
            .with_context(|| format!("packaging subject {subject}, session {session}"))?;
        debug!(
            subject,
            session,
            path = %path.display(),
            shape = ?trimmed.dim(),
            "trimmed capture"
        );
        writer.add_array2(&format!("x{session}"), &trimmed);
        last_session = Some(trimmed);
    }

    let archive_path = cfg.archive_path(subject + 1);
    writer
        .write(&archive_path)
        .with_context(|| format!("writing {}", archive_path.display()))?;
    info!(
        subject,
        sessions = cfg.n_sessions,
        archive = %archive_path.display(),
        "packaged subject"
    );

    Ok(PackagedSubject {
        archive_path,
        // n_sessions >= 1 after validate().
        last_session: last_session.unwrap_or_else(|| Array2::zeros((cfg.n_channels, 0))),
    })
}

/// Open one capture, check it against `cfg`, and return the trimmed window.
///
/// Only the first `n_channels` channels are decoded; they must share one
/// rate of at least `cfg.sfreq`.  Captures above it are resampled to
/// `cfg.sfreq` before trimming.
pub fn read_session(path: &Path, cfg: &HarnessConfig) -> Result<Array2<f64>> {
    let raw = open_raw(path)?;

    if raw.n_chan() < cfg.n_channels {
        return Err(HarnessError::malformed(
            path,
            format!("{} data channels, need at least {}", raw.n_chan(), cfg.n_channels),
        )
        .into());
    }
    let fs = raw.channel_sfreq(0);
    if let Some(ch) = (1..cfg.n_channels).find(|&ch| (raw.channel_sfreq(ch) - fs).abs() > 1e-6) {
        return Err(HarnessError::malformed(
            path,
            format!("channel {ch} sampled at {} Hz, channel 0 at {fs} Hz", raw.channel_sfreq(ch)),
        )
        .into());
    }
    check_rate(path, fs, cfg)?;
    let kept: Vec<usize> = (0..cfg.n_channels).collect();
    let n_src = raw.channel_n_times(0);

    if is_target_rate(fs, cfg) {
        check_length(path, n_src, cfg)?;
        let start = cfg.trim_samples();
        return raw.read_slice_picks(&kept, start, start + cfg.session_samples());
    }

    check_length(path, final_length(n_src, fs, cfg.sfreq), cfg)?;
    let data = raw.read_slice_picks(&kept, 0, n_src)?;
    debug!(path = %path.display(), from = fs, to = cfg.sfreq, "resampling capture");
    let data = resample(&data, fs, cfg.sfreq)?;
    Ok(window(&data, cfg))
}

/// Trim an in-memory capture `[C, T]` sampled at `sfreq`.
///
/// Same checks and window as [`read_session`], for data that did not come
/// from a file.
pub fn trim_capture(data: &Array2<f64>, sfreq: f64, cfg: &HarnessConfig) -> Result<Array2<f64>> {
    let origin = Path::new("<memory>");
    if data.nrows() < cfg.n_channels {
        return Err(HarnessError::malformed(
            origin,
            format!("{} channels, need at least {}", data.nrows(), cfg.n_channels),
        )
        .into());
    }
    check_rate(origin, sfreq, cfg)?;
    check_length(origin, final_length(data.ncols(), sfreq, cfg.sfreq), cfg)?;

    let kept = data.slice(s![..cfg.n_channels, ..]).to_owned();
    if is_target_rate(sfreq, cfg) {
        return Ok(window(&kept, cfg));
    }
    Ok(window(&resample(&kept, sfreq, cfg.sfreq)?, cfg))
}

fn is_target_rate(sfreq: f64, cfg: &HarnessConfig) -> bool {
    (sfreq - cfg.sfreq).abs() <= 1e-6
}

/// Rates below `cfg.sfreq` would need upsampling and are rejected.
fn check_rate(path: &Path, sfreq: f64, cfg: &HarnessConfig) -> Result<()> {
    if sfreq < cfg.sfreq && !is_target_rate(sfreq, cfg) {
        return Err(HarnessError::malformed(
            path,
            format!("sampled at {sfreq} Hz, below the required {} Hz", cfg.sfreq),
        )
        .into());
    }
    Ok(())
}

/// `[.., trim, trim + session)` of a capture already at `cfg.sfreq`.
fn window(data: &Array2<f64>, cfg: &HarnessConfig) -> Array2<f64> {
    let start = cfg.trim_samples();
    data.slice(s![..cfg.n_channels, start..start + cfg.session_samples()]).to_owned()
}

fn check_length(path: &Path, n_times: usize, cfg: &HarnessConfig) -> Result<()> {
    let need = cfg.capture_min_samples();
    if n_times < need {
        return Err(HarnessError::malformed(
            path,
            format!(
                "{n_times} samples ({:.1} s), need at least {need} ({} s trim + {} s session)",
                n_times as f64 / cfg.sfreq,
                cfg.trim_secs,
                cfg.session_secs
            ),
        )
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_keeps_window_after_warm_up() {
        let cfg = HarnessConfig::default();
        // Value encodes the sample index so the window is checkable.
        let data = Array2::from_shape_fn((9, 20_000), |(_, t)| t as f64);
        let out = trim_capture(&data, 250.0, &cfg).unwrap();
        assert_eq!(out.dim(), (8, 15_000));
        assert_eq!(out[[0, 0]], 2500.0);
        assert_eq!(out[[7, 14_999]], 17_499.0);
    }

    #[test]
    fn exactly_minimum_length_is_accepted() {
        let cfg = HarnessConfig::default();
        let data = Array2::zeros((8, 17_500));
        assert!(trim_capture(&data, 250.0, &cfg).is_ok());
    }

    #[test]
    fn short_capture_is_malformed() {
        let cfg = HarnessConfig::default();
        let data = Array2::zeros((8, 17_499));
        let err = trim_capture(&data, 250.0, &cfg).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::MalformedCapture { .. })
        ));
    }

    #[test]
    fn too_few_channels_is_malformed() {
        let cfg = HarnessConfig::default();
        let data = Array2::zeros((7, 20_000));
        let err = trim_capture(&data, 250.0, &cfg).unwrap_err();
        assert!(err.to_string().contains("7 channels"));
    }

    #[test]
    fn lower_rate_is_malformed() {
        let cfg = HarnessConfig::default();
        let data = Array2::zeros((8, 40_000));
        let err = trim_capture(&data, 200.0, &cfg).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::MalformedCapture { .. })
        ));
    }

    #[test]
    fn higher_rate_is_resampled_then_trimmed() {
        let cfg = HarnessConfig::default();
        let data = Array2::from_elem((9, 40_960), -2.0);
        let out = trim_capture(&data, 512.0, &cfg).unwrap();
        assert_eq!(out.dim(), (8, 15_000));
        assert!(out.iter().all(|&v| (v + 2.0).abs() < 1e-9));
    }

    #[test]
    fn length_is_judged_after_resampling() {
        let cfg = HarnessConfig::default();
        // 34 s at 512 Hz is 17 000 samples at 250 Hz, short of 17 500.
        let data = Array2::zeros((8, 512 * 34));
        assert!(trim_capture(&data, 512.0, &cfg).is_err());
    }
}
