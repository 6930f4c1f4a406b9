/// Shared helpers: scratch directories and synthetic captures.
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use eegmi::bdf::{EdfWriter, FileFormat, SignalInfo};
use eegmi::HarnessConfig;
use ndarray::{Array1, Array2};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Fresh empty directory under the system temp dir, unique per call.
pub fn scratch_dir(tag: &str) -> PathBuf {
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("eegmi-{tag}-{}-{n}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Default layout with raw captures and archives inside `dir`.
pub fn config_in(dir: &Path) -> HarnessConfig {
    HarnessConfig {
        raw_dir: dir.join("raw"),
        archive_dir: dir.join("archives"),
        ..HarnessConfig::default()
    }
}

#[allow(unused)]
/// BDF capture where every sample of the `n_eeg` EEG channels equals
/// `value`, followed by a zero `Status` channel; 1 s records.
///
/// The signals are full-scale with no unit, so the value reads back exactly.
pub fn write_constant_capture(path: &Path, n_eeg: usize, sfreq: usize, secs: usize, value: f64) {
    let n_t = sfreq * secs;
    let mut data = Array2::<f64>::from_elem((n_eeg + 1, n_t), value);
    data.row_mut(n_eeg).fill(0.0);
    let mut signals: Vec<SignalInfo> = (0..n_eeg)
        .map(|c| SignalInfo::full_scale(FileFormat::Bdf, &format!("EEG{}", c + 1), "", sfreq))
        .collect();
    signals.push(SignalInfo::full_scale(FileFormat::Bdf, "Status", "", sfreq));
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    EdfWriter::new(FileFormat::Bdf, signals, 1.0).write(path, &data).unwrap();
}

#[allow(unused)]
/// All sessions of subject 0 as constant captures; session `k` holds `k`.
pub fn write_constant_subject(cfg: &HarnessConfig, secs: usize) {
    for k in 0..cfg.n_sessions {
        let path = cfg.raw_capture_path(0, k);
        write_constant_capture(&path, cfg.n_channels, cfg.sfreq as usize, secs, k as f64);
    }
}

#[allow(unused)]
/// Like [`write_constant_capture`] with an extra `Accel` channel recorded at
/// `aux_sfreq`, placed after the EEG channels.
pub fn write_capture_with_aux(path: &Path, n_eeg: usize, sfreq: usize, aux_sfreq: usize, secs: usize, value: f64) {
    let eeg = Array1::<f64>::from_elem(sfreq * secs, value);
    let aux = Array1::<f64>::from_shape_fn(aux_sfreq * secs, |t| (t % 7) as f64);
    let mut signals: Vec<SignalInfo> = (0..n_eeg)
        .map(|c| SignalInfo::full_scale(FileFormat::Bdf, &format!("EEG{}", c + 1), "", sfreq))
        .collect();
    signals.push(SignalInfo::full_scale(FileFormat::Bdf, "Accel", "", aux_sfreq));
    let mut rows = vec![eeg.view(); n_eeg];
    rows.push(aux.view());
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    EdfWriter::new(FileFormat::Bdf, signals, 1.0).write_signals(path, &rows).unwrap();
}
