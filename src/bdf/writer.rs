//! EDF/BDF writer.
//!
//! Used to produce synthetic captures (the `synth` binary and the test
//! suite).  Samples are given in volts and converted to each signal's
//! physical unit and digital range.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Result};
use ndarray::{Array2, ArrayView1};

use super::header::{EdfHeader, FileFormat, SignalInfo};

/// Writer for continuous EDF/BDF recordings.
///
/// ```no_run
/// use eegmi::bdf::{EdfWriter, FileFormat, SignalInfo};
/// use ndarray::Array2;
///
/// let signals = (0..8)
///     .map(|i| SignalInfo::full_scale(FileFormat::Bdf, &format!("EEG{i}"), "uV", 250))
///     .collect();
/// let w = EdfWriter::new(FileFormat::Bdf, signals, 1.0);
/// w.write("s0_0.bdf".as_ref(), &Array2::zeros((8, 250 * 80))).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct EdfWriter {
    pub format:          FileFormat,
    pub signals:         Vec<SignalInfo>,
    /// Duration of one data record in seconds.
    pub record_duration: f64,
    pub patient_id:      String,
    pub recording_id:    String,
    pub start_date:      String,
    pub start_time:      String,
}

impl EdfWriter {
    pub fn new(format: FileFormat, signals: Vec<SignalInfo>, record_duration: f64) -> Self {
        Self {
            format,
            signals,
            record_duration,
            patient_id: "X X X X".into(),
            recording_id: "Startdate X X X X".into(),
            start_date: "01.01.26".into(),
            start_time: "00.00.00".into(),
        }
    }

    /// Write `data` (`[n_signals, n_times]`, volts) to `path`.
    ///
    /// All signals must share the same samples-per-record and `n_times` must
    /// be a whole number of records.
    pub fn write(&self, path: &Path, data: &Array2<f64>) -> Result<()> {
        let spr = self.signals.first().map(|s| s.samples_per_record);
        if self.signals.iter().any(|s| Some(s.samples_per_record) != spr) {
            bail!("signals use different samples-per-record; use write_signals");
        }
        let rows: Vec<ArrayView1<'_, f64>> = data.rows().into_iter().collect();
        self.write_signals(path, &rows)
    }

    /// Write one row of samples per signal (volts).  Signals may use
    /// different samples-per-record, but every row must span the same
    /// whole number of records.
    pub fn write_signals(&self, path: &Path, rows: &[ArrayView1<'_, f64>]) -> Result<()> {
        let n_ch = rows.len();
        if n_ch != self.signals.len() {
            bail!("data has {n_ch} rows but {} signals are declared", self.signals.len());
        }
        let first = match self.signals.first() {
            Some(s) => s,
            None => bail!("at least one signal is required"),
        };
        if self.signals.iter().any(|s| s.samples_per_record == 0) {
            bail!("every signal needs a non-zero samples-per-record");
        }
        if rows[0].len() % first.samples_per_record != 0 {
            bail!(
                "{} samples is not a whole number of {}-sample records",
                rows[0].len(),
                first.samples_per_record
            );
        }
        let n_records = rows[0].len() / first.samples_per_record;
        for (row, sig) in rows.iter().zip(&self.signals) {
            if row.len() != n_records * sig.samples_per_record {
                bail!(
                    "signal {} has {} samples, expected {} for {n_records} records",
                    sig.label,
                    row.len(),
                    n_records * sig.samples_per_record
                );
            }
        }

        let header = EdfHeader {
            format:          self.format,
            patient_id:      self.patient_id.clone(),
            recording_id:    self.recording_id.clone(),
            start_date:      self.start_date.clone(),
            start_time:      self.start_time.clone(),
            header_bytes:    256 * (n_ch + 1),
            reserved:        match self.format {
                FileFormat::Bdf => "24BIT".into(),
                FileFormat::Edf => String::new(),
            },
            n_records:       n_records as i64,
            record_duration: self.record_duration,
            signals:         self.signals.clone(),
        };

        let mut f = BufWriter::new(File::create(path)?);
        f.write_all(&header.to_bytes()?)?;

        let mut record = Vec::with_capacity(header.record_bytes());
        for rec in 0..n_records {
            record.clear();
            for (row, sig) in rows.iter().zip(&self.signals) {
                let spr = sig.samples_per_record;
                for t in rec * spr..(rec + 1) * spr {
                    let d = sig.to_digital(row[t]);
                    match self.format {
                        FileFormat::Edf => record.extend_from_slice(&(d as i16).to_le_bytes()),
                        FileFormat::Bdf => record.extend_from_slice(&d.to_le_bytes()[..3]),
                    }
                }
            }
            f.write_all(&record)?;
        }
        f.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bdf::raw::open_raw;

    fn scratch(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("eegmi-writer-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn bdf_negative_values_survive() {
        let path = scratch("neg.bdf");
        let sig = SignalInfo::full_scale(FileFormat::Bdf, "A1", "", 10);
        let data = Array2::from_shape_fn((1, 30), |(_, t)| t as f64 - 15.0);
        EdfWriter::new(FileFormat::Bdf, vec![sig], 1.0).write(&path, &data).unwrap();

        let raw = open_raw(&path).unwrap();
        let back = raw.read_all_data().unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn edf_slice_crosses_records() {
        let path = scratch("slice.edf");
        let sigs = vec![
            SignalInfo::full_scale(FileFormat::Edf, "C3", "", 4),
            SignalInfo::full_scale(FileFormat::Edf, "C4", "", 4),
        ];
        let data = Array2::from_shape_fn((2, 12), |(c, t)| (c * 100 + t) as f64);
        EdfWriter::new(FileFormat::Edf, sigs, 0.5).write(&path, &data).unwrap();

        let raw = open_raw(&path).unwrap();
        assert_eq!(raw.sfreq(), 8.0);
        let part = raw.read_slice(3, 9).unwrap();
        assert_eq!(part, data.slice(ndarray::s![.., 3..9]));
    }

    #[test]
    fn mixed_rates_read_per_channel() {
        let path = scratch("mixed.bdf");
        let sigs = vec![
            SignalInfo::full_scale(FileFormat::Bdf, "EEG1", "", 10),
            SignalInfo::full_scale(FileFormat::Bdf, "Accel", "", 2),
        ];
        let eeg = ndarray::Array1::from_shape_fn(30, |t| t as f64);
        let accel = ndarray::Array1::from_vec(vec![-1.0, -2.0, -3.0, -4.0, -5.0, -6.0]);
        EdfWriter::new(FileFormat::Bdf, sigs, 1.0)
            .write_signals(&path, &[eeg.view(), accel.view()])
            .unwrap();

        let raw = open_raw(&path).unwrap();
        assert_eq!(raw.channel_sfreq(1), 2.0);
        assert_eq!(raw.channel_n_times(1), 6);
        assert_eq!(raw.read_slice_picks(&[0], 5, 25).unwrap().row(0), eeg.slice(ndarray::s![5..25]));
        assert_eq!(raw.read_slice_picks(&[1], 0, 6).unwrap().row(0), accel);
        assert!(raw.read_slice(0, 30).is_err());
    }

    #[test]
    fn rows_must_cover_same_records() {
        let path = scratch("ragged.bdf");
        let sigs = vec![
            SignalInfo::full_scale(FileFormat::Bdf, "A", "", 10),
            SignalInfo::full_scale(FileFormat::Bdf, "B", "", 2),
        ];
        let a = ndarray::Array1::zeros(20);
        let b = ndarray::Array1::zeros(6);
        assert!(EdfWriter::new(FileFormat::Bdf, sigs, 1.0).write_signals(&path, &[a.view(), b.view()]).is_err());
    }

    #[test]
    fn rejects_partial_record() {
        let path = scratch("partial.bdf");
        let sig = SignalInfo::full_scale(FileFormat::Bdf, "A1", "", 10);
        let data = Array2::zeros((1, 15));
        assert!(EdfWriter::new(FileFormat::Bdf, vec![sig], 1.0).write(&path, &data).is_err());
    }
}
