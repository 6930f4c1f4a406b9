//! In-memory continuous recording with channel metadata and annotations.
//!
//! The counterpart of `mne.io.RawArray` + `mne.create_info`.
use std::fmt;

use anyhow::{ensure, Result};
use ndarray::{s, Array2, ArrayView2};

use crate::annotations::Annotations;

/// Channel kind, as in `mne.create_info(ch_types=…)`.  Archived sessions
/// hold EEG channels only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelType {
    Eeg,
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelType::Eeg => f.write_str("eeg"),
        }
    }
}

/// A labelled continuous recording: `[n_chan, n_times]` samples in volts.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecording {
    ch_names:    Vec<String>,
    ch_types:    Vec<ChannelType>,
    sfreq:       f64,
    data:        Array2<f64>,
    annotations: Annotations,
}

impl RawRecording {
    /// Build a recording; names and types must match the data rows.
    pub fn new(
        data: Array2<f64>,
        ch_names: Vec<String>,
        ch_types: Vec<ChannelType>,
        sfreq: f64,
    ) -> Result<Self> {
        ensure!(
            ch_names.len() == data.nrows() && ch_types.len() == data.nrows(),
            "{} channel names / {} types for {} data rows",
            ch_names.len(),
            ch_types.len(),
            data.nrows()
        );
        ensure!(sfreq > 0.0, "sampling rate must be positive, got {sfreq}");
        Ok(Self { ch_names, ch_types, sfreq, data, annotations: Annotations::new() })
    }

    /// Channels named `ch0..ch{n-1}`, all of one type.
    pub fn with_uniform_channels(data: Array2<f64>, ch_type: ChannelType, sfreq: f64) -> Result<Self> {
        let n = data.nrows();
        let names = (0..n).map(|i| format!("ch{i}")).collect();
        Self::new(data, names, vec![ch_type; n], sfreq)
    }

    /// Replace the annotation list (`raw.set_annotations`).
    pub fn set_annotations(&mut self, annotations: Annotations) {
        self.annotations = annotations;
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub fn ch_names(&self) -> &[String] {
        &self.ch_names
    }

    pub fn ch_types(&self) -> &[ChannelType] {
        &self.ch_types
    }

    pub fn sfreq(&self) -> f64 {
        self.sfreq
    }

    #[inline]
    pub fn n_chan(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn n_times(&self) -> usize {
        self.data.ncols()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.n_times() as f64 / self.sfreq
    }

    /// Full sample matrix.
    pub fn data(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Mutable access for in-place processing (filtering).
    pub fn data_mut(&mut self) -> &mut Array2<f64> {
        &mut self.data
    }

    /// Samples `[start, end)` of every channel.
    pub fn window(&self, start: usize, end: usize) -> Option<ArrayView2<'_, f64>> {
        (start <= end && end <= self.n_times()).then(|| self.data.slice(s![.., start..end]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_channel_names() {
        let raw = RawRecording::with_uniform_channels(Array2::zeros((3, 10)), ChannelType::Eeg, 250.0)
            .unwrap();
        assert_eq!(raw.ch_names(), ["ch0", "ch1", "ch2"]);
        assert!(raw.ch_types().iter().all(|t| t.to_string() == "eeg"));
        approx::assert_abs_diff_eq!(raw.duration_secs(), 0.04);
    }

    #[test]
    fn mismatched_names_rejected() {
        let r = RawRecording::new(Array2::zeros((2, 4)), vec!["a".into()], vec![ChannelType::Eeg; 2], 100.0);
        assert!(r.is_err());
    }

    #[test]
    fn window_bounds() {
        let raw = RawRecording::with_uniform_channels(Array2::zeros((1, 10)), ChannelType::Eeg, 10.0)
            .unwrap();
        assert_eq!(raw.window(2, 10).unwrap().ncols(), 8);
        assert!(raw.window(5, 11).is_none());
    }
}
