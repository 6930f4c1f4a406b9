//! Raw EDF/BDF data reader, the Rust counterpart of `mne.io.read_raw_bdf`.
//!
//! # Algorithm
//! 1. Parse the header (fixed part + per-signal fields).
//! 2. Resolve the record count from the file size when the header says `-1`.
//! 3. Pick the data channels (everything except EDF+/BDF+ annotation signals).
//! 4. On read, load the data records overlapping the requested slice and
//!    decode the selected channels' samples.  Channels left out of the
//!    selection may use a different samples-per-record.
//!
//! # Calibration
//! ```text
//! volts[ch, t] = ((digital[t] − dig_min) · gain + phys_min) · unit_scale
//! gain         = (phys_max − phys_min) / (dig_max − dig_min)
//! ```
//! This matches MNE's `_read_segment_file` for EDF/BDF, including the
//! `uV` → V conversion of EEG channels.
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use ndarray::{s, Array2};

use super::header::{read_header, EdfHeader, FileFormat};

/// An opened EDF/BDF recording.  Data are read lazily from `path`.
#[derive(Debug, Clone)]
pub struct RawEdf {
    /// Parsed header.
    pub header:    EdfHeader,
    /// File this was read from.
    pub path:      PathBuf,
    /// Number of complete data records available on disk.
    pub n_records: usize,
    /// Indices into `header.signals` of the sample-carrying channels.
    pub picks:     Vec<usize>,
}

impl RawEdf {
    /// Number of data channels (annotation signals excluded).
    #[inline]
    pub fn n_chan(&self) -> usize {
        self.picks.len()
    }

    /// Data channel labels in file order.
    pub fn ch_names(&self) -> Vec<String> {
        self.picks.iter().map(|&i| self.header.signals[i].label.clone()).collect()
    }

    /// Sampling rate of data channel `ch` in Hz.
    pub fn channel_sfreq(&self, ch: usize) -> f64 {
        self.header.signal_sfreq(self.picks[ch])
    }

    /// Common sampling rate of the data channels (highest rate if they differ).
    pub fn sfreq(&self) -> f64 {
        (0..self.n_chan())
            .map(|c| self.channel_sfreq(c))
            .fold(0.0, f64::max)
    }

    /// Samples per record shared by the data channels in `channels`.
    fn samples_per_record(&self, channels: &[usize]) -> Result<usize> {
        let mut spr = channels.iter().map(|&c| self.header.signals[self.picks[c]].samples_per_record);
        let first = spr.next().context("no data channels selected")?;
        if spr.any(|n| n != first) {
            bail!(
                "{}: selected channels use different sampling rates",
                self.path.display()
            );
        }
        Ok(first)
    }

    /// Total number of time points per channel, taken from the first data
    /// channel.
    pub fn n_times(&self) -> usize {
        if self.picks.is_empty() { 0 } else { self.channel_n_times(0) }
    }

    /// Number of time points of data channel `ch`.
    pub fn channel_n_times(&self, ch: usize) -> usize {
        self.header.signals[self.picks[ch]].samples_per_record * self.n_records
    }

    /// Total duration in seconds.
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.n_records as f64 * self.header.record_duration
    }

    /// Read **all** data into a `[n_chan, n_times]` f64 array in volts.
    ///
    /// Equivalent to `raw.get_data()` in MNE with `preload=True`.
    pub fn read_all_data(&self) -> Result<Array2<f64>> {
        self.read_slice(0, self.n_times())
    }

    /// Read a half-open time slice `[start, end)` in samples.
    ///
    /// Mirrors `raw.get_data(start=start, stop=end)` in MNE.  Every data
    /// channel must share one sampling rate; see
    /// [`read_slice_picks`](Self::read_slice_picks) otherwise.
    pub fn read_slice(&self, start: usize, end: usize) -> Result<Array2<f64>> {
        let all: Vec<usize> = (0..self.n_chan()).collect();
        self.read_slice_picks(&all, start, end)
    }

    /// Read `[start, end)` of the data channels `channels` only, in the
    /// given order.  Channels outside the selection may use any rate.
    pub fn read_slice_picks(&self, channels: &[usize], start: usize, end: usize) -> Result<Array2<f64>> {
        if let Some(&bad) = channels.iter().find(|&&c| c >= self.n_chan()) {
            bail!("channel {bad} out of range for {} data channels", self.n_chan());
        }
        let spr = self.samples_per_record(channels)?;
        let n_t = spr * self.n_records;
        if start > end || end > n_t {
            bail!("slice [{start}, {end}) out of range for {n_t} samples");
        }
        let mut out = Array2::<f64>::zeros((channels.len(), end - start));
        if start == end {
            return Ok(out);
        }

        let file = File::open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        let mut reader = BufReader::new(file);

        let first_rec = start / spr;
        let last_rec = (end - 1) / spr;
        let rec_bytes = self.header.record_bytes();
        reader.seek(SeekFrom::Start(
            (self.header.header_bytes + first_rec * rec_bytes) as u64,
        ))?;

        let mut buf = vec![0u8; rec_bytes];
        for rec in first_rec..=last_rec {
            reader
                .read_exact(&mut buf)
                .with_context(|| format!("reading data record {rec}"))?;
            let rec_start = rec * spr;
            // Overlap of this record with [start, end), in record-local samples.
            let pick_l = start.saturating_sub(rec_start);
            let pick_r = spr.min(end - rec_start);
            let out_off = rec_start + pick_l - start;

            for (row, &c) in channels.iter().enumerate() {
                let values = decode_signal(&self.header, &buf, self.picks[c]);
                out.slice_mut(s![row, out_off..out_off + (pick_r - pick_l)])
                    .iter_mut()
                    .zip(&values[pick_l..pick_r])
                    .for_each(|(o, &v)| *o = v);
            }
        }
        Ok(out)
    }
}

/// Decode one signal's samples from a data record, calibrated to volts.
fn decode_signal(header: &EdfHeader, record: &[u8], sig_idx: usize) -> Vec<f64> {
    let width = header.format.sample_bytes();
    let offset: usize = header.signals[..sig_idx]
        .iter()
        .map(|s| s.samples_per_record * width)
        .sum();
    let sig = &header.signals[sig_idx];
    let bytes = &record[offset..offset + sig.samples_per_record * width];

    bytes
        .chunks_exact(width)
        .map(|b| {
            let digital = match header.format {
                FileFormat::Edf => i16::from_le_bytes([b[0], b[1]]) as i32,
                FileFormat::Bdf => {
                    let ext = if b[2] & 0x80 != 0 { 0xFF } else { 0x00 };
                    i32::from_le_bytes([b[0], b[1], b[2], ext])
                }
            };
            sig.to_physical(digital)
        })
        .collect()
}

// ── Reader entry point ────────────────────────────────────────────────────

/// Open an EDF or BDF file and return a `RawEdf` without preloading data.
///
/// Mirrors `mne.io.read_raw_bdf(fname, preload=False)`.
pub fn open_raw<P: AsRef<Path>>(path: P) -> Result<RawEdf> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("open {}", path.display()))?;
    let file_len = file.metadata()?.len() as usize;
    let mut reader = BufReader::new(file);
    let header = read_header(&mut reader)
        .with_context(|| format!("reading header of {}", path.display()))?;

    let rec_bytes = header.record_bytes();
    if rec_bytes == 0 {
        bail!("{}: data records are empty", path.display());
    }
    let on_disk = file_len.saturating_sub(header.header_bytes) / rec_bytes;
    let n_records = match usize::try_from(header.n_records) {
        Ok(n) if n <= on_disk => n,
        Ok(n) => bail!(
            "{}: header announces {n} data records but only {on_disk} are present",
            path.display()
        ),
        // -1: record count unknown at write time.
        Err(_) => on_disk,
    };

    let picks: Vec<usize> = header
        .signals
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.is_annotation())
        .map(|(i, _)| i)
        .collect();

    tracing::debug!(
        path = %path.display(),
        n_chan = picks.len(),
        n_records,
        "opened raw capture"
    );

    Ok(RawEdf { header, path: path.to_path_buf(), n_records, picks })
}
