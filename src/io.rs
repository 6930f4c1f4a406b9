//! Safetensors export of epoched trials.
//!
//! The file holds `X [N, C, T]` (F64), `y [N]` (I32 class codes) and
//! `session [N]` (I32 session index), so the same trials can be inspected
//! from Python (`safetensors.numpy.load_file`) or any other tool.
use std::io::Write;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use ndarray::{Array2, ArrayView3};

use crate::paradigm::EpochsData;

// ── Generic safetensors builder ───────────────────────────────────────────────

/// Minimal safetensors writer for F32, F64 and I32 tensors.
///
/// ```rust,no_run
/// use eegmi::io::StWriter;
/// use std::path::Path;
/// let mut w = StWriter::new();
/// w.add_f64("signal", &[1.0, 2.0, 3.0], &[1, 3]);
/// w.add_i32("codes", &[1, 2], &[2]);
/// w.write(Path::new("/tmp/out.safetensors")).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct StWriter {
    entries: Vec<(String, Vec<u8>, &'static str, Vec<usize>)>,
}

impl StWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_f32(&mut self, name: &str, data: &[f32], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F32", shape.to_vec()));
    }

    pub fn add_f64(&mut self, name: &str, data: &[f64], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F64", shape.to_vec()));
    }

    pub fn add_f64_arr2(&mut self, name: &str, arr: &Array2<f64>) {
        let data: Vec<f64> = arr.iter().copied().collect();
        self.add_f64(name, &data, &[arr.nrows(), arr.ncols()]);
    }

    /// Row-major copy of a 3-D view.
    pub fn add_f64_arr3(&mut self, name: &str, arr: ArrayView3<'_, f64>) {
        let data: Vec<f64> = arr.iter().copied().collect();
        self.add_f64(name, &data, arr.shape());
    }

    pub fn add_i32(&mut self, name: &str, data: &[i32], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "I32", shape.to_vec()));
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let mut header_map = serde_json::Map::new();
        let mut offset: usize = 0;
        for (name, data, dtype, shape) in &self.entries {
            header_map.insert(name.clone(), serde_json::json!({
                "dtype": dtype,
                "shape": shape,
                "data_offsets": [offset, offset + data.len()],
            }));
            offset += data.len();
        }
        let hdr_bytes = serde_json::to_vec(&header_map)?;
        let pad = (8 - hdr_bytes.len() % 8) % 8;
        let padded: Vec<u8> = hdr_bytes.into_iter()
            .chain(std::iter::repeat(b' ').take(pad))
            .collect();
        let mut f = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        f.write_all(&(padded.len() as u64).to_le_bytes())?;
        f.write_all(&padded)?;
        for (_, data, _, _) in &self.entries {
            f.write_all(data)?;
        }
        Ok(())
    }
}

// ── Trial export ──────────────────────────────────────────────────────────────

/// Write `epochs` with their encoded labels `codes` to `path`.
///
/// Session `session_K` is stored as `K`.
pub fn write_epochs(path: &Path, epochs: &EpochsData, codes: &[usize]) -> Result<()> {
    let n = epochs.n_trials();
    ensure!(codes.len() == n, "{} trials but {} label codes", n, codes.len());
    ensure!(epochs.x.shape()[0] == n, "trial array holds {} rows for {} labels", epochs.x.shape()[0], n);

    let y: Vec<i32> = codes.iter().map(|&c| c as i32).collect();
    let session: Vec<i32> = epochs.sessions().iter().map(|k| k.index() as i32).collect();

    let mut w = StWriter::new();
    w.add_f64_arr3("X", epochs.x.view());
    w.add_i32("y", &y, &[n]);
    w.add_i32("session", &session, &[n]);
    w.write(path)
}
