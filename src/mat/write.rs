//! MAT-file writer: double-precision real arrays only.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Result};
use ndarray::Array2;

use super::{pad8, MI_DOUBLE, MI_INT32, MI_INT8, MI_MATRIX, MI_UINT32, MX_DOUBLE_CLASS};

/// Collects named arrays, then writes them as one MAT-file.
///
/// Variables are written in insertion order.
#[derive(Debug, Default)]
pub struct MatWriter {
    /// (name, dims, column-major data)
    entries: Vec<(String, Vec<usize>, Vec<f64>)>,
}

impl MatWriter {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Add a 1 × 1 double, as `savemat` does for a Python scalar.
    pub fn add_scalar(&mut self, name: &str, value: f64) {
        self.entries.push((name.to_string(), vec![1, 1], vec![value]));
    }

    /// Add a 2-D array; rows stay rows when loaded in MATLAB or SciPy.
    pub fn add_array2(&mut self, name: &str, arr: &Array2<f64>) {
        // Iterating the transpose in logical order yields column-major data.
        let data: Vec<f64> = arr.t().iter().copied().collect();
        self.entries.push((name.to_string(), vec![arr.nrows(), arr.ncols()], data));
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let mut f = BufWriter::new(File::create(path)?);
        f.write_all(&file_header())?;
        for (name, dims, data) in &self.entries {
            f.write_all(&matrix_element(name, dims, data)?)?;
        }
        f.flush()?;
        Ok(())
    }
}

fn file_header() -> [u8; 128] {
    let mut h = [b' '; 128];
    let text = b"MATLAB 5.0 MAT-file, Platform: rust, Created by: eegmi";
    h[..text.len()].copy_from_slice(text);
    // Subsystem data offset: unused.
    h[116..124].fill(0);
    h[124..126].copy_from_slice(&0x0100u16.to_le_bytes());
    h[126..128].copy_from_slice(b"IM");
    h
}

fn push_tag(out: &mut Vec<u8>, mi_type: u32, n_bytes: usize) {
    out.extend_from_slice(&mi_type.to_le_bytes());
    out.extend_from_slice(&(n_bytes as u32).to_le_bytes());
}

fn pad_to_8(out: &mut Vec<u8>) {
    let target = pad8(out.len());
    out.resize(target, 0);
}

fn matrix_element(name: &str, dims: &[usize], data: &[f64]) -> Result<Vec<u8>> {
    if !name.is_ascii() || name.is_empty() {
        bail!("variable name {name:?} must be non-empty ASCII");
    }
    let n: usize = dims.iter().product();
    if n != data.len() {
        bail!("variable {name}: dims {dims:?} do not match {} elements", data.len());
    }

    let mut body = Vec::with_capacity(64 + 8 * n);

    // Array flags.
    push_tag(&mut body, MI_UINT32, 8);
    body.extend_from_slice(&(MX_DOUBLE_CLASS as u32).to_le_bytes());
    body.extend_from_slice(&0u32.to_le_bytes());

    // Dimensions.
    push_tag(&mut body, MI_INT32, 4 * dims.len());
    for &d in dims {
        let d = i32::try_from(d)?;
        body.extend_from_slice(&d.to_le_bytes());
    }
    pad_to_8(&mut body);

    // Name.
    push_tag(&mut body, MI_INT8, name.len());
    body.extend_from_slice(name.as_bytes());
    pad_to_8(&mut body);

    // Real part.
    push_tag(&mut body, MI_DOUBLE, 8 * n);
    for v in data {
        body.extend_from_slice(&v.to_le_bytes());
    }

    let mut out = Vec::with_capacity(8 + body.len());
    push_tag(&mut out, MI_MATRIX, body.len());
    out.extend_from_slice(&body);
    Ok(out)
}
