//! MAT-file (level 5) reader and writer.
//!
//! Subject archives use the same container as `scipy.io.savemat`, so they
//! open in MATLAB, Octave and SciPy.  Only what the archives need is
//! supported: uncompressed, little-endian files holding real numeric arrays.
//!
//! # Layout
//! ```text
//! 128-byte header   116 text · 8 subsys offset · u16 version 0x0100 · "IM"
//! data elements     tag (u32 type, u32 n_bytes) + payload, 8-byte aligned
//!   miMATRIX(14)
//!     array flags   miUINT32 × 2   (class in low byte)
//!     dimensions    miINT32  × ndim
//!     array name    miINT8   × len
//!     real part     numeric  × prod(dims), column-major
//! ```
//! Elements of 4 bytes or less may use the packed "small data element"
//! tag (`u16 n_bytes` in the upper half of the first word, data inline).
//!
//! # Quick start
//! ```no_run
//! use eegmi::mat::{MatFile, MatWriter};
//! use ndarray::Array2;
//!
//! let mut w = MatWriter::new();
//! w.add_scalar("fs", 250.0);
//! w.add_array2("x0", &Array2::zeros((8, 15_000)));
//! w.write("subject_01.mat".as_ref()).unwrap();
//!
//! let mat = MatFile::read("subject_01.mat".as_ref()).unwrap();
//! let fs = mat.get("fs").and_then(|v| v.scalar());
//! ```
pub mod read;
pub mod write;

use anyhow::{bail, Result};
use ndarray::{Array2, ShapeBuilder};
use std::collections::BTreeMap;

pub use write::MatWriter;

// ── Data types (miXXX) ────────────────────────────────────────────────────
pub const MI_INT8: u32       = 1;
pub const MI_UINT8: u32      = 2;
pub const MI_INT16: u32      = 3;
pub const MI_UINT16: u32     = 4;
pub const MI_INT32: u32      = 5;
pub const MI_UINT32: u32     = 6;
pub const MI_SINGLE: u32     = 7;
pub const MI_DOUBLE: u32     = 9;
pub const MI_INT64: u32      = 12;
pub const MI_UINT64: u32     = 13;
pub const MI_MATRIX: u32     = 14;
pub const MI_COMPRESSED: u32 = 15;

// ── Array classes (mxXXX_CLASS) ───────────────────────────────────────────
pub const MX_DOUBLE_CLASS: u8 = 6;
pub const MX_UINT64_CLASS: u8 = 15;
/// Complex flag bit in the array-flags word.
pub const FLAG_COMPLEX: u32   = 0x0800;

/// One real numeric variable, stored column-major as f64.
#[derive(Debug, Clone, PartialEq)]
pub struct MatArray {
    pub dims: Vec<usize>,
    /// Elements in MATLAB (column-major) order.
    pub data: Vec<f64>,
}

impl MatArray {
    /// The value of a 1 × 1 array.
    pub fn scalar(&self) -> Option<f64> {
        (self.data.len() == 1).then(|| self.data[0])
    }

    /// Convert a 2-D array into a standard-layout `[rows, cols]` ndarray.
    pub fn to_array2(&self) -> Result<Array2<f64>> {
        let &[rows, cols] = self.dims.as_slice() else {
            bail!("expected a 2-D array, got dims {:?}", self.dims);
        };
        let arr = Array2::from_shape_vec((rows, cols).f(), self.data.clone())?;
        Ok(arr.as_standard_layout().into_owned())
    }
}

/// All numeric variables of a MAT-file, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatFile {
    pub vars: BTreeMap<String, MatArray>,
}

impl MatFile {
    pub fn get(&self, name: &str) -> Option<&MatArray> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }
}

/// Round `n` up to the next multiple of 8.
#[inline]
pub(crate) fn pad8(n: usize) -> usize {
    n.div_ceil(8) * 8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_major_to_rows() {
        // [[1, 2, 3], [4, 5, 6]] in MATLAB order.
        let a = MatArray { dims: vec![2, 3], data: vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0] };
        let arr = a.to_array2().unwrap();
        assert_eq!(arr, ndarray::array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert!(arr.is_standard_layout());
    }

    #[test]
    fn scalar_only_for_single_element() {
        assert_eq!(MatArray { dims: vec![1, 1], data: vec![250.0] }.scalar(), Some(250.0));
        assert_eq!(MatArray { dims: vec![1, 2], data: vec![1.0, 2.0] }.scalar(), None);
    }

    #[test]
    fn three_d_is_not_array2() {
        let a = MatArray { dims: vec![1, 1, 1], data: vec![0.0] };
        assert!(a.to_array2().is_err());
    }
}
