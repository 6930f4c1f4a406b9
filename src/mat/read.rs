//! MAT-file reader.
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};

use super::*;

/// One parsed data element: type and payload.
struct Element<'a> {
    mi_type: u32,
    data:    &'a [u8],
}

/// Read the element starting at `pos`; returns it and the offset of the next.
fn read_element(bytes: &[u8], pos: usize) -> Result<(Element<'_>, usize)> {
    ensure!(pos + 8 <= bytes.len(), "truncated element tag at offset {pos}");
    let word = u32::from_le_bytes(bytes[pos..pos + 4].try_into()?);

    // Small data element: n_bytes packed into the upper 16 bits.
    if word >> 16 != 0 {
        let n = (word >> 16) as usize;
        ensure!(n <= 4, "small element at offset {pos} claims {n} bytes");
        let el = Element { mi_type: word & 0xFFFF, data: &bytes[pos + 4..pos + 4 + n] };
        return Ok((el, pos + 8));
    }

    let n = u32::from_le_bytes(bytes[pos + 4..pos + 8].try_into()?) as usize;
    let start = pos + 8;
    ensure!(
        start + n <= bytes.len(),
        "element at offset {pos} needs {n} bytes, only {} left",
        bytes.len() - start
    );
    let el = Element { mi_type: word, data: &bytes[start..start + n] };
    Ok((el, start + pad8(n)))
}

/// Convert a numeric payload of any `mi*` type to f64.
fn numeric_to_f64(el: &Element<'_>) -> Result<Vec<f64>> {
    let d = el.data;
    let v: Vec<f64> = match el.mi_type {
        MI_INT8   => d.iter().map(|&b| b as i8 as f64).collect(),
        MI_UINT8  => d.iter().map(|&b| b as f64).collect(),
        MI_INT16  => d.chunks_exact(2).map(|b| i16::from_le_bytes([b[0], b[1]]) as f64).collect(),
        MI_UINT16 => d.chunks_exact(2).map(|b| u16::from_le_bytes([b[0], b[1]]) as f64).collect(),
        MI_INT32  => d.chunks_exact(4).map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64).collect(),
        MI_UINT32 => d.chunks_exact(4).map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64).collect(),
        MI_SINGLE => d.chunks_exact(4).map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64).collect(),
        MI_DOUBLE => d.chunks_exact(8).map(|b| f64::from_le_bytes(b.try_into().unwrap_or_default())).collect(),
        MI_INT64  => d.chunks_exact(8).map(|b| i64::from_le_bytes(b.try_into().unwrap_or_default()) as f64).collect(),
        MI_UINT64 => d.chunks_exact(8).map(|b| u64::from_le_bytes(b.try_into().unwrap_or_default()) as f64).collect(),
        other => bail!("unsupported numeric data type {other}"),
    };
    Ok(v)
}

/// Parse the sub-elements of one `miMATRIX`.
///
/// Returns `None` for variables that are not real numeric arrays
/// (cells, structs, chars, sparse); those are skipped by the caller.
fn parse_matrix(body: &[u8]) -> Result<Option<(String, MatArray)>> {
    let (flags, pos) = read_element(body, 0).context("array flags")?;
    ensure!(flags.data.len() >= 8, "array flags too short");
    let word = u32::from_le_bytes(flags.data[0..4].try_into()?);
    let class = (word & 0xFF) as u8;

    let (dims_el, pos) = read_element(body, pos).context("dimensions")?;
    let dims: Vec<usize> = numeric_to_f64(&dims_el)?
        .into_iter()
        .map(|d| d as usize)
        .collect();

    let (name_el, pos) = read_element(body, pos).context("array name")?;
    let name = String::from_utf8_lossy(name_el.data).into_owned();

    if !(MX_DOUBLE_CLASS..=MX_UINT64_CLASS).contains(&class) {
        tracing::warn!(name = %name, class, "skipping non-numeric MAT variable");
        return Ok(None);
    }
    ensure!(word & FLAG_COMPLEX == 0, "variable {name}: complex arrays are not supported");

    let (real, _) = read_element(body, pos).with_context(|| format!("variable {name}: real part"))?;
    let data = numeric_to_f64(&real).with_context(|| format!("variable {name}"))?;
    let expected: usize = dims.iter().product();
    ensure!(
        data.len() == expected,
        "variable {name}: {} elements for dims {dims:?}",
        data.len()
    );
    Ok(Some((name, MatArray { dims, data })))
}

impl MatFile {
    /// Parse a MAT-file already held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ensure!(bytes.len() >= 128, "file shorter than the 128-byte MAT header");
        match &bytes[126..128] {
            b"IM" => {}
            b"MI" => bail!("big-endian MAT-files are not supported"),
            other => bail!("not a level 5 MAT-file (endian indicator {other:?})"),
        }
        let version = u16::from_le_bytes([bytes[124], bytes[125]]);
        ensure!(version == 0x0100, "unsupported MAT-file version {version:#06x}");

        let mut vars = BTreeMap::new();
        let mut pos = 128;
        while pos < bytes.len() {
            let (el, next) = read_element(bytes, pos)?;
            match el.mi_type {
                MI_MATRIX => {
                    if let Some((name, arr)) = parse_matrix(el.data)
                        .with_context(|| format!("matrix element at offset {pos}"))?
                    {
                        vars.insert(name, arr);
                    }
                }
                MI_COMPRESSED => bail!("compressed MAT-file elements are not supported"),
                other => tracing::debug!(mi_type = other, pos, "skipping top-level element"),
            }
            pos = next;
        }
        Ok(MatFile { vars })
    }

    /// Read and parse a MAT-file from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_bytes(&bytes).with_context(|| format!("parsing {}", path.display()))
    }
}
