//! Fixed-width ASCII header of an EDF / BDF file.
//!
//! On-disk layout (all fields space-padded ASCII):
//! ```text
//!   8  version         "0" (EDF) or 0xFF "BIOSEMI" (BDF)
//!  80  patient id
//!  80  recording id
//!   8  start date      dd.mm.yy
//!   8  start time      hh.mm.ss
//!   8  header bytes    256 · (ns + 1)
//!  44  reserved        "24BIT" (BDF), "EDF+C" / "EDF+D" (EDF+)
//!   8  n data records  -1 when unknown
//!   8  record duration seconds
//!   4  ns              number of signals
//! ───────────────────
//! 256 bytes, then ns × 256 bytes of signal fields, each stored
//! field-major: ns labels, then ns transducers, …
//! ```
use std::io::Read;

use anyhow::{bail, Context, Result};

/// Sample width variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// 16-bit little-endian two's complement samples.
    Edf,
    /// 24-bit little-endian two's complement samples (BioSemi).
    Bdf,
}

impl FileFormat {
    /// Bytes per stored sample.
    #[inline]
    pub fn sample_bytes(self) -> usize {
        match self {
            FileFormat::Edf => 2,
            FileFormat::Bdf => 3,
        }
    }

    /// Raw 8-byte version field.
    pub fn version_field(self) -> [u8; 8] {
        match self {
            FileFormat::Edf => *b"0       ",
            FileFormat::Bdf => [0xFF, b'B', b'I', b'O', b'S', b'E', b'M', b'I'],
        }
    }

    /// Digital range of a full-scale signal.
    pub fn digital_range(self) -> (i32, i32) {
        match self {
            FileFormat::Edf => (-32_768, 32_767),
            FileFormat::Bdf => (-8_388_608, 8_388_607),
        }
    }
}

/// Per-signal header fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalInfo {
    pub label:              String,
    pub transducer:         String,
    /// Physical unit, e.g. `uV`.
    pub physical_dimension: String,
    pub physical_min:       f64,
    pub physical_max:       f64,
    pub digital_min:        i32,
    pub digital_max:        i32,
    pub prefiltering:       String,
    pub samples_per_record: usize,
}

impl SignalInfo {
    /// Signal whose physical range equals the full digital range of `format`,
    /// so stored integers are the physical values in `physical_dimension`.
    pub fn full_scale(
        format: FileFormat,
        label: &str,
        physical_dimension: &str,
        samples_per_record: usize,
    ) -> Self {
        let (dmin, dmax) = format.digital_range();
        Self {
            label: label.to_string(),
            transducer: String::new(),
            physical_dimension: physical_dimension.to_string(),
            physical_min: dmin as f64,
            physical_max: dmax as f64,
            digital_min: dmin,
            digital_max: dmax,
            prefiltering: String::new(),
            samples_per_record,
        }
    }

    /// Physical units per digital step.
    #[inline]
    pub fn gain(&self) -> f64 {
        (self.physical_max - self.physical_min) / (self.digital_max - self.digital_min) as f64
    }

    /// Factor converting the physical unit to SI volts, as MNE does for
    /// EEG channels: `uV`/`µV` → 1e-6, `mV` → 1e-3, anything else → 1.
    pub fn unit_scale(&self) -> f64 {
        match self.physical_dimension.trim() {
            "uV" | "µV" | "μV" => 1e-6,
            "mV" => 1e-3,
            "nV" => 1e-9,
            _ => 1.0,
        }
    }

    /// Calibrate one stored integer to SI units.
    #[inline]
    pub fn to_physical(&self, digital: i32) -> f64 {
        let phys = (digital - self.digital_min) as f64 * self.gain() + self.physical_min;
        phys * self.unit_scale()
    }

    /// Inverse of [`SignalInfo::to_physical`], rounded and clamped to the
    /// digital range.
    pub fn to_digital(&self, si_value: f64) -> i32 {
        let phys = si_value / self.unit_scale();
        let d = (phys - self.physical_min) / self.gain() + self.digital_min as f64;
        d.round()
            .clamp(self.digital_min as f64, self.digital_max as f64) as i32
    }

    /// `true` for the EDF+/BDF+ annotation channel, which carries TAL text
    /// rather than samples.
    pub fn is_annotation(&self) -> bool {
        matches!(self.label.trim(), "EDF Annotations" | "BDF Annotations")
    }
}

/// Parsed file header.
#[derive(Debug, Clone, PartialEq)]
pub struct EdfHeader {
    pub format:          FileFormat,
    pub patient_id:      String,
    pub recording_id:    String,
    pub start_date:      String,
    pub start_time:      String,
    pub header_bytes:    usize,
    pub reserved:        String,
    /// Number of data records; `-1` when the writer did not know it.
    pub n_records:       i64,
    /// Duration of one data record in seconds.
    pub record_duration: f64,
    pub signals:         Vec<SignalInfo>,
}

impl EdfHeader {
    /// Bytes occupied by one data record across all signals.
    pub fn record_bytes(&self) -> usize {
        let n: usize = self.signals.iter().map(|s| s.samples_per_record).sum();
        n * self.format.sample_bytes()
    }

    /// Sampling rate of signal `idx` in Hz.
    pub fn signal_sfreq(&self, idx: usize) -> f64 {
        self.signals[idx].samples_per_record as f64 / self.record_duration
    }

    /// Serialise back to the fixed-width layout (used by the writer).
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let ns = self.signals.len();
        let mut out = Vec::with_capacity(256 * (ns + 1));
        out.extend_from_slice(&self.format.version_field());
        push_field(&mut out, &self.patient_id, 80)?;
        push_field(&mut out, &self.recording_id, 80)?;
        push_field(&mut out, &self.start_date, 8)?;
        push_field(&mut out, &self.start_time, 8)?;
        push_field(&mut out, &(256 * (ns + 1)).to_string(), 8)?;
        push_field(&mut out, &self.reserved, 44)?;
        push_field(&mut out, &self.n_records.to_string(), 8)?;
        push_field(&mut out, &format_number(self.record_duration, 8)?, 8)?;
        push_field(&mut out, &ns.to_string(), 4)?;

        for s in &self.signals { push_field(&mut out, &s.label, 16)?; }
        for s in &self.signals { push_field(&mut out, &s.transducer, 80)?; }
        for s in &self.signals { push_field(&mut out, &s.physical_dimension, 8)?; }
        for s in &self.signals { push_field(&mut out, &format_number(s.physical_min, 8)?, 8)?; }
        for s in &self.signals { push_field(&mut out, &format_number(s.physical_max, 8)?, 8)?; }
        for s in &self.signals { push_field(&mut out, &s.digital_min.to_string(), 8)?; }
        for s in &self.signals { push_field(&mut out, &s.digital_max.to_string(), 8)?; }
        for s in &self.signals { push_field(&mut out, &s.prefiltering, 80)?; }
        for s in &self.signals { push_field(&mut out, &s.samples_per_record.to_string(), 8)?; }
        for _ in &self.signals { push_field(&mut out, "", 32)?; }
        Ok(out)
    }
}

/// Read and parse the complete header (fixed part + signal fields).
///
/// Leaves the reader positioned at the first data record.
pub fn read_header<R: Read>(r: &mut R) -> Result<EdfHeader> {
    let mut fixed = [0u8; 256];
    r.read_exact(&mut fixed).context("file shorter than the 256-byte header")?;

    let format = if fixed[0] == 0xFF && &fixed[1..8] == b"BIOSEMI" {
        FileFormat::Bdf
    } else if ascii(&fixed[0..8]) == "0" {
        FileFormat::Edf
    } else {
        bail!("unrecognised version field {:?}", &fixed[0..8]);
    };

    let header_bytes: usize = parse_num(&fixed[184..192], "header bytes")?;
    let n_records: i64 = parse_num(&fixed[236..244], "number of data records")?;
    let record_duration: f64 = parse_num(&fixed[244..252], "record duration")?;
    let ns: usize = parse_num(&fixed[252..256], "number of signals")?;

    if header_bytes != 256 * (ns + 1) {
        bail!("header size {header_bytes} does not match {ns} signals");
    }
    if !(record_duration > 0.0) {
        bail!("record duration must be positive, got {record_duration}");
    }

    let mut sig = vec![0u8; 256 * ns];
    r.read_exact(&mut sig).context("truncated signal header")?;

    // Field-major layout: each field holds `ns` consecutive entries.
    const WIDTHS: [usize; 9] = [16, 80, 8, 8, 8, 8, 8, 80, 8];
    let mut starts = [0usize; 9];
    for f in 1..WIDTHS.len() {
        starts[f] = starts[f - 1] + WIDTHS[f - 1] * ns;
    }
    let field = |f: usize, i: usize| signal_field(&sig, starts[f] + i * WIDTHS[f], WIDTHS[f]);

    let mut signals = Vec::with_capacity(ns);
    for i in 0..ns {
        let s = SignalInfo {
            label:              ascii(field(0, i)),
            transducer:         ascii(field(1, i)),
            physical_dimension: ascii(field(2, i)),
            physical_min:       parse_num(field(3, i), "physical minimum")?,
            physical_max:       parse_num(field(4, i), "physical maximum")?,
            digital_min:        parse_num(field(5, i), "digital minimum")?,
            digital_max:        parse_num(field(6, i), "digital maximum")?,
            prefiltering:       ascii(field(7, i)),
            samples_per_record: parse_num(field(8, i), "samples per record")?,
        };
        if s.digital_max <= s.digital_min {
            bail!("signal {i} ({}): digital max {} <= min {}", s.label, s.digital_max, s.digital_min);
        }
        signals.push(s);
    }

    Ok(EdfHeader {
        format,
        patient_id:   ascii(&fixed[8..88]),
        recording_id: ascii(&fixed[88..168]),
        start_date:   ascii(&fixed[168..176]),
        start_time:   ascii(&fixed[176..184]),
        header_bytes,
        reserved:     ascii(&fixed[192..236]),
        n_records,
        record_duration,
        signals,
    })
}

// ── Field helpers ─────────────────────────────────────────────────────────

fn signal_field(sig: &[u8], start: usize, width: usize) -> &[u8] {
    &sig[start..start + width]
}

fn ascii(raw: &[u8]) -> String {
    raw.iter()
        .map(|&b| b as char)
        .collect::<String>()
        .trim()
        .to_string()
}

fn parse_num<T: std::str::FromStr>(raw: &[u8], what: &str) -> Result<T> {
    let s = ascii(raw);
    s.parse::<T>()
        .map_err(|_| anyhow::anyhow!("invalid {what} field {s:?}"))
}

fn push_field(out: &mut Vec<u8>, value: &str, width: usize) -> Result<()> {
    if !value.is_ascii() {
        bail!("header field {value:?} is not ASCII");
    }
    if value.len() > width {
        bail!("header field {value:?} exceeds {width} bytes");
    }
    out.extend_from_slice(value.as_bytes());
    out.extend(std::iter::repeat(b' ').take(width - value.len()));
    Ok(())
}

/// Shortest decimal rendering of `v` that fits `width` characters.
fn format_number(v: f64, width: usize) -> Result<String> {
    let plain = format!("{v}");
    if plain.len() <= width {
        return Ok(plain);
    }
    for prec in (0..width).rev() {
        let s = format!("{v:.prec$}");
        if s.len() <= width {
            return Ok(s);
        }
    }
    bail!("value {v} cannot be written in {width} characters")
}
