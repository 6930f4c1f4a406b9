//! EDF / BDF file format reader and writer.
//!
//! Implements reading of `.bdf` (BioSemi 24-bit) and `.edf` (16-bit)
//! biosignal recordings with the same calibration as
//! `mne.io.read_raw_bdf` / `mne.io.read_raw_edf`.
//!
//! # Quick start
//! ```no_run
//! use eegmi::bdf::open_raw;
//!
//! let raw = open_raw("../my_data/s0_0.bdf").unwrap();
//! println!("{} channels @ {} Hz", raw.n_chan(), raw.sfreq());
//! let data = raw.read_all_data().unwrap();  // [n_chan, n_times] f64, volts
//! ```
pub mod header;
pub mod raw;
pub mod writer;

// Re-export the most commonly used items.
pub use header::{read_header, EdfHeader, FileFormat, SignalInfo};
pub use raw::{open_raw, RawEdf};
pub use writer::EdfWriter;
