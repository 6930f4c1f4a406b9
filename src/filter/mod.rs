//! Zero-phase band-pass filters.
//!
//! - [`design`]: Hamming-windowed sinc band-pass design, matching
//!   `mne.filter.create_filter(fir_window='hamming', phase='zero')`.
//! - [`apply`]: FFT convolution with zero-phase alignment and MNE's
//!   reflect-limited edge padding.
//! - [`iir`]: Butterworth second-order sections run forward and backward,
//!   matching `create_filter(method='iir')`.

pub mod apply;
pub mod design;
pub mod iir;

pub use apply::{apply_fir_zero_phase, filter_1d};
pub use design::{auto_filter_length, design_bandpass, firwin_lowpass, hamming};
pub use iir::{apply_iir_zero_phase, butter_bandpass, ringing_samples, sosfiltfilt, Section};

/// Band-pass implementation used by the paradigm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterMethod {
    /// 4th-order Butterworth, forward-backward (MNE `method='iir'`).
    #[default]
    Iir,
    /// Hamming-windowed FIR, zero-phase (MNE `method='fir'`).
    Fir,
}

impl std::str::FromStr for FilterMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "iir" => Ok(Self::Iir),
            "fir" => Ok(Self::Fir),
            other => anyhow::bail!("unknown filter method '{other}', expected 'iir' or 'fir'"),
        }
    }
}
