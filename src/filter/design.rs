//! FIR filter design matching MNE / `scipy.signal.firwin`.
//!
//! For a band-pass `[l_freq, h_freq]` Hz at sampling rate `sfreq`:
//!   • lower transition bandwidth = min(max(0.25 · l_freq, 2.0), l_freq)
//!   • upper transition bandwidth = min(max(0.25 · h_freq, 2.0), nyq − h_freq)
//!   • filter length N            = ceil(3.3 / min(l_tb, h_tb) · sfreq), rounded to odd
//!   • windowed-sinc design (Hamming), cut-offs at the transition mid-points
use std::f64::consts::PI;

use anyhow::{ensure, Result};

/// MNE transition bandwidth below the lower pass-band edge.
pub fn lower_trans_bandwidth(l_freq: f64) -> f64 {
    (0.25 * l_freq).max(2.0).min(l_freq)
}

/// MNE transition bandwidth above the upper pass-band edge.
pub fn upper_trans_bandwidth(h_freq: f64, sfreq: f64) -> f64 {
    (0.25 * h_freq).max(2.0).min(sfreq / 2.0 - h_freq)
}

/// Number of taps for a transition bandwidth, rounded up to odd.
///
/// Formula: `ceil(3.3 / trans_bw · sfreq)` (Hamming window).
pub fn auto_filter_length(trans_bw: f64, sfreq: f64) -> usize {
    let n = (3.3 / trans_bw * sfreq).ceil() as usize;
    n | 1
}

/// Design a zero-phase band-pass FIR filter.
///
/// Matches `mne.filter.create_filter(None, sfreq, l_freq, h_freq,
///   filter_length='auto', fir_window='hamming', fir_design='firwin')`.
/// Returns the impulse response `h[N]`.
pub fn design_bandpass(l_freq: f64, h_freq: f64, sfreq: f64) -> Result<Vec<f64>> {
    let nyq = sfreq / 2.0;
    ensure!(
        0.0 < l_freq && l_freq < h_freq && h_freq < nyq,
        "band [{l_freq}, {h_freq}] Hz must lie strictly inside (0, {nyq}) Hz"
    );
    let l_tb = lower_trans_bandwidth(l_freq);
    let h_tb = upper_trans_bandwidth(h_freq, sfreq);
    let n = auto_filter_length(l_tb.min(h_tb), sfreq);

    // Band-pass = lowpass(upper cut-off) − lowpass(lower cut-off).
    let hi = firwin_lowpass(n, h_freq + h_tb / 2.0, sfreq);
    let lo = firwin_lowpass(n, l_freq - l_tb / 2.0, sfreq);
    Ok(hi.iter().zip(&lo).map(|(a, b)| a - b).collect())
}

/// Hamming-windowed sinc lowpass with unit DC gain; `cutoff_hz` is the
/// −6 dB point.  `n` must be odd.
pub fn firwin_lowpass(n: usize, cutoff_hz: f64, sfreq: f64) -> Vec<f64> {
    let alpha = (n - 1) as f64 / 2.0;
    let fc = cutoff_hz / (sfreq / 2.0);
    let win = hamming(n);

    let mut h: Vec<f64> = win
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let x = i as f64 - alpha;
            let sinc = if x == 0.0 { fc } else { (PI * fc * x).sin() / (PI * x) };
            sinc * w
        })
        .collect();

    let s: f64 = h.iter().sum();
    h.iter_mut().for_each(|v| *v /= s);
    h
}

/// Hamming window of length `n`.
pub fn hamming(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}
