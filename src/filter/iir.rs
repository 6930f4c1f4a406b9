//! Butterworth IIR band-pass, applied forward and backward.
//!
//! Matches `mne.filter.create_filter(method='iir')` with MNE's default
//! `iir_params = dict(order=4, ftype='butter', output='sos')`, the band-pass
//! MOABB's `MotorImagery` paradigm uses:
//!
//! ```text
//! analog prototype (N poles) ─ lp→bp (2N poles, N zeros at 0)
//!   ─ bilinear, pre-warped edges ─ second-order sections
//! x ─ odd pad ─ sosfilt → reverse → sosfilt → reverse ─ strip pad
//! ```
//!
//! Each section is stored in SciPy's layout `[b0, b1, b2, a0, a1, a2]`
//! with `a0 = 1`.  Forward-backward filtering squares the magnitude
//! response and cancels the phase.
use std::f64::consts::PI;

use anyhow::{ensure, Result};
use ndarray::Array2;
use rustfft::num_complex::Complex;

/// Butterworth order used by the paradigm (MNE's default).
pub const DEFAULT_ORDER: usize = 4;

/// One biquad: `[b0, b1, b2, a0, a1, a2]`.
pub type Section = [f64; 6];

/// Digital Butterworth band-pass of prototype order `order`, returned as
/// `order` second-order sections.
///
/// The −3 dB points of a single pass fall exactly on `l_freq` and `h_freq`.
pub fn butter_bandpass(order: usize, l_freq: f64, h_freq: f64, sfreq: f64) -> Result<Vec<Section>> {
    ensure!(order >= 1, "filter order must be at least 1");
    let nyq = sfreq / 2.0;
    ensure!(
        l_freq > 0.0 && l_freq < h_freq && h_freq < nyq,
        "band edges must satisfy 0 < {l_freq} < {h_freq} < {nyq} Hz"
    );

    // Pre-warp to the analog edges of a bilinear transform with fs = 2.
    let warp = |f: f64| 4.0 * (PI * f / sfreq).tan();
    let (wl, wh) = (warp(l_freq), warp(h_freq));
    let bw = wh - wl;
    let wo2 = wl * wh;

    let n = order as i32;
    let mut poles: Vec<Complex<f64>> = Vec::with_capacity(2 * order);
    for m in (-n + 1..n).step_by(2) {
        let p = -Complex::from_polar(1.0, PI * m as f64 / (2.0 * n as f64));
        let p_lp = p * (bw / 2.0);
        let root = (p_lp * p_lp - wo2).sqrt();
        poles.push(p_lp + root);
        poles.push(p_lp - root);
    }

    // N analog zeros at the origin map to z = 1, the N at infinity to -1.
    let fs2 = Complex::new(4.0, 0.0);
    let mut denom = Complex::new(1.0, 0.0);
    let z_poles: Vec<Complex<f64>> = poles
        .iter()
        .map(|&p| {
            denom *= fs2 - p;
            (fs2 + p) / (fs2 - p)
        })
        .collect();
    let gain = (Complex::new((4.0 * bw).powi(n), 0.0) / denom).re;

    let mut sections = pair_poles(&z_poles)
        .into_iter()
        .map(|(a1, a2)| [1.0, 0.0, -1.0, 1.0, a1, a2])
        .collect::<Vec<Section>>();
    for c in &mut sections[0][..3] {
        *c *= gain;
    }
    Ok(sections)
}

/// Group poles into conjugate (or real) pairs, each giving the
/// denominator `1 + a1·z⁻¹ + a2·z⁻²`.
fn pair_poles(poles: &[Complex<f64>]) -> Vec<(f64, f64)> {
    const EPS: f64 = 1e-12;
    let mut out: Vec<(f64, f64)> = poles
        .iter()
        .filter(|p| p.im > EPS)
        .map(|p| (-2.0 * p.re, p.norm_sqr()))
        .collect();
    let mut real: Vec<f64> = poles.iter().filter(|p| p.im.abs() <= EPS).map(|p| p.re).collect();
    real.sort_by(f64::total_cmp);
    for pair in real.chunks(2) {
        match pair {
            [p, q] => out.push((-(p + q), p * q)),
            [p] => out.push((-p, 0.0)),
            _ => {}
        }
    }
    out
}

/// Filter every channel of `data` (`[C, T]`) forward and backward in place.
///
/// Edges are padded by odd reflection over the filter's ringing length
/// (at most `T - 1` samples), and each pass starts from the steady-state
/// response to the first sample it sees.
pub fn apply_iir_zero_phase(data: &mut Array2<f64>, sos: &[Section]) -> Result<()> {
    ensure!(!sos.is_empty(), "IIR filter has no sections");
    ensure!(sos.iter().all(|s| s[3] == 1.0), "sections must be normalised to a0 = 1");
    let ringing = ringing_samples(sos);
    for mut row in data.rows_mut() {
        let x: Vec<f64> = row.to_vec();
        let y = filtfilt(sos, &x, ringing);
        row.iter_mut().zip(y).for_each(|(o, v)| *o = v);
    }
    Ok(())
}

/// Forward-backward filter one signal with padding `padlen` (clamped to
/// `x.len() - 1`).
pub fn sosfiltfilt(sos: &[Section], x: &[f64], padlen: usize) -> Vec<f64> {
    filtfilt(sos, x, padlen)
}

fn filtfilt(sos: &[Section], x: &[f64], padlen: usize) -> Vec<f64> {
    let n = x.len();
    if n == 0 {
        return Vec::new();
    }
    let pad = padlen.min(n - 1);
    let first = x[0];
    let last = x[n - 1];
    let mut ext: Vec<f64> = Vec::with_capacity(n + 2 * pad);
    ext.extend((1..=pad).rev().map(|i| 2.0 * first - x[i]));
    ext.extend_from_slice(x);
    ext.extend((1..=pad).map(|i| 2.0 * last - x[n - 1 - i]));

    let zi = steady_state(sos);
    let mut state = scaled(&zi, ext[0]);
    sosfilt(sos, &mut ext, &mut state);
    ext.reverse();
    let mut state = scaled(&zi, ext[0]);
    sosfilt(sos, &mut ext, &mut state);
    ext.reverse();
    ext[pad..pad + n].to_vec()
}

/// Cascade the sections over `x` in place, transposed direct form II.
fn sosfilt(sos: &[Section], x: &mut [f64], state: &mut [[f64; 2]]) {
    for (s, z) in sos.iter().zip(state.iter_mut()) {
        let [b0, b1, b2, _, a1, a2] = *s;
        for v in x.iter_mut() {
            let input = *v;
            let y = b0 * input + z[0];
            z[0] = b1 * input - a1 * y + z[1];
            z[1] = b2 * input - a2 * y;
            *v = y;
        }
    }
}

/// Section states for a unit step that has been applied forever
/// (`scipy.signal.sosfilt_zi`).
fn steady_state(sos: &[Section]) -> Vec<[f64; 2]> {
    let mut scale = 1.0;
    sos.iter()
        .map(|&[b0, b1, b2, _, a1, a2]| {
            let dc = (b0 + b1 + b2) / (1.0 + a1 + a2);
            let zi = [scale * (dc - b0), scale * (b2 - a2 * dc)];
            scale *= dc;
            zi
        })
        .collect()
}

fn scaled(zi: &[[f64; 2]], by: f64) -> Vec<[f64; 2]> {
    zi.iter().map(|z| [z[0] * by, z[1] * by]).collect()
}

/// Samples until the impulse response stays below 0.1 % of its running
/// peak (MNE's `estimate_ringing_samples`), searched up to 100 000 samples.
pub fn ringing_samples(sos: &[Section]) -> usize {
    const CHUNK: usize = 1000;
    const MAX_CHUNKS: usize = 100;
    let mut state = vec![[0.0; 2]; sos.len()];
    let mut last_good = CHUNK;
    let mut thresh = 0.0_f64;
    for chunk in 0..MAX_CHUNKS {
        let mut h = vec![0.0; CHUNK];
        if chunk == 0 {
            h[0] = 1.0;
        }
        sosfilt(sos, &mut h, &mut state);
        let peak = h.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        thresh = thresh.max(0.001 * peak);
        match h.iter().rposition(|v| v.abs() > thresh) {
            Some(i) => last_good = i,
            None => return (chunk.saturating_sub(1)) * CHUNK + last_good,
        }
    }
    CHUNK * MAX_CHUNKS
}
