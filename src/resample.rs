//! FFT-based resampler matching MNE's `resample(..., method='fft')`.
//!
//! Captures recorded above the archive rate are brought down to it before
//! trimming.  Per channel:
//!
//! ```text
//! x ──smart_pad(npad)──▶ rfft ──Nyquist fix, scale──▶ irfft(n = round(ratio · len))
//!   ──strip resampled padding──▶ round(ratio · n) samples
//! ```
//!
//! Padding is an odd reflection about the end samples (`2·x[0] − x[i]`), so
//! a constant signal stays constant and edge ringing is small.
use anyhow::{bail, Result};
use ndarray::Array2;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Padding MNE adds before resampling: enough to reach the next power of two
/// with at least `min(n / 8, 100)` samples on each side.
///
/// ```text
/// min_add = min(n // 8, 100) * 2
/// total   = 2^ceil(log2(n + min_add)) - n
/// npads   = [total // 2, total - total // 2]
/// ```
pub fn auto_npad(n: usize) -> (usize, usize) {
    let min_add = (n / 8).min(100) * 2;
    let total = (n + min_add).next_power_of_two() - n;
    (total / 2, total - total / 2)
}

/// Output length for `n` input samples: `round(n · dst / src)`.
pub fn final_length(n: usize, src_sfreq: f64, dst_sfreq: f64) -> usize {
    (n as f64 * dst_sfreq / src_sfreq).round() as usize
}

/// Resample `data` (`[C, T]`) from `src_sfreq` to `dst_sfreq`.
pub fn resample(data: &Array2<f64>, src_sfreq: f64, dst_sfreq: f64) -> Result<Array2<f64>> {
    if !(src_sfreq > 0.0) || !(dst_sfreq > 0.0) {
        bail!("sampling rates must be positive, got {src_sfreq} → {dst_sfreq}");
    }
    if (src_sfreq - dst_sfreq).abs() < 1e-9 {
        return Ok(data.clone());
    }
    let ratio = dst_sfreq / src_sfreq;
    let (n_ch, n_in) = data.dim();
    let (npad_l, npad_r) = auto_npad(n_in);

    let mut planner = FftPlanner::<f64>::new();
    let mut out = Array2::<f64>::zeros((n_ch, final_length(n_in, src_sfreq, dst_sfreq)));
    for (row, mut dst) in data.rows().into_iter().zip(out.rows_mut()) {
        let x: Vec<f64> = row.to_vec();
        let y = resample_padded(&mut planner, &x, ratio, npad_l, npad_r);
        dst.iter_mut().zip(y).for_each(|(d, v)| *d = v);
    }
    Ok(out)
}

/// Resample one signal by `ratio` with explicit padding.
pub fn resample_1d(x: &[f64], ratio: f64, npad_l: usize, npad_r: usize) -> Vec<f64> {
    resample_padded(&mut FftPlanner::new(), x, ratio, npad_l, npad_r)
}

fn resample_padded(
    planner: &mut FftPlanner<f64>,
    x: &[f64],
    ratio: f64,
    npad_l: usize,
    npad_r: usize,
) -> Vec<f64> {
    let n_in = x.len();
    if n_in == 0 {
        return Vec::new();
    }
    let final_len = (ratio * n_in as f64).round() as usize;

    // Reflection cannot reach past the far end of the signal.
    let pad_l = npad_l.min(n_in - 1);
    let pad_r = npad_r.min(n_in - 1);
    let first = x[0];
    let last = x[n_in - 1];
    let mut buf: Vec<Complex<f64>> = Vec::with_capacity(n_in + pad_l + pad_r);
    buf.extend((1..=pad_l).rev().map(|i| Complex::new(2.0 * first - x[i], 0.0)));
    buf.extend(x.iter().map(|&v| Complex::new(v, 0.0)));
    buf.extend((1..=pad_r).map(|i| Complex::new(2.0 * last - x[n_in - 1 - i], 0.0)));

    let old_len = buf.len();
    let new_len = (ratio * old_len as f64).round() as usize;
    if new_len == 0 {
        return vec![0.0; final_len];
    }
    planner.plan_fft_forward(old_len).process(&mut buf);

    let half = old_len / 2 + 1;
    let mut spectrum: Vec<Complex<f64>> = buf[..half].to_vec();

    // The Nyquist bin of the shorter spectrum is split between ±f when
    // downsampling and merged when upsampling.
    let shorter = new_len < old_len;
    let use_len = if shorter { new_len } else { old_len };
    if use_len % 2 == 0 {
        let nyq = use_len / 2;
        if let Some(bin) = spectrum.get_mut(nyq) {
            *bin *= if shorter { 2.0 } else { 0.5 };
        }
    }
    let scale = new_len as f64 / old_len as f64;
    spectrum.iter_mut().for_each(|v| *v *= scale);

    // Hermitian spectrum of length new_len, truncated or zero-extended.
    let new_half = new_len / 2 + 1;
    let mut full = vec![Complex::<f64>::default(); new_len];
    let n_copy = spectrum.len().min(new_half);
    full[..n_copy].copy_from_slice(&spectrum[..n_copy]);
    for k in 1..new_half {
        let mirror = new_len - k;
        if mirror >= new_half {
            full[mirror] = full[k].conj();
        }
    }
    planner.plan_fft_inverse(new_len).process(&mut full);

    let trim_l = ((ratio * npad_l as f64).round() as usize).min(new_len);
    let inv = 1.0 / new_len as f64;
    let mut y: Vec<f64> = full[trim_l..]
        .iter()
        .take(final_len)
        .map(|c| c.re * inv)
        .collect();
    y.resize(final_len, 0.0);
    y
}
