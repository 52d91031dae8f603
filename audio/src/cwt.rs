//! Continuous log-f0 and its Mexican-hat wavelet decomposition.
//!
//! The contour is made continuous by holding the first/last voiced value
//! over the edges and linearly interpolating across unvoiced gaps, then
//! low-passed and log-compressed. [`lf0_cwt`] decomposes a (normalized)
//! log-f0 track into `NUM_SCALES` dyadic scales.

use std::f64::consts::PI;

/// Frame period of the pitch track in seconds.
pub const CWT_DT: f64 = 0.005;
/// Scale spacing in octaves.
pub const CWT_DJ: f64 = 1.0;
/// Smallest scale.
pub const CWT_S0: f64 = CWT_DT * 2.0;
/// Number of scales above the smallest one.
pub const CWT_J: usize = 9;
pub const NUM_SCALES: usize = CWT_J + 1;

/// Low-pass cutoff applied to the continuous f0, in Hz.
const LPF_CUTOFF: f64 = 20.0;
const LPF_TAPS: usize = 31;
/// Mexican-hat support, in scale units.
const WAVELET_SUPPORT: f64 = 5.0;

/// Voiced/unvoiced flags and the gap-filled f0 contour.
pub fn continuous_f0(f0: &[f32]) -> (Vec<f32>, Vec<f64>) {
    let uv: Vec<f32> = f0.iter().map(|&v| if v != 0.0 { 1.0 } else { 0.0 }).collect();
    let voiced: Vec<usize> = (0..f0.len()).filter(|&i| f0[i] != 0.0).collect();
    let (Some(&first), Some(&last)) = (voiced.first(), voiced.last()) else {
        return (uv, f0.iter().map(|&v| v as f64).collect());
    };

    let mut cont = vec![0.0f64; f0.len()];
    cont[..first].fill(f0[first] as f64);
    cont[last..].fill(f0[last] as f64);
    for pair in voiced.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let (va, vb) = (f0[a] as f64, f0[b] as f64);
        for (i, slot) in cont.iter_mut().enumerate().take(b + 1).skip(a) {
            let w = (i - a) as f64 / (b - a) as f64;
            *slot = va + (vb - va) * w;
        }
    }
    (uv, cont)
}

/// Zero-phase FIR low-pass (Hamming-windowed sinc), edges held constant.
pub fn low_pass_filter(x: &[f64], fs: f64, cutoff: f64) -> Vec<f64> {
    if x.is_empty() {
        return Vec::new();
    }
    let half = (LPF_TAPS / 2) as isize;
    let fc = cutoff / fs;
    let mut taps: Vec<f64> = (-half..=half)
        .map(|k| {
            let sinc = if k == 0 {
                2.0 * fc
            } else {
                (2.0 * PI * fc * k as f64).sin() / (PI * k as f64)
            };
            let window =
                0.54 - 0.46 * (2.0 * PI * (k + half) as f64 / (LPF_TAPS - 1) as f64).cos();
            sinc * window
        })
        .collect();
    let gain: f64 = taps.iter().sum();
    taps.iter_mut().for_each(|t| *t /= gain);

    let last = x.len() as isize - 1;
    (0..x.len() as isize)
        .map(|n| {
            taps.iter()
                .enumerate()
                .map(|(i, t)| t * x[(n + i as isize - half).clamp(0, last) as usize])
                .sum()
        })
        .collect()
}

/// Voiced/unvoiced flags and the low-passed continuous natural-log f0.
pub fn continuous_lf0(f0: &[f32]) -> (Vec<f32>, Vec<f64>) {
    let (uv, cont) = continuous_f0(f0);
    let lpf = low_pass_filter(&cont, 1.0 / CWT_DT, LPF_CUTOFF);
    (uv, lpf.iter().map(|v| v.ln()).collect())
}

/// Mean and population standard deviation.
pub fn mean_std(x: &[f64]) -> (f64, f64) {
    if x.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let n = x.len() as f64;
    let mean = x.iter().sum::<f64>() / n;
    let var = x.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, var.sqrt())
}

fn mexican_hat(t: f64) -> f64 {
    let norm = 2.0 / (3.0f64.sqrt() * PI.powf(0.25));
    norm * (1.0 - t * t) * (-t * t / 2.0).exp()
}

/// Scales used by [`lf0_cwt`]: `s0 * 2^(j * dj)` for `j` in `0..=J`.
pub fn cwt_scales() -> Vec<f64> {
    (0..NUM_SCALES)
        .map(|j| CWT_S0 * 2f64.powf(j as f64 * CWT_DJ))
        .collect()
}

/// Mexican-hat continuous wavelet transform of a log-f0 track.
///
/// Returns `([frames][NUM_SCALES], scales)`. The signal is treated as zero
/// outside its support. Non-finite input propagates into the output.
pub fn lf0_cwt(lf0: &[f64]) -> (Vec<Vec<f32>>, Vec<f64>) {
    let scales = cwt_scales();
    let n = lf0.len();
    let mut spec = vec![vec![0.0f32; NUM_SCALES]; n];

    for (j, &s) in scales.iter().enumerate() {
        let reach = ((WAVELET_SUPPORT * s / CWT_DT).ceil() as usize).min(n.saturating_sub(1));
        let kernel: Vec<f64> = (0..=2 * reach)
            .map(|i| {
                let t = (i as f64 - reach as f64) * CWT_DT / s;
                (CWT_DT / s).sqrt() * mexican_hat(t)
            })
            .collect();

        for (t, row) in spec.iter_mut().enumerate() {
            let lo = t.saturating_sub(reach);
            let hi = (t + reach).min(n - 1);
            let acc: f64 = (lo..=hi)
                .map(|m| lf0[m] * kernel[m + reach - t])
                .sum();
            row[j] = acc as f32;
        }
    }
    (spec, scales)
}
