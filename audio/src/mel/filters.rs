//! Analysis windows and the mel filterbank.

use std::f64::consts::PI;

/// Periodic Hann window of length `n`, zero-padded and centered in `fft_size`.
pub fn hann_window(n: usize, fft_size: usize) -> Vec<f64> {
    let mut window = vec![0.0; fft_size];
    if n == 0 {
        return window;
    }
    let offset = fft_size.saturating_sub(n) / 2;
    for i in 0..n.min(fft_size) {
        window[offset + i] = 0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos();
    }
    window
}

pub(crate) fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

pub(crate) fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank with area normalization.
///
/// Returns `[num_mels][fft_size / 2 + 1]`. Filter edges are placed on a
/// continuous frequency axis so narrow low-frequency filters do not collapse
/// onto a single FFT bin.
pub fn mel_filter_bank(
    num_mels: usize,
    fft_size: usize,
    sample_rate: u32,
    fmin: f64,
    fmax: f64,
) -> Vec<Vec<f64>> {
    let half_fft = fft_size / 2 + 1;
    let fft_freqs: Vec<f64> = (0..half_fft)
        .map(|k| k as f64 * sample_rate as f64 / fft_size as f64)
        .collect();

    let (low, high) = (hz_to_mel(fmin), hz_to_mel(fmax));
    let step = (high - low) / (num_mels + 1) as f64;
    let edges: Vec<f64> = (0..num_mels + 2)
        .map(|i| mel_to_hz(low + i as f64 * step))
        .collect();

    (0..num_mels)
        .map(|m| {
            let (left, center, right) = (edges[m], edges[m + 1], edges[m + 2]);
            let norm = 2.0 / (right - left);
            fft_freqs
                .iter()
                .map(|&f| {
                    let rising = (f - left) / (center - left);
                    let falling = (right - f) / (right - center);
                    rising.min(falling).max(0.0) * norm
                })
                .collect()
        })
        .collect()
}
