//! In-place radix-2 Cooley-Tukey FFT.

use std::f64::consts::PI;

/// Performs an in-place radix-2 FFT.
/// `real` and `imag` must have the same power-of-2 length.
pub fn fft(real: &mut [f64], imag: &mut [f64]) {
    let n = real.len();
    debug_assert_eq!(n, imag.len());
    debug_assert!(n.is_power_of_two() || n <= 1);
    if n <= 1 {
        return;
    }

    // Bit-reversal permutation
    let mut j = 0usize;
    for i in 0..n - 1 {
        if i < j {
            real.swap(i, j);
            imag.swap(i, j);
        }
        let mut k = n >> 1;
        while k <= j {
            j -= k;
            k >>= 1;
        }
        j += k;
    }

    let mut size = 2;
    while size <= n {
        let half = size >> 1;
        let angle = -2.0 * PI / size as f64;
        let (w_r, w_i) = (angle.cos(), angle.sin());

        for start in (0..n).step_by(size) {
            let (mut t_r, mut t_i) = (1.0, 0.0);
            for k in 0..half {
                let u = start + k;
                let v = u + half;

                let tmp_r = t_r * real[v] - t_i * imag[v];
                let tmp_i = t_r * imag[v] + t_i * real[v];

                real[v] = real[u] - tmp_r;
                imag[v] = imag[u] - tmp_i;
                real[u] += tmp_r;
                imag[u] += tmp_i;

                let next_r = t_r * w_r - t_i * w_i;
                t_i = t_r * w_i + t_i * w_r;
                t_r = next_r;
            }
        }
        size <<= 1;
    }
}

/// Magnitude spectrum of a real frame, `frame.len() / 2 + 1` bins.
///
/// `frame.len()` must be a power of two. `imag` is scratch space of the same length.
pub fn magnitude_spectrum(frame: &mut [f64], imag: &mut [f64]) -> Vec<f64> {
    imag.iter_mut().for_each(|v| *v = 0.0);
    fft(frame, imag);
    let half = frame.len() / 2 + 1;
    (0..half)
        .map(|i| (frame[i] * frame[i] + imag[i] * imag[i]).sqrt())
        .collect()
}
