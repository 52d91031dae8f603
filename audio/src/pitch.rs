//! Frame-level pitch (f0) tracking and coarse pitch quantization.
//!
//! A [`PitchTracker`] produces one f0 value in Hz per mel frame, `0.0`
//! marking unvoiced frames. [`AutocorrelationTracker`] is the built-in
//! implementation: a normalized-autocorrelation tracker with a silence gate
//! and a voicing threshold.

/// Pitch analysis parameters shared by trackers and the coarse quantizer.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchConfig {
    pub sample_rate: u32,
    pub hop_size: usize,
    pub f0_min: f64,
    pub f0_max: f64,
    /// Number of coarse pitch classes; class 0 is unused, 1 is unvoiced.
    pub f0_bin: u32,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            hop_size: 256,
            f0_min: 80.0,
            f0_max: 750.0,
            f0_bin: 256,
        }
    }
}

/// Estimates a per-frame pitch contour.
///
/// Implementations must return exactly `mel.len()` values and be safe to
/// call from several threads at once.
pub trait PitchTracker: Send + Sync {
    fn track(&self, wav: &[f32], mel: &[Vec<f32>]) -> Vec<f32>;
}

/// Normalized-autocorrelation pitch tracker.
#[derive(Debug, Clone)]
pub struct AutocorrelationTracker {
    cfg: PitchConfig,
    /// Frames quieter than this fraction of the global peak are unvoiced.
    pub silence_threshold: f32,
    /// Minimum normalized autocorrelation for a frame to count as voiced.
    pub voicing_threshold: f64,
}

impl AutocorrelationTracker {
    pub fn new(cfg: PitchConfig) -> Self {
        Self {
            cfg,
            silence_threshold: 0.03,
            voicing_threshold: 0.45,
        }
    }

    fn frame_f0(&self, wav: &[f32], center: usize, gate: f32) -> f32 {
        let sr = self.cfg.sample_rate as f64;
        let lag_min = ((sr / self.cfg.f0_max).floor() as usize).max(1);
        let lag_max = (sr / self.cfg.f0_min).ceil() as usize;
        let width = 2 * lag_max + 1;

        let start = center as isize - lag_max as isize;
        let mut x: Vec<f64> = (0..width)
            .map(|i| {
                let idx = start + i as isize;
                if idx >= 0 && (idx as usize) < wav.len() {
                    wav[idx as usize] as f64
                } else {
                    0.0
                }
            })
            .collect();

        let peak = x.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        if peak <= gate as f64 {
            return 0.0;
        }
        let mean = x.iter().sum::<f64>() / width as f64;
        x.iter_mut().for_each(|v| *v -= mean);

        // r[lag] for lag in lag_min..=lag_max, with one guard slot on each side.
        let corr = |lag: usize| -> f64 {
            if lag == 0 || lag >= width {
                return 0.0;
            }
            let (mut xy, mut xx, mut yy) = (0.0, 0.0, 0.0);
            for i in 0..width - lag {
                let (a, b) = (x[i], x[i + lag]);
                xy += a * b;
                xx += a * a;
                yy += b * b;
            }
            if xx <= 0.0 || yy <= 0.0 {
                0.0
            } else {
                xy / (xx * yy).sqrt()
            }
        };
        let r: Vec<f64> = (lag_min - 1..=lag_max + 1).map(corr).collect();

        let best = r[1..r.len() - 1].iter().cloned().fold(f64::MIN, f64::max);
        if best < self.voicing_threshold {
            return 0.0;
        }
        // Prefer the shortest lag that is a local peak close to the best one,
        // which keeps the tracker off sub-harmonics.
        let Some(k) = (1..r.len() - 1)
            .find(|&k| r[k] >= 0.9 * best && r[k] >= r[k - 1] && r[k] >= r[k + 1])
        else {
            return 0.0;
        };

        let (a, b, c) = (r[k - 1], r[k], r[k + 1]);
        let denom = a - 2.0 * b + c;
        let shift = if denom.abs() > 1e-12 {
            (0.5 * (a - c) / denom).clamp(-0.5, 0.5)
        } else {
            0.0
        };
        let lag = (lag_min - 1 + k) as f64 + shift;
        let f0 = sr / lag;
        if f0 < self.cfg.f0_min || f0 > self.cfg.f0_max {
            0.0
        } else {
            f0 as f32
        }
    }
}

impl PitchTracker for AutocorrelationTracker {
    fn track(&self, wav: &[f32], mel: &[Vec<f32>]) -> Vec<f32> {
        let peak = wav.iter().fold(0.0f32, |m, v| m.max(v.abs()));
        let gate = peak * self.silence_threshold;
        if peak == 0.0 {
            return vec![0.0; mel.len()];
        }
        (0..mel.len())
            .map(|t| self.frame_f0(wav, t * self.cfg.hop_size, gate))
            .collect()
    }
}

fn hz_to_mel(hz: f64) -> f64 {
    1127.0 * (1.0 + hz / 700.0).ln()
}

/// Quantizes an f0 contour into `f0_bin` mel-spaced classes.
///
/// Unvoiced frames map to 1; voiced frames map into `1..=f0_bin - 1`.
pub fn f0_to_coarse(f0: &[f32], cfg: &PitchConfig) -> Vec<u32> {
    let mel_min = hz_to_mel(cfg.f0_min);
    let mel_max = hz_to_mel(cfg.f0_max);
    let top = (cfg.f0_bin - 1) as f64;
    f0.iter()
        .map(|&hz| {
            let mut mel = hz_to_mel(hz as f64);
            if mel > 0.0 {
                mel = (mel - mel_min) * (cfg.f0_bin as f64 - 2.0) / (mel_max - mel_min) + 1.0;
            }
            mel.clamp(1.0, top).round_ties_even() as u32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(hz: f64, secs: f64, sr: u32) -> Vec<f32> {
        let n = (secs * sr as f64) as usize;
        (0..n)
            .map(|i| (2.0 * PI * hz * i as f64 / sr as f64).sin() as f32 * 0.6)
            .collect()
    }

    #[test]
    fn tracks_a_steady_tone() {
        let cfg = PitchConfig::default();
        let tracker = AutocorrelationTracker::new(cfg.clone());
        let wav = sine(220.0, 0.5, cfg.sample_rate);
        let mel = vec![vec![0.0f32; 4]; wav.len() / cfg.hop_size + 1];

        let f0 = tracker.track(&wav, &mel);
        assert_eq!(f0.len(), mel.len());

        let inner = &f0[4..f0.len() - 4];
        for &v in inner {
            assert!((v - 220.0).abs() < 3.0, "expected ~220 Hz, got {v}");
        }
    }

    #[test]
    fn silence_is_unvoiced() {
        let tracker = AutocorrelationTracker::new(PitchConfig::default());
        let mel = vec![vec![0.0f32; 4]; 10];
        let f0 = tracker.track(&[0.0; 2304], &mel);
        assert_eq!(f0, vec![0.0; 10]);
    }

    #[test]
    fn coarse_quantization_bounds() {
        let cfg = PitchConfig::default();
        let coarse = f0_to_coarse(&[0.0, 80.0, 750.0, 2000.0, 220.0], &cfg);
        assert_eq!(coarse[0], 1);
        assert_eq!(coarse[1], 1);
        assert_eq!(coarse[2], 255);
        assert_eq!(coarse[3], 255);
        assert!(coarse[4] > 1 && coarse[4] < 255);
    }
}
