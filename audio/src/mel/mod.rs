//! Log-mel spectrogram extraction from mono f32 PCM.
//!
//! Frames are centered: the signal is zero-padded by `fft_size / 2` on both
//! sides, so a waveform of `n` samples yields `n / hop_size + 1` frames.
//! Output is `[frames][num_mels]` holding `log10(max(1e-6, mel))` of the
//! magnitude spectrum.

mod fft;
mod filters;

pub use filters::{hann_window, mel_filter_bank};

const LOG_FLOOR: f64 = 1e-6;

/// Configuration for mel extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct MelConfig {
    pub sample_rate: u32,
    pub fft_size: usize,
    pub hop_size: usize,
    pub win_size: usize,
    pub num_mels: usize,
    pub fmin: f64,
    pub fmax: f64,
}

impl Default for MelConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            fft_size: 1024,
            hop_size: 256,
            win_size: 1024,
            num_mels: 80,
            fmin: 80.0,
            fmax: 7600.0,
        }
    }
}

/// Log-mel spectrogram extractor. Cheap to share across threads.
#[derive(Debug, Clone)]
pub struct MelExtractor {
    cfg: MelConfig,
    window: Vec<f64>,
    mel_bank: Vec<Vec<f64>>,
}

impl MelExtractor {
    pub fn new(cfg: MelConfig) -> Self {
        let window = hann_window(cfg.win_size, cfg.fft_size);
        let mel_bank =
            mel_filter_bank(cfg.num_mels, cfg.fft_size, cfg.sample_rate, cfg.fmin, cfg.fmax);
        Self { cfg, window, mel_bank }
    }

    pub fn config(&self) -> &MelConfig {
        &self.cfg
    }

    /// Number of frames produced for a waveform of `samples` samples.
    pub fn num_frames(&self, samples: usize) -> usize {
        if samples == 0 {
            0
        } else {
            samples / self.cfg.hop_size + 1
        }
    }

    /// Extracts the log-mel spectrogram of `wav`.
    pub fn extract(&self, wav: &[f32]) -> Vec<Vec<f32>> {
        let cfg = &self.cfg;
        let num_frames = self.num_frames(wav.len());
        let pad = cfg.fft_size / 2;

        let mut frame = vec![0.0f64; cfg.fft_size];
        let mut imag = vec![0.0f64; cfg.fft_size];
        let mut features = Vec::with_capacity(num_frames);

        for t in 0..num_frames {
            // Frame t covers padded[t * hop .. t * hop + fft_size].
            let start = (t * cfg.hop_size) as isize - pad as isize;
            for (i, slot) in frame.iter_mut().enumerate() {
                let idx = start + i as isize;
                let sample = if idx >= 0 && (idx as usize) < wav.len() {
                    wav[idx as usize] as f64
                } else {
                    0.0
                };
                *slot = sample * self.window[i];
            }

            let magnitude = fft::magnitude_spectrum(&mut frame, &mut imag);
            let mel: Vec<f32> = self
                .mel_bank
                .iter()
                .map(|filter| {
                    let energy: f64 = filter.iter().zip(&magnitude).map(|(w, m)| w * m).sum();
                    energy.max(LOG_FLOOR).log10() as f32
                })
                .collect();
            features.push(mel);
        }

        features
    }
}
