use voxbin_audio::{MelConfig, MelExtractor};

use crate::error::BinarizeError;

/// Computes a fixed-size speaker embedding from a waveform.
///
/// The waveform is mono f32 at the run's `audio_sample_rate`. Called only
/// from the orchestrating thread, one item at a time.
pub trait SpeakerEncoder: Send + Sync {
    fn embed_utterance(&self, wav: &[f32]) -> Result<Vec<f32>, BinarizeError>;

    /// Length of the vectors returned by [`embed_utterance`](Self::embed_utterance).
    fn dimension(&self) -> usize;
}

/// Speaker embedding from utterance-level log-mel statistics.
///
/// The vector is the per-band mean followed by the per-band standard
/// deviation over all frames, L2-normalized. Useful as a baseline or when no
/// neural encoder is available.
#[derive(Debug, Clone)]
pub struct FbankStatsEncoder {
    mel: MelExtractor,
}

impl FbankStatsEncoder {
    pub const NUM_MELS: usize = 40;

    /// 25 ms windows every 10 ms at `sample_rate`.
    pub fn new(sample_rate: u32) -> Self {
        let win_size = (sample_rate as usize * 25 / 1000).max(1);
        let hop_size = (sample_rate as usize / 100).max(1);
        let cfg = MelConfig {
            sample_rate,
            fft_size: win_size.next_power_of_two(),
            hop_size,
            win_size,
            num_mels: Self::NUM_MELS,
            fmin: 20.0,
            fmax: (sample_rate as f64 / 2.0).min(7600.0),
        };
        Self {
            mel: MelExtractor::new(cfg),
        }
    }
}

impl SpeakerEncoder for FbankStatsEncoder {
    fn embed_utterance(&self, wav: &[f32]) -> Result<Vec<f32>, BinarizeError> {
        let frames = self.mel.extract(wav);
        if frames.is_empty() {
            return Err(BinarizeError::Embedding("empty waveform".into()));
        }
        let n = frames.len() as f64;
        let mut embedding = Vec::with_capacity(self.dimension());
        let mut stds = Vec::with_capacity(Self::NUM_MELS);
        for m in 0..Self::NUM_MELS {
            let mean = frames.iter().map(|f| f[m] as f64).sum::<f64>() / n;
            let var = frames
                .iter()
                .map(|f| (f[m] as f64 - mean).powi(2))
                .sum::<f64>()
                / n;
            embedding.push(mean as f32);
            stds.push(var.sqrt() as f32);
        }
        embedding.extend(stds);
        l2_normalize(&mut embedding);
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        Self::NUM_MELS * 2
    }
}

/// Scales `v` to unit L2 norm in place. Zero vectors are left unchanged.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if norm > 1e-12 {
        for x in v.iter_mut() {
            *x = (*x as f64 / norm) as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn tone(hz: f64) -> Vec<f32> {
        (0..16000)
            .map(|i| (2.0 * PI * hz * i as f64 / 16000.0).sin() as f32 * 0.5)
            .collect()
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn embedding_is_unit_length() {
        let enc = FbankStatsEncoder::new(16000);
        let e = enc.embed_utterance(&tone(200.0)).unwrap();
        assert_eq!(e.len(), enc.dimension());
        assert!((cosine(&e, &e) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn same_signal_same_embedding() {
        let enc = FbankStatsEncoder::new(16000);
        let a = enc.embed_utterance(&tone(200.0)).unwrap();
        let b = enc.embed_utterance(&tone(200.0)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_waveform_fails() {
        let enc = FbankStatsEncoder::new(16000);
        assert!(matches!(
            enc.embed_utterance(&[]),
            Err(BinarizeError::Embedding(_))
        ));
    }

    #[test]
    fn l2_normalize_leaves_zero_vector() {
        let mut v = vec![0.0f32; 3];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0; 3]);

        let mut w = vec![3.0f32, 4.0];
        l2_normalize(&mut w);
        assert!((w[0] - 0.6).abs() < 1e-6 && (w[1] - 0.8).abs() < 1e-6);
    }
}
