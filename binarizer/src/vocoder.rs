//! Spectrogram extractors keyed by vocoder name.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::warn;
use voxbin_audio::wav;
use voxbin_audio::{MelConfig, MelExtractor};

use crate::error::BinarizeError;

/// Waveform plus its mel-spectrogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    pub wav: Vec<f32>,
    /// `[frames][num_mels]`.
    pub mel: Vec<Vec<f32>>,
}

/// Loads a waveform file and computes the mel-spectrogram a vocoder expects.
pub trait SpecExtractor: Send + Sync {
    fn wav2spec(&self, wav_fn: &Path) -> Result<Spectrogram, BinarizeError>;
}

/// Log-mel extractor reading WAV files at a fixed sample rate.
#[derive(Debug, Clone)]
pub struct MelSpecExtractor {
    mel: MelExtractor,
}

impl MelSpecExtractor {
    pub fn new(cfg: MelConfig) -> Self {
        Self {
            mel: MelExtractor::new(cfg),
        }
    }
}

impl SpecExtractor for MelSpecExtractor {
    fn wav2spec(&self, wav_fn: &Path) -> Result<Spectrogram, BinarizeError> {
        let wav = wav::load_wav(wav_fn, self.mel.config().sample_rate).map_err(|source| {
            BinarizeError::Audio {
                path: wav_fn.to_path_buf(),
                source,
            }
        })?;
        let mel = self.mel.extract(&wav);
        Ok(Spectrogram { wav, mel })
    }
}

/// Names under which the built-in mel extractor is registered.
pub const BUILTIN_VOCODERS: [&str; 4] = ["HifiGAN", "hifigan", "PWG", "pwg"];

/// Registry of spectrogram extractors.
#[derive(Clone, Default)]
pub struct VocoderRegistry {
    extractors: HashMap<String, Arc<dyn SpecExtractor>>,
}

impl VocoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in mel extractor under every builtin name.
    pub fn with_builtin(cfg: MelConfig) -> Self {
        let mut reg = Self::new();
        let mel: Arc<dyn SpecExtractor> = Arc::new(MelSpecExtractor::new(cfg));
        for name in BUILTIN_VOCODERS {
            reg.register(name, mel.clone());
        }
        reg
    }

    /// Registers an extractor, replacing any previous one of the same name.
    pub fn register(&mut self, name: &str, extractor: Arc<dyn SpecExtractor>) {
        if self.extractors.insert(name.to_string(), extractor).is_some() {
            warn!(name = %name, "vocoder: extractor replaced");
        }
    }

    /// Finds the extractor for `name`, falling back to its last `.` segment
    /// so that qualified names like `vocoders.hifigan.HifiGAN` resolve.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn SpecExtractor>, BinarizeError> {
        self.extractors
            .get(name)
            .or_else(|| name.rsplit('.').next().and_then(|short| self.extractors.get(short)))
            .cloned()
            .ok_or_else(|| BinarizeError::UnknownVocoder(name.to_string()))
    }
}
