//! Binarization configuration.
//!
//! Loaded from YAML; every key is optional and falls back to the defaults
//! below.
//!
//! ```yaml
//! processed_data_dir: data/processed/ljspeech,data/processed/vctk
//! binary_data_dir: data/binary/multi
//! num_spk: 120
//! audio_sample_rate: 22050
//! vocoder: hifigan
//! binarization_args:
//!   shuffle: true
//!   with_f0: true
//!   with_align: true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use voxbin_audio::{MelConfig, PitchConfig};

use crate::error::BinarizeError;
use crate::item::BASE_ITEM_ATTRIBUTES;

/// Environment variable overriding the worker count.
pub const NUM_WORKERS_ENV: &str = "N_PROC";

/// Per-stage switches of the binarizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinarizationArgs {
    /// Shuffle the global item ordering with a fixed seed.
    pub shuffle: bool,
    pub with_spk_embed: bool,
    /// Keep raw waveform samples in the persisted records.
    pub with_wav: bool,
    pub with_f0: bool,
    /// Wavelet pitch features; only used when `with_f0` is set.
    pub with_f0cwt: bool,
    pub with_txt: bool,
    /// Frame-to-phoneme alignment; only used when `with_txt` is set.
    pub with_align: bool,
    /// Dispatch extraction over a worker pool instead of a single thread.
    pub multiprocess: bool,
}

impl Default for BinarizationArgs {
    fn default() -> Self {
        Self {
            shuffle: false,
            with_spk_embed: false,
            with_wav: false,
            with_f0: true,
            with_f0cwt: false,
            with_txt: true,
            with_align: true,
            multiprocess: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinarizerConfig {
    /// Comma-separated list of source dataset directories.
    pub processed_data_dir: String,
    pub binary_data_dir: PathBuf,
    /// Rebuild `phone_set.json` from the corpus even if it exists.
    pub reset_phone_dict: bool,
    /// Maximum number of distinct speakers.
    pub num_spk: usize,
    pub audio_sample_rate: u32,
    /// Spectrogram extractor name; dotted paths resolve by their last segment.
    pub vocoder: String,

    pub hop_size: usize,
    pub win_size: usize,
    pub fft_size: usize,
    pub audio_num_mel_bins: usize,
    pub fmin: f64,
    pub fmax: f64,
    pub f0_min: f64,
    pub f0_max: f64,
    pub f0_bin: u32,

    /// Worker pool size; falls back to `N_PROC`, then a third of the CPUs.
    pub num_workers: Option<usize>,
    /// Attribute schema every item must match.
    pub item_attributes: Vec<String>,
    /// Leading items of the ordering used for validation (manifest corpus).
    pub valid_num: usize,
    /// Items after the validation block used for testing (manifest corpus).
    pub test_num: usize,

    pub binarization_args: BinarizationArgs,
}

impl Default for BinarizerConfig {
    fn default() -> Self {
        Self {
            processed_data_dir: "data/processed".to_string(),
            binary_data_dir: PathBuf::from("data/binary"),
            reset_phone_dict: false,
            num_spk: 1,
            audio_sample_rate: 22050,
            vocoder: "hifigan".to_string(),
            hop_size: 256,
            win_size: 1024,
            fft_size: 1024,
            audio_num_mel_bins: 80,
            fmin: 80.0,
            fmax: 7600.0,
            f0_min: 80.0,
            f0_max: 750.0,
            f0_bin: 256,
            num_workers: None,
            item_attributes: BASE_ITEM_ATTRIBUTES.iter().map(|s| s.to_string()).collect(),
            valid_num: 0,
            test_num: 0,
            binarization_args: BinarizationArgs::default(),
        }
    }
}

impl BinarizerConfig {
    /// Loads a YAML config file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, BinarizeError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, BinarizeError> {
        let cfg: Self = serde_yaml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks values that would otherwise fail deep inside extraction.
    pub fn validate(&self) -> Result<(), BinarizeError> {
        let bad = |msg: String| Err(BinarizeError::Config(msg));
        if self.hop_size == 0 || self.win_size == 0 {
            return bad("hop_size and win_size must be positive".into());
        }
        if !self.fft_size.is_power_of_two() || self.fft_size < self.win_size {
            return bad(format!(
                "fft_size {} must be a power of two >= win_size {}",
                self.fft_size, self.win_size
            ));
        }
        if self.audio_sample_rate == 0 {
            return bad("audio_sample_rate must be positive".into());
        }
        if !(self.fmin >= 0.0 && self.fmin < self.fmax) {
            return bad(format!("invalid mel range {}..{}", self.fmin, self.fmax));
        }
        if !(self.f0_min > 0.0 && self.f0_min < self.f0_max) || self.f0_bin < 3 {
            return bad(format!(
                "invalid pitch range {}..{} with {} bins",
                self.f0_min, self.f0_max, self.f0_bin
            ));
        }
        if self.processed_data_dirs().is_empty() {
            return bad("processed_data_dir is empty".into());
        }
        Ok(())
    }

    /// The source dataset directories, in dataset-id order.
    pub fn processed_data_dirs(&self) -> Vec<PathBuf> {
        self.processed_data_dir
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect()
    }

    pub fn mel_config(&self) -> MelConfig {
        MelConfig {
            sample_rate: self.audio_sample_rate,
            fft_size: self.fft_size,
            hop_size: self.hop_size,
            win_size: self.win_size,
            num_mels: self.audio_num_mel_bins,
            fmin: self.fmin,
            fmax: self.fmax,
        }
    }

    pub fn pitch_config(&self) -> PitchConfig {
        PitchConfig {
            sample_rate: self.audio_sample_rate,
            hop_size: self.hop_size,
            f0_min: self.f0_min,
            f0_max: self.f0_max,
            f0_bin: self.f0_bin,
        }
    }

    /// Worker pool size for the multiprocess strategy.
    pub fn num_workers(&self) -> usize {
        if let Some(n) = self.num_workers.filter(|&n| n > 0) {
            return n;
        }
        if let Some(n) = std::env::var(NUM_WORKERS_ENV)
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
        {
            return n;
        }
        let cpus = std::thread::available_parallelism().map_or(1, |n| n.get());
        (cpus / 3).max(1)
    }
}
