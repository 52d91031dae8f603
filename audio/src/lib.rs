//! Audio front-end for corpus binarization.
//!
//! - [`wav`]: WAV decoding, mono mixdown and resampling
//! - [`mel`]: centered log-mel spectrograms
//! - [`pitch`]: per-frame f0 tracking and coarse pitch classes
//! - [`cwt`]: continuous log-f0 and its wavelet decomposition
//!
//! # Example
//!
//! ```rust
//! use voxbin_audio::mel::{MelConfig, MelExtractor};
//! use voxbin_audio::pitch::{f0_to_coarse, AutocorrelationTracker, PitchConfig, PitchTracker};
//!
//! let wav = vec![0.0f32; 22050];
//! let mel = MelExtractor::new(MelConfig::default()).extract(&wav);
//! let f0 = AutocorrelationTracker::new(PitchConfig::default()).track(&wav, &mel);
//! let coarse = f0_to_coarse(&f0, &PitchConfig::default());
//! assert_eq!(coarse.len(), mel.len());
//! ```

pub mod cwt;
mod error;
pub mod mel;
pub mod pitch;
pub mod wav;

pub use error::AudioError;
pub use mel::{MelConfig, MelExtractor};
pub use pitch::{AutocorrelationTracker, PitchConfig, PitchTracker};
