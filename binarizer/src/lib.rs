//! Corpus binarization: audio + transcripts into split binary training records.
//!
//! # Pipeline
//!
//! 1. [`ItemRegistry`]: every item of every dataset, schema-checked, in a
//!    sorted or seeded-shuffled global order
//! 2. [`SpeakerMap`]: dense speaker ids, written to `spk_map.json`
//! 3. [`PhoneEncoder`]: phoneme vocabulary, built from the corpus or reloaded
//!    from `phone_set.json`
//! 4. [`SplitProcessor`]: for `valid`, `test`, `train`, extracts every item
//!    through [`ItemExtractor`] (serially or on a worker pool) and writes
//!    `<split>.data`/`<split>.idx`, `<split>_lengths.npy` and
//!    `<split>_f0s_mean_std.npy`
//!
//! [`Binarizer`] drives the steps. Corpus layout, alignment source,
//! spectrogram extractor, pitch tracker and speaker encoder are pluggable
//! through [`Corpus`], [`SpecExtractor`], [`PitchTracker`] and
//! [`SpeakerEncoder`].
//!
//! # Skips
//!
//! An item whose pitch is all zero, whose wavelet features are not finite,
//! whose phonemes cannot be encoded or whose alignment is missing or
//! inconsistent is logged and left out ([`SkipReason`]). Everything else
//! that fails aborts the run ([`BinarizeError`]).
//!
//! [`PitchTracker`]: voxbin_audio::PitchTracker

pub mod align;
mod binarizer;
mod config;
mod corpus;
mod embed;
mod error;
mod extract;
mod item;
mod manifest;
mod phone;
mod record;
mod registry;
mod speaker;
mod split;
mod vocoder;

pub use binarizer::Binarizer;
pub use config::{BinarizationArgs, BinarizerConfig, NUM_WORKERS_ENV};
pub use corpus::Corpus;
pub use embed::{l2_normalize, FbankStatsEncoder, SpeakerEncoder};
pub use error::{BinarizeError, ItemError, SkipReason};
pub use extract::{Extracted, ItemExtractor};
pub use item::{Item, BASE_ITEM_ATTRIBUTES};
pub use manifest::{ManifestCorpus, MANIFEST_FILE};
pub use phone::{collect_ph_set, PhoneEncodeError, PhoneEncoder, PHONE_SET_FILE, RESERVED_TOKENS};
pub use record::FeatureRecord;
pub use registry::{ItemRegistry, SHUFFLE_SEED};
pub use speaker::{SpeakerMap, SPK_MAP_FILE};
pub use split::{Dispatch, RunStats, Split, SplitProcessor, SplitSummary};
pub use vocoder::{MelSpecExtractor, SpecExtractor, Spectrogram, VocoderRegistry, BUILTIN_VOCODERS};
