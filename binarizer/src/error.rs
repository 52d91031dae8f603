use std::path::PathBuf;

use thiserror::Error;
use voxbin_audio::AudioError;
use voxbin_indexed::IndexedError;

/// Why a single item was left out of the binary output.
///
/// These are data problems with one item; the split keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("Empty **gt** f0")]
    EmptyF0,

    #[error("NaN CWT")]
    NanCwt,

    #[error("Empty phoneme")]
    EmptyPhoneme,

    #[error("Align not found")]
    AlignNotFound,

    #[error("Align does not match: {0}")]
    AlignMismatch(String),
}

/// Errors that abort the whole run.
#[derive(Debug, Error)]
pub enum BinarizeError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("config: {0}")]
    Config(String),

    #[error("dataset {ds_id}: item {item_name} has attributes {found:?}, schema is {expected:?}")]
    Schema {
        ds_id: usize,
        item_name: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("corpus: {0}")]
    Corpus(String),

    #[error("split references unknown item {0}")]
    UnknownItem(String),

    #[error("{found} speakers exceed num_spk = {max}")]
    TooManySpeakers { found: usize, max: usize },

    #[error("no spectrogram extractor registered for vocoder {0:?}")]
    UnknownVocoder(String),

    #[error("audio {path}: {source}")]
    Audio {
        path: PathBuf,
        #[source]
        source: AudioError,
    },

    #[error("container: {0}")]
    Container(#[from] IndexedError),

    #[error("speaker embedding: {0}")]
    Embedding(String),

    #[error("worker pool: {0}")]
    WorkerPool(String),
}

/// Outcome of one extraction step: skip this item, or abort the run.
#[derive(Debug)]
pub enum ItemError {
    Skip(SkipReason),
    Fatal(BinarizeError),
}

impl From<SkipReason> for ItemError {
    fn from(reason: SkipReason) -> Self {
        ItemError::Skip(reason)
    }
}

impl From<BinarizeError> for ItemError {
    fn from(err: BinarizeError) -> Self {
        ItemError::Fatal(err)
    }
}

impl From<std::io::Error> for ItemError {
    fn from(err: std::io::Error) -> Self {
        ItemError::Fatal(err.into())
    }
}
