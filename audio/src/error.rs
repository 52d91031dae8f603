use thiserror::Error;

/// Errors returned by audio loading and feature extraction.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("wav: {0}")]
    Wav(#[from] hound::Error),

    #[error("wav has no channels")]
    NoChannels,

    #[error("resample {from} Hz -> {to} Hz: {msg}")]
    Resample { from: u32, to: u32, msg: String },
}
