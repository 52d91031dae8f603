//! Phoneme vocabulary and encoder.
//!
//! Ids `0..3` are reserved for padding, end-of-sequence and unknown; the
//! vocabulary follows from id 3. Unknown symbols are never mapped to
//! `<UNK>`: encoding fails instead, and the caller skips the item.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::error::BinarizeError;
use crate::registry::ItemRegistry;

/// File name of the persisted phoneme vocabulary.
pub const PHONE_SET_FILE: &str = "phone_set.json";

pub const PAD: &str = "<pad>";
pub const EOS: &str = "<EOS>";
pub const UNK: &str = "<UNK>";
pub const RESERVED_TOKENS: [&str; 3] = [PAD, EOS, UNK];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoneEncodeError {
    #[error("empty phoneme sequence")]
    Empty,

    #[error("phoneme {0:?} is not in the vocabulary")]
    Unknown(String),
}

/// Immutable phoneme encoder. Freshly built vocabularies are sorted and
/// deduplicated; persisted ones keep their file order.
#[derive(Debug, Clone, PartialEq)]
pub struct PhoneEncoder {
    vocab: Vec<String>,
    ids: HashMap<String, u32>,
}

impl PhoneEncoder {
    pub fn new(phones: impl IntoIterator<Item = String>) -> Self {
        Self::from_vocab(phones.into_iter().collect::<BTreeSet<_>>().into_iter().collect())
    }

    /// Keeps `vocab` in the given order. A repeated symbol keeps its first id.
    pub fn from_vocab(vocab: Vec<String>) -> Self {
        let mut ids = HashMap::with_capacity(vocab.len());
        for (i, p) in vocab.iter().enumerate() {
            ids.entry(p.clone())
                .or_insert((i + RESERVED_TOKENS.len()) as u32);
        }
        Self { vocab, ids }
    }

    /// The phoneme symbols, without reserved tokens.
    pub fn vocab(&self) -> &[String] {
        &self.vocab
    }

    /// Number of ids, reserved tokens included.
    pub fn vocab_size(&self) -> usize {
        self.vocab.len() + RESERVED_TOKENS.len()
    }

    /// Encodes a whitespace-separated phoneme sequence.
    pub fn encode(&self, ph: &str) -> Result<Vec<u32>, PhoneEncodeError> {
        let ids = ph
            .split_whitespace()
            .map(|p| {
                self.ids
                    .get(p)
                    .copied()
                    .ok_or_else(|| PhoneEncodeError::Unknown(p.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if ids.is_empty() {
            return Err(PhoneEncodeError::Empty);
        }
        Ok(ids)
    }

    /// Inverse of [`encode`](Self::encode); reserved ids decode to their tokens.
    pub fn decode(&self, ids: &[u32]) -> String {
        ids.iter()
            .map(|&id| {
                let id = id as usize;
                if id < RESERVED_TOKENS.len() {
                    RESERVED_TOKENS[id]
                } else {
                    self.vocab.get(id - RESERVED_TOKENS.len()).map_or(UNK, String::as_str)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Builds the encoder from a fresh phoneme collection or a persisted vocabulary.
    ///
    /// When `reset` is set or `<dir>/phone_set.json` does not exist, `collect`
    /// supplies the phonemes, which are sorted, deduplicated and persisted.
    /// Otherwise the persisted vocabulary is used as is, in file order.
    pub fn build_or_load<F>(dir: &Path, reset: bool, collect: F) -> Result<Self, BinarizeError>
    where
        F: FnOnce() -> Result<Vec<String>, BinarizeError>,
    {
        let path = dir.join(PHONE_SET_FILE);
        if reset || !path.exists() {
            let encoder = Self::new(collect()?);
            std::fs::write(&path, serde_json::to_string(encoder.vocab())?)?;
            info!(phones = encoder.vocab.len(), path = %path.display(), "built phone set");
            Ok(encoder)
        } else {
            let vocab: Vec<String> = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
            info!(phones = vocab.len(), path = %path.display(), "loaded phone set");
            Ok(Self::from_vocab(vocab))
        }
    }
}

/// Every phoneme symbol used by the registry's items.
pub fn collect_ph_set(registry: &ItemRegistry) -> Vec<String> {
    registry
        .iter()
        .flat_map(|(_, item)| item.phonemes())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
