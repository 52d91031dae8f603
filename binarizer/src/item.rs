use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Attribute names every item of the first dataset must expose by default.
pub const BASE_ITEM_ATTRIBUTES: [&str; 5] = ["txt", "ph", "wav_fn", "tg_fn", "spk_id"];

/// One corpus entry, keyed by its item name in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Transcript text.
    pub txt: String,
    /// Whitespace-separated phoneme symbols.
    pub ph: String,
    pub wav_fn: PathBuf,
    /// Alignment source (a Praat TextGrid by default).
    #[serde(default)]
    pub tg_fn: Option<PathBuf>,
    /// Speaker tag.
    pub spk_id: String,
    /// Index of the source dataset; assigned by the registry.
    #[serde(skip)]
    pub ds_id: usize,
    /// Corpus-specific attributes, copied into the feature record.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Item {
    pub fn new(
        txt: impl Into<String>,
        ph: impl Into<String>,
        wav_fn: impl Into<PathBuf>,
        tg_fn: Option<PathBuf>,
        spk_id: impl Into<String>,
    ) -> Self {
        Self {
            txt: txt.into(),
            ph: ph.into(),
            wav_fn: wav_fn.into(),
            tg_fn,
            spk_id: spk_id.into(),
            ds_id: 0,
            extra: BTreeMap::new(),
        }
    }

    /// Names of the attributes this item carries. `tg_fn` counts only when set.
    pub fn attribute_names(&self) -> BTreeSet<String> {
        BASE_ITEM_ATTRIBUTES
            .iter()
            .filter(|&&name| name != "tg_fn" || self.tg_fn.is_some())
            .map(|s| s.to_string())
            .chain(self.extra.keys().cloned())
            .collect()
    }

    /// Phoneme symbols of `ph`.
    pub fn phonemes(&self) -> impl Iterator<Item = &str> {
        self.ph.split_whitespace()
    }
}
