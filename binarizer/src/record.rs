use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::item::Item;

/// Features of one item as persisted in a split container.
///
/// Optional stages only add their fields when enabled and successful, so
/// records of one container can differ in shape; absent fields are not
/// serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub item_name: String,
    /// `[frames][num_mels]` log-mel spectrogram.
    pub mel: Vec<Vec<f32>>,
    /// Raw samples; dropped before persistence unless `with_wav` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wav: Option<Vec<f32>>,
    /// Duration in seconds.
    pub sec: f64,
    /// Number of mel frames.
    pub len: usize,

    pub txt: String,
    pub ph: String,
    pub wav_fn: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tg_fn: Option<PathBuf>,
    /// Speaker tag.
    pub spk: String,
    /// Dense speaker id from the run's speaker map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spk_id: Option<u32>,
    pub ds_id: usize,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,

    /// Per-frame f0 in Hz, 0 for unvoiced frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f0: Option<Vec<f32>>,
    /// Coarse pitch classes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<Vec<u32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwt_spec: Option<Vec<Vec<f32>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwt_scales: Option<Vec<f64>>,
    /// Mean of the continuous log-f0 before normalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f0_mean: Option<f64>,
    /// Standard deviation of the continuous log-f0 before normalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f0_std: Option<f64>,

    /// Encoded phoneme ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mel2ph: Option<Vec<u32>>,
    /// Frames per phoneme.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dur: Option<Vec<u32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spk_embed: Option<Vec<f32>>,
}

impl FeatureRecord {
    /// A record holding only the spectrogram and the copied item attributes.
    pub fn new(
        item_name: &str,
        item: &Item,
        wav: Vec<f32>,
        mel: Vec<Vec<f32>>,
        sample_rate: u32,
    ) -> Self {
        Self {
            item_name: item_name.to_string(),
            sec: wav.len() as f64 / sample_rate as f64,
            len: mel.len(),
            mel,
            wav: Some(wav),
            txt: item.txt.clone(),
            ph: item.ph.clone(),
            wav_fn: item.wav_fn.clone(),
            tg_fn: item.tg_fn.clone(),
            spk: item.spk_id.clone(),
            spk_id: None,
            ds_id: item.ds_id,
            extra: item.extra.clone(),
            f0: None,
            pitch: None,
            cwt_spec: None,
            cwt_scales: None,
            f0_mean: None,
            f0_std: None,
            phone: None,
            mel2ph: None,
            dur: None,
            spk_embed: None,
        }
    }
}
