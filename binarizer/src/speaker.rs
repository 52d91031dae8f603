use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BinarizeError;
use crate::registry::ItemRegistry;

/// File name of the persisted speaker map.
pub const SPK_MAP_FILE: &str = "spk_map.json";

/// Speaker tag to dense id, ids assigned in sorted tag order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeakerMap(BTreeMap<String, u32>);

impl SpeakerMap {
    /// Assigns `0..N` to the distinct speaker tags of the registry.
    ///
    /// Fails when `N > num_spk`; an empty corpus always succeeds.
    pub fn build(registry: &ItemRegistry, num_spk: usize) -> Result<Self, BinarizeError> {
        let tags: BTreeSet<&str> = registry.iter().map(|(_, item)| item.spk_id.as_str()).collect();
        if !tags.is_empty() && tags.len() > num_spk {
            return Err(BinarizeError::TooManySpeakers {
                found: tags.len(),
                max: num_spk,
            });
        }
        Ok(Self(
            tags.into_iter()
                .enumerate()
                .map(|(i, tag)| (tag.to_string(), i as u32))
                .collect(),
        ))
    }

    pub fn id(&self, tag: &str) -> Option<u32> {
        self.0.get(tag).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), BinarizeError> {
        std::fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, BinarizeError> {
        Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
    }
}
