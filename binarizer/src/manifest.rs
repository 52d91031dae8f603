//! Corpus backed by one `metadata.json` manifest per dataset directory.
//!
//! ```json
//! [
//!   {"item_name": "lj_0001", "txt": "Hi.", "ph": "HH AY1", "wav_fn": "wavs/lj_0001.wav",
//!    "tg_fn": "tg/lj_0001.TextGrid", "spk_id": "lj"}
//! ]
//! ```
//!
//! Relative `wav_fn`/`tg_fn` paths resolve against the dataset directory.
//! Fields beyond the base attributes are kept as item extras.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::config::BinarizerConfig;
use crate::corpus::Corpus;
use crate::error::BinarizeError;
use crate::item::Item;
use crate::phone::collect_ph_set;
use crate::registry::ItemRegistry;

/// Manifest file name inside every processed-data directory.
pub const MANIFEST_FILE: &str = "metadata.json";

#[derive(Deserialize)]
struct ManifestEntry {
    item_name: String,
    #[serde(flatten)]
    item: Item,
}

/// Splits the registry ordering into `[valid | test | train]` blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManifestCorpus {
    pub valid_num: usize,
    pub test_num: usize,
}

impl ManifestCorpus {
    pub fn new(valid_num: usize, test_num: usize) -> Self {
        Self {
            valid_num,
            test_num,
        }
    }

    pub fn from_config(cfg: &BinarizerConfig) -> Self {
        Self::new(cfg.valid_num, cfg.test_num)
    }

    fn block(&self, item_names: &[String], start: usize, len: Option<usize>) -> Vec<String> {
        let start = start.min(item_names.len());
        let end = len.map_or(item_names.len(), |n| (start + n).min(item_names.len()));
        item_names[start..end].to_vec()
    }
}

fn resolve(dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        dir.join(path)
    }
}

impl Corpus for ManifestCorpus {
    fn load_meta_data(
        &self,
        processed_data_dir: &Path,
        ds_id: usize,
    ) -> Result<Vec<(String, Item)>, BinarizeError> {
        let path = processed_data_dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            BinarizeError::Corpus(format!("read {}: {e}", path.display()))
        })?;
        let entries: Vec<ManifestEntry> = serde_json::from_str(&content)?;
        debug!(ds_id, path = %path.display(), entries = entries.len(), "read manifest");

        Ok(entries
            .into_iter()
            .map(|ManifestEntry { item_name, mut item }| {
                item.wav_fn = resolve(processed_data_dir, item.wav_fn);
                item.tg_fn = item.tg_fn.map(|p| resolve(processed_data_dir, p));
                item.ds_id = ds_id;
                (item_name, item)
            })
            .collect())
    }

    fn train_item_names(&self, item_names: &[String]) -> Vec<String> {
        self.block(item_names, self.valid_num + self.test_num, None)
    }

    fn valid_item_names(&self, item_names: &[String]) -> Vec<String> {
        self.block(item_names, 0, Some(self.valid_num))
    }

    fn test_item_names(&self, item_names: &[String]) -> Vec<String> {
        self.block(item_names, self.valid_num, Some(self.test_num))
    }

    fn load_ph_set(&self, registry: &ItemRegistry) -> Result<Vec<String>, BinarizeError> {
        Ok(collect_ph_set(registry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("item{i}")).collect()
    }

    #[test]
    fn blocks_partition_the_ordering() {
        let corpus = ManifestCorpus::new(2, 3);
        let all = names(10);
        assert_eq!(corpus.valid_item_names(&all), &all[0..2]);
        assert_eq!(corpus.test_item_names(&all), &all[2..5]);
        assert_eq!(corpus.train_item_names(&all), &all[5..]);
    }

    #[test]
    fn short_corpus_leaves_later_blocks_empty() {
        let corpus = ManifestCorpus::new(4, 4);
        let all = names(3);
        assert_eq!(corpus.valid_item_names(&all).len(), 3);
        assert!(corpus.test_item_names(&all).is_empty());
        assert!(corpus.train_item_names(&all).is_empty());
    }

    #[test]
    fn loads_entries_and_resolves_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(MANIFEST_FILE),
            r#"[
                {"item_name": "a", "txt": "x", "ph": "k ae t", "wav_fn": "wavs/a.wav",
                 "tg_fn": "/abs/a.TextGrid", "spk_id": "s1", "emotion": "happy"},
                {"item_name": "b", "txt": "y", "ph": "d", "wav_fn": "wavs/b.wav", "spk_id": "s2"}
            ]"#,
        )
        .unwrap();

        let items = ManifestCorpus::default().load_meta_data(dir.path(), 1).unwrap();
        assert_eq!(items.len(), 2);
        let (name, a) = &items[0];
        assert_eq!(name, "a");
        assert_eq!(a.wav_fn, dir.path().join("wavs/a.wav"));
        assert_eq!(a.tg_fn, Some(PathBuf::from("/abs/a.TextGrid")));
        assert_eq!(a.ds_id, 1);
        assert_eq!(a.extra["emotion"], "happy");
        assert!(items[1].1.tg_fn.is_none());
    }

    #[test]
    fn missing_manifest_is_a_corpus_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ManifestCorpus::default().load_meta_data(dir.path(), 0),
            Err(BinarizeError::Corpus(_))
        ));
    }

    #[test]
    fn phone_set_covers_every_item() {
        let registry = ItemRegistry::from_items(
            [
                ("a".to_string(), Item::new("", "k ae t", "a.wav", None, "s")),
                ("b".to_string(), Item::new("", "d ae", "b.wav", None, "s")),
            ],
            false,
        );
        let set = ManifestCorpus::default().load_ph_set(&registry).unwrap();
        assert_eq!(set, ["ae", "d", "k", "t"]);
    }
}
