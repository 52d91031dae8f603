use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::corpus::Corpus;
use crate::error::BinarizeError;
use crate::item::Item;

/// Seed of the item-order shuffle.
pub const SHUFFLE_SEED: u64 = 1234;

/// All items of a run, keyed by name, plus the global name ordering.
///
/// Built once before any split is processed and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct ItemRegistry {
    items: HashMap<String, Item>,
    item_names: Vec<String>,
}

impl ItemRegistry {
    /// Loads every dataset through `corpus` and validates the attribute schema.
    ///
    /// Datasets are loaded in order, `ds_id` being the position in `dirs`.
    /// The first dataset must expose exactly `schema`; later ones a subset.
    /// An item without an alignment source still satisfies a schema that
    /// declares `tg_fn`.
    pub fn load(
        corpus: &dyn Corpus,
        dirs: &[PathBuf],
        schema: &[String],
        shuffle: bool,
    ) -> Result<Self, BinarizeError> {
        let schema: BTreeSet<String> = schema.iter().cloned().collect();
        let mut items = Vec::new();

        for (ds_id, dir) in dirs.iter().enumerate() {
            let loaded = corpus.load_meta_data(dir, ds_id)?;
            info!(ds_id, dir = %dir.display(), items = loaded.len(), "loaded dataset");

            for (name, mut item) in loaded {
                item.ds_id = ds_id;
                let mut found = item.attribute_names();
                if item.tg_fn.is_none() && schema.contains("tg_fn") {
                    found.insert("tg_fn".to_string());
                }
                let ok = if ds_id == 0 {
                    found == schema
                } else {
                    found.is_subset(&schema)
                };
                if !ok {
                    return Err(BinarizeError::Schema {
                        ds_id,
                        item_name: name,
                        expected: schema.into_iter().collect(),
                        found: found.into_iter().collect(),
                    });
                }
                items.push((name, item));
            }
        }

        Ok(Self::from_items(items, shuffle))
    }

    /// Builds a registry from already-validated items. Later duplicates win.
    pub fn from_items(items: impl IntoIterator<Item = (String, Item)>, shuffle: bool) -> Self {
        let mut map = HashMap::new();
        for (name, item) in items {
            if map.insert(name.clone(), item).is_some() {
                debug!(item_name = %name, "item replaced by a later dataset");
            }
        }

        let mut item_names: Vec<String> = map.keys().cloned().collect();
        item_names.sort();
        if shuffle {
            let mut rng = StdRng::seed_from_u64(SHUFFLE_SEED);
            item_names.shuffle(&mut rng);
        }

        Self {
            items: map,
            item_names,
        }
    }

    pub fn get(&self, item_name: &str) -> Option<&Item> {
        self.items.get(item_name)
    }

    /// Sorted (or seeded-shuffled) item names.
    pub fn item_names(&self) -> &[String] {
        &self.item_names
    }

    /// Items in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Item)> {
        self.item_names
            .iter()
            .filter_map(|name| self.items.get(name).map(|item| (name.as_str(), item)))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::BASE_ITEM_ATTRIBUTES;
    use std::path::Path;

    fn item(spk: &str) -> Item {
        Item::new("t", "a b", "x.wav", None, spk)
    }

    struct TwoDatasets;

    impl Corpus for TwoDatasets {
        fn load_meta_data(
            &self,
            dir: &Path,
            _ds_id: usize,
        ) -> Result<Vec<(String, Item)>, BinarizeError> {
            Ok(match dir.to_str() {
                Some("first") => vec![("a".into(), item("s1")), ("b".into(), item("s1"))],
                Some("second") => vec![("b".into(), item("s2")), ("c".into(), item("s2"))],
                _ => {
                    let mut odd = item("s3");
                    odd.extra.insert("mood".into(), serde_json::json!(1));
                    vec![("d".into(), odd)]
                }
            })
        }

        fn train_item_names(&self, item_names: &[String]) -> Vec<String> {
            item_names.to_vec()
        }

        fn valid_item_names(&self, _item_names: &[String]) -> Vec<String> {
            Vec::new()
        }

        fn test_item_names(&self, _item_names: &[String]) -> Vec<String> {
            Vec::new()
        }

        fn load_ph_set(&self, _registry: &ItemRegistry) -> Result<Vec<String>, BinarizeError> {
            Ok(Vec::new())
        }
    }

    fn schema() -> Vec<String> {
        BASE_ITEM_ATTRIBUTES.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn later_datasets_overwrite_and_get_their_ds_id() {
        let dirs = vec![PathBuf::from("first"), PathBuf::from("second")];
        let reg = ItemRegistry::load(&TwoDatasets, &dirs, &schema(), false).unwrap();

        assert_eq!(reg.item_names(), ["a", "b", "c"]);
        assert_eq!(reg.get("b").unwrap().spk_id, "s2");
        assert_eq!(reg.get("b").unwrap().ds_id, 1);
        assert_eq!(reg.get("a").unwrap().ds_id, 0);
    }

    #[test]
    fn first_dataset_must_match_schema_exactly() {
        let dirs = vec![PathBuf::from("odd")];
        let err = ItemRegistry::load(&TwoDatasets, &dirs, &schema(), false).unwrap_err();
        assert!(matches!(err, BinarizeError::Schema { ds_id: 0, .. }));
    }

    #[test]
    fn later_dataset_attributes_must_be_known() {
        let dirs = vec![PathBuf::from("first"), PathBuf::from("odd")];
        let err = ItemRegistry::load(&TwoDatasets, &dirs, &schema(), false).unwrap_err();
        assert!(matches!(err, BinarizeError::Schema { ds_id: 1, .. }));
    }

    #[test]
    fn schema_without_alignments() {
        let no_tg: Vec<String> = ["txt", "ph", "wav_fn", "spk_id"].map(String::from).into();
        let dirs = vec![PathBuf::from("first"), PathBuf::from("second")];
        let reg = ItemRegistry::load(&TwoDatasets, &dirs, &no_tg, false).unwrap();
        assert_eq!(reg.len(), 3);

        // The same schema rejects an item that carries a TextGrid.
        struct Aligned;
        impl Corpus for Aligned {
            fn load_meta_data(
                &self,
                _dir: &Path,
                _ds_id: usize,
            ) -> Result<Vec<(String, Item)>, BinarizeError> {
                let mut it = item("s1");
                it.tg_fn = Some(PathBuf::from("a.TextGrid"));
                Ok(vec![("a".into(), it)])
            }
            fn train_item_names(&self, item_names: &[String]) -> Vec<String> {
                item_names.to_vec()
            }
            fn valid_item_names(&self, _item_names: &[String]) -> Vec<String> {
                Vec::new()
            }
            fn test_item_names(&self, _item_names: &[String]) -> Vec<String> {
                Vec::new()
            }
            fn load_ph_set(&self, _registry: &ItemRegistry) -> Result<Vec<String>, BinarizeError> {
                Ok(Vec::new())
            }
        }
        let err = ItemRegistry::load(&Aligned, &dirs[..1], &no_tg, false).unwrap_err();
        assert!(matches!(err, BinarizeError::Schema { ds_id: 0, .. }));

        // The default schema accepts both shapes.
        assert!(ItemRegistry::load(&Aligned, &dirs[..1], &schema(), false).is_ok());
    }

    #[test]
    fn shuffle_is_reproducible() {
        let items = || (0..50).map(|i| (format!("item{i:03}"), item("s")));
        let a = ItemRegistry::from_items(items(), true);
        let b = ItemRegistry::from_items(items(), true);
        let sorted = ItemRegistry::from_items(items(), false);

        assert_eq!(a.item_names(), b.item_names());
        assert_ne!(a.item_names(), sorted.item_names());
        assert_eq!(sorted.item_names()[0], "item000");
    }
}
