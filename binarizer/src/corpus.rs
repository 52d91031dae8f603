use std::path::Path;

use crate::align::{self, Alignment};
use crate::config::BinarizerConfig;
use crate::error::{BinarizeError, ItemError};
use crate::item::Item;
use crate::registry::ItemRegistry;

/// Corpus-specific behavior the pipeline depends on.
///
/// An implementation knows how a processed dataset directory is laid out,
/// how items are partitioned into splits, and which phonemes the corpus
/// uses. Extraction calls [`get_align`](Corpus::get_align) from worker
/// threads, hence `Send + Sync`.
pub trait Corpus: Send + Sync {
    /// Reads the items of one dataset directory.
    ///
    /// Names must be unique within the dataset; a name seen in an earlier
    /// dataset is replaced.
    fn load_meta_data(
        &self,
        processed_data_dir: &Path,
        ds_id: usize,
    ) -> Result<Vec<(String, Item)>, BinarizeError>;

    /// Training item names, drawn from the registry ordering.
    fn train_item_names(&self, item_names: &[String]) -> Vec<String>;

    fn valid_item_names(&self, item_names: &[String]) -> Vec<String>;

    fn test_item_names(&self, item_names: &[String]) -> Vec<String>;

    /// Every phoneme symbol the corpus uses. Order and duplicates do not matter.
    fn load_ph_set(&self, registry: &ItemRegistry) -> Result<Vec<String>, BinarizeError>;

    /// Frame-to-phoneme alignment of one item.
    ///
    /// Defaults to reading the `phones` tier of the item's TextGrid.
    fn get_align(
        &self,
        item: &Item,
        mel_len: usize,
        _phone_encoded: &[u32],
        cfg: &BinarizerConfig,
    ) -> Result<Alignment, ItemError> {
        align::get_align_from_textgrid(item, mel_len, cfg.audio_sample_rate, cfg.hop_size)
    }
}
