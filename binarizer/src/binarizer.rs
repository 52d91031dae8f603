//! Pipeline driver: registry, speaker map, phoneme encoder, then every split.

use std::sync::Arc;

use tracing::info;
use voxbin_audio::{AutocorrelationTracker, PitchTracker};

use crate::config::BinarizerConfig;
use crate::corpus::Corpus;
use crate::embed::{FbankStatsEncoder, SpeakerEncoder};
use crate::error::BinarizeError;
use crate::extract::ItemExtractor;
use crate::item::Item;
use crate::phone::PhoneEncoder;
use crate::registry::ItemRegistry;
use crate::speaker::{SPK_MAP_FILE, SpeakerMap};
use crate::split::{Dispatch, Split, SplitProcessor, SplitSummary};
use crate::vocoder::{SpecExtractor, VocoderRegistry};

/// Binarizes a corpus into `binary_data_dir`.
///
/// ```no_run
/// use std::sync::Arc;
/// use voxbin_binarizer::{Binarizer, BinarizerConfig, ManifestCorpus};
///
/// let cfg = BinarizerConfig::from_yaml_file("config.yaml")?;
/// let corpus = Arc::new(ManifestCorpus::from_config(&cfg));
/// let summaries = Binarizer::new(cfg, corpus)?.process()?;
/// # Ok::<(), voxbin_binarizer::BinarizeError>(())
/// ```
pub struct Binarizer {
    cfg: Arc<BinarizerConfig>,
    corpus: Arc<dyn Corpus>,
    registry: ItemRegistry,
    vocoders: VocoderRegistry,
    pitch: Arc<dyn PitchTracker>,
    speaker_encoder: Option<Arc<dyn SpeakerEncoder>>,
    dispatch: Dispatch,
}

impl Binarizer {
    /// Validates the config and loads every item of the corpus.
    pub fn new(cfg: BinarizerConfig, corpus: Arc<dyn Corpus>) -> Result<Self, BinarizeError> {
        cfg.validate()?;
        let registry = ItemRegistry::load(
            corpus.as_ref(),
            &cfg.processed_data_dirs(),
            &cfg.item_attributes,
            cfg.binarization_args.shuffle,
        )?;
        info!(items = registry.len(), "item registry ready");

        let dispatch = if cfg.binarization_args.multiprocess {
            Dispatch::Pool {
                workers: cfg.num_workers(),
            }
        } else {
            Dispatch::Serial
        };

        Ok(Self {
            vocoders: VocoderRegistry::with_builtin(cfg.mel_config()),
            pitch: Arc::new(AutocorrelationTracker::new(cfg.pitch_config())),
            speaker_encoder: None,
            dispatch,
            registry,
            corpus,
            cfg: Arc::new(cfg),
        })
    }

    pub fn with_pitch_tracker(mut self, pitch: Arc<dyn PitchTracker>) -> Self {
        self.pitch = pitch;
        self
    }

    /// Speaker encoder used when `with_spk_embed` is set. Defaults to
    /// [`FbankStatsEncoder`].
    pub fn with_speaker_encoder(mut self, encoder: Arc<dyn SpeakerEncoder>) -> Self {
        self.speaker_encoder = Some(encoder);
        self
    }

    /// Registers a spectrogram extractor under a vocoder name.
    pub fn with_vocoder(mut self, name: &str, extractor: Arc<dyn SpecExtractor>) -> Self {
        self.vocoders.register(name, extractor);
        self
    }

    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn config(&self) -> &BinarizerConfig {
        &self.cfg
    }

    pub fn registry(&self) -> &ItemRegistry {
        &self.registry
    }

    pub fn build_spk_map(&self) -> Result<SpeakerMap, BinarizeError> {
        SpeakerMap::build(&self.registry, self.cfg.num_spk)
    }

    /// The `(name, item)` tasks of a split, in the corpus' order.
    pub fn split_items(&self, split: Split) -> Result<Vec<(String, Item)>, BinarizeError> {
        let all = self.registry.item_names();
        let names = match split {
            Split::Train => self.corpus.train_item_names(all),
            Split::Valid => self.corpus.valid_item_names(all),
            Split::Test => self.corpus.test_item_names(all),
        };
        names
            .into_iter()
            .map(|name| match self.registry.get(&name) {
                Some(item) => Ok((name, item.clone())),
                None => Err(BinarizeError::UnknownItem(name)),
            })
            .collect()
    }

    /// Runs the whole pipeline and returns one summary per split, in run order.
    pub fn process(&self) -> Result<Vec<SplitSummary>, BinarizeError> {
        let out_dir = self.cfg.binary_data_dir.as_path();
        std::fs::create_dir_all(out_dir)?;

        let spk_map = self.build_spk_map()?;
        spk_map.save(out_dir.join(SPK_MAP_FILE))?;
        info!(speakers = spk_map.len(), "spk_map: {:?}", spk_map.iter().collect::<Vec<_>>());

        let encoder = PhoneEncoder::build_or_load(out_dir, self.cfg.reset_phone_dict, || {
            self.corpus.load_ph_set(&self.registry)
        })?;

        let extractor = ItemExtractor::new(
            self.cfg.clone(),
            self.vocoders.resolve(&self.cfg.vocoder)?,
            self.pitch.clone(),
            Arc::new(encoder),
            self.corpus.clone(),
        );

        let speaker_encoder: Option<Arc<dyn SpeakerEncoder>> =
            match (&self.speaker_encoder, self.cfg.binarization_args.with_spk_embed) {
                (_, false) => None,
                (Some(encoder), true) => Some(encoder.clone()),
                (None, true) => Some(Arc::new(FbankStatsEncoder::new(self.cfg.audio_sample_rate))),
            };

        let processor = SplitProcessor::new(
            &extractor,
            &spk_map,
            speaker_encoder.as_deref(),
            self.cfg.binarization_args.with_wav,
            self.dispatch,
        );
        info!(dispatch = ?self.dispatch, "processing splits");

        Split::RUN_ORDER
            .into_iter()
            .map(|split| processor.process(split, &self.split_items(split)?, out_dir))
            .collect()
    }
}
