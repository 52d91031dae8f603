//! Per-item feature extraction.
//!
//! [`ItemExtractor::process_item`] turns one item into a [`FeatureRecord`]
//! or a [`SkipReason`]. It shares nothing mutable, so the split processor
//! may call it from any number of worker threads.

use std::sync::Arc;

use tracing::{debug, warn};
use voxbin_audio::pitch::{f0_to_coarse, PitchConfig, PitchTracker};
use voxbin_audio::cwt;

use crate::config::BinarizerConfig;
use crate::corpus::Corpus;
use crate::error::{BinarizeError, ItemError, SkipReason};
use crate::item::Item;
use crate::phone::PhoneEncoder;
use crate::record::FeatureRecord;
use crate::vocoder::SpecExtractor;

/// Result of extracting one item.
#[derive(Debug)]
pub enum Extracted {
    Record(Box<FeatureRecord>),
    Skipped(SkipReason),
}

/// Immutable extraction context shared by all items of a run.
pub struct ItemExtractor {
    cfg: Arc<BinarizerConfig>,
    pitch_cfg: PitchConfig,
    spec: Arc<dyn SpecExtractor>,
    pitch: Arc<dyn PitchTracker>,
    encoder: Arc<PhoneEncoder>,
    corpus: Arc<dyn Corpus>,
}

impl ItemExtractor {
    pub fn new(
        cfg: Arc<BinarizerConfig>,
        spec: Arc<dyn SpecExtractor>,
        pitch: Arc<dyn PitchTracker>,
        encoder: Arc<PhoneEncoder>,
        corpus: Arc<dyn Corpus>,
    ) -> Self {
        Self {
            pitch_cfg: cfg.pitch_config(),
            cfg,
            spec,
            pitch,
            encoder,
            corpus,
        }
    }

    /// Extracts the features of one item.
    ///
    /// Data problems of this item come back as `Ok(Extracted::Skipped)`;
    /// `Err` means the run cannot continue (unreadable audio, I/O failure).
    pub fn process_item(&self, item_name: &str, item: &Item) -> Result<Extracted, BinarizeError> {
        let spec = self.spec.wav2spec(&item.wav_fn)?;
        let mut rec = FeatureRecord::new(
            item_name,
            item,
            spec.wav,
            spec.mel,
            self.cfg.audio_sample_rate,
        );

        match self.add_features(item, &mut rec) {
            Ok(()) => {
                debug!(item_name, frames = rec.len, sec = rec.sec, "extracted");
                Ok(Extracted::Record(Box::new(rec)))
            }
            Err(ItemError::Skip(reason)) => {
                warn!(
                    item_name,
                    wav_fn = %item.wav_fn.display(),
                    reason = %reason,
                    "skip item"
                );
                Ok(Extracted::Skipped(reason))
            }
            Err(ItemError::Fatal(err)) => Err(err),
        }
    }

    fn add_features(&self, item: &Item, rec: &mut FeatureRecord) -> Result<(), ItemError> {
        let args = &self.cfg.binarization_args;
        if args.with_f0 {
            self.get_pitch(rec)?;
            if args.with_f0cwt {
                self.get_f0cwt(rec)?;
            }
        }
        if args.with_txt {
            let phone = self.encoder.encode(&item.ph).map_err(|err| {
                warn!(item_name = %rec.item_name, ph = %item.ph, error = %err, "phoneme encoding failed");
                SkipReason::EmptyPhoneme
            })?;
            if args.with_align {
                self.get_align(item, &phone, rec)?;
            }
            rec.phone = Some(phone);
        }
        Ok(())
    }

    fn get_pitch(&self, rec: &mut FeatureRecord) -> Result<(), ItemError> {
        let wav = rec.wav.as_deref().unwrap_or_default();
        let mut f0 = self.pitch.track(wav, &rec.mel);
        f0.resize(rec.len, 0.0);
        if f0.iter().map(|&v| v as f64).sum::<f64>() == 0.0 {
            return Err(SkipReason::EmptyF0.into());
        }
        rec.pitch = Some(f0_to_coarse(&f0, &self.pitch_cfg));
        rec.f0 = Some(f0);
        Ok(())
    }

    fn get_f0cwt(&self, rec: &mut FeatureRecord) -> Result<(), ItemError> {
        let f0 = rec.f0.as_deref().unwrap_or_default();
        let (_uv, cont_lf0_lpf) = cwt::continuous_lf0(f0);
        let (mean, std) = cwt::mean_std(&cont_lf0_lpf);
        let normed: Vec<f64> = cont_lf0_lpf.iter().map(|v| (v - mean) / std).collect();
        let (spec, scales) = cwt::lf0_cwt(&normed);
        if spec.iter().flatten().any(|v| !v.is_finite()) {
            return Err(SkipReason::NanCwt.into());
        }
        rec.cwt_spec = Some(spec);
        rec.cwt_scales = Some(scales);
        rec.f0_mean = Some(mean);
        rec.f0_std = Some(std);
        Ok(())
    }

    fn get_align(
        &self,
        item: &Item,
        phone: &[u32],
        rec: &mut FeatureRecord,
    ) -> Result<(), ItemError> {
        let align = self.corpus.get_align(item, rec.len, phone, &self.cfg)?;
        let max = align.mel2ph.iter().copied().max().unwrap_or(0) as usize;
        if max > phone.len() {
            return Err(SkipReason::AlignMismatch(format!(
                "mel2ph.max() - 1: {}, len(phone_encoded): {}",
                max - 1,
                phone.len()
            ))
            .into());
        }
        rec.mel2ph = Some(align.mel2ph);
        rec.dur = Some(align.dur);
        Ok(())
    }
}
