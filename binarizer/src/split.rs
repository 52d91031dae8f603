//! Processing of one split into its binary outputs.

use std::fmt;
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, info};
use voxbin_indexed::{IndexedDatasetBuilder, write_npy};

use crate::embed::SpeakerEncoder;
use crate::error::BinarizeError;
use crate::extract::{Extracted, ItemExtractor};
use crate::item::Item;
use crate::record::FeatureRecord;
use crate::speaker::SpeakerMap;

/// Tasks handed to the pool per round, per worker.
const CHUNK_PER_WORKER: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Valid,
    Test,
}

impl Split {
    /// Order in which a run processes the splits.
    pub const RUN_ORDER: [Split; 3] = [Split::Valid, Split::Test, Split::Train];

    /// File name prefix of the split's outputs.
    pub fn prefix(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Valid => "valid",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// How extraction tasks are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// One task at a time on the calling thread, last task first.
    Serial,
    /// A dedicated thread pool; results are aggregated in task order.
    Pool { workers: usize },
}

/// Statistics folded over the persisted records of a split.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    /// Frame count of each record, in container order.
    pub lengths: Vec<i64>,
    pub total_sec: f64,
    /// Every non-zero f0 value of every record.
    pub f0s: Vec<f64>,
}

impl RunStats {
    pub fn fold(&mut self, rec: &FeatureRecord) {
        self.lengths.push(rec.len as i64);
        self.total_sec += rec.sec;
        if let Some(f0) = &rec.f0 {
            self.f0s
                .extend(f0.iter().filter(|&&v| v != 0.0).map(|&v| v as f64));
        }
    }

    /// Mean and population standard deviation of the collected f0 values.
    pub fn f0_mean_std(&self) -> Option<(f64, f64)> {
        if self.f0s.is_empty() {
            return None;
        }
        let n = self.f0s.len() as f64;
        let mean = self.f0s.iter().sum::<f64>() / n;
        let var = self.f0s.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Some((mean, var.sqrt()))
    }
}

/// Outcome of one processed split.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitSummary {
    pub split: Split,
    pub records: usize,
    pub skipped: usize,
    pub total_sec: f64,
    pub f0_mean_std: Option<(f64, f64)>,
}

/// Runs extraction for the items of a split and persists the results.
///
/// Workers only extract; the speaker id, speaker embedding, container
/// writes and statistics all happen on the calling thread.
pub struct SplitProcessor<'a> {
    extractor: &'a ItemExtractor,
    spk_map: &'a SpeakerMap,
    speaker_encoder: Option<&'a dyn SpeakerEncoder>,
    with_wav: bool,
    dispatch: Dispatch,
}

/// Single writer of a split's outputs.
struct Sink<'a> {
    spk_map: &'a SpeakerMap,
    speaker_encoder: Option<&'a dyn SpeakerEncoder>,
    with_wav: bool,
    builder: IndexedDatasetBuilder,
    stats: RunStats,
    skipped: usize,
    progress: ProgressBar,
}

impl Sink<'_> {
    fn accept(&mut self, extracted: Extracted) -> Result<(), BinarizeError> {
        self.progress.inc(1);
        match extracted {
            Extracted::Record(rec) => self.add_record(*rec),
            Extracted::Skipped(_) => {
                self.skipped += 1;
                Ok(())
            }
        }
    }

    fn add_record(&mut self, mut rec: FeatureRecord) -> Result<(), BinarizeError> {
        rec.spk_id = self.spk_map.id(&rec.spk);
        if let Some(encoder) = self.speaker_encoder {
            let wav = rec.wav.as_deref().unwrap_or_default();
            rec.spk_embed = Some(encoder.embed_utterance(wav)?);
        }
        if !self.with_wav && rec.wav.take().is_some() {
            debug!(item_name = %rec.item_name, "del wav");
        }
        self.builder.add_item(&rec)?;
        self.stats.fold(&rec);
        Ok(())
    }
}

impl<'a> SplitProcessor<'a> {
    pub fn new(
        extractor: &'a ItemExtractor,
        spk_map: &'a SpeakerMap,
        speaker_encoder: Option<&'a dyn SpeakerEncoder>,
        with_wav: bool,
        dispatch: Dispatch,
    ) -> Self {
        Self {
            extractor,
            spk_map,
            speaker_encoder,
            with_wav,
            dispatch,
        }
    }

    /// Extracts `tasks` and writes the split's container, lengths and f0
    /// statistics under `out_dir`.
    pub fn process(
        &self,
        split: Split,
        tasks: &[(String, Item)],
        out_dir: &Path,
    ) -> Result<SplitSummary, BinarizeError> {
        let prefix = out_dir.join(split.prefix());
        let mut sink = Sink {
            spk_map: self.spk_map,
            speaker_encoder: self.speaker_encoder,
            with_wav: self.with_wav,
            builder: IndexedDatasetBuilder::create(&prefix)?,
            stats: RunStats::default(),
            skipped: 0,
            progress: progress_bar(split, tasks.len()),
        };

        match self.dispatch {
            Dispatch::Serial => {
                for (name, item) in tasks.iter().rev() {
                    let extracted = self.extractor.process_item(name, item)?;
                    sink.accept(extracted)?;
                }
            }
            Dispatch::Pool { workers } => {
                let workers = workers.max(1);
                let pool = ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(move |i| format!("binarize-{i}"))
                    .build()
                    .map_err(|e| BinarizeError::WorkerPool(e.to_string()))?;
                for chunk in tasks.chunks(workers * CHUNK_PER_WORKER) {
                    let results: Vec<Result<Extracted, BinarizeError>> = pool.install(|| {
                        chunk
                            .par_iter()
                            .map(|(name, item)| self.extractor.process_item(name, item))
                            .collect()
                    });
                    for result in results {
                        sink.accept(result?)?;
                    }
                }
            }
        }
        sink.progress.finish_and_clear();

        let Sink {
            builder,
            stats,
            skipped,
            ..
        } = sink;
        let records = builder.finalize()?;
        write_npy(out_dir.join(format!("{split}_lengths.npy")), &stats.lengths)?;
        let f0_mean_std = stats.f0_mean_std();
        if let Some((mean, std)) = f0_mean_std {
            write_npy(out_dir.join(format!("{split}_f0s_mean_std.npy")), &[mean, std])?;
        }

        info!(
            split = %split,
            records,
            skipped,
            "{split} total duration: {:.3}s",
            stats.total_sec
        );
        Ok(SplitSummary {
            split,
            records,
            skipped,
            total_sec: stats.total_sec,
            f0_mean_std,
        })
    }
}

fn progress_bar(split: Split, len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template(
        "{prefix:6.bold.dim} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
    )
    .map(|s| s.progress_chars("#>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_prefix(split.prefix());
    pb
}
