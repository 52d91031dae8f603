//! Frame-to-phoneme alignment (`mel2ph`) from Praat TextGrid files.
//!
//! `mel2ph[t]` is the 1-based index of the phoneme covering mel frame `t`;
//! `dur[i]` is the number of frames assigned to phoneme `i`.

use tracing::debug;

use crate::error::{ItemError, SkipReason};
use crate::item::Item;

/// Name of the tier holding phoneme intervals.
pub const PHONES_TIER: &str = "phones";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alignment {
    pub mel2ph: Vec<u32>,
    pub dur: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interval {
    pub xmin: f64,
    pub xmax: f64,
    pub text: String,
}

fn unquote(v: &str) -> String {
    let v = v.trim();
    let v = v.strip_prefix('"').unwrap_or(v);
    let v = v.strip_suffix('"').unwrap_or(v);
    v.replace("\"\"", "\"")
}

fn parse_number(v: &str) -> Option<f64> {
    v.trim().parse().ok()
}

/// Reads the intervals of the named tier from a long-format TextGrid.
///
/// Returns `None` when the tier does not exist or an interval is malformed.
pub fn parse_textgrid_tier(content: &str, tier: &str) -> Option<Vec<Interval>> {
    let mut tiers: Vec<(String, Vec<Interval>)> = Vec::new();
    let mut current: Option<Interval> = None;

    for line in content.lines().map(str::trim) {
        if line.starts_with("item [") && !line.starts_with("item []") {
            tiers.push((String::new(), Vec::new()));
            current = None;
        } else if line.starts_with("intervals [") {
            current = Some(Interval::default());
        } else if let Some(v) = line.strip_prefix("name =") {
            if let Some(t) = tiers.last_mut() {
                t.0 = unquote(v);
            }
        } else if let Some(interval) = current.as_mut() {
            if let Some(v) = line.strip_prefix("xmin =") {
                interval.xmin = parse_number(v)?;
            } else if let Some(v) = line.strip_prefix("xmax =") {
                interval.xmax = parse_number(v)?;
            } else if let Some(v) = line.strip_prefix("text =") {
                interval.text = unquote(v);
                if let (Some(done), Some(t)) = (current.take(), tiers.last_mut()) {
                    t.1.push(done);
                }
            }
        }
    }

    tiers.into_iter().find(|(name, _)| name == tier).map(|(_, iv)| iv)
}

/// Maps phoneme intervals onto mel frames.
///
/// Interval `i` is phoneme `i`; an interval with a non-empty label must
/// carry that phoneme's symbol. Frames outside every interval inherit the
/// nearest preceding phoneme (the first phoneme before the first interval).
pub fn mel2ph_from_intervals(
    intervals: &[Interval],
    phonemes: &[&str],
    mel_len: usize,
    sample_rate: u32,
    hop_size: usize,
) -> Result<Alignment, SkipReason> {
    if intervals.len() != phonemes.len() {
        return Err(SkipReason::AlignMismatch(format!(
            "{} intervals for {} phonemes",
            intervals.len(),
            phonemes.len()
        )));
    }
    for (i, (iv, ph)) in intervals.iter().zip(phonemes).enumerate() {
        if !iv.text.is_empty() && iv.text != *ph {
            return Err(SkipReason::AlignMismatch(format!(
                "interval {i} is {:?}, phoneme is {ph:?}",
                iv.text
            )));
        }
    }

    let frames_per_sec = sample_rate as f64 / hop_size as f64;
    let to_frame = |sec: f64| ((sec * frames_per_sec).round().max(0.0) as usize).min(mel_len);

    let mut mel2ph = vec![0u32; mel_len];
    for (i, iv) in intervals.iter().enumerate() {
        for slot in &mut mel2ph[to_frame(iv.xmin)..to_frame(iv.xmax).max(to_frame(iv.xmin))] {
            *slot = i as u32 + 1;
        }
    }

    let mut last = if phonemes.is_empty() { 0 } else { 1 };
    for slot in mel2ph.iter_mut() {
        if *slot == 0 {
            *slot = last;
        } else {
            last = *slot;
        }
    }

    let mut dur = vec![0u32; phonemes.len()];
    for &p in &mel2ph {
        if p > 0 {
            dur[p as usize - 1] += 1;
        }
    }
    Ok(Alignment { mel2ph, dur })
}

/// Default alignment hook: reads the item's TextGrid `phones` tier.
pub fn get_align_from_textgrid(
    item: &Item,
    mel_len: usize,
    sample_rate: u32,
    hop_size: usize,
) -> Result<Alignment, ItemError> {
    let Some(tg_fn) = item.tg_fn.as_ref().filter(|p| p.exists()) else {
        return Err(SkipReason::AlignNotFound.into());
    };
    let content = std::fs::read_to_string(tg_fn)?;
    let Some(intervals) = parse_textgrid_tier(&content, PHONES_TIER) else {
        debug!(tg_fn = %tg_fn.display(), "no usable phones tier");
        return Err(SkipReason::AlignMismatch(format!(
            "{} has no usable {PHONES_TIER:?} tier",
            tg_fn.display()
        ))
        .into());
    };
    let phonemes: Vec<&str> = item.phonemes().collect();
    Ok(mel2ph_from_intervals(
        &intervals, &phonemes, mel_len, sample_rate, hop_size,
    )?)
}
