//! WAV file loading.
//!
//! Files are decoded with `hound`, mixed down to mono and resampled to the
//! requested rate with a sinc resampler when the stored rate differs.

use std::path::Path;

use hound::{SampleFormat, WavReader};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::AudioError;

/// Reads a WAV file as mono f32 samples in `[-1, 1]` plus its sample rate.
pub fn read_wav(path: impl AsRef<Path>) -> Result<(Vec<f32>, u32), AudioError> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(AudioError::NoChannels);
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let max = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<Result<_, _>>()?
        }
    };

    let mono = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };
    Ok((mono, spec.sample_rate))
}

/// Reads a WAV file as mono samples at `target_rate`.
pub fn load_wav(path: impl AsRef<Path>, target_rate: u32) -> Result<Vec<f32>, AudioError> {
    let (samples, rate) = read_wav(path)?;
    resample(samples, rate, target_rate)
}

/// Resamples a mono signal from `from` Hz to `to` Hz.
pub fn resample(samples: Vec<f32>, from: u32, to: u32) -> Result<Vec<f32>, AudioError> {
    if from == to || samples.is_empty() {
        return Ok(samples);
    }
    let err = |msg: String| AudioError::Resample { from, to, msg };

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window: WindowFunction::BlackmanHarris2,
    };
    let expected = (samples.len() as f64 * to as f64 / from as f64).round() as usize;
    let mut resampler =
        SincFixedIn::<f32>::new(to as f64 / from as f64, 1.0, params, samples.len(), 1)
            .map_err(|e| err(e.to_string()))?;

    // The sinc filter delays the output; flush with silence until the
    // delayed tail is out, then drop the leading delay frames.
    let delay = resampler.output_delay();
    let waves_in = vec![samples];
    let mut mono = first_channel(resampler.process(&waves_in, None), &err)?;
    while mono.len() < delay + expected {
        let tail = first_channel(resampler.process_partial(None::<&[Vec<f32>]>, None), &err)?;
        if tail.is_empty() {
            break;
        }
        mono.extend(tail);
    }
    mono.drain(..delay.min(mono.len()));
    mono.resize(expected, 0.0);
    Ok(mono)
}

fn first_channel(
    out: Result<Vec<Vec<f32>>, rubato::ResampleError>,
    err: &impl Fn(String) -> AudioError,
) -> Result<Vec<f32>, AudioError> {
    out.map_err(|e| err(e.to_string()))?
        .into_iter()
        .next()
        .ok_or_else(|| err("no output channel".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    fn write_wav(path: &Path, channels: u16, rate: u32, frames: &[i16]) {
        let spec = WavSpec {
            channels,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in frames {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn reads_and_downmixes_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, 16000, &[16384, 0, -16384, -16384]);

        let (samples, rate) = read_wav(&path).unwrap();
        assert_eq!(rate, 16000);
        assert_eq!(samples.len(), 2);
        assert!((samples[0] - 0.25).abs() < 1e-6);
        assert!((samples[1] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn load_resamples_to_target_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, 1, 16000, &vec![1000i16; 1600]);

        let samples = load_wav(&path, 22050).unwrap();
        assert_eq!(samples.len(), 2205);
    }

    #[test]
    fn resampled_signal_is_not_delayed() {
        let (from, to) = (16000u32, 32000u32);
        let hz = 200.0;
        let input: Vec<f32> = (0..3200)
            .map(|i| (2.0 * std::f64::consts::PI * hz * i as f64 / from as f64).sin() as f32)
            .collect();

        let out = resample(input, from, to).unwrap();
        assert_eq!(out.len(), 6400);
        let expected = |i: usize| (2.0 * std::f64::consts::PI * hz * i as f64 / to as f64).sin() as f32;
        // Away from the edges the output tracks the source phase.
        for i in (400..6000).step_by(37) {
            assert!((out[i] - expected(i)).abs() < 0.1, "sample {i}: {} vs {}", out[i], expected(i));
        }
    }

    #[test]
    fn same_rate_is_untouched() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(samples.clone(), 22050, 22050).unwrap(), samples);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(matches!(read_wav("/nonexistent/x.wav"), Err(AudioError::Wav(_))));
    }
}
