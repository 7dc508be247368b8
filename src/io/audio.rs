use std::{f32::consts::FRAC_1_SQRT_2, fs::File, path::Path};

use anyhow::{anyhow, Context};
use hound::WavWriter;
use rubato::{FftFixedInOut, Resampler};
use symphonia::core::{
    audio::SampleBuffer, codecs::DecoderOptions, errors::Error as SymphoniaError,
    formats::FormatOptions, io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
};
use symphonia::default::{get_codecs, get_probe};
use tracing::{debug, trace, warn};

use crate::{
    error::Result,
    io::progress::{ProgressReporter, Stage},
    types::AudioBuffer,
};

const RESAMPLE_CHUNK: usize = 1024;

/// Decodes a whole file to interleaved `f32` at `target_rate` / `target_channels`.
pub fn read_audio<P: AsRef<Path>>(
    path: P,
    target_rate: u32,
    target_channels: u16,
    progress: &mut ProgressReporter,
) -> Result<AudioBuffer> {
    let path: &Path = path.as_ref();

    let file: File =
        File::open(path).with_context(|| format!("Failed to open audio file: {:?}", path))?;

    let mss: MediaSourceStream = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint: Hint = Hint::new();

    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .with_context(|| format!("Unsupported audio format: {:?}", path))?;

    let mut format = probed.format;
    let track = format.default_track().context("No default track found")?;
    let track_id = track.id;
    let expected_frames = track.codec_params.n_frames.unwrap_or(0) as usize;

    let mut decoder = get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create decoder")?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_rate: u32 = 0;
    let mut channels: u16 = 0;

    progress.update(Stage::ReadAudio, 0, expected_frames);

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(anyhow!("Failed to read packet: {e}").into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                trace!("Skipping corrupted frame: {}", e);
                continue;
            }
            Err(e) => return Err(anyhow!("Decode error: {e}").into()),
        };
        sample_rate = decoded.spec().rate;
        channels = decoded.spec().channels.count() as u16;

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
        buffer.copy_interleaved_ref(decoded);

        samples.extend_from_slice(buffer.samples());

        if channels > 0 && expected_frames > 0 {
            progress.update(
                Stage::ReadAudio,
                samples.len() / channels as usize,
                expected_frames,
            );
        }
    }

    if channels == 0 || sample_rate == 0 {
        return Err(anyhow!("No audio decoded from {:?}", path).into());
    }

    debug!(
        "Read audio: sample_rate={}, channels={}, frames={}",
        sample_rate,
        channels,
        samples.len() / channels as usize
    );

    let samples = remix_channels(&samples, channels, target_channels);
    let samples = resample(&samples, target_channels, sample_rate, target_rate)?;
    let frames = samples.len() / target_channels as usize;
    progress.update(Stage::ReadAudio, frames, frames);

    AudioBuffer::new(samples, target_rate, target_channels)
}

/// Maps interleaved audio from `from` to `to` channels.
///
/// Upmixing repeats input channel `c % from`. Downmixing folds every input
/// channel into the outputs (see [`downmix_gains`]) and normalizes each output
/// so its gains sum to one.
fn remix_channels(samples: &[f32], from: u16, to: u16) -> Vec<f32> {
    if from == to {
        return samples.to_vec();
    }
    let from = from as usize;
    let to = to as usize;

    let matrix: Vec<Vec<f32>> = if from < to {
        (0..to)
            .map(|c| (0..from).map(|i| if i == c % from { 1.0 } else { 0.0 }).collect())
            .collect()
    } else {
        downmix_gains(from, to)
    };

    let mut out = Vec::with_capacity(samples.len() / from * to);
    for frame in samples.chunks_exact(from) {
        for row in &matrix {
            out.push(row.iter().zip(frame).map(|(g, s)| g * s).sum());
        }
    }
    out
}

/// `[to][from]` gain matrix for `from > to`.
///
/// Mono averages everything. Stereo keeps the front pair, adds the center
/// (channel 2 of 3, 5 or more channels) to both sides at -3 dB, drops the LFE
/// (channel 3 of 6 or more) and folds the remaining channels alternately into
/// left and right at -3 dB. Other layouts keep their first `to` channels and
/// fold the rest round-robin at -3 dB.
fn downmix_gains(from: usize, to: usize) -> Vec<Vec<f32>> {
    let mut matrix = vec![vec![0.0f32; from]; to];

    if to == 1 {
        matrix[0].fill(1.0);
    } else if to == 2 {
        matrix[0][0] = 1.0;
        matrix[1][1] = 1.0;
        let has_center = from == 3 || from >= 5;
        let has_lfe = from >= 6;
        let mut side = 0;
        for i in 2..from {
            if has_center && i == 2 {
                matrix[0][i] = FRAC_1_SQRT_2;
                matrix[1][i] = FRAC_1_SQRT_2;
            } else if has_lfe && i == 3 {
                continue;
            } else {
                matrix[side][i] = FRAC_1_SQRT_2;
                side ^= 1;
            }
        }
    } else {
        for (c, row) in matrix.iter_mut().enumerate() {
            row[c] = 1.0;
        }
        for i in to..from {
            matrix[(i - to) % to][i] = FRAC_1_SQRT_2;
        }
    }

    for row in &mut matrix {
        let total: f32 = row.iter().sum();
        if total > 0.0 {
            row.iter_mut().for_each(|g| *g /= total);
        }
    }
    matrix
}

/// Resamples interleaved audio, compensating the resampler delay so output
/// frame `n` lines up with input time `n / to_rate`.
fn resample(samples: &[f32], channels: u16, from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    let ch = channels as usize;
    let frames = samples.len() / ch;

    let mut resampler =
        FftFixedInOut::<f32>::new(from_rate as usize, to_rate as usize, RESAMPLE_CHUNK, ch)
            .map_err(|e| anyhow!("Failed to create resampler: {e}"))?;
    let chunk_in = resampler.input_frames_next();
    // FftFixedInOut delays its output by half an output chunk.
    let delay = resampler.output_frames_next() / 2;

    let expected = (frames as u64 * to_rate as u64).div_ceil(from_rate as u64) as usize;
    let needed = delay + expected;
    let mut planar_out: Vec<Vec<f32>> = vec![Vec::with_capacity(needed); ch];
    let mut planar_in: Vec<Vec<f32>> = vec![vec![0.0; chunk_in]; ch];

    // Past the end of the input the chunks are zero, which flushes the tail.
    let mut pos = 0;
    while planar_out[0].len() < needed {
        let n = chunk_in.min(frames.saturating_sub(pos));
        for (c, buf) in planar_in.iter_mut().enumerate() {
            buf.fill(0.0);
            for (i, slot) in buf.iter_mut().take(n).enumerate() {
                *slot = samples[(pos + i) * ch + c];
            }
        }

        let out = resampler
            .process(&planar_in, None)
            .map_err(|e| anyhow!("Resampling failed: {e}"))?;
        for (dst, src) in planar_out.iter_mut().zip(out) {
            dst.extend_from_slice(&src);
        }
        pos += chunk_in;
    }

    debug!(
        "Resampled {} frames {} Hz -> {} frames {} Hz (delay {})",
        frames, from_rate, expected, to_rate, delay
    );

    let mut interleaved = Vec::with_capacity(expected * ch);
    for i in delay..needed {
        for plane in &planar_out {
            interleaved.push(plane[i]);
        }
    }
    Ok(interleaved)
}

/// Writes `audio` as 16-bit PCM WAV.
///
/// `format_hint` and `bit_rate` only matter for compressed formats; anything
/// other than WAV is written as WAV with a warning.
pub fn write_audio<P: AsRef<Path>>(
    path: P,
    audio: &AudioBuffer,
    format_hint: Option<&str>,
    bit_rate: u32,
) -> Result<()> {
    let path = path.as_ref();
    if let Some(hint) = format_hint.filter(|h| !h.eq_ignore_ascii_case("wav")) {
        warn!(
            "No encoder for `{}`, writing {} as WAV (bit rate {} ignored)",
            hint,
            path.display(),
            bit_rate
        );
    }

    let spec = hound::WavSpec {
        channels: audio.channels(),
        sample_rate: audio.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create output file: {:?}", path))?;
    for sample in audio.samples() {
        let s = (sample * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        writer.write_sample(s).context("Failed to write sample")?;
    }

    writer.finalize().context("Failed to finalize WAV")?;
    Ok(())
}
