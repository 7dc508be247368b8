use std::path::PathBuf;

use ndarray::{ArrayView2, ArrayViewMut2};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StemError};

/// Reserved track name that always resolves to the unseparated input.
pub const INPUT_TRACK_NAME: &str = "input";

/// Interleaved multichannel `f32` audio, stored as `[frame][channel]`.
///
/// The shape is fixed at construction: `samples.len() == frames * channels`.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
    frames: usize,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<Self> {
        if channels == 0 {
            return Err(StemError::InvalidInput("channel count must be > 0".into()));
        }
        if sample_rate == 0 {
            return Err(StemError::InvalidInput("sample rate must be > 0".into()));
        }
        if samples.len() % channels as usize != 0 {
            return Err(StemError::InvalidInput(format!(
                "{} samples cannot be split into frames of {} channels",
                samples.len(),
                channels
            )));
        }
        let frames = samples.len() / channels as usize;
        Ok(Self {
            samples,
            sample_rate,
            channels,
            frames,
        })
    }

    /// Zero-filled buffer of the given shape.
    pub fn silent(frames: usize, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples: vec![0.0; frames * channels as usize],
            sample_rate,
            channels,
            frames,
        }
    }

    /// Zero-filled buffer with the same shape as `self`.
    pub fn silent_like(&self) -> Self {
        Self::silent(self.frames, self.channels, self.sample_rate)
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    /// Same frame count, channel count and sample rate.
    pub fn same_shape(&self, other: &AudioBuffer) -> bool {
        self.frames == other.frames
            && self.channels == other.channels
            && self.sample_rate == other.sample_rate
    }

    /// Copies `len` frames starting at frame `offset` into a new buffer.
    pub fn window(&self, offset: usize, len: usize) -> Result<AudioBuffer> {
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= self.frames)
            .ok_or_else(|| {
                StemError::InvalidInput(format!(
                    "window {}..{} exceeds {} frames",
                    offset,
                    offset.saturating_add(len),
                    self.frames
                ))
            })?;
        let ch = self.channels as usize;
        Ok(Self {
            samples: self.samples[offset * ch..end * ch].to_vec(),
            sample_rate: self.sample_rate,
            channels: self.channels,
            frames: len,
        })
    }

    /// `(frames, channels)` view over the interleaved samples.
    pub fn view(&self) -> Result<ArrayView2<'_, f32>> {
        Ok(ArrayView2::from_shape(
            (self.frames, self.channels as usize),
            &self.samples,
        )?)
    }

    pub fn view_mut(&mut self) -> Result<ArrayViewMut2<'_, f32>> {
        Ok(ArrayViewMut2::from_shape(
            (self.frames, self.channels as usize),
            &mut self.samples,
        )?)
    }
}

/// Separated stems in the model's declared order, plus the original input
/// under [`INPUT_TRACK_NAME`].
#[derive(Clone, Debug)]
pub struct StemSet {
    input: AudioBuffer,
    stems: Vec<(String, AudioBuffer)>,
}

impl StemSet {
    pub fn new(input: AudioBuffer) -> Self {
        Self {
            input,
            stems: Vec::new(),
        }
    }

    /// Appends a stem. The reserved input name and duplicates are rejected.
    pub fn insert(&mut self, name: impl Into<String>, buffer: AudioBuffer) -> Result<()> {
        let name = name.into();
        if name == INPUT_TRACK_NAME {
            return Err(StemError::InvalidInput(format!(
                "`{INPUT_TRACK_NAME}` is reserved for the original audio"
            )));
        }
        if self.stems.iter().any(|(n, _)| *n == name) {
            return Err(StemError::InvalidInput(format!("duplicate stem `{name}`")));
        }
        self.stems.push((name, buffer));
        Ok(())
    }

    /// Looks up a stem by name; `input` resolves to the original audio.
    pub fn get(&self, name: &str) -> Option<&AudioBuffer> {
        if name == INPUT_TRACK_NAME {
            return Some(&self.input);
        }
        self.stems.iter().find(|(n, _)| n == name).map(|(_, b)| b)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn input(&self) -> &AudioBuffer {
        &self.input
    }

    /// Separated stem names, declared order, without `input`.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stems.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AudioBuffer)> {
        self.stems.iter().map(|(n, b)| (n.as_str(), b))
    }

    pub fn len(&self) -> usize {
        self.stems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stems.is_empty()
    }

    pub fn into_parts(self) -> (AudioBuffer, Vec<(String, AudioBuffer)>) {
        (self.input, self.stems)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SplitOptions {
    pub model_name: String,
    /// Overrides the models directory lookup.
    pub models_dir: Option<PathBuf>,
    /// Base path for output files; defaults to the input path.
    pub output_base: Option<PathBuf>,
    pub bit_rate: u32,
    /// Track list expression, empty means every model stem.
    pub tracks: String,
    pub overwrite: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            model_name: "2stems".into(),
            models_dir: None,
            output_base: None,
            bit_rate: crate::io::output::DEFAULT_BIT_RATE,
            tracks: String::new(),
            overwrite: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ragged_samples() {
        let err = AudioBuffer::new(vec![0.0; 5], 44100, 2).unwrap_err();
        assert!(matches!(err, StemError::InvalidInput(_)));
    }

    #[test]
    fn window_copies_frame_range() {
        let buf = AudioBuffer::new((0..8).map(|v| v as f32).collect(), 10, 2).unwrap();
        let w = buf.window(1, 2).unwrap();
        assert_eq!(w.frames(), 2);
        assert_eq!(w.samples(), &[2.0, 3.0, 4.0, 5.0]);
        assert!(buf.window(3, 2).is_err());
        assert_eq!(w.into_samples(), vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn input_name_is_reserved() {
        let input = AudioBuffer::silent(4, 1, 10);
        let mut set = StemSet::new(input.clone());
        assert!(set.insert(INPUT_TRACK_NAME, input.clone()).is_err());
        set.insert("vocals", input.clone()).unwrap();
        assert!(set.insert("vocals", input).is_err());
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["vocals"]);
        assert!(set.contains(INPUT_TRACK_NAME));
    }
}
