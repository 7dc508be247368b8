use ndarray::s;

use crate::{
    core::segment::SegmentDescriptor,
    error::{Result, StemError},
    types::AudioBuffer,
};

/// Full-length per-stem buffers filled one segment at a time.
///
/// Buffers are only handed out by [`StitchAssembler::finish`] once every frame
/// has been written.
pub struct StitchAssembler {
    stems: Vec<(String, AudioBuffer)>,
    total: usize,
    filled: usize,
}

impl StitchAssembler {
    pub fn new(names: &[String], total: usize, channels: u16, sample_rate: u32) -> Self {
        let stems = names
            .iter()
            .map(|n| (n.clone(), AudioBuffer::silent(total, channels, sample_rate)))
            .collect();
        Self {
            stems,
            total,
            filled: 0,
        }
    }

    /// Frames written so far, summed over segments.
    pub fn frames_filled(&self) -> usize {
        self.filled
    }

    pub fn total_frames(&self) -> usize {
        self.total
    }

    /// Copies the use range of each output into its stem at `slice_offset`.
    pub fn accept(&mut self, segment: &SegmentDescriptor, outputs: &[AudioBuffer]) -> Result<()> {
        if outputs.len() != self.stems.len() {
            return Err(StemError::RuntimeFailure(format!(
                "segment {}: model returned {} outputs, expected {}",
                segment.index,
                outputs.len(),
                self.stems.len()
            )));
        }
        if segment.slice_range().end > self.total {
            return Err(StemError::InvalidInput(format!(
                "segment {} ends at frame {} past total {}",
                segment.index,
                segment.slice_range().end,
                self.total
            )));
        }

        for ((name, stem), output) in self.stems.iter_mut().zip(outputs) {
            if output.frames() != segment.window_length || output.channels() != stem.channels() {
                return Err(StemError::RuntimeFailure(format!(
                    "segment {}: output `{}` has {} frames x {} channels, expected {} x {}",
                    segment.index,
                    name,
                    output.frames(),
                    output.channels(),
                    segment.window_length,
                    stem.channels()
                )));
            }

            let src = output.view()?;
            let mut dst = stem.view_mut()?;
            dst.slice_mut(s![segment.slice_range(), ..])
                .assign(&src.slice(s![segment.use_range(), ..]));
        }

        self.filled += segment.use_length;
        Ok(())
    }

    /// Hands the stems over once `0..total` is covered.
    pub fn finish(self) -> Result<Vec<(String, AudioBuffer)>> {
        if self.filled != self.total {
            return Err(StemError::InvalidInput(format!(
                "stitched {} of {} frames",
                self.filled, self.total
            )));
        }
        Ok(self.stems)
    }
}
