//! Windowing policy for segmented inference.
//!
//! The input is cut into slices of `slice_length` frames. Each slice is fed to
//! the model with up to `extend_length` frames of context on either side, and
//! only the slice itself (the "use" range) is kept from the model output.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StemError};

pub const SLICE_SECONDS: usize = 30;
pub const EXTEND_SECONDS: usize = 5;
pub const LAST_SEGMENT_MIN_SECONDS: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentConfig {
    pub slice_length: usize,
    pub extend_length: usize,
    /// A trailing slice shorter than this is merged into the previous one.
    pub last_segment_min_length: usize,
}

impl SegmentConfig {
    pub fn new(slice_length: usize, extend_length: usize, last_segment_min_length: usize) -> Self {
        Self {
            slice_length,
            extend_length,
            last_segment_min_length,
        }
    }

    /// Default 30s / 5s / 10s lengths in frames at `sample_rate`.
    pub fn for_sample_rate(sample_rate: u32) -> Self {
        let rate = sample_rate as usize;
        Self::new(
            rate * SLICE_SECONDS,
            rate * EXTEND_SECONDS,
            rate * LAST_SEGMENT_MIN_SECONDS,
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.slice_length == 0 {
            return Err(StemError::InvalidInput("slice length must be > 0".into()));
        }
        if self.extend_length >= self.slice_length {
            return Err(StemError::InvalidInput(format!(
                "extend length {} must be shorter than slice length {}",
                self.extend_length, self.slice_length
            )));
        }
        if self.last_segment_min_length >= self.slice_length {
            return Err(StemError::InvalidInput(format!(
                "last segment min length {} must be shorter than slice length {}",
                self.last_segment_min_length, self.slice_length
            )));
        }
        Ok(())
    }
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self::for_sample_rate(44100)
    }
}

/// One inference call: which frames go in, which frames of the output are kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentDescriptor {
    pub index: usize,
    pub total_segments: usize,
    /// Absolute frame where this segment's kept output lands.
    pub slice_offset: usize,
    pub extend_begin: usize,
    pub extend_end: usize,
    /// Absolute frame where the model input window starts.
    pub window_offset: usize,
    pub window_length: usize,
    /// Offset of the kept range inside the window.
    pub use_offset: usize,
    pub use_length: usize,
}

impl SegmentDescriptor {
    pub fn is_last(&self) -> bool {
        self.index + 1 == self.total_segments
    }

    /// Absolute frames fed to the model.
    pub fn window_range(&self) -> Range<usize> {
        self.window_offset..self.window_offset + self.window_length
    }

    /// Absolute frames this segment contributes to the output.
    pub fn slice_range(&self) -> Range<usize> {
        self.slice_offset..self.slice_offset + self.use_length
    }

    /// Frames of the window output that are kept.
    pub fn use_range(&self) -> Range<usize> {
        self.use_offset..self.use_offset + self.use_length
    }
}

/// Plans the segments for `total` frames.
///
/// The slice ranges of the returned plan partition `0..total` in order.
pub fn plan_segments(total: usize, config: &SegmentConfig) -> Result<Vec<SegmentDescriptor>> {
    config.validate()?;
    if total == 0 {
        return Err(StemError::InvalidInput("audio has no frames".into()));
    }

    let slice = config.slice_length;
    let mut count = total.div_ceil(slice);

    if count >= 2 {
        let last_len = total - slice * (count - 1);
        if last_len < config.last_segment_min_length {
            count -= 1;
        }
    }

    let segments = (0..count)
        .map(|index| {
            let is_last = index + 1 == count;
            let slice_offset = slice * index;
            let extend_begin = if index == 0 { 0 } else { config.extend_length };
            let extend_end = if is_last { 0 } else { config.extend_length };
            let use_length = if is_last { total - slice_offset } else { slice };
            let window_offset = slice_offset - extend_begin;
            let window_length =
                (extend_begin + use_length + extend_end).min(total - window_offset);

            SegmentDescriptor {
                index,
                total_segments: count,
                slice_offset,
                extend_begin,
                extend_end,
                window_offset,
                window_length,
                use_offset: extend_begin,
                use_length,
            }
        })
        .collect();

    Ok(segments)
}
