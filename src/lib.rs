//! # stem-splitter-engine
//!
//! Segmented stem separation: long audio is cut into overlapping windows,
//! each window goes through a separation model, and the kept part of every
//! window is stitched back into full-length stems. Stems can then be
//! recombined with track expressions like `acc=input-vocals`.

pub mod core;
pub mod error;
pub mod io;
pub mod model;
mod pipeline;
pub mod tracks;
mod types;

pub use crate::{
    core::{
        engine::{IdentityModel, ModelLoader, StemModel},
        segment::{plan_segments, SegmentConfig, SegmentDescriptor},
        splitter::{split, split_with_info, Splitter},
        stitch::StitchAssembler,
    },
    error::{Result, StemError},
    io::{
        audio::{read_audio, write_audio},
        output::{parse_bit_rate, DEFAULT_BIT_RATE},
        progress::{ProgressEvent, ProgressReporter, Stage},
    },
    model::registry::{resolve_model, ModelInfo},
    pipeline::split_file,
    tracks::{evaluate, parse_track_list, validate, SignedSource, TrackExpression},
    types::{AudioBuffer, SplitOptions, StemSet, INPUT_TRACK_NAME},
};

#[cfg(feature = "onnx")]
pub use crate::core::onnx::{OnnxLoader, OnnxModel};
