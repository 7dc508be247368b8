use crate::{
    core::{
        engine::{ModelLoader, StemModel},
        segment::{plan_segments, SegmentConfig},
        stitch::StitchAssembler,
    },
    error::{Result, StemError},
    io::progress::{ProgressReporter, Stage},
    model::registry::{resolve_model, ModelInfo},
    types::{AudioBuffer, StemSet},
};

use tracing::{debug, info};

/// Runs a model over a whole buffer, one segment at a time.
#[derive(Clone, Copy, Debug)]
pub struct Splitter {
    segments: SegmentConfig,
}

impl Splitter {
    pub fn new(segments: SegmentConfig) -> Self {
        Self { segments }
    }

    /// Default 30s / 5s / 10s windowing at the model's sample rate.
    pub fn for_model(info: &ModelInfo) -> Self {
        Self::new(SegmentConfig::for_sample_rate(info.sample_rate))
    }

    pub fn segment_config(&self) -> &SegmentConfig {
        &self.segments
    }

    /// Separates `input` into the model's stems.
    ///
    /// Either every segment succeeds and the full [`StemSet`] is returned, or
    /// the first failure is returned and all partial buffers are dropped.
    pub fn run<M: StemModel + ?Sized>(
        &self,
        info: &ModelInfo,
        input: AudioBuffer,
        model: &mut M,
        progress: &mut ProgressReporter,
    ) -> Result<StemSet> {
        check_input(info, &input)?;

        let total = input.frames();
        let plan = plan_segments(total, &self.segments)?;
        info!(
            "Splitting {} frames ({:.1}s) into {} segment(s) with `{}`",
            total,
            input.duration_secs(),
            plan.len(),
            info.name
        );

        let mut assembler =
            StitchAssembler::new(&info.stems, total, input.channels(), input.sample_rate());

        progress.update(Stage::ProcessSegment, 0, total);
        for segment in &plan {
            debug!(
                "segment {}/{}: window {:?}, keep {:?} -> {:?}",
                segment.index + 1,
                segment.total_segments,
                segment.window_range(),
                segment.use_range(),
                segment.slice_range()
            );

            let window = input.window(segment.window_offset, segment.window_length)?;
            let outputs = model.run(&window, &info.outputs)?;
            assembler.accept(segment, &outputs)?;

            progress.update(Stage::ProcessSegment, assembler.frames_filled(), total);
        }

        let mut stems = StemSet::new(input);
        for (name, buffer) in assembler.finish()? {
            stems.insert(name, buffer)?;
        }
        Ok(stems)
    }
}

/// Resolves `model_name`, loads it through `loader` and splits `input`.
pub fn split<L: ModelLoader>(
    model_name: &str,
    input: AudioBuffer,
    loader: &L,
    progress: &mut ProgressReporter,
) -> Result<StemSet> {
    let info = resolve_model(model_name)?;
    split_with_info(&info, input, loader, progress)
}

pub fn split_with_info<L: ModelLoader>(
    info: &ModelInfo,
    input: AudioBuffer,
    loader: &L,
    progress: &mut ProgressReporter,
) -> Result<StemSet> {
    // Fail on bad input before paying for a model load.
    check_input(info, &input)?;

    progress.update(Stage::LoadModel, 0, 1);
    let mut model = loader.load(info)?;
    progress.update(Stage::LoadModel, 1, 1);

    Splitter::for_model(info).run(info, input, &mut model, progress)
}

fn check_input(info: &ModelInfo, input: &AudioBuffer) -> Result<()> {
    if input.channels() != info.channels {
        return Err(StemError::InvalidInput(format!(
            "model `{}` needs {} channels, got {}",
            info.name,
            info.channels,
            input.channels()
        )));
    }
    if input.sample_rate() != info.sample_rate {
        return Err(StemError::InvalidInput(format!(
            "model `{}` needs {} Hz, got {} Hz",
            info.name,
            info.sample_rate,
            input.sample_rate()
        )));
    }
    if input.is_empty() {
        return Err(StemError::InvalidInput("audio has no frames".into()));
    }
    Ok(())
}
