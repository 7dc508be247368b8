//! Weighted, throttled progress reporting.
//!
//! Each [`ProgressReporter`] owns its throttling state, so concurrent
//! operations and tests never share a "last reported" value.

use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    ReadAudio,
    LoadModel,
    ProcessSegment,
    WriteOutput,
}

impl Stage {
    /// `(base, width)` of this stage on the overall 0..100 scale.
    fn span(self) -> (f64, f64) {
        match self {
            Stage::ReadAudio => (0.0, 2.0),
            Stage::LoadModel => (2.0, 3.0),
            Stage::ProcessSegment => (5.0, 85.0),
            Stage::WriteOutput => (90.0, 10.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::ReadAudio => "Reading audio samples",
            Stage::LoadModel => "Loading model",
            Stage::ProcessSegment => "Processing segment",
            Stage::WriteOutput => "Writing output file",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub done: usize,
    pub total: usize,
    /// Overall progress, 0..=100.
    pub percent: f64,
}

type Sink = Box<dyn FnMut(&ProgressEvent) + Send>;

pub struct ProgressReporter {
    sink: Option<Sink>,
    last_percent: Option<f64>,
    min_change: f64,
}

impl ProgressReporter {
    pub const MIN_CHANGE: f64 = 1.0;

    pub fn new(sink: impl FnMut(&ProgressEvent) + Send + 'static) -> Self {
        Self {
            sink: Some(Box::new(sink)),
            last_percent: None,
            min_change: Self::MIN_CHANGE,
        }
    }

    /// Tracks state but forwards nothing.
    pub fn silent() -> Self {
        Self {
            sink: None,
            last_percent: None,
            min_change: Self::MIN_CHANGE,
        }
    }

    /// Reports `done` of `total` for `stage`; returns whether it was emitted.
    ///
    /// Stage boundaries (`done == 0` or `done == total`) always emit, anything
    /// else only once overall progress moved by at least one percent.
    pub fn update(&mut self, stage: Stage, done: usize, total: usize) -> bool {
        let done = done.min(total);
        let (base, width) = stage.span();
        let fraction = if total == 0 {
            1.0
        } else {
            done as f64 / total as f64
        };
        let percent = base + fraction * width;

        let boundary = done == 0 || done == total;
        let moved = self
            .last_percent
            .map_or(true, |last| (percent - last).abs() >= self.min_change);
        if !boundary && !moved {
            return false;
        }

        self.last_percent = Some(percent);
        let event = ProgressEvent {
            stage,
            done,
            total,
            percent,
        };
        debug!(
            "[{:6.2}%] {}, {}/{}",
            percent,
            stage.label(),
            done,
            total
        );
        if let Some(sink) = self.sink.as_mut() {
            sink(&event);
        }
        true
    }

    pub fn last_percent(&self) -> Option<f64> {
        self.last_percent
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::silent()
    }
}
