use std::sync::{Arc, Mutex};

use stem_splitter_engine::{
    split, AudioBuffer, IdentityModel, ModelInfo, ProgressEvent, ProgressReporter, Result,
    SegmentConfig, Splitter, Stage, StemError, StemModel,
};

const RATE: u32 = 1000;

fn info() -> ModelInfo {
    ModelInfo {
        name: "test".into(),
        variant: None,
        sample_rate: RATE,
        channels: 2,
        input_tensor: "input_waveform".into(),
        stems: vec!["vocals".into(), "accompaniment".into()],
        outputs: vec!["output_vocals".into(), "output_accompaniment".into()],
    }
}

fn splitter() -> Splitter {
    Splitter::new(SegmentConfig::new(1000, 200, 400))
}

/// Stereo ramp where every sample is unique.
fn ramp(frames: usize) -> AudioBuffer {
    let samples = (0..frames * 2).map(|i| i as f32 * 1e-4).collect();
    AudioBuffer::new(samples, RATE, 2).unwrap()
}

fn identity(_: &ModelInfo) -> Result<IdentityModel> {
    Ok(IdentityModel)
}

/// Scales the window by a per-output gain.
struct Gain(Vec<f32>);

impl StemModel for Gain {
    fn run(&mut self, window: &AudioBuffer, output_names: &[String]) -> Result<Vec<AudioBuffer>> {
        assert_eq!(output_names.len(), self.0.len());
        self.0
            .iter()
            .map(|g| {
                let samples = window.samples().iter().map(|s| s * g).collect();
                AudioBuffer::new(samples, window.sample_rate(), window.channels())
            })
            .collect()
    }
}

/// Fails on the n-th call.
struct FailAt {
    calls: usize,
    fail_on: usize,
}

impl StemModel for FailAt {
    fn run(&mut self, window: &AudioBuffer, output_names: &[String]) -> Result<Vec<AudioBuffer>> {
        self.calls += 1;
        if self.calls == self.fail_on {
            return Err(StemError::RuntimeFailure("session aborted".into()));
        }
        IdentityModel.run(window, output_names)
    }
}

/// Drops the last frame of every output.
struct Truncating;

impl StemModel for Truncating {
    fn run(&mut self, window: &AudioBuffer, output_names: &[String]) -> Result<Vec<AudioBuffer>> {
        let short = window.window(0, window.frames() - 1)?;
        Ok(output_names.iter().map(|_| short.clone()).collect())
    }
}

fn recording_reporter() -> (ProgressReporter, Arc<Mutex<Vec<ProgressEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let reporter = ProgressReporter::new(move |e| sink.lock().unwrap().push(*e));
    (reporter, events)
}

#[test]
fn identity_model_reconstructs_input() {
    for total in [1, 199, 999, 1000, 1001, 1399, 1400, 2300, 3500, 7777] {
        let input = ramp(total);
        let stems = splitter()
            .run(&info(), input.clone(), &mut IdentityModel, &mut ProgressReporter::silent())
            .unwrap();

        assert_eq!(stems.len(), 2);
        let (original, parts) = stems.into_parts();
        assert_eq!(original, input);
        for (name, buf) in &parts {
            assert_eq!(buf, &input, "stem `{name}` differs at total={total}");
        }
    }
}

#[test]
fn splitter_exposes_its_windowing() {
    assert_eq!(
        splitter().segment_config(),
        &SegmentConfig::new(1000, 200, 400)
    );
    let for_model = Splitter::for_model(&info());
    assert_eq!(
        for_model.segment_config(),
        &SegmentConfig::for_sample_rate(RATE)
    );
    assert_eq!(for_model.segment_config().slice_length, 30 * RATE as usize);
}

#[test]
fn stems_follow_declared_order() {
    let stems = splitter()
        .run(
            &info(),
            ramp(2500),
            &mut Gain(vec![0.5, -1.0]),
            &mut ProgressReporter::silent(),
        )
        .unwrap();

    assert_eq!(
        stems.names().collect::<Vec<_>>(),
        vec!["vocals", "accompaniment"]
    );
    let input = stems.input().samples();
    let vocals = stems.get("vocals").unwrap().samples();
    let acc = stems.get("accompaniment").unwrap().samples();
    for i in [0, 1, 1999, 2000, 4999] {
        assert_eq!(vocals[i], input[i] * 0.5);
        assert_eq!(acc[i], -input[i]);
    }
}

#[test]
fn model_failure_aborts_the_split() {
    let mut model = FailAt {
        calls: 0,
        fail_on: 2,
    };
    let err = splitter()
        .run(&info(), ramp(3500), &mut model, &mut ProgressReporter::silent())
        .unwrap_err();
    assert!(matches!(err, StemError::RuntimeFailure(_)));
    assert_eq!(model.calls, 2);
}

#[test]
fn wrong_output_length_is_a_runtime_failure() {
    let err = splitter()
        .run(&info(), ramp(1500), &mut Truncating, &mut ProgressReporter::silent())
        .unwrap_err();
    assert!(matches!(err, StemError::RuntimeFailure(_)));
}

#[test]
fn input_must_match_model_layout() {
    let mono = AudioBuffer::new(vec![0.0; 500], RATE, 1).unwrap();
    let err = splitter()
        .run(&info(), mono, &mut IdentityModel, &mut ProgressReporter::silent())
        .unwrap_err();
    assert!(matches!(err, StemError::InvalidInput(_)));

    let wrong_rate = AudioBuffer::new(vec![0.0; 500], 22050, 2).unwrap();
    let err = splitter()
        .run(&info(), wrong_rate, &mut IdentityModel, &mut ProgressReporter::silent())
        .unwrap_err();
    assert!(matches!(err, StemError::InvalidInput(_)));

    let empty = AudioBuffer::silent(0, 2, RATE);
    let err = splitter()
        .run(&info(), empty, &mut IdentityModel, &mut ProgressReporter::silent())
        .unwrap_err();
    assert!(matches!(err, StemError::InvalidInput(_)));
}

#[test]
fn segment_progress_is_monotonic_and_completes() {
    let (mut reporter, events) = recording_reporter();
    splitter()
        .run(&info(), ramp(9000), &mut IdentityModel, &mut reporter)
        .unwrap();

    let events = events.lock().unwrap();
    let segments: Vec<_> = events
        .iter()
        .filter(|e| e.stage == Stage::ProcessSegment)
        .collect();
    assert!(segments.len() >= 2);
    assert_eq!(segments[0].done, 0);
    assert!(segments.windows(2).all(|w| w[0].percent <= w[1].percent));

    let last = segments.last().unwrap();
    assert_eq!(last.done, last.total);
    assert_eq!(last.total, 9000);
}

#[test]
fn unknown_model_is_rejected_before_loading() {
    let input = AudioBuffer::silent(100, 2, 44100);
    let loader = |_: &ModelInfo| -> Result<IdentityModel> {
        panic!("loader must not be called for an unknown model")
    };
    let err = split("7stems", input, &loader, &mut ProgressReporter::silent()).unwrap_err();
    assert!(matches!(err, StemError::UnknownModel(_)));
}

#[test]
fn split_loads_registry_model() {
    let input = AudioBuffer::new(vec![0.25; 2 * 44100], 44100, 2).unwrap();
    let (mut reporter, events) = recording_reporter();
    let stems = split("4stems", input.clone(), &identity, &mut reporter).unwrap();

    assert_eq!(
        stems.names().collect::<Vec<_>>(),
        vec!["vocals", "drums", "bass", "other"]
    );
    assert_eq!(stems.input(), &input);
    assert_eq!(stems.get("bass"), Some(&input));

    let events = events.lock().unwrap();
    assert!(events
        .iter()
        .any(|e| e.stage == Stage::LoadModel && e.done == 1));
}

#[test]
fn rate_mismatch_skips_model_load() {
    let input = AudioBuffer::silent(100, 2, 16000);
    let loader = |_: &ModelInfo| -> Result<IdentityModel> {
        panic!("loader must not be called for mismatched input")
    };
    let err = split("2stems", input, &loader, &mut ProgressReporter::silent()).unwrap_err();
    assert!(matches!(err, StemError::InvalidInput(_)));
}
