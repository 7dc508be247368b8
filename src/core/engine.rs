//! Boundary to the inference runtime.

use crate::{error::Result, model::registry::ModelInfo, types::AudioBuffer};

/// A loaded separation model.
///
/// `run` receives one window of interleaved audio and the model's declared
/// output names, and returns one buffer per output in the same order. Every
/// output must have the window's frame and channel count.
pub trait StemModel {
    fn run(&mut self, window: &AudioBuffer, output_names: &[String]) -> Result<Vec<AudioBuffer>>;
}

impl<M: StemModel + ?Sized> StemModel for Box<M> {
    fn run(&mut self, window: &AudioBuffer, output_names: &[String]) -> Result<Vec<AudioBuffer>> {
        (**self).run(window, output_names)
    }
}

/// Creates a [`StemModel`] for a registry entry.
pub trait ModelLoader {
    type Model: StemModel;

    fn load(&self, info: &ModelInfo) -> Result<Self::Model>;
}

impl<F, M> ModelLoader for F
where
    F: Fn(&ModelInfo) -> Result<M>,
    M: StemModel,
{
    type Model = M;

    fn load(&self, info: &ModelInfo) -> Result<M> {
        self(info)
    }
}

/// Returns its input unchanged for every output.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityModel;

impl StemModel for IdentityModel {
    fn run(&mut self, window: &AudioBuffer, output_names: &[String]) -> Result<Vec<AudioBuffer>> {
        Ok(output_names.iter().map(|_| window.clone()).collect())
    }
}
