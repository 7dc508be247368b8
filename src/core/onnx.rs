//! ONNX Runtime backed [`StemModel`].

use crate::{
    core::engine::{ModelLoader, StemModel},
    error::{Result, StemError},
    model::{paths::locate_model_file, registry::ModelInfo},
    types::AudioBuffer,
};

use ort::{
    session::{
        builder::{GraphOptimizationLevel, SessionBuilder},
        Session,
    },
    value::{DynValue, Tensor, Value},
};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use tracing::info;

/// Loads `<models_dir>/<model>/model.onnx` (or its variant file).
pub struct OnnxLoader {
    models_dir: PathBuf,
    requested: String,
}

impl OnnxLoader {
    /// `requested` is the model name as the user wrote it, variant included.
    pub fn new(models_dir: impl Into<PathBuf>, requested: impl Into<String>) -> Self {
        Self {
            models_dir: models_dir.into(),
            requested: requested.into(),
        }
    }
}

impl ModelLoader for OnnxLoader {
    type Model = OnnxModel;

    fn load(&self, info: &ModelInfo) -> Result<OnnxModel> {
        let path = locate_model_file(&self.models_dir, &self.requested, info)?;
        OnnxModel::from_file(&path, info)
    }
}

pub struct OnnxModel {
    session: Session,
    input_tensor: String,
}

impl OnnxModel {
    pub fn from_file(path: &Path, info: &ModelInfo) -> Result<Self> {
        info!("Loading model `{}` from {}", info.name, path.display());
        let session = SessionBuilder::new()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(path)?;

        if !session.inputs.iter().any(|i| i.name == info.input_tensor) {
            return Err(StemError::RuntimeFailure(format!(
                "model missing input `{}`",
                info.input_tensor
            )));
        }

        Ok(Self {
            session,
            input_tensor: info.input_tensor.clone(),
        })
    }
}

impl StemModel for OnnxModel {
    fn run(&mut self, window: &AudioBuffer, output_names: &[String]) -> Result<Vec<AudioBuffer>> {
        let frames = window.frames();
        let channels = window.channels() as usize;

        // [T, C] interleaved, same layout as the buffer
        let input: Value = Tensor::from_array((vec![frames, channels], window.samples().to_vec()))?
            .into_dyn();

        let outputs = self
            .session
            .run(vec![(self.input_tensor.clone(), input)])?;
        let mut by_name: HashMap<String, DynValue> = outputs
            .into_iter()
            .map(|(name, v)| (name.to_string(), v))
            .collect();

        output_names
            .iter()
            .map(|name| {
                let value = by_name.remove(name).ok_or_else(|| {
                    StemError::RuntimeFailure(format!("model did not return `{name}`"))
                })?;
                let (_shape, data) = value.try_extract_tensor::<f32>()?;
                if data.len() != frames * channels {
                    return Err(StemError::RuntimeFailure(format!(
                        "output `{}` has {} samples, expected {}",
                        name,
                        data.len(),
                        frames * channels
                    )));
                }
                AudioBuffer::new(data.to_vec(), window.sample_rate(), window.channels())
            })
            .collect()
    }
}
