use crate::{
    error::{Result, StemError},
    model::registry::ModelInfo,
};
use directories::ProjectDirs;
use std::{
    env,
    path::{Path, PathBuf},
};

pub const MODELS_DIR_ENV: &str = "STEM_SPLITTER_MODELS_DIR";

const MODEL_FILE: &str = "model.onnx";

/// Directory holding one sub-directory per model.
///
/// Order: explicit override, `STEM_SPLITTER_MODELS_DIR`, platform data dir.
pub fn models_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        return Ok(dir.to_path_buf());
    }
    if let Ok(dir) = env::var(MODELS_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    let proj = ProjectDirs::from("dev", "StemSplitter", "stem-splitter-engine")
        .ok_or(StemError::ModelsDirUnavailable)?;
    let mut p = PathBuf::from(proj.data_dir());
    p.push("models");
    Ok(p)
}

/// Finds the model file for `requested` (e.g. `5stems-16khz`).
///
/// `<models>/<requested>/model.onnx` wins; otherwise a variant is looked up
/// as `<models>/<name>/model-<variant>.onnx`.
pub fn locate_model_file(models_dir: &Path, requested: &str, info: &ModelInfo) -> Result<PathBuf> {
    let direct = models_dir.join(requested).join(MODEL_FILE);
    if direct.is_file() {
        return Ok(direct);
    }

    let fallback = match &info.variant {
        Some(variant) => models_dir
            .join(&info.name)
            .join(format!("model-{variant}.onnx")),
        None => models_dir.join(&info.name).join(MODEL_FILE),
    };
    if fallback.is_file() {
        return Ok(fallback);
    }

    Err(StemError::UnknownModel(format!(
        "{requested} (no model file at {} or {})",
        direct.display(),
        fallback.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::registry::resolve_model;
    use std::fs;

    #[test]
    fn prefers_dedicated_variant_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("5stems-16khz");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("model.onnx"), b"x").unwrap();

        let info = resolve_model("5stems-16khz").unwrap();
        let found = locate_model_file(tmp.path(), "5stems-16khz", &info).unwrap();
        assert_eq!(found, dir.join("model.onnx"));
    }

    #[test]
    fn falls_back_to_variant_file_in_basic_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("4stems");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("model-22khz.onnx"), b"x").unwrap();

        let info = resolve_model("4stems-22khz").unwrap();
        let found = locate_model_file(tmp.path(), "4stems-22khz", &info).unwrap();
        assert_eq!(found, dir.join("model-22khz.onnx"));
    }

    #[test]
    fn missing_model_file_is_unknown_model() {
        let tmp = tempfile::tempdir().unwrap();
        let info = resolve_model("2stems").unwrap();
        let err = locate_model_file(tmp.path(), "2stems", &info).unwrap_err();
        assert!(matches!(err, StemError::UnknownModel(_)));
    }

    #[test]
    fn override_wins() {
        let dir = models_dir(Some(Path::new("/opt/models"))).unwrap();
        assert_eq!(dir, PathBuf::from("/opt/models"));
    }
}
