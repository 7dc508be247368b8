use crate::error::{Result, StemError};
use once_cell::sync::Lazy;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub stems: Vec<String>,
    pub outputs: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Registry {
    pub default: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub input: String,
    pub models: Vec<RegistryEntry>,
}

/// Everything the splitter needs to know about one model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelInfo {
    /// Registry name, e.g. `4stems`.
    pub name: String,
    /// Suffix after the first `-` of the requested name, e.g. `16khz`.
    pub variant: Option<String>,
    pub sample_rate: u32,
    pub channels: u16,
    pub input_tensor: String,
    /// Stem names in output order.
    pub stems: Vec<String>,
    /// Output tensor names, parallel to `stems`.
    pub outputs: Vec<String>,
}

const REGISTRY_JSON: &str = include_str!("../../models/registry.json");

static REGISTRY: Lazy<std::result::Result<Registry, String>> =
    Lazy::new(|| serde_json::from_str(REGISTRY_JSON).map_err(|e| e.to_string()));

pub fn registry() -> Result<&'static Registry> {
    REGISTRY
        .as_ref()
        .map_err(|e| StemError::Registry(format!("embedded registry is invalid: {e}")))
}

/// Resolves a model name such as `2stems` or `5stems-16khz`.
///
/// An empty name selects the registry default.
pub fn resolve_model(model_name: &str) -> Result<ModelInfo> {
    let reg = registry()?;
    let target = if model_name.is_empty() {
        reg.default.as_str()
    } else {
        model_name
    };

    let (basic, variant) = match target.split_once('-') {
        Some((b, v)) => (b, Some(v.to_string())),
        None => (target, None),
    };

    let entry = reg
        .models
        .iter()
        .find(|m| m.name == basic)
        .ok_or_else(|| StemError::UnknownModel(target.to_string()))?;

    if entry.stems.len() != entry.outputs.len() {
        return Err(StemError::Registry(format!(
            "model `{}` declares {} stems but {} outputs",
            entry.name,
            entry.stems.len(),
            entry.outputs.len()
        )));
    }

    Ok(ModelInfo {
        name: entry.name.clone(),
        variant,
        sample_rate: reg.sample_rate,
        channels: reg.channels,
        input_tensor: reg.input.clone(),
        stems: entry.stems.clone(),
        outputs: entry.outputs.clone(),
    })
}

/// Registry model names, default first.
pub fn model_names() -> Result<Vec<String>> {
    let reg = registry()?;
    let mut names: Vec<String> = reg.models.iter().map(|m| m.name.clone()).collect();
    if let Some(pos) = names.iter().position(|n| *n == reg.default) {
        let default = names.remove(pos);
        names.insert(0, default);
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_variant_suffix() {
        let info = resolve_model("5stems-16khz").unwrap();
        assert_eq!(info.name, "5stems");
        assert_eq!(info.variant.as_deref(), Some("16khz"));
        assert_eq!(info.stems, ["vocals", "drums", "bass", "piano", "other"]);
        assert_eq!(info.outputs[3], "output_piano");
    }

    #[test]
    fn empty_name_uses_default() {
        let info = resolve_model("").unwrap();
        assert_eq!(info.name, "2stems");
        assert_eq!(info.sample_rate, 44100);
        assert_eq!(info.channels, 2);
    }

    #[test]
    fn unknown_model_is_reported() {
        match resolve_model("7stems") {
            Err(StemError::UnknownModel(name)) => assert_eq!(name, "7stems"),
            other => panic!("expected UnknownModel, got {other:?}"),
        }
    }

    #[test]
    fn default_is_listed_first() {
        let names = model_names().unwrap();
        assert_eq!(names[0], "2stems");
        assert_eq!(names.len(), 3);
    }
}
