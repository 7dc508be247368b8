use crate::{
    core::{engine::ModelLoader, splitter::split_with_info},
    error::{Result, StemError},
    io::{
        audio::{read_audio, write_audio},
        output::{check_output_path, output_path, OUTPUT_EXTENSION},
        progress::{ProgressReporter, Stage},
    },
    model::registry::resolve_model,
    tracks::{evaluate, parse_track_list, validate},
    types::{AudioBuffer, SplitOptions},
};

use std::{
    borrow::Cow,
    collections::HashSet,
    path::{Path, PathBuf},
};
use tracing::info;

/// Reads `input_path`, separates it and writes the requested tracks.
///
/// The track list, model name and every output path are checked before the
/// audio is decoded. Returns the written paths in output order.
pub fn split_file<L: ModelLoader>(
    input_path: &Path,
    opts: &SplitOptions,
    loader: &L,
    progress: &mut ProgressReporter,
) -> Result<Vec<PathBuf>> {
    if !input_path.is_file() {
        return Err(StemError::InvalidInput(format!(
            "input file {} does not exist",
            input_path.display()
        )));
    }

    let info = resolve_model(&opts.model_name)?;
    let expressions = parse_track_list(&opts.tracks)?;
    validate(&expressions, &info.stems)?;

    let names: Vec<String> = if expressions.is_empty() {
        info.stems.clone()
    } else {
        expressions.iter().map(|e| e.output_name.clone()).collect()
    };

    let base = opts.output_base.as_deref().unwrap_or(input_path);
    let paths = plan_outputs(base, &names, opts.overwrite)?;
    for p in &paths {
        info!("Output: {}", p.display());
    }

    let input = read_audio(input_path, info.sample_rate, info.channels, progress)?;
    let stems = split_with_info(&info, input, loader, progress)?;

    let tracks: Vec<(String, Cow<'_, AudioBuffer>)> = if expressions.is_empty() {
        stems
            .iter()
            .map(|(name, buf)| (name.to_string(), Cow::Borrowed(buf)))
            .collect()
    } else {
        evaluate(&expressions, &stems)?
    };

    if let Some(ext) = input_path.extension().and_then(|e| e.to_str()) {
        if !ext.eq_ignore_ascii_case(OUTPUT_EXTENSION) {
            info!("No `{}` encoder available, writing {} files", ext, OUTPUT_EXTENSION);
        }
    }
    let total = tracks.len();
    for (i, ((name, buffer), path)) in tracks.iter().zip(&paths).enumerate() {
        // Recheck: the file may have appeared while we were processing.
        check_output_path(path, opts.overwrite)?;
        write_audio(path, buffer, Some(OUTPUT_EXTENSION), opts.bit_rate)?;
        info!("Wrote `{}` to {}", name, path.display());
        progress.update(Stage::WriteOutput, i + 1, total);
    }

    Ok(paths)
}

fn plan_outputs(base: &Path, names: &[String], overwrite: bool) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|name| {
            if !seen.insert(name.as_str()) {
                return Err(StemError::InvalidInput(format!(
                    "track `{name}` is requested more than once"
                )));
            }
            let path = output_path(base, name);
            check_output_path(&path, overwrite)?;
            Ok(path)
        })
        .collect()
}
