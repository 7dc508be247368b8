//! Output file naming, overwrite checks and bit-rate parsing.

use std::path::{Path, PathBuf};

use crate::error::{Result, StemError};

pub const DEFAULT_BIT_RATE: u32 = 256_000;

/// Extension of the files [`crate::write_audio`] produces.
pub const OUTPUT_EXTENSION: &str = "wav";

/// Inserts `.extra` before the extension: `dir/song.mp3` + `vocals` ->
/// `dir/song.vocals.mp3`.
pub fn add_extra_extension(path: &Path, extra: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}.{extra}.{}", ext.to_string_lossy()),
        None => format!("{stem}.{extra}"),
    };
    path.with_file_name(name)
}

/// Path of the file for `track`, next to `base`, always with the WAV extension.
pub fn output_path(base: &Path, track: &str) -> PathBuf {
    add_extra_extension(&base.with_extension(OUTPUT_EXTENSION), track)
}

/// Fails if `path` exists and `overwrite` is off, or exists read-only.
pub fn check_output_path(path: &Path, overwrite: bool) -> Result<()> {
    let Ok(meta) = path.metadata() else {
        return Ok(());
    };
    if !overwrite {
        return Err(StemError::OutputExists {
            path: path.display().to_string(),
        });
    }
    if meta.permissions().readonly() {
        return Err(StemError::InvalidInput(format!(
            "output file {} cannot be written",
            path.display()
        )));
    }
    Ok(())
}

/// Parses `256k`, `128K` or `192000`.
pub fn parse_bit_rate(text: &str) -> Result<u32> {
    let text = text.trim();
    let (digits, multiplier) = match text.strip_suffix(|c: char| c == 'k' || c == 'K') {
        Some(d) => (d, 1000),
        None => (text, 1),
    };
    digits
        .parse::<u32>()
        .ok()
        .filter(|v| *v > 0)
        .and_then(|v| v.checked_mul(multiplier))
        .ok_or_else(|| StemError::InvalidInput(format!("cannot parse bit rate `{text}`")))
}
