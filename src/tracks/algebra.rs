use std::borrow::Cow;

use super::TrackExpression;
use crate::{
    error::{Result, StemError},
    types::{AudioBuffer, StemSet, INPUT_TRACK_NAME},
};

/// Checks every referenced name against `known` (plus `input`) up front, so a
/// bad track list fails before any inference work starts.
pub fn validate<S: AsRef<str>>(expressions: &[TrackExpression], known: &[S]) -> Result<()> {
    for expr in expressions {
        for name in expr.referenced_names() {
            let found =
                name == INPUT_TRACK_NAME || known.iter().any(|k| k.as_ref() == name);
            if !found {
                return Err(StemError::UnknownTrack(name.to_string()));
            }
        }
    }
    Ok(())
}

/// Computes one output track.
///
/// Pass-through items borrow the existing buffer; expressions allocate a new
/// buffer and never touch the stems they read.
pub fn evaluate_one<'a>(expr: &TrackExpression, stems: &'a StemSet) -> Result<Cow<'a, AudioBuffer>> {
    if expr.is_passthrough() {
        return stems
            .get(&expr.output_name)
            .map(Cow::Borrowed)
            .ok_or_else(|| StemError::UnknownTrack(expr.output_name.clone()));
    }

    // Resolve and shape-check everything before allocating.
    let resolved = expr
        .sources
        .iter()
        .map(|src| {
            stems
                .get(&src.name)
                .map(|buf| (src, buf))
                .ok_or_else(|| StemError::UnknownTrack(src.name.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    let (_, first) = resolved[0];
    if let Some((src, _)) = resolved.iter().find(|(_, buf)| !buf.same_shape(first)) {
        return Err(StemError::ShapeMismatch {
            track: expr.output_name.clone(),
            offending: src.name.clone(),
        });
    }

    let mut acc = first.silent_like();
    for (src, buf) in &resolved {
        let out = acc.samples_mut();
        if src.subtract {
            out.iter_mut().zip(buf.samples()).for_each(|(a, s)| *a -= s);
        } else {
            out.iter_mut().zip(buf.samples()).for_each(|(a, s)| *a += s);
        }
    }

    Ok(Cow::Owned(acc))
}

/// Evaluates every expression, in the order written.
pub fn evaluate<'a>(
    expressions: &[TrackExpression],
    stems: &'a StemSet,
) -> Result<Vec<(String, Cow<'a, AudioBuffer>)>> {
    expressions
        .iter()
        .map(|expr| Ok((expr.output_name.clone(), evaluate_one(expr, stems)?)))
        .collect()
}
