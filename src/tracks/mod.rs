//! Track list expressions such as `vocals,mix=vocals+drums,acc=input-vocals`.
//!
//! A list item is either a plain stem name, which selects that stem, or
//! `name=expr`, which writes a new track computed as the signed sum of the
//! named sources. The reserved name `input` refers to the original audio.

mod algebra;
mod parser;

pub use algebra::{evaluate, evaluate_one, validate};
pub use parser::parse_track_list;

/// Maximum number of items in one track list.
pub const MAX_TRACK_ITEMS: usize = 10;
/// Maximum number of sources in one expression.
pub const MAX_SOURCE_TRACKS: usize = 10;
/// Maximum track name length, in characters.
pub const MAX_TRACK_NAME_LEN: usize = 99;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedSource {
    pub name: String,
    /// Subtract (phase-invert) this source instead of adding it.
    pub subtract: bool,
}

impl SignedSource {
    pub fn add(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subtract: false,
        }
    }

    pub fn sub(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subtract: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackExpression {
    pub output_name: String,
    /// Empty means "pass `output_name` through unchanged".
    pub sources: Vec<SignedSource>,
}

impl TrackExpression {
    pub fn passthrough(name: impl Into<String>) -> Self {
        Self {
            output_name: name.into(),
            sources: Vec::new(),
        }
    }

    pub fn is_passthrough(&self) -> bool {
        self.sources.is_empty()
    }

    /// Names this expression reads from.
    pub fn referenced_names(&self) -> impl Iterator<Item = &str> {
        let own = self.is_passthrough().then_some(self.output_name.as_str());
        own.into_iter()
            .chain(self.sources.iter().map(|s| s.name.as_str()))
    }
}
