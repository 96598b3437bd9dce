//! # Filename Parsing
//!
//! The import engine only depends on [`FilenameParser`]; [`SceneParser`] is
//! the regex implementation for scene-style release names.

pub mod heuristic;

use std::path::Path;

use crate::error::Result;
use crate::types::{ParsedCandidate, Series};

pub use heuristic::{SceneParser, SceneRelease};

/// Turns a file path into a structured import candidate.
pub trait FilenameParser: Send + Sync {
    /// Parses `path` as a release of `series`.
    ///
    /// When `scene_source` is set the file lives outside the series root, so
    /// identification must come from the filename alone and folder layout
    /// is ignored. Returns `Ok(None)` when the file cannot be identified.
    fn parse(&self, path: &Path, series: &Series, scene_source: bool)
    -> Result<Option<ParsedCandidate>>;
}
