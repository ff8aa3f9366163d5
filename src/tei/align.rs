//! Alignment boundary
//!
//! The statistical aligner itself lives outside this crate; it arrives
//! through the [`Aligner`] trait and is treated as a black box with one
//! contract: the returned correspondences, taken together, cover every
//! source and target index exactly once. [`adapter`] consumes that output,
//! drops unmatched indices and decides annotation granularity.
//! [`monotone`] is a deterministic built-in backend so the CLI and the test
//! suite run without the external embedding model.

pub mod adapter;
pub mod monotone;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

use crate::tei::error::AlignError;

/// Which document a participant belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Source,
    Target,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => write!(f, "source"),
            Side::Target => write!(f, "target"),
        }
    }
}

/// Whether identifiers attach at whole-unit or sentence-span level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Unit,
    Sentence,
}

/// One cross-document mapping as produced by the external aligner: index
/// sets into the two unit (or sentence) sequences plus a score.
#[derive(Debug, Clone, PartialEq)]
pub struct Correspondence {
    pub source: Vec<usize>,
    pub target: Vec<usize>,
    pub score: f32,
    pub granularity: Granularity,
}

/// One participant of a resolved correspondence: a whole unit, or a span of
/// its normalized text.
#[derive(Debug, Clone, PartialEq)]
pub enum ParticipantSpec {
    Whole { unit: usize },
    Span { unit: usize, span: Range<usize> },
}

impl ParticipantSpec {
    pub fn unit(&self) -> usize {
        match self {
            ParticipantSpec::Whole { unit } => *unit,
            ParticipantSpec::Span { unit, .. } => *unit,
        }
    }
}

/// Aligner tuning knobs, passed through to the backend verbatim.
/// `seg_threshold` is ours: the minimum sub-correspondence score required to
/// promote a whole-unit correspondence to sentence granularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    pub max_align: usize,
    pub top_k: usize,
    pub win: usize,
    pub skip: f32,
    pub margin: bool,
    pub len_penalty: bool,
    pub seg_threshold: f32,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            max_align: 5,
            top_k: 3,
            win: 5,
            skip: -0.1,
            margin: true,
            len_penalty: true,
            seg_threshold: 0.5,
        }
    }
}

/// Boundary to the external alignment backend.
pub trait Aligner: Send + Sync {
    fn align(
        &self,
        source: &[String],
        target: &[String],
        config: &AlignConfig,
    ) -> Result<Vec<Correspondence>, AlignError>;
}

pub use adapter::{resolve, ResolvedCorrespondence};
pub use monotone::MonotoneAligner;
