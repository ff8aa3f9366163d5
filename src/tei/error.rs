//! Error types for the alignment pipeline
//!
//! The pipeline is all-or-nothing per request: every variant here aborts the
//! whole request and no partial corpus is ever emitted. The one non-fatal
//! condition (a sentence-level re-alignment that produces nothing promotable)
//! is not an error at all; the adapter falls back to whole-unit granularity
//! and logs it.

use std::fmt;

/// Input is not well-formed markup.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    /// Byte offset into the input where the reader gave up.
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at byte {}: {}", self.position, self.message)
    }
}

impl std::error::Error for ParseError {}

/// External aligner failure (model error, degenerate empty input).
#[derive(Debug, Clone, PartialEq)]
pub struct AlignError {
    pub message: String,
}

impl AlignError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for AlignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "alignment failed: {}", self.message)
    }
}

impl std::error::Error for AlignError {}

/// Errors surfaced by the request-level `annotate` entry point.
#[derive(Debug, Clone, PartialEq)]
pub enum AlignmentPipelineError {
    /// One of the two input documents failed to parse.
    Parse(ParseError),
    /// The external aligner failed on non-empty input.
    Alignment(AlignError),
    /// A document contains no alignable text at all.
    EmptyDocument(&'static str),
    /// Two participants were minted the same identifier. Structurally
    /// unreachable with the UUID minter; treated as an invariant violation.
    IdentifierCollision(String),
    /// The tree mutator was handed a plan it cannot apply without breaking
    /// the byte-preservation invariant. Also an invariant violation: the
    /// adapter verifies span separability before promotion.
    Mutate(String),
}

impl fmt::Display for AlignmentPipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignmentPipelineError::Parse(e) => write!(f, "{}", e),
            AlignmentPipelineError::Alignment(e) => write!(f, "{}", e),
            AlignmentPipelineError::EmptyDocument(side) => {
                write!(f, "{} document contains no alignable text", side)
            }
            AlignmentPipelineError::IdentifierCollision(id) => {
                write!(f, "identifier collision: '{}' minted twice", id)
            }
            AlignmentPipelineError::Mutate(msg) => write!(f, "annotation failed: {}", msg),
        }
    }
}

impl std::error::Error for AlignmentPipelineError {}

impl From<ParseError> for AlignmentPipelineError {
    fn from(e: ParseError) -> Self {
        AlignmentPipelineError::Parse(e)
    }
}

impl From<AlignError> for AlignmentPipelineError {
    fn from(e: AlignError) -> Self {
        AlignmentPipelineError::Alignment(e)
    }
}
