//! # teialign
//!
//! A structure-preserving alignment annotator for TEI documents.
//!
//! The byte-preservation invariant drives the whole design: any subtree the
//! annotator does not touch serializes back identical to its input, and
//! stripping the inserted identifiers and wrappers from an annotated
//! document reproduces the original exactly. See the [`tei`] module for the
//! pipeline layout.

pub mod tei;

pub use tei::pipeline::{AlignmentService, AnnotateRequest, ComposedOutput};
