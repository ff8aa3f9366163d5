//! # teialign
//!
//! Structure-preserving alignment annotator for TEI documents.
//!
//! Two independently-authored documents plus cross-document text
//! correspondences go in; one combined corpus comes out, with every byte of
//! each original's structure preserved and minimal annotations marking
//! which spans correspond. The modules mirror the pipeline, leaves first:
//!
//! - [`xml`] — verbatim-preserving document tree
//! - [`extract`] — alignable units with tree addresses and normalized text
//! - [`segment`] — sentence splitter boundary
//! - [`align`] — aligner boundary, adapter, granularity decisions
//! - [`group`] — alignment groups and identifier minting
//! - [`annotate`] — the tree mutator
//! - [`compose`] — final corpus assembly
//! - [`pipeline`] — request orchestration and the service facade

pub mod align;
pub mod annotate;
pub mod compose;
pub mod error;
pub mod extract;
pub mod group;
pub mod model;
pub mod pipeline;
pub mod segment;
pub mod xml;

pub use error::{AlignError, AlignmentPipelineError, ParseError};
pub use pipeline::{annotate as annotate_documents, AlignmentService, AnnotateRequest, ComposedOutput};
