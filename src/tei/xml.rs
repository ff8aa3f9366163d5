//! Raw-preserving XML document model
//!
//! The whole design of this module serves one invariant: any subtree the
//! annotator does not touch must serialize back byte-for-byte identical to
//! its input form, attribute order, whitespace, comments and processing
//! instructions included.
//!
//! To get that, nodes do not store a parsed view of the markup. Every node
//! keeps the verbatim input slice it was read from: an element keeps its
//! exact start tag and end tag text, text/comment/PI nodes keep their raw
//! bytes. Serialization is plain concatenation, so identity is structural
//! rather than something a writer has to reconstruct. Attribute values are
//! parsed lazily and only when a caller asks.

pub mod parser;
pub mod tree;

pub use parser::parse;
pub use tree::{Document, Element, Node};
