//! Text extraction & unitization
//!
//! Walks a parsed document in pre-order and yields the ordered sequence of
//! alignable units (paragraph- and heading-class elements by default). Each
//! unit carries its tree address and a normalized text form for the aligner:
//! runs of whitespace collapse to single spaces and the result is trimmed.
//! The normalized form is never written back; instead every normalized byte
//! is back-mapped to the child node and raw byte range it came from, so
//! sentence spans can later be re-extracted from the live tree exactly.
//!
//! Granularity of the back-mapping is the unit's direct child list. A direct
//! text child is splittable at any character; anything else (inline
//! elements, page breaks, notes, CDATA) is atomic: it contributes its
//! flattened text to the unit but can only move into a wrapper whole.
//! Text inside a nested alignable element belongs to the inner unit only —
//! with one identifier per participant, letting a byte belong to two units
//! would annotate it twice.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

use crate::tei::xml::tree::cdata_inner;
use crate::tei::xml::{Document, Element, Node};

static WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize(text: &str) -> String {
    WS.replace_all(text, " ").trim().to_string()
}

/// Which element classes are eligible for alignment.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub alignable: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            alignable: vec!["p".to_string(), "head".to_string()],
        }
    }
}

impl ExtractConfig {
    pub fn is_alignable(&self, name: &str) -> bool {
        self.alignable.iter().any(|a| a == name)
    }
}

/// One alignable block, immutable once derived.
#[derive(Debug, Clone)]
pub struct AlignableUnit {
    /// Path of child indices from the document's top-level node stream.
    pub address: Vec<usize>,
    /// Element local name (`p`, `head`, ...).
    pub name: String,
    normalized: String,
    pieces: Vec<Piece>,
}

#[derive(Debug, Clone)]
struct Piece {
    child: usize,
    kind: PieceKind,
    norm: Range<usize>,
    /// Per-character map, splittable text pieces only.
    chars: Vec<CharMap>,
}

#[derive(Debug, Clone, PartialEq)]
enum PieceKind {
    Text,
    Atomic,
}

#[derive(Debug, Clone)]
struct CharMap {
    norm: usize,
    raw: usize,
    raw_len: usize,
}

/// Where a normalized-text span lives inside a unit's child list.
#[derive(Debug, Clone, PartialEq)]
pub struct Extent {
    pub start_child: usize,
    /// Byte offset into the start child's raw text (0 when atomic).
    pub start_offset: usize,
    pub end_child: usize,
    /// Exclusive byte offset into the end child's raw text; `None` takes the
    /// whole end child.
    pub end_offset: Option<usize>,
}

impl Extent {
    /// Strictly-before check used to verify that wrapper plans are disjoint.
    pub fn ends_before(&self, other: &Extent) -> bool {
        if self.end_child < other.start_child {
            return true;
        }
        if self.end_child > other.start_child {
            return false;
        }
        match self.end_offset {
            Some(end) => end <= other.start_offset,
            None => false,
        }
    }
}

impl AlignableUnit {
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Map a span of the normalized text back to a contiguous range of the
    /// unit's children. Returns `None` when the span matches no text or when
    /// an atomic child's text straddles the span boundary, in which case the
    /// caller must fall back to whole-unit granularity.
    pub fn span_extent(&self, span: &Range<usize>) -> Option<Extent> {
        let mut start: Option<(usize, usize)> = None;
        let mut end: Option<(usize, Option<usize>)> = None;
        for piece in &self.pieces {
            match piece.kind {
                PieceKind::Text => {
                    for cm in &piece.chars {
                        if cm.norm >= span.start && cm.norm < span.end {
                            if start.is_none() {
                                start = Some((piece.child, cm.raw));
                            }
                            end = Some((piece.child, Some(cm.raw + cm.raw_len)));
                        }
                    }
                }
                PieceKind::Atomic => {
                    if piece.norm.start >= piece.norm.end {
                        continue;
                    }
                    let overlaps = piece.norm.start < span.end && piece.norm.end > span.start;
                    if !overlaps {
                        continue;
                    }
                    let inside = piece.norm.start >= span.start && piece.norm.end <= span.end;
                    if !inside {
                        return None;
                    }
                    if start.is_none() {
                        start = Some((piece.child, 0));
                    }
                    end = Some((piece.child, None));
                }
            }
        }
        let (start_child, start_offset) = start?;
        let (end_child, end_offset) = end?;
        Some(Extent {
            start_child,
            start_offset,
            end_child,
            end_offset,
        })
    }
}

/// Extract the document-order sequence of alignable units. Units with no
/// non-whitespace text are skipped; they keep no identifier and are emitted
/// unchanged by every later step.
pub fn extract_units(doc: &Document, config: &ExtractConfig) -> Vec<AlignableUnit> {
    let mut units = Vec::new();
    let mut address = Vec::new();
    walk_nodes(&doc.nodes, config, &mut address, &mut units);
    units
}

fn walk_nodes(
    nodes: &[Node],
    config: &ExtractConfig,
    address: &mut Vec<usize>,
    units: &mut Vec<AlignableUnit>,
) {
    for (i, node) in nodes.iter().enumerate() {
        if let Node::Element(el) = node {
            address.push(i);
            if config.is_alignable(&el.name) {
                if let Some(unit) = build_unit(el, address.clone(), config) {
                    units.push(unit);
                }
            }
            walk_nodes(&el.children, config, address, units);
            address.pop();
        }
    }
}

fn build_unit(
    el: &Element,
    address: Vec<usize>,
    config: &ExtractConfig,
) -> Option<AlignableUnit> {
    let mut builder = UnitBuilder::new();
    for (i, child) in el.children.iter().enumerate() {
        match child {
            Node::Text(raw) => builder.push_text_child(i, raw),
            Node::CData(raw) => builder.push_atomic_child(i, cdata_inner(raw)),
            Node::Element(sub) => {
                if config.is_alignable(&sub.name) {
                    // Own unit; acts as a word gap here.
                    builder.mark_gap();
                    builder.push_atomic_child(i, "");
                } else {
                    builder.push_atomic_child(i, &flatten_text(sub, config));
                }
            }
            Node::Comment(_)
            | Node::ProcessingInstruction(_)
            | Node::Doctype(_)
            | Node::Decl(_) => builder.push_atomic_child(i, ""),
        }
    }
    let (normalized, pieces) = builder.finish();
    if normalized.is_empty() {
        return None;
    }
    Some(AlignableUnit {
        address,
        name: el.name.clone(),
        normalized,
        pieces,
    })
}

/// Descendant text of a non-alignable element, nested alignable subtrees
/// excluded (they are their own units).
fn flatten_text(el: &Element, config: &ExtractConfig) -> String {
    let mut out = String::new();
    collect_flat(el, config, &mut out);
    out
}

fn collect_flat(el: &Element, config: &ExtractConfig, out: &mut String) {
    for child in &el.children {
        match child {
            Node::Text(raw) => out.push_str(raw),
            Node::CData(raw) => out.push_str(cdata_inner(raw)),
            Node::Element(sub) => {
                if config.is_alignable(&sub.name) {
                    out.push(' ');
                } else {
                    collect_flat(sub, config, out);
                }
            }
            Node::Comment(_)
            | Node::ProcessingInstruction(_)
            | Node::Doctype(_)
            | Node::Decl(_) => {}
        }
    }
}

struct UnitBuilder {
    normalized: String,
    pieces: Vec<Piece>,
    pending_space: bool,
}

impl UnitBuilder {
    fn new() -> Self {
        Self {
            normalized: String::new(),
            pieces: Vec::new(),
            pending_space: false,
        }
    }

    fn mark_gap(&mut self) {
        self.pending_space = true;
    }

    fn flush_space(&mut self) {
        if self.pending_space && !self.normalized.is_empty() {
            self.normalized.push(' ');
        }
        self.pending_space = false;
    }

    fn push_text_child(&mut self, child: usize, raw: &str) {
        let mut chars = Vec::new();
        let mut norm_start = None;
        for (off, c) in raw.char_indices() {
            if c.is_whitespace() {
                self.pending_space = true;
                continue;
            }
            self.flush_space();
            if norm_start.is_none() {
                norm_start = Some(self.normalized.len());
            }
            chars.push(CharMap {
                norm: self.normalized.len(),
                raw: off,
                raw_len: c.len_utf8(),
            });
            self.normalized.push(c);
        }
        let norm = match norm_start {
            Some(s) => s..self.normalized.len(),
            None => self.normalized.len()..self.normalized.len(),
        };
        self.pieces.push(Piece {
            child,
            kind: PieceKind::Text,
            norm,
            chars,
        });
    }

    fn push_atomic_child(&mut self, child: usize, text: &str) {
        let mut norm_start = None;
        for c in text.chars() {
            if c.is_whitespace() {
                self.pending_space = true;
                continue;
            }
            self.flush_space();
            if norm_start.is_none() {
                norm_start = Some(self.normalized.len());
            }
            self.normalized.push(c);
        }
        let norm = match norm_start {
            Some(s) => s..self.normalized.len(),
            None => self.normalized.len()..self.normalized.len(),
        };
        self.pieces.push(Piece {
            child,
            kind: PieceKind::Atomic,
            norm,
            chars: Vec::new(),
        });
    }

    fn finish(self) -> (String, Vec<Piece>) {
        (self.normalized, self.pieces)
    }
}

/// First `language` element with a non-empty `ident` attribute, the way the
/// TEI header declares it under `profileDesc/langUsage`.
pub fn document_language(doc: &Document) -> Option<String> {
    find_language(&doc.nodes)
}

fn find_language(nodes: &[Node]) -> Option<String> {
    for node in nodes {
        if let Node::Element(el) = node {
            if el.name == "language" {
                if let Some(ident) = el.attr("ident") {
                    if !ident.is_empty() {
                        return Some(ident);
                    }
                }
            }
            if let Some(found) = find_language(&el.children) {
                return Some(found);
            }
        }
    }
    None
}

/// First non-empty `title` text, used for request summaries.
pub fn document_title(doc: &Document) -> Option<String> {
    find_title(&doc.nodes)
}

fn find_title(nodes: &[Node]) -> Option<String> {
    for node in nodes {
        if let Node::Element(el) = node {
            if el.name == "title" {
                let title = normalize(&el.text_content());
                if !title.is_empty() {
                    return Some(title);
                }
            }
            if let Some(found) = find_title(&el.children) {
                return Some(found);
            }
        }
    }
    None
}
