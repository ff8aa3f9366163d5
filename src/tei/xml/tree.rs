//! Tree node types and verbatim serialization

use crate::tei::error::ParseError;

/// A single node in the document tree.
///
/// Non-element variants hold the verbatim input slice including its markup
/// (`<!-- -->`, `<![CDATA[ ]]>`, `<? ?>`). Exhaustive matching everywhere
/// keeps the mutator honest about pass-through content.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    Doctype(String),
    Decl(String),
}

/// An element with its verbatim tag text and ordered children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Local name with any namespace prefix stripped, used for matching.
    pub name: String,
    /// Verbatim start tag, e.g. `<p rend="x">` or `<pb n="3"/>`.
    pub raw_start: String,
    /// Verbatim end tag, e.g. `</p>`. `None` for self-closing elements.
    pub raw_end: Option<String>,
    pub children: Vec<Node>,
}

/// A parsed document: the full top-level node stream, prolog and epilog
/// included. There is no separate root field; the root element is simply the
/// first `Element` node in the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub nodes: Vec<Node>,
}

impl Node {
    fn write_xml(&self, out: &mut String) {
        match self {
            Node::Element(el) => el.write_xml(out),
            Node::Text(raw)
            | Node::CData(raw)
            | Node::Comment(raw)
            | Node::ProcessingInstruction(raw)
            | Node::Doctype(raw)
            | Node::Decl(raw) => out.push_str(raw),
        }
    }
}

impl Element {
    pub fn write_xml(&self, out: &mut String) {
        out.push_str(&self.raw_start);
        for child in &self.children {
            child.write_xml(out);
        }
        if let Some(end) = &self.raw_end {
            out.push_str(end);
        }
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out);
        out
    }

    /// Read an attribute value from the verbatim start tag.
    ///
    /// The name must match exactly as written, prefix included (`xml:id`,
    /// `ident`). Values are returned raw, without entity decoding.
    pub fn attr(&self, name: &str) -> Option<String> {
        let raw = self.raw_start.as_str();
        let bytes = raw.as_bytes();
        // Skip "<name" and walk name="value" / name='value' pairs.
        let mut i = 1;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
            i += 1;
        }
        while i < bytes.len() {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            let key_start = i;
            while i < bytes.len()
                && !bytes[i].is_ascii_whitespace()
                && bytes[i] != b'='
                && bytes[i] != b'>'
                && bytes[i] != b'/'
            {
                i += 1;
            }
            if i == key_start {
                return None;
            }
            let key = &raw[key_start..i];
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() || bytes[i] != b'=' {
                continue;
            }
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() || (bytes[i] != b'"' && bytes[i] != b'\'') {
                return None;
            }
            let quote = bytes[i];
            i += 1;
            let value_start = i;
            while i < bytes.len() && bytes[i] != quote {
                i += 1;
            }
            if i >= bytes.len() {
                return None;
            }
            if key == name {
                return Some(raw[value_start..i].to_string());
            }
            i += 1;
        }
        None
    }

    /// Concatenated text content of this element and all descendants.
    /// CDATA contributes its inner text; comments and PIs contribute nothing.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Element(el) => el.collect_text(out),
                Node::Text(raw) => out.push_str(raw),
                Node::CData(raw) => out.push_str(cdata_inner(raw)),
                Node::Comment(_)
                | Node::ProcessingInstruction(_)
                | Node::Doctype(_)
                | Node::Decl(_) => {}
            }
        }
    }
}

impl Document {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        super::parser::parse(input)
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.write_xml(&mut out);
        }
        out
    }

    /// First element in the top-level stream, i.e. the document root.
    pub fn root(&self) -> Option<&Element> {
        self.nodes.iter().find_map(|n| match n {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Resolve a tree address (path of child indices from the top-level
    /// node stream) to an element.
    pub fn element_at(&self, address: &[usize]) -> Option<&Element> {
        let (&first, rest) = address.split_first()?;
        let mut current = match self.nodes.get(first)? {
            Node::Element(el) => el,
            _ => return None,
        };
        for &idx in rest {
            current = match current.children.get(idx)? {
                Node::Element(el) => el,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn element_at_mut(&mut self, address: &[usize]) -> Option<&mut Element> {
        let (&first, rest) = address.split_first()?;
        let mut current = match self.nodes.get_mut(first)? {
            Node::Element(el) => el,
            _ => return None,
        };
        for &idx in rest {
            current = match current.children.get_mut(idx)? {
                Node::Element(el) => el,
                _ => return None,
            };
        }
        Some(current)
    }
}

/// Inner text of a verbatim `<![CDATA[...]]>` slice.
pub fn cdata_inner(raw: &str) -> &str {
    raw.strip_prefix("<![CDATA[")
        .and_then(|s| s.strip_suffix("]]>"))
        .unwrap_or("")
}
