//! Event-driven parser producing the verbatim tree
//!
//! quick-xml does the tokenization; we never use its event payloads for
//! content. Instead the reader's byte position before and after each event
//! delimits the event's verbatim input slice, and that slice is what the
//! tree stores. Every byte of the input lands in exactly one node, which is
//! what makes `Document::to_xml` an exact inverse of `parse`.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::tei::error::ParseError;
use crate::tei::xml::tree::{Document, Element, Node};

pub fn parse(input: &str) -> Result<Document, ParseError> {
    let mut reader = Reader::from_str(input);
    {
        let config = reader.config_mut();
        config.trim_text_start = false;
        config.trim_text_end = false;
        config.check_end_names = true;
    }

    let mut nodes: Vec<Node> = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut prev = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| {
            ParseError::new(e.to_string(), reader.buffer_position() as usize)
        })?;
        let pos = reader.buffer_position() as usize;
        let raw = input[prev..pos].to_string();
        prev = pos;

        match event {
            Event::Start(ref start) => {
                let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                stack.push(Element {
                    name,
                    raw_start: raw,
                    raw_end: None,
                    children: Vec::new(),
                });
            }
            Event::End(_) => {
                let mut element = stack
                    .pop()
                    .ok_or_else(|| ParseError::new("unexpected closing tag", pos))?;
                element.raw_end = Some(raw);
                push_node(&mut nodes, &mut stack, Node::Element(element));
            }
            Event::Empty(ref start) => {
                let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                push_node(
                    &mut nodes,
                    &mut stack,
                    Node::Element(Element {
                        name,
                        raw_start: raw,
                        raw_end: None,
                        children: Vec::new(),
                    }),
                );
            }
            Event::Text(_) => {
                if !raw.is_empty() {
                    push_node(&mut nodes, &mut stack, Node::Text(raw));
                }
            }
            Event::CData(_) => push_node(&mut nodes, &mut stack, Node::CData(raw)),
            Event::Comment(_) => push_node(&mut nodes, &mut stack, Node::Comment(raw)),
            Event::PI(_) => {
                push_node(&mut nodes, &mut stack, Node::ProcessingInstruction(raw))
            }
            Event::Decl(_) => push_node(&mut nodes, &mut stack, Node::Decl(raw)),
            Event::DocType(_) => push_node(&mut nodes, &mut stack, Node::Doctype(raw)),
            Event::Eof => break,
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::new(
            format!("unclosed element '{}'", open.name),
            prev,
        ));
    }

    Ok(Document { nodes })
}

fn push_node(nodes: &mut Vec<Node>, stack: &mut Vec<Element>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => nodes.push(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(input: &str) {
        let doc = parse(input).expect("parse failed");
        assert_eq!(doc.to_xml(), input);
    }

    #[test]
    fn roundtrip_preserves_every_byte() {
        roundtrip(concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<!DOCTYPE TEI>\n",
            "<!-- leading   comment -->\n",
            "<TEI xmlns=\"http://www.tei-c.org/ns/1.0\">\n",
            "  <teiHeader attr2=\"b\"  attr1='a'>\n",
            "    <title>Caf\u{e9} &amp; more</title>\n",
            "  </teiHeader>\n",
            "  <text><body>\n",
            "    <p n=\"1\">Some   spaced\ttext<pb n=\"2\"/>tail</p>\n",
            "    <p><![CDATA[raw <stuff>]]></p>\n",
            "    <?pagebreak here?>\n",
            "  </body></text>\n",
            "</TEI>\n",
        ));
    }

    #[test]
    fn roundtrip_keeps_attribute_order_and_quoting() {
        roundtrip(r#"<root z="1" a='2' m = "3"><leaf/></root>"#);
    }

    #[test]
    fn nested_elements_land_in_document_order() {
        let doc = parse("<a><b>x</b><c/><b>y</b></a>").expect("parse failed");
        let root = doc.root().expect("no root");
        assert_eq!(root.name, "a");
        let names: Vec<&str> = root
            .children
            .iter()
            .map(|n| match n {
                Node::Element(el) => el.name.as_str(),
                _ => "?",
            })
            .collect();
        assert_eq!(names, vec!["b", "c", "b"]);
    }

    #[test]
    fn namespaced_names_are_matched_by_local_name() {
        let doc = parse("<tei:p xmlns:tei=\"x\">t</tei:p>").expect("parse failed");
        assert_eq!(doc.root().expect("no root").name, "p");
        assert_eq!(
            doc.root().expect("no root").raw_start,
            "<tei:p xmlns:tei=\"x\">"
        );
    }

    #[test]
    fn malformed_markup_is_a_parse_error() {
        assert!(parse("<a><b></a>").is_err());
    }

    #[test]
    fn element_at_follows_child_indices() {
        let doc = parse("<a>t<b><c/></b></a>").expect("parse failed");
        let c = doc.element_at(&[0, 1, 0]).expect("address miss");
        assert_eq!(c.name, "c");
        assert!(doc.element_at(&[0, 0]).is_none());
    }
}
