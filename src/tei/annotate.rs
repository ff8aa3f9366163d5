//! Tree mutator / annotator
//!
//! Applies one alignment side's identifiers to its document with minimal,
//! non-destructive insertions. Per unit there are three states:
//!
//! - NONE: no participant touches the unit; it is left alone.
//! - WHOLE: one identifier for the whole unit; spliced into the verbatim
//!   start tag as an `xml:id` attribute, content untouched.
//! - PARTIAL: identified sentence spans get a `<seg xml:id="...">` wrapper
//!   around their verbatim original content; everything between wrappers is
//!   emitted verbatim in its original position.
//!
//! The governing contract: [`strip_annotations`] applied to the output with
//! the minted identifier set must reproduce the input byte-for-byte.

use std::collections::{HashMap, HashSet};
use std::mem;
use std::ops::Range;

use crate::tei::align::{ParticipantSpec, Side};
use crate::tei::error::AlignmentPipelineError;
use crate::tei::extract::{AlignableUnit, Extent};
use crate::tei::group::AlignmentGroup;
use crate::tei::xml::{Document, Element, Node};

#[derive(Debug, Default)]
struct UnitPlan {
    whole: Vec<String>,
    spans: Vec<(Range<usize>, String)>,
}

/// Attach every participant identifier of `side` to its element or span.
pub fn apply(
    doc: &mut Document,
    units: &[AlignableUnit],
    groups: &[AlignmentGroup],
    side: Side,
) -> Result<(), AlignmentPipelineError> {
    let mut plans: HashMap<usize, UnitPlan> = HashMap::new();
    for group in groups {
        for participant in &group.participants {
            if participant.side != side {
                continue;
            }
            let plan = plans.entry(participant.spec.unit()).or_default();
            match &participant.spec {
                ParticipantSpec::Whole { .. } => plan.whole.push(participant.id.clone()),
                ParticipantSpec::Span { span, .. } => {
                    plan.spans.push((span.clone(), participant.id.clone()))
                }
            }
        }
    }

    // Units come out of extraction in pre-order, so walking them backwards
    // annotates nested units before any ancestor rebuilds its child list.
    for unit_index in (0..units.len()).rev() {
        if let Some(plan) = plans.remove(&unit_index) {
            apply_unit(doc, &units[unit_index], plan)?;
        }
    }
    Ok(())
}

fn mutate_err(msg: impl Into<String>) -> AlignmentPipelineError {
    AlignmentPipelineError::Mutate(msg.into())
}

fn apply_unit(
    doc: &mut Document,
    unit: &AlignableUnit,
    plan: UnitPlan,
) -> Result<(), AlignmentPipelineError> {
    if !plan.whole.is_empty() {
        if plan.whole.len() > 1 || !plan.spans.is_empty() {
            return Err(mutate_err(format!(
                "unit at {:?} participates more than once at whole-unit level",
                unit.address
            )));
        }
        let element = unit_element(doc, unit)?;
        attach_unit_id(element, &plan.whole[0]);
        return Ok(());
    }

    let spans = plan.spans;
    if spans.is_empty() {
        return Ok(());
    }

    // A single span over the entire normalized text is the whole unit in
    // disguise; the identifier goes on the element, no wrapper.
    if spans.len() == 1 {
        let (span, id) = &spans[0];
        if span.start == 0 && span.end == unit.normalized().len() {
            let element = unit_element(doc, unit)?;
            attach_unit_id(element, id);
            return Ok(());
        }
    }

    let mut extents = Vec::with_capacity(spans.len());
    for (span, id) in &spans {
        let extent = unit.span_extent(span).ok_or_else(|| {
            mutate_err(format!(
                "sentence span {:?} not separable in unit at {:?}",
                span, unit.address
            ))
        })?;
        extents.push((extent, id.clone()));
    }
    extents.sort_by_key(|(e, _)| (e.start_child, e.start_offset));
    for pair in extents.windows(2) {
        if !pair[0].0.ends_before(&pair[1].0) {
            return Err(mutate_err(format!(
                "overlapping sentence spans in unit at {:?}",
                unit.address
            )));
        }
    }

    let element = unit_element(doc, unit)?;
    let original = mem::take(&mut element.children);
    element.children = rebuild_children(&original, &extents)?;
    Ok(())
}

fn unit_element<'a>(
    doc: &'a mut Document,
    unit: &AlignableUnit,
) -> Result<&'a mut Element, AlignmentPipelineError> {
    doc.element_at_mut(&unit.address)
        .ok_or_else(|| mutate_err(format!("stale tree address {:?}", unit.address)))
}

/// Whole-unit identifier placement. An element that already carries its own
/// `xml:id` keeps it untouched; a second attribute of the same name would not
/// be well-formed, so the minted identifier goes on a wrapper around the
/// content instead, which strips the same way a span wrapper does.
fn attach_unit_id(element: &mut Element, id: &str) {
    if element.attr("xml:id").is_some() {
        let content = mem::take(&mut element.children);
        element.children = vec![wrapper(id, content)];
    } else {
        insert_id(&mut element.raw_start, id);
    }
}

/// Splice an `xml:id` attribute into a verbatim start tag.
fn insert_id(raw_start: &mut String, id: &str) {
    let at = if raw_start.ends_with("/>") {
        raw_start.len() - 2
    } else {
        raw_start.len() - 1
    };
    raw_start.insert_str(at, &format!(" xml:id=\"{}\"", id));
}

fn wrapper(id: &str, children: Vec<Node>) -> Node {
    Node::Element(Element {
        name: "seg".to_string(),
        raw_start: format!("<seg xml:id=\"{}\">", id),
        raw_end: Some("</seg>".to_string()),
        children,
    })
}

/// Push whatever remains of a child after `off` consumed bytes. Only text
/// children are ever partially consumed.
fn push_remainder(node: &Node, off: usize, sink: &mut Vec<Node>) {
    if off == 0 {
        sink.push(node.clone());
        return;
    }
    if let Node::Text(raw) = node {
        if off < raw.len() {
            sink.push(Node::Text(raw[off..].to_string()));
        }
    }
}

fn rebuild_children(
    original: &[Node],
    extents: &[(Extent, String)],
) -> Result<Vec<Node>, AlignmentPipelineError> {
    let mut rebuilt = Vec::new();
    let mut idx = 0usize;
    let mut off = 0usize;

    for (extent, id) in extents {
        while idx < extent.start_child {
            push_remainder(&original[idx], off, &mut rebuilt);
            idx += 1;
            off = 0;
        }
        if extent.start_offset > off {
            let Node::Text(raw) = &original[idx] else {
                return Err(mutate_err("span start offset inside a non-text child"));
            };
            rebuilt.push(Node::Text(raw[off..extent.start_offset].to_string()));
            off = extent.start_offset;
        }

        let mut content = Vec::new();
        while idx < extent.end_child {
            push_remainder(&original[idx], off, &mut content);
            idx += 1;
            off = 0;
        }
        match extent.end_offset {
            Some(end) => {
                let Node::Text(raw) = &original[idx] else {
                    return Err(mutate_err("span end offset inside a non-text child"));
                };
                if end > off {
                    content.push(Node::Text(raw[off..end].to_string()));
                }
                off = end;
                if off >= raw.len() {
                    idx += 1;
                    off = 0;
                }
            }
            None => {
                push_remainder(&original[idx], off, &mut content);
                idx += 1;
                off = 0;
            }
        }
        rebuilt.push(wrapper(id, content));
    }

    while idx < original.len() {
        push_remainder(&original[idx], off, &mut rebuilt);
        idx += 1;
        off = 0;
    }
    Ok(rebuilt)
}

/// Remove every annotation this pipeline inserted: `xml:id` attributes whose
/// value is in `ids`, and `<seg>` wrappers minted by [`wrapper`]. Inverse of
/// [`apply`]; the round-trip tests lean on it, and it only touches nodes
/// carrying minted identifiers, so pre-existing `xml:id`s and `seg`s survive.
pub fn strip_annotations(doc: &mut Document, ids: &HashSet<String>) {
    strip_nodes(&mut doc.nodes, ids);
}

fn strip_nodes(nodes: &mut Vec<Node>, ids: &HashSet<String>) {
    let mut i = 0;
    while i < nodes.len() {
        let replacement = match &mut nodes[i] {
            Node::Element(el) => {
                strip_nodes(&mut el.children, ids);
                if is_inserted_wrapper(el, ids) {
                    Some(mem::take(&mut el.children))
                } else {
                    if let Some(id) = el.attr("xml:id") {
                        if ids.contains(&id) {
                            el.raw_start = el
                                .raw_start
                                .replacen(&format!(" xml:id=\"{}\"", id), "", 1);
                        }
                    }
                    None
                }
            }
            _ => None,
        };
        match replacement {
            Some(children) => {
                nodes.splice(i..=i, children);
            }
            None => i += 1,
        }
    }
}

fn is_inserted_wrapper(el: &Element, ids: &HashSet<String>) -> bool {
    if el.name != "seg" {
        return false;
    }
    match el.attr("xml:id") {
        Some(id) => {
            ids.contains(&id) && el.raw_start == format!("<seg xml:id=\"{}\">", id)
        }
        None => false,
    }
}
