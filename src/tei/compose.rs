//! Corpus composer
//!
//! Assembles the final container: a static corpus header carrying the two
//! language identifiers, a standOff link section with exactly one link per
//! alignment group, and the two annotated documents. Each annotated document
//! is emitted verbatim from its own root element down — the only bytes that
//! differ from the inputs are the annotator's insertions. Input prologs
//! (XML declaration, doctype) are not repeated inside the container since a
//! mid-document declaration would not be well-formed.

use crate::tei::group::AlignmentGroup;
use crate::tei::xml::Document;

/// Minimal attribute-value escaping for the few values we interpolate.
fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Compose the corpus document.
///
/// Link records appear in the order the correspondences were produced; each
/// `target` lists all participant identifiers of the group, source side
/// first, as space-separated `#id` tokens.
pub fn compose(
    source: &Document,
    target: &Document,
    source_lang: &str,
    target_lang: &str,
    groups: &[AlignmentGroup],
) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<TEI xmlns=\"http://www.tei-c.org/ns/1.0\">\n");

    out.push_str("  <teiHeader>\n");
    out.push_str("    <fileDesc>\n");
    out.push_str("      <titleStmt>\n");
    out.push_str("        <title>Aligned Parallel Texts</title>\n");
    out.push_str("      </titleStmt>\n");
    out.push_str("      <publicationStmt>\n");
    out.push_str("        <p>Aligned with teialign</p>\n");
    out.push_str("      </publicationStmt>\n");
    out.push_str("    </fileDesc>\n");
    out.push_str("    <profileDesc>\n");
    out.push_str("      <langUsage>\n");
    out.push_str(&format!(
        "        <language ident=\"{}\"/>\n",
        escape_attr(source_lang)
    ));
    out.push_str(&format!(
        "        <language ident=\"{}\"/>\n",
        escape_attr(target_lang)
    ));
    out.push_str("      </langUsage>\n");
    out.push_str("    </profileDesc>\n");
    out.push_str("  </teiHeader>\n");

    out.push_str("  <standOff>\n");
    out.push_str("    <linkGrp type=\"translation\">\n");
    for group in groups {
        let targets: Vec<String> = group
            .participants
            .iter()
            .map(|p| format!("#{}", p.id))
            .collect();
        out.push_str(&format!(
            "      <link xml:id=\"{}\" target=\"{}\" type=\"Linguistic\"/>\n",
            group.id,
            targets.join(" ")
        ));
    }
    out.push_str("    </linkGrp>\n");
    out.push_str("  </standOff>\n");

    push_group(&mut out, "source", source_lang, source);
    push_group(&mut out, "target", target_lang, target);

    out.push_str("</TEI>\n");
    out
}

fn push_group(out: &mut String, kind: &str, lang: &str, doc: &Document) {
    out.push_str(&format!(
        "  <group type=\"{}\" xml:lang=\"{}\">\n",
        kind,
        escape_attr(lang)
    ));
    if let Some(root) = doc.root() {
        root.write_xml(out);
        out.push('\n');
    }
    out.push_str("  </group>\n");
}
