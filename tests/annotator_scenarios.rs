//! End-to-end annotation scenarios
//!
//! Each test drives the full pipeline with a scripted backend and a
//! sequential identifier minter, then verifies the annotated corpus the way
//! a reviewer would read it: which elements carry identifiers, where the
//! wrappers sit, and what the link section says.

use std::collections::VecDeque;
use std::sync::Mutex;

use teialign::tei::align::{AlignConfig, Aligner, Correspondence, Granularity};
use teialign::tei::error::AlignError;
use teialign::tei::group::SequentialMinter;
use teialign::tei::pipeline::{annotate, AnnotateRequest};
use teialign::tei::segment::RuleSplitter;

struct ScriptedAligner {
    responses: Mutex<VecDeque<Vec<Correspondence>>>,
}

impl ScriptedAligner {
    fn new(responses: Vec<Vec<Correspondence>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

impl Aligner for ScriptedAligner {
    fn align(
        &self,
        _source: &[String],
        _target: &[String],
        _config: &AlignConfig,
    ) -> Result<Vec<Correspondence>, AlignError> {
        self.responses
            .lock()
            .expect("poisoned")
            .pop_front()
            .ok_or_else(|| AlignError::new("script exhausted"))
    }
}

fn cor(source: Vec<usize>, target: Vec<usize>, score: f32) -> Correspondence {
    Correspondence {
        source,
        target,
        score,
        granularity: Granularity::Unit,
    }
}

fn run(src: &str, tgt: &str, script: Vec<Vec<Correspondence>>) -> String {
    let mut request = AnnotateRequest::new(src, tgt);
    request.source_lang = Some("en");
    request.target_lang = Some("fr");
    let aligner = ScriptedAligner::new(script);
    let splitter = RuleSplitter::new();
    let mut minter = SequentialMinter::new("id");
    annotate(&request, &aligner, &splitter, &mut minter)
        .expect("pipeline failed")
        .xml
}

fn body(paragraphs: &str) -> String {
    format!("<TEI><text><body>{}</body></text></TEI>", paragraphs)
}

#[test]
fn scenario_a_one_to_one_paragraphs_get_one_link_and_two_identifiers() {
    let corpus = run(
        &body("<p>Premier full paragraph.</p>"),
        &body("<p>Second full paragraph.</p>"),
        vec![vec![cor(vec![0], vec![0], 1.0)]],
    );
    assert!(corpus.contains("<link xml:id=\"id-1\" target=\"#id-2 #id-3\" type=\"Linguistic\"/>"));
    assert!(corpus.contains("<p xml:id=\"id-2\">Premier full paragraph.</p>"));
    assert!(corpus.contains("<p xml:id=\"id-3\">Second full paragraph.</p>"));
    assert_eq!(corpus.matches("<link ").count(), 1);
    assert!(!corpus.contains("<seg"));
}

#[test]
fn scenario_b_mixed_sentences_leave_the_unmatched_one_as_plain_text() {
    // Sentences 1 and 3 of the source paragraph match; sentence 2 does not.
    let corpus = run(
        &body("<p>Alpha one. Bravo two. Charlie three.</p>"),
        &body("<p>Xx yy. Zz ww.</p>"),
        vec![
            vec![cor(vec![0], vec![0], 1.0)],
            vec![
                cor(vec![0], vec![0], 0.9),
                cor(vec![1], vec![], 0.0),
                cor(vec![2], vec![1], 0.9),
            ],
        ],
    );
    assert!(corpus.contains(concat!(
        "<p><seg xml:id=\"id-2\">Alpha one.</seg>",
        " Bravo two. ",
        "<seg xml:id=\"id-5\">Charlie three.</seg></p>"
    )));
    assert!(corpus.contains(
        "<p><seg xml:id=\"id-3\">Xx yy.</seg> <seg xml:id=\"id-6\">Zz ww.</seg></p>"
    ));
    assert!(corpus.contains("target=\"#id-2 #id-3\""));
    assert!(corpus.contains("target=\"#id-5 #id-6\""));
    assert_eq!(corpus.matches("<link ").count(), 2);
}

#[test]
fn scenario_c_many_to_many_mints_distinct_identifiers_per_participant() {
    // Two source headings jointly align to one target heading; the
    // sentence-level re-alignment offers nothing, so whole-unit wins.
    let corpus = run(
        &body("<head>First heading.</head><head>Second heading.</head>"),
        &body("<head>Only heading.</head>"),
        vec![vec![cor(vec![0, 1], vec![0], 0.95)], vec![]],
    );
    assert!(corpus.contains("<link xml:id=\"id-1\" target=\"#id-2 #id-3 #id-4\" type=\"Linguistic\"/>"));
    assert!(corpus.contains("<head xml:id=\"id-2\">First heading.</head>"));
    assert!(corpus.contains("<head xml:id=\"id-3\">Second heading.</head>"));
    assert!(corpus.contains("<head xml:id=\"id-4\">Only heading.</head>"));
    assert_eq!(corpus.matches("<link ").count(), 1);
    assert!(!corpus.contains("<seg"));
}

#[test]
fn granularity_fallback_keeps_a_single_whole_unit_identifier() {
    // Multi-sentence on both sides, but every sub-correspondence scores
    // below the acceptance threshold.
    let corpus = run(
        &body("<p>Alpha one. Bravo two.</p>"),
        &body("<p>Xx yy. Zz ww.</p>"),
        vec![
            vec![cor(vec![0], vec![0], 1.0)],
            vec![cor(vec![0], vec![0], 0.3), cor(vec![1], vec![1], 0.2)],
        ],
    );
    assert!(corpus.contains("<p xml:id=\"id-2\">Alpha one. Bravo two.</p>"));
    assert!(corpus.contains("<p xml:id=\"id-3\">Xx yy. Zz ww.</p>"));
    assert_eq!(corpus.matches("<link ").count(), 1);
    assert!(!corpus.contains("<seg"));
}

#[test]
fn units_with_no_correspondence_are_emitted_unchanged() {
    let corpus = run(
        &body("<p>Matched here.</p>"),
        &body("<p>Matched there.</p><p rend=\"x\">Left   alone.</p>"),
        vec![vec![
            cor(vec![0], vec![0], 1.0),
            cor(vec![], vec![1], 0.0),
        ]],
    );
    assert!(corpus.contains("<p rend=\"x\">Left   alone.</p>"));
    assert_eq!(corpus.matches("<link ").count(), 1);
}

#[test]
fn identifiers_are_never_shared_across_participants() {
    let corpus = run(
        &body("<head>First heading.</head><head>Second heading.</head>"),
        &body("<head>Only heading.</head>"),
        vec![vec![cor(vec![0, 1], vec![0], 0.95)], vec![]],
    );
    for id in ["id-2", "id-3", "id-4"] {
        let needle = format!("xml:id=\"{}\"", id);
        // Once on an element; the link's target list uses #-prefixed refs.
        assert_eq!(corpus.matches(&needle).count(), 1, "{} not unique", id);
    }
}
