//! Adapter between the aligner's index space and annotation plans
//!
//! Runs the external backend over the two unit-text sequences, drops
//! correspondences with an empty opposite side, and decides granularity:
//! a whole-unit correspondence with more than one sentence on either side
//! is re-aligned at sentence level, and promoted only if that yields at
//! least one sub-correspondence above the acceptance threshold whose spans
//! can also be carved out of the tree without breaking byte preservation.
//! Anything less falls back to whole-unit granularity; the fallback is never
//! an error.

use std::collections::HashMap;
use std::ops::Range;

use tracing::{debug, warn};

use crate::tei::align::{
    AlignConfig, Aligner, Correspondence, Granularity, ParticipantSpec,
};
use crate::tei::error::AlignmentPipelineError;
use crate::tei::extract::AlignableUnit;
use crate::tei::segment::{trimmed, SentenceSplitter};

/// A retained correspondence with participants resolved to units or spans,
/// source side first. Consumed once by identifier assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCorrespondence {
    pub source: Vec<ParticipantSpec>,
    pub target: Vec<ParticipantSpec>,
    pub score: f32,
    pub granularity: Granularity,
}

/// Run the backend and resolve its output against the extracted units.
pub fn resolve(
    aligner: &dyn Aligner,
    splitter: &dyn SentenceSplitter,
    source_units: &[AlignableUnit],
    target_units: &[AlignableUnit],
    source_lang: &str,
    target_lang: &str,
    config: &AlignConfig,
) -> Result<Vec<ResolvedCorrespondence>, AlignmentPipelineError> {
    if source_units.is_empty() {
        return Err(AlignmentPipelineError::EmptyDocument("source"));
    }
    if target_units.is_empty() {
        return Err(AlignmentPipelineError::EmptyDocument("target"));
    }

    let source_texts: Vec<String> = source_units
        .iter()
        .map(|u| u.normalized().to_string())
        .collect();
    let target_texts: Vec<String> = target_units
        .iter()
        .map(|u| u.normalized().to_string())
        .collect();

    let correspondences = aligner.align(&source_texts, &target_texts, config)?;
    debug!(
        count = correspondences.len(),
        "backend returned correspondences"
    );

    let mut resolved = Vec::new();
    for cor in correspondences {
        if cor.source.is_empty() || cor.target.is_empty() {
            // No cross-document match; the unit keeps no identifier.
            continue;
        }
        match promote(
            &cor,
            aligner,
            splitter,
            source_units,
            target_units,
            source_lang,
            target_lang,
            config,
        )? {
            Some(sentence_level) => resolved.extend(sentence_level),
            None => resolved.push(ResolvedCorrespondence {
                source: cor
                    .source
                    .iter()
                    .map(|&unit| ParticipantSpec::Whole { unit })
                    .collect(),
                target: cor
                    .target
                    .iter()
                    .map(|&unit| ParticipantSpec::Whole { unit })
                    .collect(),
                score: cor.score,
                granularity: Granularity::Unit,
            }),
        }
    }
    Ok(resolved)
}

/// Attempt sentence-granularity promotion of one whole-unit correspondence.
/// `Ok(None)` means "keep whole-unit"; only a backend error is fatal.
#[allow(clippy::too_many_arguments)]
fn promote(
    cor: &Correspondence,
    aligner: &dyn Aligner,
    splitter: &dyn SentenceSplitter,
    source_units: &[AlignableUnit],
    target_units: &[AlignableUnit],
    source_lang: &str,
    target_lang: &str,
    config: &AlignConfig,
) -> Result<Option<Vec<ResolvedCorrespondence>>, AlignmentPipelineError> {
    let src_spans = sentence_spans(&cor.source, source_units, source_lang, splitter);
    let tgt_spans = sentence_spans(&cor.target, target_units, target_lang, splitter);
    if src_spans.len() <= 1 && tgt_spans.len() <= 1 {
        return Ok(None);
    }
    if src_spans.is_empty() || tgt_spans.is_empty() {
        warn!("sentence split produced nothing; keeping whole-unit granularity");
        return Ok(None);
    }

    let src_texts: Vec<String> = src_spans
        .iter()
        .map(|(u, r)| source_units[*u].normalized()[r.clone()].to_string())
        .collect();
    let tgt_texts: Vec<String> = tgt_spans
        .iter()
        .map(|(u, r)| target_units[*u].normalized()[r.clone()].to_string())
        .collect();

    let subs = aligner.align(&src_texts, &tgt_texts, config)?;
    let retained: Vec<&Correspondence> = subs
        .iter()
        .filter(|s| {
            !s.source.is_empty() && !s.target.is_empty() && s.score > config.seg_threshold
        })
        .collect();
    if retained.is_empty() {
        warn!(
            threshold = config.seg_threshold,
            "no sub-correspondence above threshold; keeping whole-unit granularity"
        );
        return Ok(None);
    }

    let src_used: Vec<usize> = retained.iter().flat_map(|s| s.source.clone()).collect();
    let tgt_used: Vec<usize> = retained.iter().flat_map(|s| s.target.clone()).collect();
    if !separable(&src_used, &src_spans, source_units)
        || !separable(&tgt_used, &tgt_spans, target_units)
    {
        warn!("sentence spans not separable in the tree; keeping whole-unit granularity");
        return Ok(None);
    }

    let mut out = Vec::with_capacity(retained.len());
    for sub in retained {
        out.push(ResolvedCorrespondence {
            source: sub
                .source
                .iter()
                .map(|&i| ParticipantSpec::Span {
                    unit: src_spans[i].0,
                    span: src_spans[i].1.clone(),
                })
                .collect(),
            target: sub
                .target
                .iter()
                .map(|&i| ParticipantSpec::Span {
                    unit: tgt_spans[i].0,
                    span: tgt_spans[i].1.clone(),
                })
                .collect(),
            score: sub.score,
            granularity: Granularity::Sentence,
        });
    }
    Ok(Some(out))
}

/// Trimmed sentence spans of the given units, tagged with their unit index.
fn sentence_spans(
    unit_indices: &[usize],
    units: &[AlignableUnit],
    language: &str,
    splitter: &dyn SentenceSplitter,
) -> Vec<(usize, Range<usize>)> {
    let mut out = Vec::new();
    for &u in unit_indices {
        let text = units[u].normalized();
        for span in splitter.split(text, language) {
            let t = trimmed(text, &span);
            if !t.is_empty() {
                out.push((u, t));
            }
        }
    }
    out
}

/// Every matched span must map to an extent, and the extents of one unit
/// must be pairwise disjoint, or the wrappers could not be inserted without
/// rewriting unrelated bytes.
fn separable(
    used: &[usize],
    spans: &[(usize, Range<usize>)],
    units: &[AlignableUnit],
) -> bool {
    let mut per_unit: HashMap<usize, Vec<crate::tei::extract::Extent>> = HashMap::new();
    for &i in used {
        let (unit, range) = &spans[i];
        match units[*unit].span_extent(range) {
            Some(extent) => per_unit.entry(*unit).or_default().push(extent),
            None => return false,
        }
    }
    for extents in per_unit.values_mut() {
        extents.sort_by_key(|e| (e.start_child, e.start_offset));
        for pair in extents.windows(2) {
            if !pair[0].ends_before(&pair[1]) {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tei::align::MonotoneAligner;
    use crate::tei::error::AlignError;
    use crate::tei::extract::{extract_units, ExtractConfig};
    use crate::tei::segment::RuleSplitter;
    use crate::tei::xml::Document;
    use std::collections::VecDeque;
    use std::sync::Mutex;

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

    fn units(xml: &str) -> Vec<AlignableUnit> {
        let doc = Document::parse(xml).expect("parse failed");
        extract_units(&doc, &ExtractConfig::default())
    }

    #[test]
    fn unmatched_correspondences_are_dropped() {
        let src = units("<body><p>One.</p><p>Two.</p></body>");
        let tgt = units("<body><p>Eins.</p></body>");
        let aligner = ScriptedAligner::new(vec![vec![
            cor(vec![0], vec![0], 1.0),
            cor(vec![1], vec![], 0.0),
        ]]);
        let resolved = resolve(
            &aligner,
            &RuleSplitter::new(),
            &src,
            &tgt,
            "en",
            "de",
            &AlignConfig::default(),
        )
        .expect("resolve failed");
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].source, vec![ParticipantSpec::Whole { unit: 0 }]);
        assert_eq!(resolved[0].granularity, Granularity::Unit);
    }

    #[test]
    fn multi_sentence_units_promote_when_scores_clear_threshold() {
        let src = units("<body><p>Alpha one. Bravo two.</p></body>");
        let tgt = units("<body><p>Uno. Dos.</p></body>");
        let aligner = ScriptedAligner::new(vec![
            vec![cor(vec![0], vec![0], 1.0)],
            vec![cor(vec![0], vec![0], 0.9), cor(vec![1], vec![1], 0.8)],
        ]);
        let resolved = resolve(
            &aligner,
            &RuleSplitter::new(),
            &src,
            &tgt,
            "en",
            "es",
            &AlignConfig::default(),
        )
        .expect("resolve failed");
        assert_eq!(resolved.len(), 2);
        assert!(resolved
            .iter()
            .all(|r| r.granularity == Granularity::Sentence));
        match &resolved[0].source[0] {
            ParticipantSpec::Span { unit, span } => {
                assert_eq!(*unit, 0);
                assert_eq!(&src[0].normalized()[span.clone()], "Alpha one.");
            }
            other => panic!("expected span participant, got {:?}", other),
        }
    }

    #[test]
    fn low_scores_fall_back_to_whole_unit() {
        let src = units("<body><p>Alpha one. Bravo two.</p></body>");
        let tgt = units("<body><p>Uno. Dos.</p></body>");
        let aligner = ScriptedAligner::new(vec![
            vec![cor(vec![0], vec![0], 1.0)],
            vec![cor(vec![0], vec![0], 0.2), cor(vec![1], vec![1], 0.1)],
        ]);
        let resolved = resolve(
            &aligner,
            &RuleSplitter::new(),
            &src,
            &tgt,
            "en",
            "es",
            &AlignConfig::default(),
        )
        .expect("resolve failed");
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].granularity, Granularity::Unit);
        assert_eq!(resolved[0].source, vec![ParticipantSpec::Whole { unit: 0 }]);
        assert_eq!(resolved[0].target, vec![ParticipantSpec::Whole { unit: 0 }]);
    }

    #[test]
    fn splitter_returning_no_spans_keeps_whole_unit_granularity() {
        // Splits nothing on the target side, so the multi-sentence candidate
        // cannot be re-aligned; the request must still succeed at unit level.
        struct OneSidedSplitter;
        impl SentenceSplitter for OneSidedSplitter {
            fn split(&self, text: &str, language: &str) -> Vec<Range<usize>> {
                if language == "es" {
                    Vec::new()
                } else {
                    RuleSplitter::new().split(text, language)
                }
            }
        }
        let src = units("<body><p>Alpha one. Bravo two.</p></body>");
        let tgt = units("<body><p>Uno. Dos.</p></body>");
        let aligner = ScriptedAligner::new(vec![vec![cor(vec![0], vec![0], 1.0)]]);
        let resolved = resolve(
            &aligner,
            &OneSidedSplitter,
            &src,
            &tgt,
            "en",
            "es",
            &AlignConfig::default(),
        )
        .expect("resolve failed");
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].granularity, Granularity::Unit);
        assert_eq!(resolved[0].source, vec![ParticipantSpec::Whole { unit: 0 }]);
    }

    #[test]
    fn backend_error_aborts_the_request() {
        let src = units("<body><p>One.</p></body>");
        let tgt = units("<body><p>Eins.</p></body>");
        let aligner = ScriptedAligner::new(vec![]);
        let err = resolve(
            &aligner,
            &RuleSplitter::new(),
            &src,
            &tgt,
            "en",
            "de",
            &AlignConfig::default(),
        )
        .expect_err("should fail");
        assert!(matches!(err, AlignmentPipelineError::Alignment(_)));
    }

    #[test]
    fn empty_unit_list_is_rejected_before_the_backend_runs() {
        let tgt = units("<body><p>Eins.</p></body>");
        let err = resolve(
            &MonotoneAligner::new(),
            &RuleSplitter::new(),
            &[],
            &tgt,
            "en",
            "de",
            &AlignConfig::default(),
        )
        .expect_err("should fail");
        assert!(matches!(err, AlignmentPipelineError::EmptyDocument("source")));
    }
}
