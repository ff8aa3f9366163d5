//! Deterministic fallback backend
//!
//! Pairs the i-th source unit with the i-th target unit and scores the pair
//! by character-length ratio. Leftover units on the longer side come back
//! with an empty opposite set, which keeps the adapter's total-coverage
//! contract intact. This is a stand-in for development, the CLI and tests;
//! real deployments install an embedding-based backend via the model handle.

use crate::tei::align::{AlignConfig, Aligner, Correspondence, Granularity};
use crate::tei::error::AlignError;

#[derive(Debug, Clone, Default)]
pub struct MonotoneAligner;

impl MonotoneAligner {
    pub fn new() -> Self {
        Self
    }
}

fn length_ratio(a: &str, b: &str) -> f32 {
    let x = a.chars().count();
    let y = b.chars().count();
    if x == 0 || y == 0 {
        return 0.0;
    }
    x.min(y) as f32 / x.max(y) as f32
}

impl Aligner for MonotoneAligner {
    fn align(
        &self,
        source: &[String],
        target: &[String],
        config: &AlignConfig,
    ) -> Result<Vec<Correspondence>, AlignError> {
        if source.is_empty() || target.is_empty() {
            return Err(AlignError::new("empty input sequence"));
        }
        let paired = source.len().min(target.len());
        let mut out = Vec::with_capacity(source.len().max(target.len()));
        for i in 0..paired {
            let score = if config.len_penalty {
                length_ratio(&source[i], &target[i])
            } else {
                1.0
            };
            out.push(Correspondence {
                source: vec![i],
                target: vec![i],
                score,
                granularity: Granularity::Unit,
            });
        }
        for i in paired..source.len() {
            out.push(Correspondence {
                source: vec![i],
                target: Vec::new(),
                score: 0.0,
                granularity: Granularity::Unit,
            });
        }
        for j in paired..target.len() {
            out.push(Correspondence {
                source: Vec::new(),
                target: vec![j],
                score: 0.0,
                granularity: Granularity::Unit,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn covers_every_index_exactly_once() {
        let aligner = MonotoneAligner::new();
        let out = aligner
            .align(
                &texts(&["a", "bb", "ccc"]),
                &texts(&["x", "yy"]),
                &AlignConfig::default(),
            )
            .expect("align failed");
        let mut src: Vec<usize> = out.iter().flat_map(|c| c.source.clone()).collect();
        let mut tgt: Vec<usize> = out.iter().flat_map(|c| c.target.clone()).collect();
        src.sort_unstable();
        tgt.sort_unstable();
        assert_eq!(src, vec![0, 1, 2]);
        assert_eq!(tgt, vec![0, 1]);
        assert!(out[2].target.is_empty());
    }

    #[test]
    fn empty_input_is_an_error() {
        let aligner = MonotoneAligner::new();
        assert!(aligner
            .align(&[], &texts(&["x"]), &AlignConfig::default())
            .is_err());
    }

    #[test]
    fn equal_length_pairs_score_highest() {
        let aligner = MonotoneAligner::new();
        let out = aligner
            .align(
                &texts(&["same size", "longer sentence here"]),
                &texts(&["same size", "tiny"]),
                &AlignConfig::default(),
            )
            .expect("align failed");
        assert!(out[0].score > out[1].score);
        assert_eq!(out[0].score, 1.0);
    }
}
