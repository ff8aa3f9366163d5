//! Sentence segmentation boundary
//!
//! The splitter contract: spans cover the whole input with no gaps and no
//! overlap, and the same text with the same language always produces the
//! same boundaries (the annotator's idempotence depends on it). Inter-
//! sentence whitespace attaches to the preceding span; callers that want
//! the bare sentence use [`trimmed`].
//!
//! `RuleSplitter` is a deterministic rule-based implementation: a sentence
//! ends at terminal punctuation, optionally followed by closing quotes or
//! brackets, followed by whitespace and something that can open a sentence.
//! CJK scripts have no inter-word spaces, so for those languages the
//! boundary lands right after the terminator.

use std::ops::Range;

pub trait SentenceSplitter: Send + Sync {
    /// Split `text` into ordered sentence spans covering all of it.
    fn split(&self, text: &str, language: &str) -> Vec<Range<usize>>;
}

/// Deterministic punctuation-driven splitter.
#[derive(Debug, Clone, Default)]
pub struct RuleSplitter;

impl RuleSplitter {
    pub fn new() -> Self {
        Self
    }
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '…' | '。' | '！' | '？')
}

fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '»' | '”' | '’' | '」' | '』')
}

fn opens_sentence(c: char) -> bool {
    c.is_uppercase()
        || c.is_numeric()
        || matches!(c, '"' | '\'' | '(' | '[' | '«' | '“' | '‘' | '「' | '『')
}

fn spaceless(language: &str) -> bool {
    matches!(language, "zh" | "ja" | "ko")
}

impl SentenceSplitter for RuleSplitter {
    fn split(&self, text: &str, language: &str) -> Vec<Range<usize>> {
        let cjk = spaceless(language);
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut spans = Vec::new();
        let mut start = 0usize;
        let mut i = 0usize;
        while i < chars.len() {
            if is_terminator(chars[i].1) {
                let mut j = i + 1;
                while j < chars.len() && is_closer(chars[j].1) {
                    j += 1;
                }
                if j >= chars.len() {
                    spans.push(start..text.len());
                    start = text.len();
                    break;
                }
                if cjk {
                    let end = chars[j].0;
                    spans.push(start..end);
                    start = end;
                    i = j;
                    continue;
                }
                if chars[j].1.is_whitespace() {
                    let mut k = j;
                    while k < chars.len() && chars[k].1.is_whitespace() {
                        k += 1;
                    }
                    if k >= chars.len() {
                        spans.push(start..text.len());
                        start = text.len();
                        break;
                    }
                    if opens_sentence(chars[k].1) {
                        let end = chars[k].0;
                        spans.push(start..end);
                        start = end;
                    }
                    i = k;
                    continue;
                }
            }
            i += 1;
        }
        if start < text.len() {
            spans.push(start..text.len());
        }
        if spans.is_empty() && !text.is_empty() {
            spans.push(0..text.len());
        }
        spans
    }
}

/// Shrink a span to exclude leading and trailing whitespace.
pub fn trimmed(text: &str, range: &Range<usize>) -> Range<usize> {
    let slice = &text[range.clone()];
    let ltrim = slice.len() - slice.trim_start().len();
    let rtrim = slice.len() - slice.trim_end().len();
    if range.start + ltrim >= range.end - rtrim {
        return range.start..range.start;
    }
    (range.start + ltrim)..(range.end - rtrim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("He left. She stayed.", "en", 2)]
    #[case("One! Two? Three.", "en", 3)]
    #[case("No terminator here", "en", 1)]
    #[case("One. two continues here.", "en", 1)]
    #[case("\u{201c}Go.\u{201d} Then silence.", "en", 2)]
    #[case("你好。再见。", "zh", 2)]
    fn splits_into_expected_count(
        #[case] text: &str,
        #[case] language: &str,
        #[case] expected: usize,
    ) {
        let spans = RuleSplitter::new().split(text, language);
        assert_eq!(spans.len(), expected, "spans: {:?}", spans);
    }

    #[test]
    fn spans_partition_the_input() {
        let text = "Alpha one. Bravo two.  Charlie three.";
        let spans = RuleSplitter::new().split(text, "en");
        let mut cursor = 0;
        for span in &spans {
            assert_eq!(span.start, cursor);
            cursor = span.end;
        }
        assert_eq!(cursor, text.len());
    }

    #[test]
    fn whitespace_attaches_to_the_preceding_span() {
        let text = "Alpha one. Bravo two.";
        let spans = RuleSplitter::new().split(text, "en");
        assert_eq!(&text[spans[0].clone()], "Alpha one. ");
        assert_eq!(&text[spans[1].clone()], "Bravo two.");
        assert_eq!(&text[trimmed(text, &spans[0])], "Alpha one.");
    }

    #[test]
    fn splitting_is_deterministic() {
        let text = "Mr. Jones arrived. He sat down. \u{201c}Well.\u{201d}";
        let a = RuleSplitter::new().split(text, "en");
        let b = RuleSplitter::new().split(text, "en");
        assert_eq!(a, b);
    }

    #[test]
    fn trimmed_collapses_all_whitespace_spans() {
        let text = "a   b";
        assert_eq!(trimmed(text, &(1..4)), 1..1);
    }
}
