//! 文本分片
//!
//! 优先按空行分段；只有一段（或没有）时改为按句子切分，
//! 保证单段文本也能逐个单元生成插图和音频。

use regex::Regex;
use std::collections::HashSet;

use crate::models::{SegmentKind, Segmentation};

/// 文本分片器
#[derive(Debug, Clone)]
pub struct TextSegmenter {
    paragraph_break: Regex,
    sentence_end: Regex,
}

impl TextSegmenter {
    pub fn new() -> Self {
        Self {
            paragraph_break: Regex::new(r"\n\s*\n").expect("段落分隔正则无效"),
            sentence_end: Regex::new(r"[.!?]\s+").expect("句子分隔正则无效"),
        }
    }

    /// 切分文本
    ///
    /// 非空段落有两段及以上时返回段落；否则返回句子。
    /// 粒度按去重前的段落数决定，结果再去除空白、去重并保持首次出现顺序。
    pub fn segment(&self, text: &str) -> Segmentation {
        let paragraphs: Vec<&str> = self
            .paragraph_break
            .split(text)
            .filter(|p| !p.trim().is_empty())
            .collect();
        if paragraphs.len() > 1 {
            return Segmentation {
                kind: SegmentKind::Paragraph,
                segments: dedup_trimmed(paragraphs),
            };
        }

        Segmentation {
            kind: SegmentKind::Sentence,
            segments: dedup_trimmed(self.split_sentences(text)),
        }
    }

    /// 在句末标点之后切分，标点留在句子里
    fn split_sentences<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut sentences = Vec::new();
        let mut start = 0;
        for m in self.sentence_end.find_iter(text) {
            // 标点均为单字节字符
            let cut = m.start() + 1;
            sentences.push(&text[start..cut]);
            start = m.end();
        }
        sentences.push(&text[start..]);
        sentences
    }
}

impl Default for TextSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

fn dedup_trimmed<'a>(units: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    units
        .into_iter()
        .map(str::trim)
        .filter(|unit| !unit.is_empty())
        .filter(|unit| seen.insert(*unit))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_paragraphs() {
        let segmenter = TextSegmenter::new();
        let result = segmenter.segment("Para one.\n\nPara two.");
        assert_eq!(result.kind, SegmentKind::Paragraph);
        assert_eq!(result.segments, vec!["Para one.", "Para two."]);
    }

    #[test]
    fn test_single_paragraph_falls_back_to_sentences() {
        let segmenter = TextSegmenter::new();
        let result = segmenter.segment("One. Two! Three?");
        assert_eq!(result.kind, SegmentKind::Sentence);
        assert_eq!(result.segments, vec!["One.", "Two!", "Three?"]);
    }

    #[test]
    fn test_blank_line_with_spaces_is_paragraph_break() {
        let segmenter = TextSegmenter::new();
        let result = segmenter.segment("  First para.\nstill first.\n   \t\n\nSecond para.  ");
        assert_eq!(result.kind, SegmentKind::Paragraph);
        assert_eq!(
            result.segments,
            vec!["First para.\nstill first.", "Second para."]
        );
    }

    #[test]
    fn test_duplicates_removed_in_first_occurrence_order() {
        let segmenter = TextSegmenter::new();
        let result = segmenter.segment("A.\n\nB.\n\nA.\n\nC.");
        assert_eq!(result.segments, vec!["A.", "B.", "C."]);

        let result = segmenter.segment("Go. Stop. Go. Wait?!  Go.");
        assert_eq!(result.kind, SegmentKind::Sentence);
        assert_eq!(result.segments, vec!["Go.", "Stop.", "Wait?!"]);
    }

    #[test]
    fn test_repeated_paragraphs_stay_paragraphs() {
        let segmenter = TextSegmenter::new();
        let result = segmenter.segment("A. B.\n\nA. B.");
        assert_eq!(result.kind, SegmentKind::Paragraph);
        assert_eq!(result.segments, vec!["A. B."]);
    }

    #[test]
    fn test_single_paragraph_between_blank_lines() {
        // 空段落不计数，只有一段时仍按句子切分
        let segmenter = TextSegmenter::new();
        let result = segmenter.segment("\n\nHello there. General Kenobi.\n\n\n");
        assert_eq!(result.kind, SegmentKind::Sentence);
        assert_eq!(result.segments, vec!["Hello there.", "General Kenobi."]);
    }

    #[test]
    fn test_empty_text() {
        let segmenter = TextSegmenter::new();
        let result = segmenter.segment("   \n\n  ");
        assert_eq!(result.kind, SegmentKind::Sentence);
        assert!(result.is_empty());
    }

    #[test]
    fn test_punctuation_without_whitespace_does_not_split() {
        let segmenter = TextSegmenter::new();
        let result = segmenter.segment("Pi is 3.14 roughly. Version 2.0 shipped");
        assert_eq!(
            result.segments,
            vec!["Pi is 3.14 roughly.", "Version 2.0 shipped"]
        );
    }
}
