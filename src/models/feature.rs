use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::artifacts::{
    IpaWord, Narration, QuestionSet, SyllableBreakdown, Visualization, WordData,
};
use crate::models::worker_io::WorkerKind;

/// 对外提供的功能
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureId {
    /// 阅读理解选择题
    Comprehension,
    /// 单词发音与释义（逐词查词典）
    Pronunciation,
    /// 音节拆分
    Syllables,
    /// IPA 音标拆分
    Phonemes,
    /// 逐段配图
    Visualization,
    /// 朗读音频
    Narration,
}

impl FeatureId {
    pub const ALL: [FeatureId; 6] = [
        FeatureId::Comprehension,
        FeatureId::Pronunciation,
        FeatureId::Syllables,
        FeatureId::Phonemes,
        FeatureId::Visualization,
        FeatureId::Narration,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FeatureId::Comprehension => "comprehension",
            FeatureId::Pronunciation => "pronunciation",
            FeatureId::Syllables => "syllables",
            FeatureId::Phonemes => "phonemes",
            FeatureId::Visualization => "visualization",
            FeatureId::Narration => "narration",
        }
    }

    /// 该功能使用的 worker
    pub fn worker(self) -> WorkerKind {
        match self {
            FeatureId::Comprehension => WorkerKind::QuestionWriter,
            FeatureId::Pronunciation => WorkerKind::DictionaryLookup,
            FeatureId::Syllables => WorkerKind::Syllabifier,
            FeatureId::Phonemes => WorkerKind::PhonemeDecomposer,
            FeatureId::Visualization => WorkerKind::Illustrator,
            FeatureId::Narration => WorkerKind::Narrator,
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `generate` 返回给调用方的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "feature", content = "result", rename_all = "snake_case")]
pub enum FeatureResult {
    Comprehension(QuestionSet),
    Pronunciation(Vec<WordData>),
    Syllables(Vec<SyllableBreakdown>),
    Phonemes(Vec<IpaWord>),
    Visualization(Visualization),
    Narration(Narration),
}

impl FeatureResult {
    pub fn feature(&self) -> FeatureId {
        match self {
            FeatureResult::Comprehension(_) => FeatureId::Comprehension,
            FeatureResult::Pronunciation(_) => FeatureId::Pronunciation,
            FeatureResult::Syllables(_) => FeatureId::Syllables,
            FeatureResult::Phonemes(_) => FeatureId::Phonemes,
            FeatureResult::Visualization(_) => FeatureId::Visualization,
            FeatureResult::Narration(_) => FeatureId::Narration,
        }
    }
}
