use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::segment::SegmentKind;

/// 阅读理解题的一个选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    #[serde(rename = "isCorrect")]
    pub is_correct: bool,
}

/// 一道选择题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub choices: Vec<Choice>,
}

/// 阅读理解题集合
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub questions: Vec<Question>,
}

impl QuestionSet {
    /// 检查题目结构：至少一道题，每题至少两个选项且至少一个正确答案
    pub fn validate(&self) -> Result<(), String> {
        if self.questions.is_empty() {
            return Err("题目列表为空".to_string());
        }
        for (idx, q) in self.questions.iter().enumerate() {
            if q.question.trim().is_empty() {
                return Err(format!("第 {} 题题干为空", idx + 1));
            }
            if q.choices.len() < 2 {
                return Err(format!("第 {} 题选项不足两个", idx + 1));
            }
            if !q.choices.iter().any(|c| c.is_correct) {
                return Err(format!("第 {} 题没有正确答案", idx + 1));
            }
        }
        Ok(())
    }
}

/// 词典返回的单词发音数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordData {
    pub word: String,
    pub phonetic: String,
    pub audio_url: Option<String>,
    pub definition: String,
}

/// 单词的音节拆分
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyllableBreakdown {
    pub word: String,
    pub syllables: String,
}

/// 单词的 IPA 音标拆分
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpaWord {
    pub word: String,
    pub ipa: String,
    pub ipa_symbols: Vec<String>,
}

/// 插图 worker 对单个分片的输出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Illustration {
    pub image_data: String,
}

/// 一个分片及其插图
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentImage {
    pub segment: String,
    pub image_data: String,
    pub segment_type: SegmentKind,
}

/// 可视化结果，按原文顺序排列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visualization {
    pub segment_kind: SegmentKind,
    pub results: Vec<SegmentImage>,
}

/// 朗读音频
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Narration {
    #[serde(skip_serializing)]
    pub audio: Vec<u8>,
    /// 音频落盘位置（写盘失败时为 None）
    pub file: Option<PathBuf>,
}
