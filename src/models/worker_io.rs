//! worker 边界上的数据结构
//!
//! 一次请求 = 一个 JSON 文档写入 worker 的输入；一次响应 = worker 退出前写出的全部输出。
//! 每种 worker 只有一种响应结构，收到后立即按结构校验，不符合的一律视为 `MalformedOutput`。

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::WorkerError;
use crate::models::artifacts::{
    Illustration, IpaWord, QuestionSet, SyllableBreakdown, WordData,
};
use crate::models::segment::SegmentKind;

/// worker 种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerKind {
    QuestionWriter,
    DictionaryLookup,
    Syllabifier,
    PhonemeDecomposer,
    Illustrator,
    Narrator,
}

impl WorkerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkerKind::QuestionWriter => "question_writer",
            WorkerKind::DictionaryLookup => "dictionary_lookup",
            WorkerKind::Syllabifier => "syllabifier",
            WorkerKind::PhonemeDecomposer => "phoneme_decomposer",
            WorkerKind::Illustrator => "illustrator",
            WorkerKind::Narrator => "narrator",
        }
    }

    /// 按该 worker 的结构解析并校验输出
    pub fn decode(self, output: &WorkerOutput) -> Result<WorkerPayload, WorkerError> {
        match self {
            WorkerKind::QuestionWriter => {
                let set: QuestionSet = parse_json(&output.stdout)?;
                set.validate().map_err(|reason| {
                    WorkerError::malformed_output(format!(
                        "{}: {}",
                        reason,
                        output.stdout_lossy()
                    ))
                })?;
                Ok(WorkerPayload::Questions(set))
            }
            WorkerKind::DictionaryLookup => {
                Ok(WorkerPayload::WordEntry(parse_json(&output.stdout)?))
            }
            WorkerKind::Syllabifier => Ok(WorkerPayload::Syllables(parse_json(&output.stdout)?)),
            WorkerKind::PhonemeDecomposer => {
                Ok(WorkerPayload::Phonemes(parse_json(&output.stdout)?))
            }
            WorkerKind::Illustrator => {
                let illustration: Illustration = parse_json(&output.stdout)?;
                if illustration.image_data.trim().is_empty() {
                    return Err(WorkerError::malformed_output(format!(
                        "image_data 为空: {}",
                        output.stdout_lossy()
                    )));
                }
                Ok(WorkerPayload::Illustration(illustration))
            }
            WorkerKind::Narrator => {
                if output.stdout.is_empty() {
                    return Err(WorkerError::malformed_output("音频输出为空"));
                }
                Ok(WorkerPayload::Audio(output.stdout.clone()))
            }
        }
    }
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 写入 worker 输入流的请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_kind: Option<SegmentKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_count: Option<usize>,
}

impl WorkerRequest {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            segment_kind: None,
            context: None,
            question_count: None,
        }
    }
}

/// worker 退出后收集到的全部输出
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerOutput {
    pub stdout: Vec<u8>,
    /// 诊断输出，仅作参考，不决定成败
    pub stderr: String,
}

impl WorkerOutput {
    pub fn new(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// 校验后的 worker 响应，每种 worker 一个变体
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerPayload {
    Questions(QuestionSet),
    /// 词典未收录该词时为 None
    WordEntry(Option<WordData>),
    Syllables(Vec<SyllableBreakdown>),
    Phonemes(Vec<IpaWord>),
    Illustration(Illustration),
    Audio(Vec<u8>),
}

impl WorkerPayload {
    pub fn kind(&self) -> WorkerKind {
        match self {
            WorkerPayload::Questions(_) => WorkerKind::QuestionWriter,
            WorkerPayload::WordEntry(_) => WorkerKind::DictionaryLookup,
            WorkerPayload::Syllables(_) => WorkerKind::Syllabifier,
            WorkerPayload::Phonemes(_) => WorkerKind::PhonemeDecomposer,
            WorkerPayload::Illustration(_) => WorkerKind::Illustrator,
            WorkerPayload::Audio(_) => WorkerKind::Narrator,
        }
    }
}

fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WorkerError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|_| WorkerError::malformed_output(String::from_utf8_lossy(bytes)))?;
    serde_json::from_value(value).map_err(|e| {
        WorkerError::malformed_output(format!(
            "结构不匹配 ({}): {}",
            e,
            String::from_utf8_lossy(bytes)
        ))
    })
}
