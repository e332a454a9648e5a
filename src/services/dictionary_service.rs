//! 词典查询服务 - 业务能力层
//!
//! 只负责"查一个单词的音标、发音音频和释义"能力。
//! 上游是 Merriam-Webster collegiate 词典 API。

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::DictionaryConfig;
use crate::error::WorkerError;
use crate::infrastructure::Worker;
use crate::models::{WordData, WorkerOutput, WorkerRequest};

const AUDIO_BASE_URL: &str = "https://media.merriam-webster.com/audio/prons/en/us/mp3";

/// 词典查询服务
///
/// 请求文本就是要查的单词。查不到时输出 JSON `null`，
/// 由编排层在汇总时省略该词。
pub struct DictionaryService {
    client: Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl DictionaryService {
    pub fn new(config: &DictionaryConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// 查询单个单词
    pub async fn lookup(&self, word: &str) -> Result<Option<WordData>, WorkerError> {
        let url = format!("{}/{}", self.base_url, word);
        debug!("查询词典: {}", word);

        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| classify_request_error(word, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(word, status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_request_error(word, e))?;
        let payload: Value = serde_json::from_str(&body)
            .map_err(|_| WorkerError::malformed_output(body.clone()))?;

        Ok(extract_word_data(word, &payload))
    }
}

#[async_trait]
impl Worker for DictionaryService {
    async fn call(&self, request: &WorkerRequest) -> Result<WorkerOutput, WorkerError> {
        let entry = self.lookup(request.text.trim()).await?;
        let body = serde_json::to_vec(&entry)
            .map_err(|e| WorkerError::malformed_output(format!("序列化词条失败: {}", e)))?;
        Ok(WorkerOutput::new(body))
    }

    fn describe(&self) -> String {
        format!("dictionary:{}", self.base_url)
    }
}

fn classify_request_error(word: &str, err: reqwest::Error) -> WorkerError {
    if err.is_timeout() {
        WorkerError::timeout(format!("查询 '{}' 超时: {}", word, err))
    } else if err.is_connect() {
        WorkerError::unavailable(format!("无法连接词典服务 ('{}'): {}", word, err))
    } else {
        WorkerError::process_failed(format!("查询 '{}' 失败: {}", word, err))
    }
}

fn classify_status(word: &str, status: StatusCode) -> WorkerError {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        WorkerError::unavailable(format!("词典服务暂不可用 ('{}'): HTTP {}", word, status))
    } else {
        WorkerError::process_failed(format!("查询 '{}' 失败: HTTP {}", word, status))
    }
}

/// 从词典响应中提取第一个词条
///
/// 第一项必须是带 `hwi.prs[0]` 的对象；对拼写建议（字符串数组）或空数组返回 None。
pub fn extract_word_data(word: &str, payload: &Value) -> Option<WordData> {
    let entry = payload.as_array()?.first()?.as_object()?;
    let pronunciation = entry.get("hwi")?.get("prs")?.as_array()?.first()?;

    let phonetic = pronunciation
        .get("mw")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let audio_url = pronunciation
        .get("sound")
        .and_then(|sound| sound.get("audio"))
        .and_then(Value::as_str)
        .filter(|file| !file.is_empty())
        .map(audio_url);
    let definition = entry
        .get("shortdef")
        .and_then(Value::as_array)
        .and_then(|defs| defs.first())
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Some(WordData {
        word: word.to_string(),
        phonetic,
        audio_url,
        definition,
    })
}

/// 音频文件名 → 下载地址
pub fn audio_url(file: &str) -> String {
    let subdir = if file.starts_with("bix") {
        "bix"
    } else if file.starts_with("gg") {
        "gg"
    } else if file.starts_with(|c: char| c == '_' || c.is_ascii_digit()) {
        "number"
    } else {
        &file[..file.chars().next().map_or(0, char::len_utf8)]
    };
    format!("{}/{}/{}.mp3", AUDIO_BASE_URL, subdir, file)
}
