use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::FeatureId;

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 扇出时同时进行中的单元数量
    pub max_in_flight_units: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    pub cache: CacheConfig,
    pub workers: WorkerCommands,
    pub llm: LlmConfig,
    pub dictionary: DictionaryConfig,
    pub narration: NarrationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_in_flight_units: 3,
            verbose_logging: false,
            cache: CacheConfig::default(),
            workers: WorkerCommands::default(),
            llm: LlmConfig::default(),
            dictionary: DictionaryConfig::default(),
            narration: NarrationConfig::default(),
        }
    }
}

impl Config {
    /// 默认配置 + 环境变量覆盖
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载，再套用环境变量覆盖
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        let config = Self::from_toml_str(&content).map_err(|source| {
            ConfigError::TomlParseFailed {
                path: path.display().to_string(),
                source,
            }
        })?;
        Ok(config.with_env_overrides())
    }

    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_parse("MAX_IN_FLIGHT_UNITS") {
            self.max_in_flight_units = v;
        }
        if let Some(v) = env_parse("VERBOSE_LOGGING") {
            self.verbose_logging = v;
        }
        if let Ok(v) = std::env::var("LLM_API_KEY") {
            self.llm.api_key = v;
        }
        if let Ok(v) = std::env::var("LLM_API_BASE_URL") {
            self.llm.api_base_url = v;
        }
        if let Ok(v) = std::env::var("LLM_MODEL_NAME") {
            self.llm.model_name = v;
        }
        if let Ok(v) = std::env::var("MERRIAM_WEBSTER_API_KEY") {
            self.dictionary.api_key = v;
        }
        if let Ok(v) = std::env::var("AUDIO_DIR") {
            self.narration.audio_dir = v;
        }
        if let Some(v) = env_parse("AUDIO_RETENTION") {
            self.narration.retention = v;
        }
        self
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// 各功能的缓存容量
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub comprehension: usize,
    pub pronunciation: usize,
    pub syllables: usize,
    pub phonemes: usize,
    pub visualization: usize,
    pub narration: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            comprehension: 100,
            pronunciation: 200,
            syllables: 200,
            phonemes: 200,
            visualization: 50,
            narration: 100,
        }
    }
}

impl CacheConfig {
    pub fn capacity_for(&self, feature: FeatureId) -> usize {
        match feature {
            FeatureId::Comprehension => self.comprehension,
            FeatureId::Pronunciation => self.pronunciation,
            FeatureId::Syllables => self.syllables,
            FeatureId::Phonemes => self.phonemes,
            FeatureId::Visualization => self.visualization,
            FeatureId::Narration => self.narration,
        }
    }
}

/// 外部进程 worker 的启动命令
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct WorkerCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// 单次调用超时（毫秒），不设置则一直等待进程退出
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl WorkerCommand {
    pub fn python(script: &str) -> Self {
        Self {
            program: "python".to_string(),
            args: vec![script.to_string()],
            timeout_ms: None,
        }
    }

    /// 设置单次调用超时（毫秒）
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// 外部进程 worker 命令表
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WorkerCommands {
    pub syllabifier: Option<WorkerCommand>,
    pub phoneme_decomposer: Option<WorkerCommand>,
    pub illustrator: Option<WorkerCommand>,
    pub narrator: Option<WorkerCommand>,
}

impl Default for WorkerCommands {
    fn default() -> Self {
        Self {
            syllabifier: Some(WorkerCommand::python("workers/syllabify.py")),
            phoneme_decomposer: Some(WorkerCommand::python("workers/decompose.py")),
            // 插图和朗读 worker 内部调用网络服务，必须限时
            illustrator: Some(
                WorkerCommand::python("workers/illustrate.py").with_timeout_ms(90_000),
            ),
            narrator: Some(WorkerCommand::python("workers/narrate.py").with_timeout_ms(60_000)),
        }
    }
}

/// 阅读理解出题（LLM）配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: String,
    pub api_base_url: String,
    pub model_name: String,
    pub timeout_ms: u64,
    /// 每多少个字符出一道题
    pub chars_per_question: usize,
    pub max_questions: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            model_name: "gemini-1.5-flash".to_string(),
            timeout_ms: 60_000,
            chars_per_question: 200,
            max_questions: 15,
        }
    }
}

/// 词典查询配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_ms: u64,
    pub retry_backoff_ms: u64,
    /// 包括首次调用在内的最大尝试次数
    pub max_attempts: u32,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://www.dictionaryapi.com/api/v3/references/collegiate/json"
                .to_string(),
            timeout_ms: 5_000,
            retry_backoff_ms: 2_000,
            max_attempts: 2,
        }
    }
}

/// 朗读音频配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    pub audio_dir: String,
    /// 目录中最多保留的音频文件数
    pub retention: usize,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            audio_dir: "audio_files".to_string(),
            retention: 20,
        }
    }
}
