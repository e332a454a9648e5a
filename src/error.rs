use std::fmt;

use thiserror::Error;

use crate::models::FeatureId;

/// Worker 调用失败的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerErrorKind {
    /// 无法启动 worker（可执行文件不存在、未注册等）
    LaunchFailed,
    /// worker 以非零退出码结束，或后端明确报告失败
    ProcessFailed,
    /// 退出码为 0，但输出不是合法 JSON 或不符合该 worker 的结构
    MalformedOutput,
    /// 调用超时
    Timeout,
    /// 上游服务暂时不可用（限流、5xx、连接失败）
    Unavailable,
}

impl WorkerErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkerErrorKind::LaunchFailed => "launch_failed",
            WorkerErrorKind::ProcessFailed => "process_failed",
            WorkerErrorKind::MalformedOutput => "malformed_output",
            WorkerErrorKind::Timeout => "timeout",
            WorkerErrorKind::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for WorkerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单次 worker 调用的错误
///
/// `detail` 保存诊断信息：进程失败时是 stderr 原文，输出格式错误时是原始输出。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("worker 错误 ({kind}): {detail}")]
pub struct WorkerError {
    pub kind: WorkerErrorKind,
    pub detail: String,
}

impl WorkerError {
    pub fn new(kind: WorkerErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// 是否属于可以立即重试一次的暂时性失败
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            WorkerErrorKind::Timeout | WorkerErrorKind::Unavailable
        )
    }

    // ========== 便捷构造函数 ==========

    /// 创建启动失败错误
    pub fn launch_failed(detail: impl Into<String>) -> Self {
        Self::new(WorkerErrorKind::LaunchFailed, detail)
    }

    /// 创建进程失败错误
    pub fn process_failed(detail: impl Into<String>) -> Self {
        Self::new(WorkerErrorKind::ProcessFailed, detail)
    }

    /// 创建输出格式错误
    pub fn malformed_output(detail: impl Into<String>) -> Self {
        Self::new(WorkerErrorKind::MalformedOutput, detail)
    }

    /// 创建超时错误
    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(WorkerErrorKind::Timeout, detail)
    }

    /// 创建上游不可用错误
    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::new(WorkerErrorKind::Unavailable, detail)
    }
}

/// 对调用方可见的错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 输入规范化后为空
    InvalidInput,
    /// 暂时性失败，重试后仍未成功
    Transient,
    /// worker 启动失败或执行失败
    ProcessFailed,
    /// worker 输出无法解析
    MalformedOutput,
    /// 所有分片都失败
    TotalFailure,
}

/// `generate` 的终止性错误
#[derive(Debug, Clone, Error)]
pub enum GenerateError {
    /// 输入在规范化后没有可处理的内容
    #[error("输入为空 ({feature})")]
    EmptyInput { feature: FeatureId },

    /// 单次 worker 调用失败
    #[error("生成失败 ({feature}): {source}")]
    Worker {
        feature: FeatureId,
        #[source]
        source: WorkerError,
    },

    /// 扇出中所有单元都失败
    #[error("所有 {attempted} 个单元均失败 ({feature}): {last}")]
    AllUnitsFailed {
        feature: FeatureId,
        attempted: usize,
        last: WorkerError,
    },
}

impl GenerateError {
    /// 机器可区分的错误类别
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerateError::EmptyInput { .. } => ErrorKind::InvalidInput,
            GenerateError::Worker { source, .. } => match source.kind {
                WorkerErrorKind::Timeout | WorkerErrorKind::Unavailable => ErrorKind::Transient,
                WorkerErrorKind::LaunchFailed | WorkerErrorKind::ProcessFailed => {
                    ErrorKind::ProcessFailed
                }
                WorkerErrorKind::MalformedOutput => ErrorKind::MalformedOutput,
            },
            GenerateError::AllUnitsFailed { .. } => ErrorKind::TotalFailure,
        }
    }

    /// 人类可读的诊断信息
    pub fn detail(&self) -> String {
        match self {
            GenerateError::EmptyInput { feature } => {
                format!("{} 的输入规范化后没有内容", feature)
            }
            GenerateError::Worker { source, .. } => source.detail.clone(),
            GenerateError::AllUnitsFailed {
                attempted, last, ..
            } => format!("{} 个单元全部失败，最后一个错误: {}", attempted, last),
        }
    }

    pub fn feature(&self) -> FeatureId {
        match self {
            GenerateError::EmptyInput { feature }
            | GenerateError::Worker { feature, .. }
            | GenerateError::AllUnitsFailed { feature, .. } => *feature,
        }
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== Result 类型别名 ==========

/// 生成结果类型
pub type AppResult<T> = Result<T, GenerateError>;
