//! Worker 调用管线 - 业务能力层
//!
//! 只负责"调用一种 worker 并拿到校验过的结果"这一能力：
//! 查找注册的 worker → 超时控制 → 按 worker 结构解析输出 → 暂时性失败时按策略重试。
//! 除此之外不吞掉任何错误，是否致命由编排层决定。

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::WorkerError;
use crate::infrastructure::{ProcessWorker, Worker};
use crate::models::{WorkerKind, WorkerPayload, WorkerRequest};
use crate::services::{DictionaryService, LlmService};
use crate::utils::logging::truncate_text;

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 包括首次调用在内的最大尝试次数
    pub max_attempts: u32,
    /// 两次尝试之间的等待时间
    pub backoff: Duration,
}

impl RetryPolicy {
    /// 不重试
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    /// 暂时性失败后等待 `backoff` 再试一次
    pub fn once_after(backoff: Duration) -> Self {
        Self {
            max_attempts: 2,
            backoff,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

struct Registration {
    worker: Arc<dyn Worker>,
    timeout: Option<Duration>,
    retry: RetryPolicy,
}

/// Worker 调用管线
///
/// 职责：
/// - 持有 worker 注册表
/// - 对每次调用施加超时，超时的调用直接放弃
/// - 解析并校验输出为对应的 `WorkerPayload`
/// - 只对暂时性失败重试，且次数有上限
pub struct WorkerPipeline {
    workers: HashMap<WorkerKind, Registration>,
    invocations: AtomicUsize,
}

impl WorkerPipeline {
    /// 创建空管线
    pub fn new() -> Self {
        Self {
            workers: HashMap::new(),
            invocations: AtomicUsize::new(0),
        }
    }

    /// 按配置注册所有 worker
    pub fn from_config(config: &Config) -> Self {
        let mut pipeline = Self::new();

        pipeline.register_with(
            WorkerKind::QuestionWriter,
            Arc::new(LlmService::new(&config.llm)),
            Some(Duration::from_millis(config.llm.timeout_ms)),
            RetryPolicy::none(),
        );

        let dictionary = &config.dictionary;
        pipeline.register_with(
            WorkerKind::DictionaryLookup,
            Arc::new(DictionaryService::new(dictionary)),
            Some(Duration::from_millis(dictionary.timeout_ms)),
            RetryPolicy {
                max_attempts: dictionary.max_attempts.max(1),
                backoff: Duration::from_millis(dictionary.retry_backoff_ms),
            },
        );

        let commands = [
            (WorkerKind::Syllabifier, &config.workers.syllabifier),
            (WorkerKind::PhonemeDecomposer, &config.workers.phoneme_decomposer),
            (WorkerKind::Illustrator, &config.workers.illustrator),
            (WorkerKind::Narrator, &config.workers.narrator),
        ];
        for (kind, command) in commands {
            match command {
                Some(command) => pipeline.register_with(
                    kind,
                    Arc::new(ProcessWorker::from_command(command)),
                    command.timeout(),
                    RetryPolicy::none(),
                ),
                None => warn!("⚠️ 未配置 {} 的启动命令，调用时将报告启动失败", kind),
            }
        }

        pipeline
    }

    /// 注册 worker（不限时、不重试）
    pub fn register(&mut self, kind: WorkerKind, worker: Arc<dyn Worker>) {
        self.register_with(kind, worker, None, RetryPolicy::none());
    }

    /// 注册 worker，并指定超时和重试策略
    pub fn register_with(
        &mut self,
        kind: WorkerKind,
        worker: Arc<dyn Worker>,
        timeout: Option<Duration>,
        retry: RetryPolicy,
    ) {
        debug!("注册 worker: {} -> {}", kind, worker.describe());
        self.workers.insert(
            kind,
            Registration {
                worker,
                timeout,
                retry,
            },
        );
    }

    pub fn is_registered(&self, kind: WorkerKind) -> bool {
        self.workers.contains_key(&kind)
    }

    /// 至今为止实际发起的 worker 调用次数（含重试）
    pub fn invocation_count(&self) -> usize {
        self.invocations.load(Ordering::Relaxed)
    }

    /// 调用一种 worker
    ///
    /// # 返回
    /// 校验后的响应；失败时返回分类后的 `WorkerError`
    pub async fn invoke(
        &self,
        kind: WorkerKind,
        request: &WorkerRequest,
    ) -> Result<WorkerPayload, WorkerError> {
        let registration = self
            .workers
            .get(&kind)
            .ok_or_else(|| WorkerError::launch_failed(format!("未注册 worker: {}", kind)))?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.call_once(kind, registration, request).await {
                Err(err) if err.is_transient() && attempt < registration.retry.max_attempts => {
                    warn!(
                        "[{}] 第 {} 次调用失败 ({}), {}ms 后重试",
                        kind,
                        attempt,
                        err.kind,
                        registration.retry.backoff.as_millis()
                    );
                    tokio::time::sleep(registration.retry.backoff).await;
                }
                Err(err) => {
                    debug!("[{}] 调用失败 (第 {} 次): {}", kind, attempt, err);
                    return Err(err);
                }
                Ok(payload) => {
                    if attempt > 1 {
                        info!("[{}] 第 {} 次调用成功", kind, attempt);
                    }
                    return Ok(payload);
                }
            }
        }
    }

    async fn call_once(
        &self,
        kind: WorkerKind,
        registration: &Registration,
        request: &WorkerRequest,
    ) -> Result<WorkerPayload, WorkerError> {
        self.invocations.fetch_add(1, Ordering::Relaxed);
        let call = registration.worker.call(request);

        let output = match registration.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(WorkerError::timeout(format!(
                        "{} 超过 {}ms 未完成",
                        registration.worker.describe(),
                        limit.as_millis()
                    )))
                }
            },
            None => call.await?,
        };

        if !output.stderr.trim().is_empty() {
            debug!(
                "[{}] worker 诊断输出: {}",
                kind,
                truncate_text(output.stderr.trim(), 200)
            );
        }

        kind.decode(&output)
    }
}

impl Default for WorkerPipeline {
    fn default() -> Self {
        Self::new()
    }
}
