//! worker 抽象
//!
//! 编排层只认识 `Worker`：一次请求，一次响应。
//! 具体实现可以是外部进程、进程内调用或网络 RPC。

use async_trait::async_trait;

use crate::error::WorkerError;
use crate::models::{WorkerOutput, WorkerRequest};

/// 生成 worker
#[async_trait]
pub trait Worker: Send + Sync {
    /// 执行一次请求，返回 worker 的全部原始输出
    ///
    /// 实现只负责报告失败，不做重试，也不解析输出结构。
    async fn call(&self, request: &WorkerRequest) -> Result<WorkerOutput, WorkerError>;

    /// 用于日志的名称
    fn describe(&self) -> String;
}
