//! 单元测试用的 worker 替身

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::WorkerError;
use crate::infrastructure::Worker;
use crate::models::{WorkerOutput, WorkerRequest};

type Script = dyn Fn(&WorkerRequest, usize) -> Result<WorkerOutput, WorkerError> + Send + Sync;

/// 按脚本返回结果的 worker，记录调用次数、请求和最大并发数
pub struct ScriptedWorker {
    script: Box<Script>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: Mutex<Vec<WorkerRequest>>,
}

impl ScriptedWorker {
    /// `script` 的第二个参数是从 1 开始的调用序号
    pub fn new(
        script: impl Fn(&WorkerRequest, usize) -> Result<WorkerOutput, WorkerError>
            + Send
            + Sync
            + 'static,
    ) -> Arc<Self> {
        Arc::new(Self::build(script, Duration::ZERO))
    }

    pub fn with_delay(
        delay: Duration,
        script: impl Fn(&WorkerRequest, usize) -> Result<WorkerOutput, WorkerError>
            + Send
            + Sync
            + 'static,
    ) -> Arc<Self> {
        Arc::new(Self::build(script, delay))
    }

    /// 总是返回同一段输出
    pub fn replying(body: &str) -> Arc<Self> {
        let body = body.to_string();
        Self::new(move |_, _| Ok(WorkerOutput::new(body.clone())))
    }

    fn build(
        script: impl Fn(&WorkerRequest, usize) -> Result<WorkerOutput, WorkerError>
            + Send
            + Sync
            + 'static,
        delay: Duration,
    ) -> Self {
        Self {
            script: Box::new(script),
            delay,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<WorkerRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Worker for ScriptedWorker {
    async fn call(&self, request: &WorkerRequest) -> Result<WorkerOutput, WorkerError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().unwrap().push(request.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        (self.script)(request, n)
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}
