//! 外部进程 worker - 基础设施层
//!
//! 每次调用启动一个新进程：JSON 请求写入 stdin 后关闭，
//! 同时收集 stdout 和 stderr 直到进程退出。进程从不复用。

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::config::WorkerCommand;
use crate::error::WorkerError;
use crate::infrastructure::worker::Worker;
use crate::models::{WorkerOutput, WorkerRequest};

/// 外部进程 worker
///
/// 职责：
/// - 独占本次调用的进程句柄
/// - 按退出码区分成功 / 失败
/// - 不解析输出结构，不重试
#[derive(Debug, Clone)]
pub struct ProcessWorker {
    program: String,
    args: Vec<String>,
}

impl ProcessWorker {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_command(command: &WorkerCommand) -> Self {
        Self::new(command.program.clone(), command.args.clone())
    }
}

#[async_trait]
impl Worker for ProcessWorker {
    async fn call(&self, request: &WorkerRequest) -> Result<WorkerOutput, WorkerError> {
        let payload = serde_json::to_vec(request)
            .map_err(|e| WorkerError::launch_failed(format!("请求序列化失败: {}", e)))?;

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // 超时后放弃等待即可，进程自行结束，迟到的输出被丢弃
            .kill_on_drop(false);

        let mut child = command.spawn().map_err(|e| {
            WorkerError::launch_failed(format!("无法启动 {}: {}", self.describe(), e))
        })?;
        debug!("已启动 worker 进程: {} (pid: {:?})", self.describe(), child.id());

        let stdin = child.stdin.take();
        let write_input = async move {
            if let Some(mut stdin) = stdin {
                // worker 可能不读输入就退出，写失败不影响结果判定
                if let Err(e) = stdin.write_all(&payload).await {
                    debug!("写入 worker 输入失败: {}", e);
                }
                let _ = stdin.shutdown().await;
            }
        };

        let (_, output) = tokio::join!(write_input, child.wait_with_output());
        let output = output
            .map_err(|e| WorkerError::process_failed(format!("等待 worker 退出失败: {}", e)))?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            debug!(
                "worker 退出码: {:?}, stderr 长度: {}",
                output.status.code(),
                stderr.len()
            );
            if stderr.is_empty() {
                return Err(WorkerError::process_failed(format!(
                    "worker 异常退出: {}",
                    output.status
                )));
            }
            return Err(WorkerError::process_failed(stderr));
        }

        debug!(
            "worker 正常退出，stdout {} 字节，stderr {} 字节",
            output.stdout.len(),
            stderr.len()
        );

        Ok(WorkerOutput {
            stdout: output.stdout,
            stderr,
        })
    }

    fn describe(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}
