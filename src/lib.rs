//! # Reading Assist
//!
//! 阅读辅助产物生成管线：阅读理解题、单词发音、音节、音标、逐段配图、朗读音频
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（进程、缓存、产物目录），只暴露能力
//! - `ProcessWorker` - 每次调用启动一个新进程，stdin 写请求，收集 stdout / stderr
//! - `BoundedCache` - 固定容量 LRU 缓存
//! - `ArtifactStore` - 保留数量有限的音频目录
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单次调用
//! - `WorkerPipeline` - 超时、输出校验、暂时性失败重试
//! - `LlmService` - LLM 出题能力
//! - `DictionaryService` - 词典查询能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一组单元"的处理流程
//! - `RequestCtx` - 上下文封装（请求编号 + 功能）
//! - `fan_out` - 有界有序扇出，跳过失败单元
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/generator` - 规范化输入、查缓存、调度 worker
//! - `orchestrator/feature_caches` - 每个功能一个缓存
//!
//! 文本预处理（`text/`）是纯函数，供编排层计算缓存键和工作单元。
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod text;
pub mod utils;
pub mod workflow;

#[cfg(test)]
mod testing;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppResult, ErrorKind, GenerateError, WorkerError, WorkerErrorKind};
pub use models::{FeatureId, FeatureResult};
pub use orchestrator::{ArtifactGenerator, GeneratorStats};
pub use services::WorkerPipeline;
