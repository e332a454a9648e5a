//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层是对外的唯一入口，负责缓存和调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `generator` - 产物生成器
//! - 按功能规范化输入、计算缓存键
//! - 命中缓存直接返回
//! - 整段调用或有界扇出（`workflow::fan_out`）
//! - 朗读音频落盘（`ArtifactStore`）
//!
//! ### `feature_caches` - 功能缓存
//! - 每个功能一个 `BoundedCache`，由生成器独占
//! - 统计命中 / 未命中次数
//!
//! ## 层次关系
//!
//! ```text
//! generator (处理一次 generate 请求)
//!     ↓
//! workflow::fan_out (处理一组单词 / 分片)
//!     ↓
//! services::WorkerPipeline (能力层：超时 / 校验 / 重试)
//!     ↓
//! infrastructure (基础设施：ProcessWorker / BoundedCache / ArtifactStore)
//! ```
//!
//! ## 设计原则
//!
//! 1. **向下依赖**：编排层 → workflow → services → infrastructure
//! 2. **无全局状态**：缓存和计数器都属于生成器实例
//! 3. **只缓存成功结果**

pub mod feature_caches;
pub mod generator;

// 重新导出主要类型
pub use feature_caches::{FeatureCaches, Fingerprint};
pub use generator::{ArtifactGenerator, GeneratorStats};
