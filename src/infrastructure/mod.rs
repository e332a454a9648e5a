//! 基础设施层（Infrastructure）
//!
//! 持有稀缺资源（进程句柄、缓存、产物目录），只暴露能力，不认识具体功能流程。

pub mod artifact_store;
pub mod bounded_cache;
pub mod process_worker;
pub mod worker;

pub use artifact_store::ArtifactStore;
pub use bounded_cache::BoundedCache;
pub use process_worker::ProcessWorker;
pub use worker::Worker;
