pub mod dictionary_service;
pub mod llm_service;
pub mod worker_pipeline;

pub use dictionary_service::DictionaryService;
pub use llm_service::LlmService;
pub use worker_pipeline::{RetryPolicy, WorkerPipeline};
