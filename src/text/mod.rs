//! 文本预处理：调用任何外部 worker 之前的确定性规范化

pub mod normalizer;
pub mod segmenter;

pub use normalizer::{base_form, base_forms, surface_forms, NormalizedWord, WordNormalizer};
pub use segmenter::TextSegmenter;
