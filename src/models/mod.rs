pub mod artifacts;
pub mod feature;
pub mod segment;
pub mod worker_io;

pub use artifacts::{
    Choice, IpaWord, Narration, Question, QuestionSet, SegmentImage, SyllableBreakdown,
    Visualization, WordData,
};
pub use feature::{FeatureId, FeatureResult};
pub use segment::{SegmentKind, Segmentation};
pub use worker_io::{WorkerKind, WorkerOutput, WorkerPayload, WorkerRequest};
