//! Analysis services
//!
//! One module per pipeline stage, plus the pipeline that chains them.

pub mod inference_client;
pub mod input_normalizer;
pub mod pipeline;
pub mod prompt_builder;
pub mod response_validator;
pub mod rubric;

pub use inference_client::{InferenceBackend, InferenceClient, RawModelResponse};
pub use input_normalizer::{CanonicalImage, ImageInput, InputNormalizer};
pub use pipeline::AnalysisPipeline;
pub use prompt_builder::{AnalysisRequest, PromptBuilder};
pub use rubric::{DEFAULT_RUBRIC, RUBRIC_VERSION};
