//! Plant leaf disease diagnosis with a pretrained ResNet9.
//!
//! Core pipeline: [`preprocess::Preprocessor`] -> [`engine::infer`] ->
//! [`diagnosis::compose_result`], tied together by [`diagnosis::predict`].
//! The rocket server in [`server`] owns the model lifecycle.

pub mod api;
pub mod app_state;
pub mod config;
pub mod diagnosis;
pub mod engine;
pub mod error;
pub mod knowledge;
pub mod labels;
pub mod loader;
pub mod network;
pub mod preprocess;
pub mod server;
pub mod telemetry;
pub mod types;

pub use diagnosis::{compose_result, predict, ModelState, PredictionResult};
pub use engine::{infer, ProbabilityDistribution};
pub use error::{DecodeError, InferenceError, ModelLoadError, PredictError};
pub use knowledge::DiseaseInfo;
pub use labels::Label;
pub use loader::{load_model, BindingMode, ModelHandle, ModelSource};
pub use preprocess::Preprocessor;
