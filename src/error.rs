use std::time::Duration;

use thiserror::Error;

/// Image bytes could not be turned into a model input.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("image could not be decoded: {0}")]
    Image(#[from] image::ImageError),

    #[error("decoded image could not be laid out as a tensor: {0}")]
    Layout(#[source] candle_core::Error),
}

/// Anything that stops a `ModelHandle` from being produced.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("failed to fetch `{filename}` from hub repo `{repo_id}`: {source}")]
    Hub {
        repo_id: String,
        filename: String,
        #[source]
        source: hf_hub::api::sync::ApiError,
    },

    #[error("weights file {path} is not readable: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to deserialize checkpoint {path}: {source}")]
    Checkpoint {
        path: String,
        #[source]
        source: candle_core::Error,
    },

    #[error("compute device unavailable: {0}")]
    Device(#[source] candle_core::Error),

    #[error("checkpoint declares {found} classes, the label catalog supports 1..={max}")]
    UnsupportedClassCount { found: usize, max: usize },

    #[error("parameter `{name}` has shape {found:?}, architecture expects {expected:?}")]
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error(
        "checkpoint does not match the architecture: {} missing, {} unexpected parameters",
        .missing.len(),
        .unexpected.len()
    )]
    IncompleteCheckpoint {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("failed to build network: {0}")]
    Build(#[source] candle_core::Error),
}

/// Forward pass failures.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("input tensor has shape {found:?}, expected [1, {channels}, H, W]")]
    InputShape { found: Vec<usize>, channels: usize },

    #[error("forward pass failed: {0}")]
    Forward(#[from] candle_core::Error),

    #[error("network produced an unusable distribution: {0}")]
    InvalidOutput(String),
}

/// Failures of the composed bytes-to-diagnosis pipeline.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Serving-layer wrapper around a single prediction.
#[derive(Debug, Error)]
pub enum DiagnoseError {
    #[error(transparent)]
    Predict(#[from] PredictError),

    #[error("diagnosis did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("diagnosis worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Serving-layer wrapper around a (re)load of the model.
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("a model load is already in progress")]
    InProgress,

    #[error(transparent)]
    Failed(#[from] ModelLoadError),

    #[error("model load worker failed: {0}")]
    Worker(#[source] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration could not be read: {0}")]
    Figment(#[from] rocket::figment::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
