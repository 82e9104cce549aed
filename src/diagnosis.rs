//! Turning a distribution into a diagnosis, and the end-to-end `predict`.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::engine::{infer, ProbabilityDistribution};
use crate::error::PredictError;
use crate::labels::Label;
use crate::loader::ModelHandle;
use crate::preprocess::Preprocessor;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub label: Label,
    pub confidence: f32,
    pub description: &'static str,
    pub remedy: &'static str,
}

/// Lifecycle of the process-wide model. Callers must handle every variant.
#[derive(Debug, Clone)]
pub enum ModelState {
    Loading,
    Ready(Arc<ModelHandle>),
    Unavailable { reason: String },
}

impl ModelState {
    pub fn handle(&self) -> Result<&Arc<ModelHandle>, PredictError> {
        match self {
            ModelState::Ready(handle) => Ok(handle),
            ModelState::Loading => Err(PredictError::ModelUnavailable(
                "model is still loading".to_string(),
            )),
            ModelState::Unavailable { reason } => {
                Err(PredictError::ModelUnavailable(reason.clone()))
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ModelState::Ready(_))
    }
}

pub fn compose_result(distribution: &ProbabilityDistribution) -> PredictionResult {
    // ProbabilityDistribution never holds more entries than the catalog
    let label = Label::ALL[distribution.argmax()];
    let info = label.info();
    PredictionResult {
        label,
        confidence: distribution.max(),
        description: info.description,
        remedy: info.remedy,
    }
}

/// Bytes in, diagnosis out. An unready model fails before the bytes are touched.
pub fn predict(
    image: &[u8],
    model: &ModelState,
    preprocessor: &Preprocessor,
) -> Result<PredictionResult, PredictError> {
    let handle = model.handle()?;
    let start = Instant::now();

    let input = preprocessor.preprocess(image)?;
    let distribution = infer(handle, &input)?;
    let result = compose_result(&distribution);

    info!(
        label = %result.label,
        confidence = result.confidence,
        bytes = image.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "diagnosis complete"
    );
    Ok(result)
}
