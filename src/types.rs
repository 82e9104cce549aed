use serde::{Deserialize, Serialize};

use crate::diagnosis::PredictionResult;
use crate::knowledge::lookup_by_name;
use crate::labels::Label;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub label: String,
    pub confidence: f32,
    pub description: String,
    pub remedy: String,
}

impl From<PredictionResult> for PredictionResponse {
    fn from(result: PredictionResult) -> Self {
        Self {
            label: result.label.as_str().to_string(),
            confidence: result.confidence,
            description: result.description.to_string(),
            remedy: result.remedy.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfoResponse {
    /// `loading`, `ready` or `unavailable`
    pub status: String,
    pub source: String,
    pub device: Option<String>,
    pub num_classes: Option<usize>,
    pub bound_parameters: Option<usize>,
    #[serde(default)]
    pub missing_parameters: Vec<String>,
    #[serde(default)]
    pub unexpected_parameters: Vec<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadModelResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiseaseResponse {
    pub label: String,
    pub crop: Option<String>,
    pub condition: Option<String>,
    /// `None` for names outside the catalog.
    pub healthy: Option<bool>,
    pub description: String,
    pub remedy: String,
}

impl DiseaseResponse {
    /// Knowledge entry for any name; names outside the catalog get the fallback text.
    pub fn for_name(name: &str) -> Self {
        let label = name.parse::<Label>().ok();
        let info = lookup_by_name(name);
        Self {
            label: name.to_string(),
            crop: label.map(|l| l.crop().to_string()),
            condition: label.map(|l| l.condition().to_string()),
            healthy: label.map(Label::is_healthy),
            description: info.description.to_string(),
            remedy: info.remedy.to_string(),
        }
    }
}

impl From<Label> for DiseaseResponse {
    fn from(label: Label) -> Self {
        Self::for_name(label.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
