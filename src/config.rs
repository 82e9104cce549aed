//! Service configuration.
//!
//! Read from rocket's figment: `Rocket.toml` / `ROCKET_*` as usual, plus the
//! bare environment variables the deployment already uses (`HF_REPO_ID`,
//! `HF_TOKEN`, `IMAGE_SIZE`, ...).

use std::path::PathBuf;
use std::time::Duration;

use candle_core::Device;
use rocket::figment::providers::Env;
use rocket::figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::loader::{BindingMode, ModelSource};
use crate::preprocess::DEFAULT_IMAGE_SIZE;

const ENV_KEYS: &[&str] = &[
    "image_size",
    "hf_repo_id",
    "hf_model_filename",
    "hf_token",
    "weights_path",
    "device",
    "partial_weights",
    "inference_timeout_secs",
];

/// Three 2x pools must leave at least one pixel.
const MIN_IMAGE_SIZE: u32 = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    /// CUDA device 0 when compiled in and present, CPU otherwise.
    #[default]
    Auto,
    Cpu,
    Cuda,
}

impl DevicePreference {
    pub fn resolve(self) -> candle_core::Result<Device> {
        match self {
            DevicePreference::Auto => Device::cuda_if_available(0),
            DevicePreference::Cpu => Ok(Device::Cpu),
            DevicePreference::Cuda => Device::new_cuda(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_image_size")]
    pub image_size: u32,
    #[serde(default = "default_repo_id")]
    pub hf_repo_id: String,
    #[serde(default = "default_model_filename")]
    pub hf_model_filename: String,
    #[serde(default)]
    pub hf_token: Option<String>,
    /// Local weights file; when set the hub is not contacted.
    #[serde(default)]
    pub weights_path: Option<PathBuf>,
    #[serde(default)]
    pub device: DevicePreference,
    #[serde(default)]
    pub partial_weights: bool,
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    #[serde(default = "default_inference_timeout_secs")]
    pub inference_timeout_secs: u64,
}

fn default_image_size() -> u32 {
    DEFAULT_IMAGE_SIZE
}

fn default_repo_id() -> String {
    "kritimbista/my-model-weights".to_string()
}

fn default_model_filename() -> String {
    "model_weights.pth".to_string()
}

fn default_allowed_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "webp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_inference_timeout_secs() -> u64 {
    30
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            image_size: default_image_size(),
            hf_repo_id: default_repo_id(),
            hf_model_filename: default_model_filename(),
            hf_token: None,
            weights_path: None,
            device: DevicePreference::default(),
            partial_weights: false,
            allowed_extensions: default_allowed_extensions(),
            inference_timeout_secs: default_inference_timeout_secs(),
        }
    }
}

impl ServiceConfig {
    /// Rocket's default figment with the bare deployment variables merged on top.
    pub fn figment() -> Figment {
        rocket::Config::figment().merge(Env::raw().only(ENV_KEYS))
    }

    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: ServiceConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.image_size < MIN_IMAGE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "image_size must be at least {MIN_IMAGE_SIZE}, got {}",
                self.image_size
            )));
        }
        if self.inference_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "inference_timeout_secs must be positive".to_string(),
            ));
        }
        if self.weights_path.is_none()
            && (self.hf_repo_id.trim().is_empty() || self.hf_model_filename.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "hf_repo_id and hf_model_filename are required without weights_path".to_string(),
            ));
        }
        Ok(())
    }

    pub fn model_source(&self) -> ModelSource {
        match &self.weights_path {
            Some(path) => ModelSource::Local(path.clone()),
            None => ModelSource::Hub {
                repo_id: self.hf_repo_id.clone(),
                filename: self.hf_model_filename.clone(),
                token: self.hf_token.clone().filter(|t| !t.is_empty()),
            },
        }
    }

    pub fn binding_mode(&self) -> BindingMode {
        if self.partial_weights {
            BindingMode::Partial
        } else {
            BindingMode::Strict
        }
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }

    /// Case-insensitive check of an upload's file extension.
    pub fn allows_extension(&self, ext: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }
}
