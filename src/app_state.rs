use std::sync::Arc;

use parking_lot::RwLock;
use rocket::tokio::sync::Mutex;
use rocket::tokio::task;
use tracing::{error, info, warn};

use crate::config::ServiceConfig;
use crate::diagnosis::{predict, ModelState, PredictionResult};
use crate::error::{DiagnoseError, ModelLoadError, ReloadError};
use crate::loader::{load_model, ModelHandle};
use crate::preprocess::Preprocessor;

/// Shared server state:
/// - model: current lifecycle state of the classifier, swapped atomically on (re)load
/// - load_lock: at most one load runs at a time
pub struct AppState {
    config: ServiceConfig,
    preprocessor: Preprocessor,
    model: RwLock<ModelState>,
    load_lock: Mutex<()>,
}

impl AppState {
    /// State before the first load attempt.
    pub fn new(config: ServiceConfig) -> Arc<Self> {
        Self::with_model(config, ModelState::Loading)
    }

    pub fn with_model(config: ServiceConfig, model: ModelState) -> Arc<Self> {
        Arc::new(Self {
            preprocessor: Preprocessor::new(config.image_size),
            config,
            model: RwLock::new(model),
            load_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Snapshot of the model state; the lock is released before returning.
    pub fn model(&self) -> ModelState {
        self.model.read().clone()
    }

    /// Loads the configured weights on the blocking pool and swaps them in.
    ///
    /// On failure a previously ready model stays in service; otherwise the
    /// state becomes `Unavailable` with the failure as reason.
    pub async fn load_model(&self) -> Result<Arc<ModelHandle>, ReloadError> {
        let _guard = self.load_lock.try_lock().map_err(|_| ReloadError::InProgress)?;

        let source = self.config.model_source();
        let mode = self.config.binding_mode();
        let preference = self.config.device;
        info!(source = %source, ?mode, "loading model");

        let loaded = task::spawn_blocking(move || {
            let device = preference.resolve().map_err(ModelLoadError::Device)?;
            load_model(&source, &device, mode)
        })
        .await;

        let outcome = match loaded {
            Ok(Ok(handle)) => Ok(Arc::new(handle)),
            Ok(Err(err)) => Err(ReloadError::Failed(err)),
            Err(join) => Err(ReloadError::Worker(join)),
        };

        let mut slot = self.model.write();
        match outcome {
            Ok(handle) => {
                *slot = ModelState::Ready(Arc::clone(&handle));
                Ok(handle)
            }
            Err(err) => {
                if slot.is_ready() {
                    warn!(error = %err, "model reload failed, keeping current model");
                } else {
                    error!(error = %err, "model unavailable");
                    *slot = ModelState::Unavailable {
                        reason: err.to_string(),
                    };
                }
                Err(err)
            }
        }
    }

    /// Runs one prediction off the async executor under the configured deadline.
    pub async fn diagnose(&self, image: Vec<u8>) -> Result<PredictionResult, DiagnoseError> {
        let model = self.model();
        // fail fast without occupying a blocking thread
        model.handle().map_err(DiagnoseError::Predict)?;

        let preprocessor = self.preprocessor;
        let deadline = self.config.inference_timeout();
        let work = task::spawn_blocking(move || predict(&image, &model, &preprocessor));

        match rocket::tokio::time::timeout(deadline, work).await {
            Ok(joined) => Ok(joined??),
            Err(_) => {
                warn!(timeout = ?deadline, "diagnosis exceeded deadline, result discarded");
                Err(DiagnoseError::TimedOut(deadline))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use image::{DynamicImage, ImageFormat};

    use super::*;
    use crate::error::PredictError;
    use crate::labels::LABEL_COUNT;
    use crate::loader::tests::{random_handle, random_state_dict};
    use crate::preprocess::tests::{encode, gradient};

    fn local_config(path: PathBuf) -> ServiceConfig {
        ServiceConfig {
            image_size: 32,
            weights_path: Some(path),
            device: crate::config::DevicePreference::Cpu,
            ..ServiceConfig::default()
        }
    }

    #[rocket::async_test]
    async fn failed_first_load_marks_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(local_config(dir.path().join("missing.safetensors")));

        assert!(state.load_model().await.is_err());
        match state.model() {
            ModelState::Unavailable { reason } => assert!(reason.contains("missing.safetensors")),
            other => panic!("expected unavailable, got {other:?}"),
        }

        let err = state.diagnose(vec![1, 2, 3]).await.unwrap_err();
        assert!(matches!(
            err,
            DiagnoseError::Predict(PredictError::ModelUnavailable(_))
        ));
    }

    #[rocket::async_test]
    async fn successful_load_serves_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resnet9.safetensors");
        candle_core::safetensors::save(&random_state_dict(LABEL_COUNT), &path).unwrap();
        let state = AppState::new(local_config(path));

        let handle = state.load_model().await.unwrap();
        assert_eq!(handle.num_classes(), LABEL_COUNT);
        assert!(state.model().is_ready());

        let png = encode(DynamicImage::ImageRgb8(gradient(40, 40)), ImageFormat::Png);
        let result = state.diagnose(png).await.unwrap();
        assert!((0.0..=1.0).contains(&result.confidence));
    }

    #[rocket::async_test]
    async fn failed_reload_keeps_ready_model() {
        let dir = tempfile::tempdir().unwrap();
        let config = local_config(dir.path().join("gone.safetensors"));
        let state = AppState::with_model(config, ModelState::Ready(Arc::new(random_handle())));

        assert!(matches!(
            state.load_model().await,
            Err(ReloadError::Failed(ModelLoadError::Io { .. }))
        ));
        assert!(state.model().is_ready());
    }

    #[rocket::async_test]
    async fn concurrent_load_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(local_config(dir.path().join("w.safetensors")));

        let _held = state.load_lock.lock().await;
        assert!(matches!(
            state.load_model().await,
            Err(ReloadError::InProgress)
        ));
    }

    #[rocket::async_test]
    async fn loading_state_is_not_ready() {
        let state = AppState::new(ServiceConfig::default());
        let err = state.diagnose(Vec::new()).await.unwrap_err();
        assert!(matches!(
            err,
            DiagnoseError::Predict(PredictError::ModelUnavailable(ref r)) if r.contains("loading")
        ));
    }
}
