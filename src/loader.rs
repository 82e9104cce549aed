//! Weight artifact retrieval and binding.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use hf_hub::api::sync::ApiBuilder;
use hf_hub::Cache;
use tracing::{info, warn};

use crate::error::ModelLoadError;
use crate::labels::LABEL_COUNT;
use crate::network::{ResNet9, FEATURES};

/// Tensor whose row count is the checkpoint's own class count.
const CLASSIFIER_WEIGHT: &str = "classifier.2.weight";
/// Key some training scripts wrap the state dict under.
const WRAPPED_STATE_DICT: &str = "model_state_dict";
/// BatchNorm step counters; meaningless for eval-only forward passes.
const BATCH_COUNTER_SUFFIX: &str = ".num_batches_tracked";

/// Where the weight artifact lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    Hub {
        repo_id: String,
        filename: String,
        token: Option<String>,
    },
    Local(PathBuf),
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSource::Hub {
                repo_id, filename, ..
            } => write!(f, "hf://{repo_id}/{filename}"),
            ModelSource::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// How strictly checkpoint keys must line up with the architecture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BindingMode {
    /// Every parameter must be present and no extra keys are allowed.
    #[default]
    Strict,
    /// Bind matching keys, keep initial values for the rest and report both sides.
    Partial,
}

/// Outcome of binding a checkpoint to the architecture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindReport {
    pub bound: usize,
    pub missing: Vec<String>,
    pub unexpected: Vec<String>,
}

impl BindReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

/// A ready-to-infer network bound to a device. Immutable once built.
#[derive(Debug)]
pub struct ModelHandle {
    model: ResNet9,
    device: Device,
    source: String,
    report: BindReport,
}

impl ModelHandle {
    /// Binds an in-memory state dict to a fresh ResNet9 on `device`.
    pub fn from_state_dict(
        tensors: HashMap<String, Tensor>,
        device: &Device,
        mode: BindingMode,
        source: impl Into<String>,
    ) -> Result<Self, ModelLoadError> {
        let num_classes = class_count(&tensors)?;
        let (bound, report) = bind(tensors, num_classes, device, mode)?;

        let vb = VarBuilder::from_tensors(bound, DType::F32, device);
        let model = ResNet9::new(vb, num_classes).map_err(ModelLoadError::Build)?;

        Ok(Self {
            model,
            device: device.clone(),
            source: source.into(),
            report,
        })
    }

    pub fn model(&self) -> &ResNet9 {
        &self.model
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn num_classes(&self) -> usize {
        self.model.num_classes()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn report(&self) -> &BindReport {
        &self.report
    }
}

/// Fetches (or reuses the cached copy of) the artifact and builds a handle.
pub fn load_model(
    source: &ModelSource,
    device: &Device,
    mode: BindingMode,
) -> Result<ModelHandle, ModelLoadError> {
    let start = Instant::now();
    let path = fetch_weights(source)?;
    let tensors = read_checkpoint(&path, device)?;
    info!(
        path = %path.display(),
        tensors = tensors.len(),
        "checkpoint deserialized"
    );

    let handle = ModelHandle::from_state_dict(tensors, device, mode, source.to_string())?;
    info!(
        source = %source,
        device = ?device,
        classes = handle.num_classes(),
        bound = handle.report().bound,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "model ready"
    );
    Ok(handle)
}

/// Resolves a source to a local file, downloading into the HF cache if needed.
pub fn fetch_weights(source: &ModelSource) -> Result<PathBuf, ModelLoadError> {
    match source {
        ModelSource::Local(path) => {
            if !path.is_file() {
                return Err(ModelLoadError::Io {
                    path: path.display().to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
                });
            }
            Ok(path.clone())
        }
        ModelSource::Hub {
            repo_id,
            filename,
            token,
        } => {
            info!(repo = %repo_id, filename = %filename, "fetching weights from hub");
            let hub_err = |source| ModelLoadError::Hub {
                repo_id: repo_id.clone(),
                filename: filename.clone(),
                source,
            };
            let api = ApiBuilder::new()
                .with_progress(false)
                .with_token(hub_token(token.as_deref(), &Cache::default()))
                .build()
                .map_err(hub_err)?;
            api.model(repo_id.clone()).get(filename).map_err(hub_err)
        }
    }
}

/// An explicit token wins; otherwise the login stored next to the hub cache.
fn hub_token(explicit: Option<&str>, cache: &Cache) -> Option<String> {
    explicit.map(str::to_string).or_else(|| cache.token())
}

/// Reads a safetensors file, or a PyTorch pickle (plain or `model_state_dict`-wrapped).
pub fn read_checkpoint(
    path: &Path,
    device: &Device,
) -> Result<HashMap<String, Tensor>, ModelLoadError> {
    let checkpoint_err = |source| ModelLoadError::Checkpoint {
        path: path.display().to_string(),
        source,
    };

    let is_safetensors = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("safetensors"));
    if is_safetensors {
        return candle_core::safetensors::load(path, device).map_err(checkpoint_err);
    }

    let mut entries =
        candle_core::pickle::read_all_with_key(path, None).map_err(checkpoint_err)?;
    if entries.is_empty() {
        entries = candle_core::pickle::read_all_with_key(path, Some(WRAPPED_STATE_DICT))
            .map_err(checkpoint_err)?;
    }
    Ok(entries.into_iter().collect())
}

fn class_count(tensors: &HashMap<String, Tensor>) -> Result<usize, ModelLoadError> {
    let Some(weight) = tensors.get(CLASSIFIER_WEIGHT) else {
        return Ok(LABEL_COUNT);
    };
    let found = match weight.dims() {
        [rows, FEATURES] => *rows,
        dims => {
            return Err(ModelLoadError::ShapeMismatch {
                name: CLASSIFIER_WEIGHT.to_string(),
                expected: vec![LABEL_COUNT, FEATURES],
                found: dims.to_vec(),
            })
        }
    };
    if found == 0 || found > LABEL_COUNT {
        return Err(ModelLoadError::UnsupportedClassCount {
            found,
            max: LABEL_COUNT,
        });
    }
    Ok(found)
}

/// Matches checkpoint tensors against the parameter set ResNet9 declares.
///
/// The architecture is instantiated once on the CPU purely to enumerate
/// parameter names, shapes and initial values. The returned map holds
/// tensors on `device` detached from that template.
fn bind(
    mut tensors: HashMap<String, Tensor>,
    num_classes: usize,
    device: &Device,
    mode: BindingMode,
) -> Result<(HashMap<String, Tensor>, BindReport), ModelLoadError> {
    let template = VarMap::new();
    ResNet9::new(
        VarBuilder::from_varmap(&template, DType::F32, &Device::Cpu),
        num_classes,
    )
    .map_err(ModelLoadError::Build)?;
    let mut expected: Vec<(String, Tensor)> = {
        let vars = template.data().lock().map_err(|_| {
            ModelLoadError::Build(candle_core::Error::Msg("parameter template poisoned".into()))
        })?;
        vars.iter()
            .map(|(name, var)| (name.clone(), var.as_tensor().clone()))
            .collect()
    };
    expected.sort_by(|a, b| a.0.cmp(&b.0));

    let mut bound = HashMap::with_capacity(expected.len());
    let mut report = BindReport::default();

    for (name, initial) in expected {
        match tensors.remove(&name) {
            Some(tensor) => {
                if tensor.dims() != initial.dims() {
                    return Err(ModelLoadError::ShapeMismatch {
                        name,
                        expected: initial.dims().to_vec(),
                        found: tensor.dims().to_vec(),
                    });
                }
                let tensor = tensor
                    .to_dtype(DType::F32)
                    .and_then(|t| t.to_device(device))
                    .map_err(ModelLoadError::Device)?;
                bound.insert(name, tensor);
                report.bound += 1;
            }
            None => {
                // copy out so the bound model does not share storage with the template
                let values = initial
                    .flatten_all()
                    .and_then(|t| t.to_vec1::<f32>())
                    .map_err(ModelLoadError::Build)?;
                let tensor = Tensor::from_vec(values, initial.dims(), device)
                    .map_err(ModelLoadError::Device)?;
                bound.insert(name.clone(), tensor);
                report.missing.push(name);
            }
        }
    }

    report.unexpected = tensors
        .into_keys()
        .filter(|name| !name.ends_with(BATCH_COUNTER_SUFFIX))
        .collect();
    report.unexpected.sort();

    if !report.is_complete() {
        match mode {
            BindingMode::Strict => {
                return Err(ModelLoadError::IncompleteCheckpoint {
                    missing: report.missing,
                    unexpected: report.unexpected,
                })
            }
            BindingMode::Partial => warn!(
                missing = ?report.missing,
                unexpected = ?report.unexpected,
                "partial weight load: skipped keys"
            ),
        }
    }

    Ok((bound, report))
}
