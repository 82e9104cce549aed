use candle_core::{DType, Module, Tensor, D};
use tracing::debug;

use crate::error::InferenceError;
use crate::labels::{Label, LABEL_COUNT};
use crate::loader::ModelHandle;
use crate::network::IN_CHANNELS;

const TOP_K_LOGGED: usize = 5;
/// Allowed drift of the summed probabilities from 1.
const SUM_TOLERANCE: f32 = 1e-4;

/// Softmax output of one forward pass, with its argmax.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityDistribution {
    probs: Vec<f32>,
    top: usize,
}

impl ProbabilityDistribution {
    /// Accepts a non-empty vector of probabilities in `[0, 1]` summing to 1
    /// that fits the catalog.
    pub fn new(probs: Vec<f32>) -> Result<Self, InferenceError> {
        if probs.is_empty() {
            return Err(InferenceError::InvalidOutput("empty distribution".into()));
        }
        if probs.len() > LABEL_COUNT {
            return Err(InferenceError::InvalidOutput(format!(
                "{} classes exceed the {LABEL_COUNT}-entry catalog",
                probs.len()
            )));
        }
        if let Some(bad) = probs.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(InferenceError::InvalidOutput(format!(
                "invalid probability {bad}"
            )));
        }
        let sum: f32 = probs.iter().sum();
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(InferenceError::InvalidOutput(format!(
                "probabilities sum to {sum}"
            )));
        }

        // strict `>` keeps the first of equal maxima
        let mut top = 0;
        for (i, p) in probs.iter().enumerate() {
            if *p > probs[top] {
                top = i;
            }
        }
        Ok(Self { probs, top })
    }

    pub fn argmax(&self) -> usize {
        self.top
    }

    pub fn max(&self) -> f32 {
        self.probs[self.top]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.probs
    }

    pub fn len(&self) -> usize {
        self.probs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    /// Highest `k` (index, probability) pairs, ties in index order.
    pub fn top_k(&self, k: usize) -> Vec<(usize, f32)> {
        let mut indexed: Vec<(usize, f32)> = self.probs.iter().copied().enumerate().collect();
        indexed.sort_by(|a, b| b.1.total_cmp(&a.1));
        indexed.truncate(k);
        indexed
    }
}

/// Runs one forward pass and softmaxes the logits over the class dimension.
pub fn infer(handle: &ModelHandle, input: &Tensor) -> Result<ProbabilityDistribution, InferenceError> {
    match input.dims() {
        [1, IN_CHANNELS, h, w] if *h > 0 && *w > 0 => {}
        dims => {
            return Err(InferenceError::InputShape {
                found: dims.to_vec(),
                channels: IN_CHANNELS,
            })
        }
    }

    let input = input.to_device(handle.device())?.to_dtype(DType::F32)?;
    let logits = handle.model().forward(&input)?;
    let probs = candle_nn::ops::softmax(&logits, D::Minus1)?
        .squeeze(0)?
        .to_vec1::<f32>()?;
    let distribution = ProbabilityDistribution::new(probs)?;

    if tracing::enabled!(tracing::Level::DEBUG) {
        for (rank, (idx, p)) in distribution.top_k(TOP_K_LOGGED).into_iter().enumerate() {
            let name = Label::from_index(idx).map_or("?", Label::as_str);
            debug!(rank = rank + 1, label = name, probability = p, "top prediction");
        }
    }
    Ok(distribution)
}

#[cfg(test)]
mod tests {
    use candle_core::Device;
    use image::{DynamicImage, ImageFormat};

    use super::*;
    use crate::loader::tests::random_handle;
    use crate::preprocess::tests::{encode, gradient};
    use crate::preprocess::Preprocessor;

    fn leaf_tensor() -> Tensor {
        let png = encode(DynamicImage::ImageRgb8(gradient(48, 40)), ImageFormat::Png);
        Preprocessor::new(32).preprocess(&png).unwrap()
    }

    #[test]
    fn distribution_sums_to_one() {
        let handle = random_handle();
        let dist = infer(&handle, &leaf_tensor()).unwrap();

        assert_eq!(dist.len(), LABEL_COUNT);
        let sum: f32 = dist.as_slice().iter().sum();
        assert!((sum - 1.0).abs() < 1e-4, "sum = {sum}");
        assert!(dist.as_slice().iter().all(|p| *p >= 0.0));
    }

    #[test]
    fn inference_is_deterministic() {
        let handle = random_handle();
        let input = leaf_tensor();
        let a = infer(&handle, &input).unwrap();
        let b = infer(&handle, &input).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn argmax_is_the_maximum() {
        let handle = random_handle();
        let dist = infer(&handle, &leaf_tensor()).unwrap();
        let max = dist.as_slice().iter().copied().fold(f32::MIN, f32::max);
        assert_eq!(dist.max(), max);
        assert_eq!(dist.as_slice()[dist.argmax()], max);
    }

    #[test]
    fn rejects_unbatched_input() {
        let handle = random_handle();
        let input = Tensor::zeros((3, 32, 32), DType::F32, &Device::Cpu).unwrap();
        let err = infer(&handle, &input).unwrap_err();
        assert!(matches!(err, InferenceError::InputShape { ref found, .. } if found == &[3, 32, 32]));
    }

    #[test]
    fn rejects_wrong_channel_count() {
        let handle = random_handle();
        let input = Tensor::zeros((1, 4, 32, 32), DType::F32, &Device::Cpu).unwrap();
        assert!(matches!(
            infer(&handle, &input),
            Err(InferenceError::InputShape { .. })
        ));
    }

    #[test]
    fn ties_resolve_to_first_index() {
        let dist = ProbabilityDistribution::new(vec![0.1, 0.4, 0.1, 0.4]).unwrap();
        assert_eq!(dist.argmax(), 1);
        assert_eq!(dist.top_k(3), vec![(1, 0.4), (3, 0.4), (0, 0.1)]);
    }

    #[test]
    fn rejects_malformed_distributions() {
        assert!(ProbabilityDistribution::new(vec![]).is_err());
        assert!(ProbabilityDistribution::new(vec![0.5, f32::NAN]).is_err());
        assert!(ProbabilityDistribution::new(vec![1.5, -0.5]).is_err());
        assert!(ProbabilityDistribution::new(vec![0.0; LABEL_COUNT + 1]).is_err());
    }

    #[test]
    fn rejects_values_above_one() {
        let err = ProbabilityDistribution::new(vec![5.0, 0.0]).unwrap_err();
        assert!(matches!(err, InferenceError::InvalidOutput(ref msg) if msg.contains('5')));
    }

    #[test]
    fn rejects_unnormalized_distribution() {
        assert!(matches!(
            ProbabilityDistribution::new(vec![0.3, 0.3]),
            Err(InferenceError::InvalidOutput(_))
        ));
        assert!(ProbabilityDistribution::new(vec![0.3, 0.7 + 5e-5]).is_ok());
    }
}
