//! ResNet9 as trained for PlantVillage.
//!
//! Parameter paths follow the PyTorch state dict (`conv1.0.weight`,
//! `res1.1.1.running_var`, `classifier.2.bias`, ...) so checkpoints bind
//! without renaming.

use candle_core::{Module, Result, Tensor, D};
use candle_nn::{batch_norm, conv2d, linear, BatchNorm, Conv2d, Conv2dConfig, Linear, VarBuilder};

pub const IN_CHANNELS: usize = 3;
pub const FEATURES: usize = 512;

const BN_EPS: f64 = 1e-5;

/// Conv 3x3 (padding 1) -> BatchNorm -> ReLU, optionally followed by 2x2 max pooling.
#[derive(Debug, Clone)]
struct ConvBlock {
    conv: Conv2d,
    bn: BatchNorm,
    pool: bool,
}

impl ConvBlock {
    fn new(in_c: usize, out_c: usize, pool: bool, vb: VarBuilder) -> Result<Self> {
        let cfg = Conv2dConfig {
            padding: 1,
            stride: 1,
            ..Default::default()
        };
        let conv = conv2d(in_c, out_c, 3, cfg, vb.pp("0"))?;
        let bn = batch_norm(out_c, BN_EPS, vb.pp("1"))?;
        Ok(Self { conv, bn, pool })
    }
}

impl Module for ConvBlock {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        // eval mode: normalise with the stored running statistics
        let xs = xs.apply(&self.conv)?.apply_t(&self.bn, false)?.relu()?;
        if self.pool {
            xs.max_pool2d(2)
        } else {
            Ok(xs)
        }
    }
}

/// Two non-pooling blocks whose output is added back onto their input.
#[derive(Debug, Clone)]
struct Residual {
    first: ConvBlock,
    second: ConvBlock,
}

impl Residual {
    fn new(channels: usize, vb: VarBuilder) -> Result<Self> {
        Ok(Self {
            first: ConvBlock::new(channels, channels, false, vb.pp("0"))?,
            second: ConvBlock::new(channels, channels, false, vb.pp("1"))?,
        })
    }
}

impl Module for Residual {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let out = xs.apply(&self.first)?.apply(&self.second)?;
        out + xs
    }
}

#[derive(Debug, Clone)]
pub struct ResNet9 {
    conv1: ConvBlock,
    conv2: ConvBlock,
    res1: Residual,
    conv3: ConvBlock,
    conv4: ConvBlock,
    res2: Residual,
    classifier: Linear,
    num_classes: usize,
}

impl ResNet9 {
    pub fn new(vb: VarBuilder, num_classes: usize) -> Result<Self> {
        Ok(Self {
            conv1: ConvBlock::new(IN_CHANNELS, 64, false, vb.pp("conv1"))?,
            conv2: ConvBlock::new(64, 128, true, vb.pp("conv2"))?,
            res1: Residual::new(128, vb.pp("res1"))?,
            conv3: ConvBlock::new(128, 256, true, vb.pp("conv3"))?,
            conv4: ConvBlock::new(256, FEATURES, true, vb.pp("conv4"))?,
            res2: Residual::new(FEATURES, vb.pp("res2"))?,
            // index 2 of the torch Sequential(AdaptiveAvgPool2d, Flatten, Linear)
            classifier: linear(FEATURES, num_classes, vb.pp("classifier").pp("2"))?,
            num_classes,
        })
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}

impl Module for ResNet9 {
    /// `[B, 3, H, W]` images to `[B, num_classes]` logits.
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let xs = xs
            .apply(&self.conv1)?
            .apply(&self.conv2)?
            .apply(&self.res1)?
            .apply(&self.conv3)?
            .apply(&self.conv4)?
            .apply(&self.res2)?;
        // global average pool over H and W
        let pooled = xs.mean(D::Minus1)?.mean(D::Minus1)?;
        pooled.apply(&self.classifier)
    }
}

#[cfg(test)]
mod tests {
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    use super::*;

    #[test]
    fn parameter_layout_matches_torch_state_dict() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        ResNet9::new(vb, 38).unwrap();

        let data = varmap.data().lock().unwrap();
        // 8 conv blocks x (conv weight, bias, bn weight, bias, running mean, var) + linear
        assert_eq!(data.len(), 8 * 6 + 2);

        let shape = |name: &str| data.get(name).map(|v| v.dims().to_vec());
        assert_eq!(shape("conv1.0.weight"), Some(vec![64, 3, 3, 3]));
        assert_eq!(shape("conv1.1.running_mean"), Some(vec![64]));
        assert_eq!(shape("conv2.0.weight"), Some(vec![128, 64, 3, 3]));
        assert_eq!(shape("res1.0.0.weight"), Some(vec![128, 128, 3, 3]));
        assert_eq!(shape("res1.1.1.running_var"), Some(vec![128]));
        assert_eq!(shape("conv3.0.bias"), Some(vec![256]));
        assert_eq!(shape("conv4.0.weight"), Some(vec![512, 256, 3, 3]));
        assert_eq!(shape("res2.1.0.weight"), Some(vec![512, 512, 3, 3]));
        assert_eq!(shape("classifier.2.weight"), Some(vec![38, 512]));
        assert_eq!(shape("classifier.2.bias"), Some(vec![38]));
    }

    #[test]
    fn forward_yields_one_logit_per_class() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let model = ResNet9::new(vb, 10).unwrap();

        let input = Tensor::zeros((2, IN_CHANNELS, 32, 32), DType::F32, &Device::Cpu).unwrap();
        let logits = model.forward(&input).unwrap();
        assert_eq!(logits.dims(), &[2, 10]);
        assert_eq!(model.num_classes(), 10);
    }
}
