use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{Embedding, Linear};
use std::path::Path;

use saferide_core::error::Error;
use saferide_core::traits::IntentScorer;
use saferide_core::types::PAD_ID;

use crate::pool::masked_mean;

/// Exported classifier weights reduced to a bag of embeddings: token
/// embeddings averaged over non-padding positions, a dense head, softmax.
///
/// Expects a safetensors file with `embedding.weight` [V, D],
/// `head.weight` [N, D] and `head.bias` [N].
pub struct BagOfEmbeddingsScorer {
    embedding: Embedding,
    head: Linear,
    vocab_size: usize,
    num_classes: usize,
    device: Device,
}

impl BagOfEmbeddingsScorer {
    pub fn load(path: &Path, device: Device) -> saferide_core::error::Result<Self> {
        let scorer = Self::read(path, device).map_err(|e| Error::artifact(path, e))?;
        tracing::info!(
            vocab_size = scorer.vocab_size,
            classes = scorer.num_classes,
            path = %path.display(),
            "loaded bag-of-embeddings scorer"
        );
        Ok(scorer)
    }

    fn read(path: &Path, device: Device) -> Result<Self> {
        let tensors = candle_core::safetensors::load(path, &device)?;
        let take = |name: &str| -> Result<Tensor> {
            let t = tensors.get(name).ok_or_else(|| anyhow!("missing tensor '{name}'"))?;
            Ok(t.to_dtype(DType::F32)?)
        };
        let embedding = take("embedding.weight")?;
        let head_weight = take("head.weight")?;
        let head_bias = take("head.bias")?;

        let (vocab_size, dim) = embedding.dims2()?;
        let (num_classes, head_dim) = head_weight.dims2()?;
        anyhow::ensure!(head_dim == dim, "head.weight expects {head_dim} features, embedding has {dim}");
        let bias_len = head_bias.dims1()?;
        anyhow::ensure!(bias_len == num_classes, "head.bias has {bias_len} entries for {num_classes} classes");

        Ok(Self {
            embedding: Embedding::new(embedding, dim),
            head: Linear::new(head_weight, Some(head_bias)),
            vocab_size,
            num_classes,
            device,
        })
    }

    fn forward(&self, ids: &[u32]) -> Result<Vec<f32>> {
        if let Some(bad) = ids.iter().find(|id| **id as usize >= self.vocab_size) {
            anyhow::bail!("token id {bad} outside embedding table of {} rows", self.vocab_size);
        }
        let input = Tensor::new(ids, &self.device)?.unsqueeze(0)?;
        let hidden = self.embedding.forward(&input)?;
        let pooled = masked_mean(&hidden, &input, PAD_ID)?;
        let logits = self.head.forward(&pooled)?;
        let probs = candle_nn::ops::softmax_last_dim(&logits)?;
        Ok(probs.squeeze(0)?.to_device(&Device::Cpu)?.to_vec1::<f32>()?)
    }
}

impl IntentScorer for BagOfEmbeddingsScorer {
    fn num_classes(&self) -> usize { self.num_classes }

    fn token_capacity(&self) -> Option<usize> { Some(self.vocab_size) }

    fn score(&self, ids: &[u32]) -> saferide_core::error::Result<Vec<f32>> {
        self.forward(ids).map_err(|e| Error::Scorer(e.to_string()))
    }
}
