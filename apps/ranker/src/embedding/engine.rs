//! BERT sentence-embedding engine on candle.
//!
//! Weights, config and tokenizer are fetched from the HuggingFace hub (cached
//! locally after the first run). Output vectors are attention-masked mean
//! pools of the last hidden state, matching sentence-transformers.

use std::sync::Arc;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use hf_hub::api::sync::Api;
use serde::Deserialize;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use super::{Embedder, EmbeddingError};

/// Maximum sequence length for MiniLM-style encoders; longer texts are truncated.
const MAX_SEQUENCE_LENGTH: usize = 256;

#[derive(Deserialize)]
struct HiddenSize {
    hidden_size: usize,
}

struct BertInner {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

/// Embedder backed by a pretrained BERT checkpoint. Cheap to clone.
#[derive(Clone)]
pub struct BertEmbedder {
    inner: Arc<BertInner>,
    model_id: String,
    dimension: usize,
}

impl BertEmbedder {
    /// Downloads (or reuses the cached copy of) `model_id` and loads it on CPU.
    /// Blocking: call from `spawn_blocking` when inside the runtime.
    pub fn load(model_id: &str) -> Result<Self, EmbeddingError> {
        info!("Loading sentence embedding model: {model_id}");
        let device = Device::Cpu;

        let api = Api::new().map_err(|e| EmbeddingError::Load(format!("hub client: {e}")))?;
        let repo = api.model(model_id.to_string());

        let config_path = repo
            .get("config.json")
            .map_err(|e| EmbeddingError::Load(format!("config.json: {e}")))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| EmbeddingError::Load(format!("tokenizer.json: {e}")))?;
        let weights_path = repo
            .get("model.safetensors")
            .map_err(|e| EmbeddingError::Load(format!("model.safetensors: {e}")))?;

        let config_contents = std::fs::read_to_string(&config_path)
            .map_err(|e| EmbeddingError::Load(format!("reading config: {e}")))?;
        let config: BertConfig = serde_json::from_str(&config_contents)
            .map_err(|e| EmbeddingError::Load(format!("parsing config: {e}")))?;
        let HiddenSize { hidden_size } = serde_json::from_str(&config_contents)
            .map_err(|e| EmbeddingError::Load(format!("parsing hidden_size: {e}")))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| EmbeddingError::Load(format!("tokenizer: {e}")))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| EmbeddingError::Load(format!("tokenizer truncation: {e}")))?;
        // Batches are padded by hand below.
        tokenizer.with_padding(None);

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)?
        };
        let model = BertModel::load(vb, &config)?;

        info!("Model loaded: {model_id} ({hidden_size} dimensions)");

        Ok(Self {
            inner: Arc::new(BertInner {
                model,
                tokenizer,
                device,
            }),
            model_id: model_id.to_string(),
            dimension: hidden_size,
        })
    }
}

impl BertInner {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbeddingError::Tokenization(e.to_string()))?;

        let batch_size = encodings.len();
        let max_len = encodings
            .iter()
            .map(|enc| enc.get_ids().len())
            .max()
            .unwrap_or(0)
            .max(1);

        let mut flat_ids = vec![0u32; batch_size * max_len];
        let mut flat_mask = vec![0u32; batch_size * max_len];
        for (row, enc) in encodings.iter().enumerate() {
            let ids = enc.get_ids();
            let mask = enc.get_attention_mask();
            let offset = row * max_len;
            flat_ids[offset..offset + ids.len()].copy_from_slice(ids);
            flat_mask[offset..offset + mask.len()].copy_from_slice(mask);
        }

        let token_ids = Tensor::from_vec(flat_ids, (batch_size, max_len), &self.device)?;
        let attention_mask = Tensor::from_vec(flat_mask, (batch_size, max_len), &self.device)?;
        let token_type_ids = token_ids.zeros_like()?;

        let hidden = self
            .model
            .forward(&token_ids, &token_type_ids, Some(&attention_mask))?;
        debug!("Encoder output shape: {:?}", hidden.shape());

        let pooled = mean_pool(&hidden, &attention_mask)?;
        let vectors = pooled.to_vec2::<f32>()?;

        if vectors.len() != texts.len() {
            return Err(EmbeddingError::Inference(format!(
                "expected {} embeddings, model produced {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }
}

/// Mean over the sequence axis, ignoring padded positions.
fn mean_pool(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor, EmbeddingError> {
    let mask = attention_mask
        .to_dtype(DType::F32)?
        .unsqueeze(2)?
        .broadcast_as(hidden.shape())?;
    let summed = hidden.mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;
    Ok(summed.broadcast_div(&counts)?)
}

#[async_trait]
impl Embedder for BertEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || inner.embed_batch(&texts))
            .await
            .map_err(|e| EmbeddingError::Task(e.to_string()))?
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
