//! RoBERTa sequence classifier on candle
//!
//! Loads a HuggingFace `RobertaForSequenceClassification` checkpoint (for
//! example `cardiffnlp/twitter-roberta-base-sentiment`) into candle's
//! XLM-RoBERTa implementation, which shares the architecture and weight names.
//! Each [`SentimentClassifier::classify`] call is one padded forward pass.

use super::{Distribution, InferenceError, SentimentClassifier};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{
    Config as RobertaConfig, XLMRobertaForSequenceClassification,
};
use hf_hub::api::sync::ApiBuilder;
use std::path::PathBuf;
use tokenizers::models::bpe::BPE;
use tokenizers::pre_tokenizers::byte_level::ByteLevel;
use tokenizers::processors::roberta::RobertaProcessing;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tracing::debug;

/// Tokenizer source shipped with a checkpoint
#[derive(Debug, Clone)]
pub enum TokenizerFiles {
    /// Serialized `tokenizer.json`
    Json(PathBuf),
    /// Older checkpoints ship only the byte-level BPE tables
    VocabMerges { vocab: PathBuf, merges: PathBuf },
}

/// Local paths of a downloaded checkpoint
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub config_path: PathBuf,
    pub weights_path: PathBuf,
    pub tokenizer: TokenizerFiles,
}

/// Fetch a checkpoint from the HuggingFace Hub (cached under `~/.cache/huggingface/hub/`)
///
/// Synchronous I/O; call from `spawn_blocking`.
pub fn download_model(repo_id: &str, token: Option<String>) -> Result<ModelFiles, InferenceError> {
    let api = ApiBuilder::new()
        .with_token(token)
        .build()
        .map_err(|e| {
            InferenceError::ModelLoad(format!("Failed to initialize HuggingFace API: {e}"))
        })?;
    let repo = api.model(repo_id.to_string());

    let fetch = |file: &str| {
        repo.get(file).map_err(|e| {
            InferenceError::ModelLoad(format!("Failed to download '{file}' from '{repo_id}': {e}"))
        })
    };

    let config_path = fetch("config.json")?;
    let weights_path = repo
        .get("model.safetensors")
        .or_else(|_| fetch("pytorch_model.bin"))?;
    let tokenizer = match repo.get("tokenizer.json") {
        Ok(path) => TokenizerFiles::Json(path),
        Err(_) => TokenizerFiles::VocabMerges {
            vocab: fetch("vocab.json")?,
            merges: fetch("merges.txt")?,
        },
    };

    Ok(ModelFiles {
        config_path,
        weights_path,
        tokenizer,
    })
}

/// CUDA device 0 when compiled with CUDA support and present, CPU otherwise
pub fn select_device() -> Device {
    Device::cuda_if_available(0).unwrap_or(Device::Cpu)
}

/// Sentiment classifier over a RoBERTa checkpoint
pub struct RobertaSentimentClassifier {
    model: XLMRobertaForSequenceClassification,
    tokenizer: Tokenizer,
    device: Device,
    labels: Vec<String>,
}

impl RobertaSentimentClassifier {
    /// Build the model and a tokenizer that truncates to `max_sequence_length`
    pub fn load(
        files: &ModelFiles,
        device: Device,
        max_sequence_length: usize,
    ) -> Result<Self, InferenceError> {
        let config_str = std::fs::read_to_string(&files.config_path).map_err(|e| {
            InferenceError::ModelLoad(format!(
                "Failed to read {}: {e}",
                files.config_path.display()
            ))
        })?;
        let mut config_json: serde_json::Value = serde_json::from_str(&config_str)
            .map_err(|e| InferenceError::ModelLoad(format!("Failed to parse config.json: {e}")))?;

        let labels = native_labels(&config_json)?;
        let pad_token_id = config_json
            .get("pad_token_id")
            .and_then(|v| v.as_u64())
            .unwrap_or(1) as u32;

        // Older RoBERTa configs predate this key
        if let Some(object) = config_json.as_object_mut() {
            object
                .entry("position_embedding_type")
                .or_insert_with(|| serde_json::Value::String("absolute".to_string()));
        }
        let config: RobertaConfig = serde_json::from_value(config_json).map_err(|e| {
            InferenceError::ModelLoad(format!("Unsupported RoBERTa config: {e}"))
        })?;

        let mut tokenizer = load_tokenizer(&files.tokenizer)?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_sequence_length,
                ..Default::default()
            }))
            .map_err(|e| InferenceError::Tokenization(e.to_string()))?;
        let pad_token = tokenizer
            .id_to_token(pad_token_id)
            .unwrap_or_else(|| "<pad>".to_string());
        // RoBERTa derives position ids from the pad id, so padding must use the model's own
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            pad_id: pad_token_id,
            pad_token,
            ..Default::default()
        }));

        let is_safetensors = files
            .weights_path
            .extension()
            .is_some_and(|ext| ext == "safetensors");
        let vb = if is_safetensors {
            // SAFETY: the mmap'd file lives in the hub cache and is not modified while loaded
            unsafe {
                VarBuilder::from_mmaped_safetensors(&[&files.weights_path], DType::F32, &device)?
            }
        } else {
            VarBuilder::from_pth(&files.weights_path, DType::F32, &device)?
        };
        let model = XLMRobertaForSequenceClassification::new(labels.len(), &config, vb)?;

        Ok(Self {
            model,
            tokenizer,
            device,
            labels,
        })
    }

    /// Native labels in logit order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl SentimentClassifier for RobertaSentimentClassifier {
    fn classify(&self, texts: &[&str]) -> Result<Vec<Distribution>, InferenceError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| InferenceError::Tokenization(e.to_string()))?;

        let batch_size = encodings.len();
        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);
        debug!(batch_size, max_len, "RoBERTa forward pass");

        let input_ids: Vec<u32> = encodings
            .iter()
            .flat_map(|e| e.get_ids().to_vec())
            .collect();
        let attention_mask: Vec<u32> = encodings
            .iter()
            .flat_map(|e| e.get_attention_mask().to_vec())
            .collect();

        let input_ids = Tensor::from_vec(input_ids, (batch_size, max_len), &self.device)?;
        let attention_mask = Tensor::from_vec(attention_mask, (batch_size, max_len), &self.device)?;
        // Single-segment input
        let token_type_ids = input_ids.zeros_like()?;

        let logits = self
            .model
            .forward(&input_ids, &attention_mask, &token_type_ids)?;
        let probs = candle_nn::ops::softmax(&logits, 1)?.to_vec2::<f32>()?;

        if probs.len() != texts.len() {
            return Err(InferenceError::MalformedOutput(format!(
                "expected {} distributions, model returned {}",
                texts.len(),
                probs.len()
            )));
        }

        Ok(probs
            .into_iter()
            .map(|row| self.labels.iter().cloned().zip(row).collect())
            .collect())
    }
}

/// Native label names from `id2label`, falling back to `LABEL_{i}` for `num_labels`
fn native_labels(config_json: &serde_json::Value) -> Result<Vec<String>, InferenceError> {
    if let Some(id2label) = config_json.get("id2label").and_then(|v| v.as_object()) {
        let mut entries: Vec<(usize, String)> = id2label
            .iter()
            .filter_map(|(k, v)| Some((k.parse().ok()?, v.as_str()?.to_string())))
            .collect();
        entries.sort_by_key(|(idx, _)| *idx);
        if !entries.is_empty() {
            return Ok(entries.into_iter().map(|(_, label)| label).collect());
        }
    }

    let num_labels = config_json
        .get("num_labels")
        .or_else(|| config_json.get("_num_labels"))
        .and_then(|v| v.as_u64())
        .ok_or_else(|| {
            InferenceError::ModelLoad(
                "config.json has neither id2label nor num_labels".to_string(),
            )
        })?;
    Ok((0..num_labels).map(|i| format!("LABEL_{i}")).collect())
}

fn load_tokenizer(files: &TokenizerFiles) -> Result<Tokenizer, InferenceError> {
    match files {
        TokenizerFiles::Json(path) => Tokenizer::from_file(path).map_err(|e| {
            InferenceError::Tokenization(format!(
                "Failed to load tokenizer from '{}': {e}",
                path.display()
            ))
        }),
        TokenizerFiles::VocabMerges { vocab, merges } => {
            let bpe = BPE::from_file(&vocab.to_string_lossy(), &merges.to_string_lossy())
                .build()
                .map_err(|e| {
                    InferenceError::Tokenization(format!("Failed to build BPE model: {e}"))
                })?;
            let mut tokenizer = Tokenizer::new(bpe);
            let cls_id = tokenizer.token_to_id("<s>").unwrap_or(0);
            let sep_id = tokenizer.token_to_id("</s>").unwrap_or(2);
            tokenizer.with_pre_tokenizer(Some(ByteLevel::new(false, true, true)));
            tokenizer.with_post_processor(Some(RobertaProcessing::new(
                ("</s>".to_string(), sep_id),
                ("<s>".to_string(), cls_id),
            )));
            Ok(tokenizer)
        }
    }
}
