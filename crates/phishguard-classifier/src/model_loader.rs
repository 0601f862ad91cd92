//! Model loading and inference for the BERT phishing classifier
//!
//! The artifact directory follows the Hugging Face layout written by
//! `save_pretrained`: `config.json`, `model.safetensors`, and either
//! `tokenizer.json` or `vocab.txt`. Weights are expected under the
//! `BertForSequenceClassification` names (`bert.*`, `bert.pooler.dense`,
//! `classifier`).

use crate::classifier::PhishingClassifier;
use crate::config::{InferenceConfig, PaddingPolicy};
use crate::device::{select_device, DeviceHandle};
use candle_core::{DType, Device, IndexOp, Tensor, D};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use phishguard_core::{Error, PredictionOutcome, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tokenizers::{Encoding, PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

const CONFIG_FILE: &str = "config.json";
const WEIGHTS_FILE: &str = "model.safetensors";
const TOKENIZER_FILE: &str = "tokenizer.json";
const VOCAB_FILE: &str = "vocab.txt";

const PAD_TOKEN: &str = "[PAD]";
const UNK_TOKEN: &str = "[UNK]";
const CLS_TOKEN: &str = "[CLS]";
const SEP_TOKEN: &str = "[SEP]";

/// Number of classes the head must produce
const NUM_LABELS: usize = 2;

/// Label section of a sequence-classification `config.json`
#[derive(Debug, Default, Deserialize)]
struct LabelConfig {
    #[serde(default)]
    id2label: HashMap<String, String>,
}

/// Loaded tokenizer and BERT sequence-classification model
///
/// Everything here is read-only after [`ModelLoader::initialize`], so one
/// instance can be shared across request handlers behind an `Arc`.
pub struct ModelLoader {
    name: String,
    tokenizer: Tokenizer,
    model: BertModel,
    pooler: Linear,
    classifier: Linear,
    device: Device,
    handle: DeviceHandle,
    labels: Vec<String>,
    config: InferenceConfig,
}

impl ModelLoader {
    /// Load the tokenizer and model and place them on the selected device.
    ///
    /// Errors are logged and returned; callers treat them as fatal.
    pub fn initialize(config: InferenceConfig) -> Result<Self> {
        match Self::load(config) {
            Ok(loader) => {
                tracing::info!(
                    model = %loader.name,
                    device = %loader.handle,
                    max_length = loader.config.max_length,
                    "Model loaded successfully on {}",
                    loader.handle
                );
                Ok(loader)
            }
            Err(e) => {
                tracing::error!("Error loading model: {}", e);
                Err(e)
            }
        }
    }

    fn load(config: InferenceConfig) -> Result<Self> {
        config.validate()?;

        let model_path = config.model_path.clone();
        if !model_path.is_dir() {
            return Err(Error::artifact(format!(
                "Model directory not found: {}",
                model_path.display()
            )));
        }

        let (handle, device) = select_device(config.device)?;
        tracing::debug!("Selected device: {}", handle);

        let mut tokenizer = load_tokenizer(&model_path)?;
        configure_tokenizer(&mut tokenizer, &config)?;

        let config_path = model_path.join(CONFIG_FILE);
        let bert_config: BertConfig = parse_json_config(&config_path)?;
        let label_config: LabelConfig = parse_json_config(&config_path)?;
        let labels = resolve_labels(&label_config)?;

        if config.phishing_class_index >= labels.len() {
            return Err(Error::config(format!(
                "phishing_class_index {} is out of range for {} labels",
                config.phishing_class_index,
                labels.len()
            )));
        }

        let vb = load_var_builder(&model_path, &device)?;
        let (model, backbone_vb) = load_bert_backbone(&vb, &bert_config)?;
        let pooler = candle_nn::linear(
            bert_config.hidden_size,
            bert_config.hidden_size,
            backbone_vb.pp("pooler").pp("dense"),
        )
        .map_err(|e| Error::artifact(format!("Failed to load pooler: {}", e)))?;
        let classifier = candle_nn::linear(bert_config.hidden_size, NUM_LABELS, vb.pp("classifier"))
            .map_err(|e| Error::artifact(format!("Failed to load classification head: {}", e)))?;

        Ok(Self {
            name: model_name(&model_path),
            tokenizer,
            model,
            pooler,
            classifier,
            device,
            handle,
            labels,
            config,
        })
    }

    /// Tokenize `text` with the configured truncation and padding
    pub fn encode(&self, text: &str) -> Result<Encoding> {
        self.tokenizer
            .encode(text, true)
            .map_err(|e| Error::tokenization(format!("Tokenization failed: {}", e)))
    }


    fn phishing_probability(&self, text: &str) -> Result<f64> {
        let start = Instant::now();
        let encoding = self.encode(text)?;

        tracing::debug!(
            tokens = encoding.get_ids().len(),
            truncated = !encoding.get_overflowing().is_empty(),
            "Encoded input"
        );

        let input_ids = batch_tensor(encoding.get_ids(), &self.device)?;
        let token_type_ids = batch_tensor(encoding.get_type_ids(), &self.device)?;
        let attention_mask = batch_tensor(encoding.get_attention_mask(), &self.device)?;

        let hidden_states = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(|e| Error::inference(format!("Model forward pass failed: {}", e)))?;

        let cls_embedding = hidden_states
            .i((.., 0, ..))
            .map_err(|e| Error::inference(format!("Failed to get CLS token: {}", e)))?;

        let pooled = self
            .pooler
            .forward(&cls_embedding)
            .and_then(|t| t.tanh())
            .map_err(|e| Error::inference(format!("Pooler failed: {}", e)))?;

        let logits = self
            .classifier
            .forward(&pooled)
            .map_err(|e| Error::inference(format!("Classification head failed: {}", e)))?;

        let probabilities = to_probabilities(&logits)?;
        let probability = probabilities
            .get(self.config.phishing_class_index)
            .copied()
            .ok_or_else(|| {
                Error::inference(format!(
                    "Expected {} class probabilities, got {}",
                    NUM_LABELS,
                    probabilities.len()
                ))
            })?;

        if !probability.is_finite() {
            return Err(Error::inference(format!(
                "Non-finite phishing probability: {}",
                probability
            )));
        }

        tracing::debug!(
            latency_us = start.elapsed().as_micros() as u64,
            probability,
            "Prediction complete"
        );

        Ok(f64::from(probability))
    }
}

impl PhishingClassifier for ModelLoader {
    fn predict(&self, text: &str) -> PredictionOutcome {
        let result = self.phishing_probability(text);
        if let Err(e) = &result {
            tracing::warn!("Prediction error: {}", e);
        }
        result.into()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn device(&self) -> DeviceHandle {
        self.handle
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn threshold(&self) -> f64 {
        self.config.threshold
    }
}

fn model_name(model_path: &Path) -> String {
    std::fs::canonicalize(model_path)
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "phishguard-model".to_string())
}

fn parse_json_config<T: DeserializeOwned>(config_path: &Path) -> Result<T> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        Error::artifact(format!(
            "Failed to read config {}: {}",
            config_path.display(),
            e
        ))
    })?;

    serde_json::from_str(&config_str).map_err(|e| {
        Error::artifact(format!(
            "Failed to parse config {}: {}",
            config_path.display(),
            e
        ))
    })
}

fn resolve_labels(label_config: &LabelConfig) -> Result<Vec<String>> {
    if label_config.id2label.is_empty() {
        return Ok(vec!["legitimate".to_string(), "phishing".to_string()]);
    }

    if label_config.id2label.len() != NUM_LABELS {
        return Err(Error::artifact(format!(
            "Expected a binary classification head, config declares {} labels",
            label_config.id2label.len()
        )));
    }

    (0..NUM_LABELS)
        .map(|idx| {
            label_config
                .id2label
                .get(&idx.to_string())
                .cloned()
                .ok_or_else(|| Error::artifact(format!("id2label is missing index {}", idx)))
        })
        .collect()
}

fn load_var_builder(model_path: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let weights_path = model_path.join(WEIGHTS_FILE);
    if !weights_path.exists() {
        return Err(Error::artifact(format!(
            "{} not found in {}",
            WEIGHTS_FILE,
            model_path.display()
        )));
    }

    let vb = unsafe {
        VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)
            .map_err(|e| Error::artifact(format!("Failed to load weights: {}", e)))?
    };

    Ok(vb)
}

/// Load the backbone, returning the builder scoped to the prefix that worked
fn load_bert_backbone(
    vb: &VarBuilder<'static>,
    config: &BertConfig,
) -> Result<(BertModel, VarBuilder<'static>)> {
    let mut errors = Vec::new();

    for prefix in ["bert", ""] {
        let vb_prefix = if prefix.is_empty() {
            vb.clone()
        } else {
            vb.pp(prefix)
        };
        let effective_prefix = if prefix.is_empty() { "<root>" } else { prefix };

        match BertModel::load(vb_prefix.clone(), config) {
            Ok(model) => {
                tracing::debug!("Loaded BERT backbone from '{}'", effective_prefix);
                return Ok((model, vb_prefix));
            }
            Err(e) => errors.push(format!("{}: {}", effective_prefix, e)),
        }
    }

    Err(Error::artifact(format!(
        "Failed to load BERT backbone with tried prefixes [{}]",
        errors.join(" | ")
    )))
}

fn load_tokenizer(model_path: &Path) -> Result<Tokenizer> {
    let tokenizer_json_path = model_path.join(TOKENIZER_FILE);
    if tokenizer_json_path.exists() {
        tracing::debug!("Loading tokenizer from {}", TOKENIZER_FILE);
        return Tokenizer::from_file(&tokenizer_json_path)
            .map_err(|e| Error::artifact(format!("Failed to load {}: {}", TOKENIZER_FILE, e)));
    }

    let vocab_path = model_path.join(VOCAB_FILE);
    if vocab_path.exists() {
        tracing::debug!("Building tokenizer from {}", VOCAB_FILE);
        return build_wordpiece_tokenizer(&vocab_path);
    }

    Err(Error::artifact(format!(
        "No tokenizer found in {} (tried {}, {})",
        model_path.display(),
        TOKENIZER_FILE,
        VOCAB_FILE
    )))
}

fn build_wordpiece_tokenizer(vocab_path: &Path) -> Result<Tokenizer> {
    use tokenizers::models::wordpiece::WordPiece;
    use tokenizers::normalizers::BertNormalizer;
    use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
    use tokenizers::processors::bert::BertProcessing;

    let wordpiece = WordPiece::from_file(vocab_path.to_string_lossy().as_ref())
        .unk_token(UNK_TOKEN.to_string())
        .build()
        .map_err(|e| Error::artifact(format!("Failed to build WordPiece model: {}", e)))?;

    let mut tokenizer = Tokenizer::new(wordpiece);
    tokenizer.with_normalizer(Some(BertNormalizer::default()));
    tokenizer.with_pre_tokenizer(Some(BertPreTokenizer));

    let special_id = |token: &str| {
        tokenizer
            .token_to_id(token)
            .ok_or_else(|| Error::artifact(format!("{} missing from {}", token, VOCAB_FILE)))
    };
    let sep = (SEP_TOKEN.to_string(), special_id(SEP_TOKEN)?);
    let cls = (CLS_TOKEN.to_string(), special_id(CLS_TOKEN)?);
    tokenizer.with_post_processor(Some(BertProcessing::new(sep, cls)));

    Ok(tokenizer)
}

/// Apply the truncation and padding policy, overriding whatever the
/// artifact's tokenizer shipped with
fn configure_tokenizer(tokenizer: &mut Tokenizer, config: &InferenceConfig) -> Result<()> {
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: config.max_length,
            ..Default::default()
        }))
        .map_err(|e| Error::config(format!("Failed to configure truncation: {}", e)))?;

    let strategy = match config.padding {
        PaddingPolicy::Longest => PaddingStrategy::BatchLongest,
        PaddingPolicy::Fixed => PaddingStrategy::Fixed(config.max_length),
    };
    let pad_id = tokenizer.token_to_id(PAD_TOKEN).unwrap_or(0);

    tokenizer.with_padding(Some(PaddingParams {
        strategy,
        pad_id,
        pad_token: PAD_TOKEN.to_string(),
        ..Default::default()
    }));

    Ok(())
}

fn batch_tensor(values: &[u32], device: &Device) -> Result<Tensor> {
    Tensor::new(values, device)
        .and_then(|t| t.unsqueeze(0))
        .map_err(|e| Error::inference(format!("Failed to create input tensor: {}", e)))
}

fn to_probabilities(logits: &Tensor) -> Result<Vec<f32>> {
    candle_nn::ops::softmax(logits, D::Minus1)
        .map_err(|e| Error::inference(format!("Softmax failed: {}", e)))?
        .squeeze(0)
        .map_err(|e| Error::inference(format!("Squeeze failed: {}", e)))?
        .to_vec1()
        .map_err(|e| Error::inference(format!("Failed to convert to vec: {}", e)))
}
