//! Model loader integration tests
//!
//! Builds a tiny randomly initialised BERT sequence classifier on disk, laid
//! out like a `save_pretrained` directory, and drives the real loader against
//! it. Scores are meaningless; the tests check the inference contract.

use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use phishguard_classifier::{
    DeviceHandle, DevicePreference, InferenceConfig, ModelLoader, PaddingPolicy,
    PhishingClassifier,
};
use phishguard_core::{Error, PredictionOutcome};
use std::path::Path;
use tempfile::TempDir;

const HIDDEN_SIZE: usize = 8;

fn vocab() -> Vec<String> {
    let mut tokens: Vec<String> = ["[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]"]
        .iter()
        .map(|t| t.to_string())
        .collect();

    for word in ["http", "https", "www", "com", "login", "secure", "paypal", "verify"] {
        tokens.push(word.to_string());
    }
    for c in ('a'..='z').chain('0'..='9') {
        tokens.push(c.to_string());
        tokens.push(format!("##{}", c));
    }
    for p in [":", "/", ".", "-", "_", "?", "=", "&"] {
        tokens.push(p.to_string());
    }
    tokens
}

fn bert_config_json(vocab_size: usize) -> String {
    format!(
        r#"{{
  "architectures": ["BertForSequenceClassification"],
  "model_type": "bert",
  "vocab_size": {vocab_size},
  "hidden_size": {HIDDEN_SIZE},
  "num_hidden_layers": 1,
  "num_attention_heads": 2,
  "intermediate_size": 16,
  "hidden_act": "gelu",
  "hidden_dropout_prob": 0.1,
  "attention_probs_dropout_prob": 0.1,
  "max_position_embeddings": 128,
  "type_vocab_size": 2,
  "initializer_range": 0.02,
  "layer_norm_eps": 1e-12,
  "pad_token_id": 0,
  "position_embedding_type": "absolute",
  "use_cache": true,
  "classifier_dropout": null,
  "id2label": {{"0": "legitimate", "1": "phishing"}},
  "label2id": {{"legitimate": 0, "phishing": 1}}
}}"#
    )
}

/// Write config.json, vocab.txt and model.safetensors into a fresh directory
fn write_tiny_artifact() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let tokens = vocab();

    std::fs::write(dir.path().join("vocab.txt"), tokens.join("\n")).unwrap();

    let config_json = bert_config_json(tokens.len());
    std::fs::write(dir.path().join("config.json"), &config_json).unwrap();

    let config: BertConfig = serde_json::from_str(&config_json).unwrap();
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    BertModel::load(vb.pp("bert"), &config).unwrap();
    candle_nn::linear(HIDDEN_SIZE, HIDDEN_SIZE, vb.pp("bert").pp("pooler").pp("dense")).unwrap();
    candle_nn::linear(HIDDEN_SIZE, 2, vb.pp("classifier")).unwrap();
    varmap.save(dir.path().join("model.safetensors")).unwrap();

    dir
}

fn cpu_config(path: &Path) -> InferenceConfig {
    InferenceConfig::from_local(path).with_device(DevicePreference::Cpu)
}

fn load(path: &Path) -> ModelLoader {
    match ModelLoader::initialize(cpu_config(path)) {
        Ok(loader) => loader,
        Err(e) => panic!("Failed to load tiny model: {}", e),
    }
}

fn probability(outcome: PredictionOutcome) -> f64 {
    match outcome {
        PredictionOutcome::Success { probability } => probability,
        PredictionOutcome::Failure { reason } => panic!("Prediction failed: {}", reason),
    }
}

#[test]
fn test_initialize_from_vocab_artifact() {
    let dir = write_tiny_artifact();
    let loader = load(dir.path());

    assert_eq!(loader.device(), DeviceHandle::Cpu);
    assert_eq!(loader.labels(), &["legitimate".to_string(), "phishing".to_string()]);
    assert_eq!(loader.threshold(), 0.5);
    assert!(!loader.name().is_empty());
}

#[test]
fn test_probability_in_unit_interval() {
    let dir = write_tiny_artifact();
    let loader = load(dir.path());

    let inputs = [
        "http://paypal-secure-login.verify-account.tk/reset",
        "https://www.example.com",
        "",
        "   ",
        "ünïcödé 🎣 ドメイン",
    ];

    for text in inputs {
        let p = probability(loader.predict(text));
        assert!((0.0..=1.0).contains(&p), "{:?} scored {}", text, p);
    }
}

#[test]
fn test_prediction_is_deterministic() {
    let dir = write_tiny_artifact();
    let loader = load(dir.path());
    let text = "http://paypal-secure-login.verify-account.tk/reset";

    let first = probability(loader.predict(text));
    for _ in 0..5 {
        assert_eq!(probability(loader.predict(text)), first);
    }
}

#[test]
fn test_long_input_is_truncated_not_rejected() {
    let dir = write_tiny_artifact();
    let loader = load(dir.path());
    let long_text = format!("http://{}.com/login", "a.".repeat(2_000));

    let encoding = loader.encode(&long_text).unwrap();
    assert_eq!(encoding.get_ids().len(), 64);

    let p = probability(loader.predict(&long_text));
    assert!((0.0..=1.0).contains(&p));
}

#[test]
fn test_fixed_padding_matches_longest() {
    let dir = write_tiny_artifact();
    let longest = load(dir.path());
    let fixed = match ModelLoader::initialize(
        cpu_config(dir.path()).with_padding(PaddingPolicy::Fixed),
    ) {
        Ok(loader) => loader,
        Err(e) => panic!("Failed to load tiny model: {}", e),
    };

    let text = "https://secure.paypal.com";
    let encoding = fixed.encode(text).unwrap();
    assert_eq!(encoding.get_ids().len(), 64);
    assert!(encoding.get_attention_mask().contains(&0));

    let a = probability(longest.predict(text));
    let b = probability(fixed.predict(text));
    assert!((a - b).abs() < 1e-4, "padding changed the score: {} vs {}", a, b);
}

#[test]
fn test_prefers_tokenizer_json_when_present() {
    let dir = write_tiny_artifact();
    std::fs::write(dir.path().join("tokenizer.json"), "not a tokenizer").unwrap();

    match ModelLoader::initialize(cpu_config(dir.path())) {
        Err(Error::Artifact(msg)) => assert!(msg.contains("tokenizer.json")),
        Err(e) => panic!("Unexpected error: {}", e),
        Ok(_) => panic!("Expected corrupt tokenizer.json to fail"),
    }
}

#[test]
fn test_missing_weights_is_fatal() {
    let dir = write_tiny_artifact();
    std::fs::remove_file(dir.path().join("model.safetensors")).unwrap();

    match ModelLoader::initialize(cpu_config(dir.path())) {
        Err(e) => {
            assert!(e.is_fatal());
            assert!(e.to_string().contains("model.safetensors"));
        }
        Ok(_) => panic!("Expected missing weights to fail"),
    }
}

#[test]
fn test_empty_directory_is_fatal() {
    let dir = tempfile::tempdir().unwrap();

    match ModelLoader::initialize(cpu_config(dir.path())) {
        Err(e) => assert!(e.is_fatal()),
        Ok(_) => panic!("Expected empty artifact directory to fail"),
    }
}

#[test]
fn test_phishing_index_out_of_range() {
    let dir = write_tiny_artifact();
    let mut config = cpu_config(dir.path());
    config.phishing_class_index = 2;

    assert!(matches!(
        ModelLoader::initialize(config),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_shared_across_threads() {
    let dir = write_tiny_artifact();
    let loader = std::sync::Arc::new(load(dir.path()));
    let text = "http://verify-login.com";
    let expected = probability(loader.predict(text));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let loader = loader.clone();
            std::thread::spawn(move || probability(loader.predict(text)))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
