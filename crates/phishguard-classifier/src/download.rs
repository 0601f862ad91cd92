//! Fetch a classifier artifact from the Hugging Face Hub into a local directory

use hf_hub::{api::sync::Api, Repo, RepoType};
use phishguard_core::{Error, Result};
use std::path::{Path, PathBuf};

/// Model served by default
pub const DEFAULT_REPO: &str = "CrabInHoney/urlbert-tiny-v4-phishing-classifier";

/// Files the loader cannot start without
const REQUIRED_FILES: &[&str] = &["config.json", "model.safetensors"];

/// Tokenizer files; at least one must be present
const TOKENIZER_FILES: &[&str] = &["tokenizer.json", "vocab.txt", "tokenizer_config.json"];

/// Download the artifact files of `repo_id` at `revision` into `dest`.
///
/// Returns the paths written under `dest`.
pub fn download_artifacts(repo_id: &str, revision: &str, dest: &Path) -> Result<Vec<PathBuf>> {
    tracing::info!("Downloading model from HuggingFace: {} @ {}", repo_id, revision);

    let api = Api::new()
        .map_err(|e| Error::download(format!("Failed to initialize HuggingFace API: {}", e)))?;
    let repo = api.repo(Repo::with_revision(
        repo_id.to_string(),
        RepoType::Model,
        revision.to_string(),
    ));

    std::fs::create_dir_all(dest)?;

    let mut written = Vec::new();
    for file in REQUIRED_FILES {
        tracing::debug!("Downloading {}", file);
        let cached = repo
            .get(file)
            .map_err(|e| Error::download(format!("Failed to download {}: {}", file, e)))?;
        written.push(copy_into(&cached, dest, file)?);
    }

    for file in TOKENIZER_FILES {
        match repo.get(file) {
            Ok(cached) => written.push(copy_into(&cached, dest, file)?),
            Err(e) => tracing::debug!("Optional file {} unavailable: {}", file, e),
        }
    }

    if !has_tokenizer(dest) {
        return Err(Error::download(format!(
            "{} provides neither tokenizer.json nor vocab.txt",
            repo_id
        )));
    }

    tracing::info!("Model downloaded to: {}", dest.display());
    Ok(written)
}

fn copy_into(cached: &Path, dest: &Path, file: &str) -> Result<PathBuf> {
    let target = dest.join(file);
    std::fs::copy(cached, &target).map_err(|e| {
        Error::download(format!(
            "Failed to copy {} to {}: {}",
            file,
            target.display(),
            e
        ))
    })?;
    Ok(target)
}

/// Whether `dir` holds a tokenizer the loader can read
pub fn has_tokenizer(dir: &Path) -> bool {
    dir.join("tokenizer.json").exists() || dir.join("vocab.txt").exists()
}
