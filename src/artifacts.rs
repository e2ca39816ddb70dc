//! Persistence of trained artifact pairs under a per-model directory.
//!
//! Artifacts are keyed by a sanitized form of the model's display name, not
//! its id, so two models with the same name share (and clobber) one
//! directory. Writers staging a new pair go through a per-name lock and a
//! temp-file/rename swap, so a crash mid-write never leaves a truncated
//! artifact behind; readers are not synchronized against writers.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex};

use thiserror::Error;

use crate::ml::ArtifactPair;
use crate::ml::bayes::MultinomialBayes;
use crate::ml::vectorizer::CountVectorizer;

/// Filename of the serialized vectorizer inside a model directory.
pub const VECTORIZER_FILE_NAME: &str = "vectorizer.json";
/// Filename of the serialized classifier inside a model directory.
pub const CLASSIFIER_FILE_NAME: &str = "classifier.json";

static WRITE_LOCKS: LazyLock<Mutex<HashMap<String, Arc<Mutex<()>>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Errors returned when saving or loading artifact pairs.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// No trained artifacts exist for the model name.
    #[error("Model {name:?} has not been trained yet")]
    NotTrained { name: String },
    /// Failed to create the model's artifact directory.
    #[error("Failed to create artifact directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to write or swap an artifact file.
    #[error("Failed to write artifact {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to read an artifact file.
    #[error("Failed to read artifact {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// An artifact file held malformed JSON.
    #[error("Failed to parse artifact {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// An artifact file parsed but failed structural validation.
    #[error("Invalid artifact {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Directory name for a model: lowercased, spaces and slashes replaced.
pub fn artifact_dir_name(model_name: &str) -> String {
    model_name.to_lowercase().replace([' ', '/'], "_")
}

/// Directory holding a model's artifact pair.
pub fn model_dir(models_root: &Path, model_name: &str) -> PathBuf {
    models_root.join(artifact_dir_name(model_name))
}

/// Persist a fitted pair, replacing any previous pair for this model name.
///
/// Both files are fully staged under temporary names before either rename, so
/// the previous pair stays intact until the new one is complete on disk.
pub fn save_artifacts(
    models_root: &Path,
    model_name: &str,
    pair: &ArtifactPair,
) -> Result<(), ArtifactError> {
    let lock = write_lock_for(model_name);
    let _guard = lock.lock().expect("artifact write lock poisoned");

    let dir = model_dir(models_root, model_name);
    std::fs::create_dir_all(&dir).map_err(|source| ArtifactError::CreateDir {
        path: dir.clone(),
        source,
    })?;

    let vectorizer_path = dir.join(VECTORIZER_FILE_NAME);
    let classifier_path = dir.join(CLASSIFIER_FILE_NAME);
    let vectorizer_json =
        serde_json::to_vec_pretty(&pair.vectorizer).map_err(|source| ArtifactError::Json {
            path: vectorizer_path.clone(),
            source,
        })?;
    let classifier_json =
        serde_json::to_vec_pretty(&pair.classifier).map_err(|source| ArtifactError::Json {
            path: classifier_path.clone(),
            source,
        })?;

    let staged_vectorizer = stage_file(&vectorizer_path, &vectorizer_json)?;
    let staged_classifier = match stage_file(&classifier_path, &classifier_json) {
        Ok(path) => path,
        Err(err) => {
            let _ = std::fs::remove_file(&staged_vectorizer);
            return Err(err);
        }
    };

    if let Err(err) = swap_into_place(&staged_vectorizer, &vectorizer_path) {
        let _ = std::fs::remove_file(&staged_classifier);
        return Err(err);
    }
    swap_into_place(&staged_classifier, &classifier_path)
}

/// Load the persisted pair for a model name.
///
/// Fails with [`ArtifactError::NotTrained`] when either file is missing.
pub fn load_artifacts(models_root: &Path, model_name: &str) -> Result<ArtifactPair, ArtifactError> {
    let dir = model_dir(models_root, model_name);
    let vectorizer_path = dir.join(VECTORIZER_FILE_NAME);
    let classifier_path = dir.join(CLASSIFIER_FILE_NAME);
    if !vectorizer_path.is_file() || !classifier_path.is_file() {
        return Err(ArtifactError::NotTrained {
            name: model_name.to_string(),
        });
    }

    let vectorizer: CountVectorizer = read_json(&vectorizer_path)?;
    vectorizer
        .validate()
        .map_err(|reason| ArtifactError::Invalid {
            path: vectorizer_path,
            reason,
        })?;
    let classifier: MultinomialBayes = read_json(&classifier_path)?;
    classifier
        .validate()
        .map_err(|reason| ArtifactError::Invalid {
            path: classifier_path.clone(),
            reason,
        })?;
    if classifier.feature_log_prob[0].len() != vectorizer.vocabulary_len() {
        return Err(ArtifactError::Invalid {
            path: classifier_path,
            reason: "Classifier feature width does not match vectorizer vocabulary".to_string(),
        });
    }

    Ok(ArtifactPair {
        vectorizer,
        classifier,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let bytes = std::fs::read(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_lock_for(model_name: &str) -> Arc<Mutex<()>> {
    let mut locks = WRITE_LOCKS.lock().expect("artifact lock table poisoned");
    locks
        .entry(artifact_dir_name(model_name))
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone()
}

/// Write `data` to a fresh temporary file next to `path` and return its name.
fn stage_file(path: &Path, data: &[u8]) -> Result<PathBuf, ArtifactError> {
    use rand::TryRngCore;

    let dir = path.parent().ok_or_else(|| ArtifactError::Write {
        path: path.to_path_buf(),
        source: std::io::Error::other("artifact path has no parent directory"),
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());

    let mut last_err = None;
    for _ in 0..5 {
        let mut bytes = [0u8; 6];
        rand::rngs::OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|source| ArtifactError::Write {
                path: path.to_path_buf(),
                source: std::io::Error::other(format!(
                    "failed to generate temporary file suffix: {source}"
                )),
            })?;
        let suffix: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        let tmp_path = dir.join(format!("{file_name}.tmp-{suffix}"));

        let file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path);
        let mut file = match file {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                last_err = Some(err);
                continue;
            }
            Err(source) => {
                return Err(ArtifactError::Write {
                    path: tmp_path,
                    source,
                });
            }
        };

        if let Err(source) = file.write_all(data).and_then(|_| file.sync_all()) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(ArtifactError::Write {
                path: tmp_path,
                source,
            });
        }
        return Ok(tmp_path);
    }

    Err(ArtifactError::Write {
        path: path.to_path_buf(),
        source: last_err
            .unwrap_or_else(|| std::io::Error::other("could not create temporary file")),
    })
}

fn swap_into_place(tmp_path: &Path, path: &Path) -> Result<(), ArtifactError> {
    replace_file(tmp_path, path).map_err(|source| {
        let _ = std::fs::remove_file(tmp_path);
        ArtifactError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn replace_file(tmp_path: &Path, path: &Path) -> std::io::Result<()> {
    #[cfg(windows)]
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    std::fs::rename(tmp_path, path)
}
