//! Local sentence-transformer embeddings (fastembed / ONNX runtime)
//!
//! Runs `all-MiniLM-L6-v2` locally. The model is downloaded on first use into
//! `FASTEMBED_CACHE_PATH`, else `<cache dir>/cvm/fastembed`.
//!
//! ## Configuration
//!
//! ```toml
//! [search]
//! embedding_backend = "minilm"
//! ```

use std::path::PathBuf;
use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::{info, warn};

use crate::error::{CvmError, Result};
use crate::search::embeddings::Embedder;

pub const MINILM_DIMS: usize = 384;
pub const MINILM_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

const BATCH_SIZE: usize = 32;

fn cache_dir() -> PathBuf {
    if let Ok(path) = std::env::var("FASTEMBED_CACHE_PATH") {
        return PathBuf::from(path);
    }
    dirs::cache_dir().map_or_else(
        || PathBuf::from(".fastembed_cache"),
        |dir| dir.join("cvm").join("fastembed"),
    )
}

/// `all-MiniLM-L6-v2` through fastembed.
pub struct MiniLmEmbedder {
    model: Mutex<TextEmbedding>,
}

impl MiniLmEmbedder {
    /// Load the model, downloading it if it is not cached yet.
    pub fn new() -> Result<Self> {
        let cache_dir = cache_dir();
        if let Err(err) = std::fs::create_dir_all(&cache_dir) {
            warn!(path = %cache_dir.display(), error = %err, "failed to create model cache dir");
        }

        let options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(false)
            .with_cache_dir(cache_dir);
        let model = TextEmbedding::try_new(options)
            .map_err(|e| CvmError::Embedding(format!("load {MINILM_MODEL}: {e}")))?;

        info!(model = MINILM_MODEL, "loaded sentence embedding model");
        Ok(Self {
            model: Mutex::new(model),
        })
    }

    fn run(&self, texts: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        let expected = texts.len();
        let mut model = self
            .model
            .lock()
            .map_err(|_| CvmError::Embedding("embedding model lock poisoned".to_string()))?;
        let vectors = model
            .embed(texts, Some(BATCH_SIZE))
            .map_err(|e| CvmError::Embedding(e.to_string()))?;
        if vectors.len() != expected {
            return Err(CvmError::Embedding(format!(
                "model returned {} vectors for {expected} texts",
                vectors.len()
            )));
        }
        Ok(vectors)
    }
}

impl Embedder for MiniLmEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.run(vec![text])?
            .pop()
            .ok_or_else(|| CvmError::Embedding("no embedding generated".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.run(texts.to_vec())
    }

    fn dims(&self) -> usize {
        MINILM_DIMS
    }

    fn name(&self) -> &str {
        MINILM_MODEL
    }
}
