//! Hash embeddings
//!
//! Implements FNV-1a based feature-hashing embeddings for résumé and job
//! description text. No ML model dependencies - fully deterministic, so the
//! same text always maps to the same vector across processes.
//!
//! Every token (and adjacent-token bigram) is projected onto all dimensions
//! with a pseudo-random sign, so texts sharing no features come out close to
//! orthogonal at any dimension.

use crate::config::SearchConfig;
use crate::error::{CvmError, Result};

/// Pluggable embedding backend interface.
///
/// `name` identifies the model that produced a vector; the embedding store
/// records it per entry so vectors from different models are never compared.
pub trait Embedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
    fn dims(&self) -> usize;
    fn name(&self) -> &str;

    /// Embed many texts at once, in input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

/// Build an embedder from search config.
pub fn build_embedder(config: &SearchConfig) -> Result<Box<dyn Embedder>> {
    let backend = config.embedding_backend.trim().to_lowercase();
    let dims = config.embedding_dims as usize;
    if dims == 0 {
        return Err(CvmError::Config(
            "search.embedding_dims must be greater than 0".to_string(),
        ));
    }

    match backend.as_str() {
        "" | "hash" => Ok(Box::new(HashEmbedder::new(dims))),
        "minilm" => build_minilm(dims),
        other => Err(CvmError::Config(format!(
            "unknown embedding backend: {other}"
        ))),
    }
}

#[cfg(feature = "minilm")]
fn build_minilm(dims: usize) -> Result<Box<dyn Embedder>> {
    use crate::search::embeddings_local::{MINILM_DIMS, MiniLmEmbedder};

    if dims != MINILM_DIMS {
        tracing::warn!(
            configured = dims,
            model_dims = MINILM_DIMS,
            "search.embedding_dims is ignored by the minilm backend"
        );
    }
    Ok(Box::new(MiniLmEmbedder::new()?))
}

#[cfg(not(feature = "minilm"))]
fn build_minilm(_dims: usize) -> Result<Box<dyn Embedder>> {
    Err(CvmError::Config(
        "embedding backend 'minilm' requires a cvm built with `--features minilm`".to_string(),
    ))
}

/// Hash embedder using FNV-1a
pub struct HashEmbedder {
    /// Embedding dimension (default: 384)
    dim: usize,
    name: String,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

impl HashEmbedder {
    /// Create embedder with specified dimension
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            name: format!("hash-fnv1a-{dim}"),
        }
    }

    /// Embed text into vector
    #[must_use]
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        if self.dim == 0 {
            return Vec::new();
        }

        let tokens = tokenize(text);
        let mut embedding = vec![0.0; self.dim];

        if tokens.is_empty() {
            return embedding;
        }

        for token in &tokens {
            accumulate_embedding(&mut embedding, token, 1.0);
        }

        for window in tokens.windows(2) {
            let bigram = format!("{} {}", window[0], window[1]);
            accumulate_embedding(&mut embedding, &bigram, 0.5);
        }

        l2_normalize(&mut embedding);
        embedding
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    fn dims(&self) -> usize {
        self.dim
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    lowered
        .split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|token| token.len() >= 2)
        .map(ToString::to_string)
        .collect()
}

fn accumulate_embedding(embedding: &mut [f32], token: &str, weight: f32) {
    let token_hash = fnv1a_hash(token.as_bytes());

    for (i, value) in embedding.iter_mut().enumerate() {
        // FNV low bits barely change with the salt; only use mixed bits.
        let dim_hash = mix64(fnv1a_hash_with_salt(token_hash, i as u64));
        *value += if dim_hash >> 63 == 0 { weight } else { -weight };
    }
}

/// splitmix64 finalizer.
const fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

fn fnv1a_hash_with_salt(seed: u64, salt: u64) -> u64 {
    let mut bytes = [0u8; 16];
    bytes[..8].copy_from_slice(&seed.to_le_bytes());
    bytes[8..].copy_from_slice(&salt.to_le_bytes());
    fnv1a_hash(&bytes)
}

fn fnv1a_hash(data: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    let mut hash = FNV_OFFSET;
    for byte in data {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn l2_normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vec.iter_mut() {
            *value /= norm;
        }
    }
}
