//! File-backed embedding store.
//!
//! All candidate vectors live in one artifact, `cv_embeddings.bin`, next to a
//! `cv_metadata.json` sidecar. Bulk precompute and single-key upserts both
//! rewrite that artifact, so there is exactly one persisted representation.
//!
//! ## Artifact layout (little endian)
//!
//! ```text
//! magic    b"CVMEMB01"
//! version  u32
//! dims     u32
//! count    u64
//! entries  count x { id: i64, model_len: u16, model: [u8], vector: dims x f16 }
//! sha256   [u8; 32] over every preceding byte
//! ```
//!
//! Writes land in a temp file in the same directory and are renamed over the
//! artifact. An advisory lock file orders writers (exclusive) against readers
//! (shared) across processes.
//!
//! The binary artifact is authoritative: it carries each entry's model, and
//! nothing in cvm reads the sidecar back. The sidecar is a human-readable
//! view regenerated after every artifact write, so a crash between the two
//! renames can leave it one write behind until the next write.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use half::f16;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{CvmError, Result};
use crate::search::Embedder;

const MAGIC: &[u8; 8] = b"CVMEMB01";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 8 + 4 + 4 + 8;
const CHECKSUM_LEN: usize = 32;

pub const ARTIFACT_FILENAME: &str = "cv_embeddings.bin";
pub const METADATA_FILENAME: &str = "cv_metadata.json";
const LOCK_FILENAME: &str = "cv_embeddings.lock";
const PRECOMPUTE_BATCH: usize = 32;

/// One stored vector and the model that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEmbedding {
    pub vector: Vec<f32>,
    pub model: String,
}

/// Every stored vector, keyed and ordered by candidate id.
pub type EmbeddingCollection = BTreeMap<i64, StoredEmbedding>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingStats {
    pub exists: bool,
    pub count: usize,
    pub dims: Option<usize>,
    pub models: Vec<String>,
    pub file_size_bytes: u64,
    pub file_size_mb: f64,
    pub checksum: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrecomputeReport {
    pub count: usize,
    pub model: String,
    pub dims: usize,
}

/// Persistence for candidate embedding vectors.
pub trait EmbeddingStore {
    fn get(&self, candidate_id: i64) -> Result<Option<StoredEmbedding>>;

    /// Insert or replace a single candidate's vector, keeping every other
    /// entry.
    fn put_one(&self, candidate_id: i64, vector: &[f32], model: &str) -> Result<()>;

    /// Replace the whole collection.
    fn put_all(&self, entries: BTreeMap<i64, Vec<f32>>, model: &str) -> Result<()>;

    /// Empty when nothing has been stored yet.
    fn load_all(&self) -> Result<EmbeddingCollection>;

    fn stats(&self) -> Result<EmbeddingStats>;
}

/// Embed every candidate's text and replace the stored collection.
///
/// Fails with [`CvmError::NoCandidates`] without touching the store when
/// `candidates` is empty.
pub fn precompute_all(
    store: &dyn EmbeddingStore,
    embedder: &dyn Embedder,
    candidates: &[(i64, String)],
) -> Result<PrecomputeReport> {
    precompute_all_with_progress(store, embedder, candidates, |_| {})
}

/// [`precompute_all`] with a callback invoked with the running count after
/// each embedded batch.
pub fn precompute_all_with_progress(
    store: &dyn EmbeddingStore,
    embedder: &dyn Embedder,
    candidates: &[(i64, String)],
    mut on_progress: impl FnMut(usize),
) -> Result<PrecomputeReport> {
    if candidates.is_empty() {
        return Err(CvmError::NoCandidates);
    }

    let mut entries = BTreeMap::new();
    let mut done = 0;
    for chunk in candidates.chunks(PRECOMPUTE_BATCH) {
        let texts: Vec<&str> = chunk.iter().map(|(_, text)| text.as_str()).collect();
        let vectors = embedder.embed_batch(&texts)?;
        for ((candidate_id, _), vector) in chunk.iter().zip(vectors) {
            entries.insert(*candidate_id, vector);
        }
        done += chunk.len();
        on_progress(done);
    }

    let count = entries.len();
    store.put_all(entries, embedder.name())?;

    info!(count, model = embedder.name(), "precomputed candidate embeddings");
    Ok(PrecomputeReport {
        count,
        model: embedder.name().to_string(),
        dims: embedder.dims(),
    })
}

// =============================================================================
// FILE STORE
// =============================================================================

/// [`EmbeddingStore`] persisted under a single directory.
#[derive(Debug, Clone)]
pub struct FileEmbeddingStore {
    dir: PathBuf,
}

impl FileEmbeddingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.dir.join(ARTIFACT_FILENAME)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILENAME)
    }

    fn lock(&self, exclusive: bool) -> Result<ArtifactLock> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(LOCK_FILENAME);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| CvmError::LockFailed(format!("open {}: {e}", path.display())))?;

        let locked = if exclusive {
            file.lock_exclusive()
        } else {
            file.lock_shared()
        };
        locked.map_err(|e| CvmError::LockFailed(format!("lock {}: {e}", path.display())))?;

        Ok(ArtifactLock { file })
    }

    fn read_unlocked(&self) -> Result<Option<DecodedArtifact>> {
        let path = self.artifact_path();
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)?;
        decode_artifact(&bytes).map(Some)
    }

    fn write_unlocked(&self, dims: usize, entries: &EmbeddingCollection) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let bytes = encode_artifact(dims, entries)?;
        write_atomic(&self.dir, &self.artifact_path(), &bytes)?;

        // Derived view; the artifact above is already committed.

        let metadata: BTreeMap<String, MetadataEntry> = entries
            .iter()
            .map(|(id, entry)| {
                (
                    id.to_string(),
                    MetadataEntry {
                        model: entry.model.clone(),
                    },
                )
            })
            .collect();
        let json = serde_json::to_vec_pretty(&metadata)?;
        write_atomic(&self.dir, &self.metadata_path(), &json)?;

        debug!(
            path = %self.artifact_path().display(),
            count = entries.len(),
            dims,
            "wrote embedding artifact"
        );
        Ok(())
    }
}

impl EmbeddingStore for FileEmbeddingStore {
    fn get(&self, candidate_id: i64) -> Result<Option<StoredEmbedding>> {
        Ok(self.load_all()?.remove(&candidate_id))
    }

    fn put_one(&self, candidate_id: i64, vector: &[f32], model: &str) -> Result<()> {
        let _lock = self.lock(true)?;
        let current = self.read_unlocked()?;

        let (dims, mut entries) = match current {
            Some(artifact) if !artifact.entries.is_empty() => {
                if artifact.dims != vector.len() {
                    return Err(CvmError::DimensionMismatch {
                        expected: artifact.dims,
                        actual: vector.len(),
                    });
                }
                if let Some(other) = artifact.entries.values().find(|e| e.model != model) {
                    return Err(CvmError::ModelMismatch {
                        expected: other.model.clone(),
                        actual: model.to_string(),
                    });
                }
                (artifact.dims, artifact.entries)
            }
            _ => (vector.len(), BTreeMap::new()),
        };

        entries.insert(
            candidate_id,
            StoredEmbedding {
                vector: vector.to_vec(),
                model: model.to_string(),
            },
        );
        self.write_unlocked(dims, &entries)
    }

    fn put_all(&self, entries: BTreeMap<i64, Vec<f32>>, model: &str) -> Result<()> {
        let dims = entries.values().next().map_or(0, Vec::len);
        if let Some(bad) = entries.values().find(|v| v.len() != dims) {
            return Err(CvmError::DimensionMismatch {
                expected: dims,
                actual: bad.len(),
            });
        }

        let collection: EmbeddingCollection = entries
            .into_iter()
            .map(|(id, vector)| {
                (
                    id,
                    StoredEmbedding {
                        vector,
                        model: model.to_string(),
                    },
                )
            })
            .collect();

        let _lock = self.lock(true)?;
        self.write_unlocked(dims, &collection)
    }

    fn load_all(&self) -> Result<EmbeddingCollection> {
        if !self.artifact_path().exists() {
            return Ok(BTreeMap::new());
        }
        let _lock = self.lock(false)?;
        Ok(self
            .read_unlocked()?
            .map(|artifact| artifact.entries)
            .unwrap_or_default())
    }

    fn stats(&self) -> Result<EmbeddingStats> {
        let path = self.artifact_path();
        if !path.exists() {
            return Ok(EmbeddingStats {
                exists: false,
                count: 0,
                dims: None,
                models: Vec::new(),
                file_size_bytes: 0,
                file_size_mb: 0.0,
                checksum: None,
            });
        }

        let _lock = self.lock(false)?;
        let bytes = std::fs::read(&path)?;
        let artifact = decode_artifact(&bytes)?;
        let models: BTreeSet<String> = artifact
            .entries
            .values()
            .map(|e| e.model.clone())
            .collect();
        let file_size_bytes = bytes.len() as u64;
        let file_size_mb = (file_size_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0;

        Ok(EmbeddingStats {
            exists: true,
            count: artifact.entries.len(),
            dims: (!artifact.entries.is_empty()).then_some(artifact.dims),
            models: models.into_iter().collect(),
            file_size_bytes,
            file_size_mb,
            checksum: Some(hex::encode(&bytes[bytes.len() - CHECKSUM_LEN..])),
        })
    }
}

/// Held for the duration of one store operation.
struct ArtifactLock {
    file: File,
}

impl Drop for ArtifactLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            debug!("Failed to release embedding lock: {}", e);
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MetadataEntry {
    model: String,
}

fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> Result<()> {
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(target).map_err(|e| CvmError::Io(e.error))?;
    Ok(())
}

// =============================================================================
// CODEC
// =============================================================================

struct DecodedArtifact {
    dims: usize,
    entries: EmbeddingCollection,
}

fn encode_artifact(dims: usize, entries: &EmbeddingCollection) -> Result<Vec<u8>> {
    let dims_u32 = u32::try_from(dims)
        .map_err(|_| CvmError::Serialization(format!("dimension {dims} too large")))?;

    let mut out = Vec::with_capacity(HEADER_LEN + entries.len() * (16 + dims * 2) + CHECKSUM_LEN);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&dims_u32.to_le_bytes());
    out.extend_from_slice(&(entries.len() as u64).to_le_bytes());

    for (id, entry) in entries {
        if entry.vector.len() != dims {
            return Err(CvmError::DimensionMismatch {
                expected: dims,
                actual: entry.vector.len(),
            });
        }
        let model = entry.model.as_bytes();
        let model_len = u16::try_from(model.len()).map_err(|_| {
            CvmError::Serialization(format!("model name too long: {}", entry.model))
        })?;

        out.extend_from_slice(&id.to_le_bytes());
        out.extend_from_slice(&model_len.to_le_bytes());
        out.extend_from_slice(model);
        out.extend_from_slice(&encode_embedding_f16(&entry.vector));
    }

    let checksum = Sha256::digest(&out);
    out.extend_from_slice(&checksum);
    Ok(out)
}

fn decode_artifact(bytes: &[u8]) -> Result<DecodedArtifact> {
    if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(CvmError::CorruptArtifact(format!(
            "artifact too short: {} bytes",
            bytes.len()
        )));
    }

    let (body, checksum) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    if Sha256::digest(body).as_slice() != checksum {
        return Err(CvmError::CorruptArtifact("checksum mismatch".to_string()));
    }

    let mut reader = ByteReader::new(body);
    if reader.take(8)? != MAGIC {
        return Err(CvmError::CorruptArtifact("bad magic".to_string()));
    }
    let version = reader.u32()?;
    if version != FORMAT_VERSION {
        return Err(CvmError::CorruptArtifact(format!(
            "unsupported format version {version}"
        )));
    }
    let dims = reader.u32()? as usize;
    let count = reader.u64()?;

    let mut entries = BTreeMap::new();
    for _ in 0..count {
        let id = reader.i64()?;
        let model_len = usize::from(reader.u16()?);
        let model = std::str::from_utf8(reader.take(model_len)?)
            .map_err(|e| CvmError::CorruptArtifact(format!("model name: {e}")))?
            .to_string();
        let vector = decode_embedding_f16(reader.take(dims.saturating_mul(2))?, dims)?;
        entries.insert(id, StoredEmbedding { vector, model });
    }

    if !reader.is_empty() {
        return Err(CvmError::CorruptArtifact(
            "trailing bytes after last entry".to_string(),
        ));
    }

    Ok(DecodedArtifact { dims, entries })
}

struct ByteReader<'a> {
    bytes: &'a [u8],
}

impl<'a> ByteReader<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.bytes.len() < len {
            return Err(CvmError::CorruptArtifact("truncated entry".to_string()));
        }
        let (head, tail) = self.bytes.split_at(len);
        self.bytes = tail;
        Ok(head)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.array()?))
    }
}

fn encode_embedding_f16(values: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 2);
    for value in values {
        let bits = f16::from_f32(*value).to_bits();
        out.extend_from_slice(&bits.to_le_bytes());
    }
    out
}

fn decode_embedding_f16(bytes: &[u8], dims: usize) -> Result<Vec<f32>> {
    let expected = dims.saturating_mul(2);
    if bytes.len() != expected {
        return Err(CvmError::CorruptArtifact(format!(
            "embedding length mismatch: expected {}, got {}",
            expected,
            bytes.len()
        )));
    }

    let mut out = Vec::with_capacity(dims);
    for chunk in bytes.chunks_exact(2) {
        let bits = u16::from_le_bytes([chunk[0], chunk[1]]);
        out.push(f16::from_bits(bits).to_f32());
    }
    Ok(out)
}
