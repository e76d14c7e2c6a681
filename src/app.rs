//! Application context shared by every command.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::{CvmError, Result};
use crate::search::{
    Embedder, HybridRanker, MatchMode, MatchWeights, RankOutcome, RankedCandidate, SemanticRanker,
    build_embedder,
};
use crate::storage::{Database, FileEmbeddingStore};

pub const DATABASE_FILENAME: &str = "cv_database.db";
pub const EMBEDDINGS_DIR: &str = "embeddings";
pub const CONFIG_FILENAME: &str = "config.toml";

pub struct AppContext {
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub config: Config,
    pub db: Database,
    pub store: FileEmbeddingStore,
    pub robot_mode: bool,
    pub quiet: bool,
    embedder: OnceCell<Box<dyn Embedder>>,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let root = resolve_root(cli.root.as_deref())?;
        let config = Config::load(cli.config.as_deref(), &root)?;
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| root.join(CONFIG_FILENAME));
        let robot_mode = cli.robot || config.robot.enabled;

        Self::open(root, config_path, config, robot_mode, cli.quiet)
    }

    /// Open the database and embedding store under `root`.
    pub fn open(
        root: PathBuf,
        config_path: PathBuf,
        config: Config,
        robot_mode: bool,
        quiet: bool,
    ) -> Result<Self> {
        let db = Database::open(root.join(DATABASE_FILENAME))?;
        let store = FileEmbeddingStore::new(root.join(EMBEDDINGS_DIR));
        debug!(root = %root.display(), "opened cvm root");

        Ok(Self {
            root,
            config_path,
            config,
            db,
            store,
            robot_mode,
            quiet,
            embedder: OnceCell::new(),
        })
    }

    /// Replace the configured embedder, including one already built.
    #[must_use]
    pub fn with_embedder(mut self, embedder: Box<dyn Embedder>) -> Self {
        self.embedder = OnceCell::from(embedder);
        self
    }

    /// The embedder, built from `[search]` config on first use.
    pub fn embedder(&self) -> Result<&dyn Embedder> {
        if let Some(embedder) = self.embedder.get() {
            return Ok(embedder.as_ref());
        }
        let built = build_embedder(&self.config.search)?;
        debug!(model = built.name(), dims = built.dims(), "initialized embedder");
        Ok(self.embedder.get_or_init(|| built).as_ref())
    }

    /// Rank every embedded candidate by cosine similarity to `query`.
    pub fn rank_semantic(&self, query: &str) -> Result<RankOutcome<RankedCandidate>> {
        self.rank(query, MatchMode::Semantic, MatchWeights::default())
    }

    /// Rank every embedded candidate by the weighted hybrid score.
    pub fn rank_hybrid(
        &self,
        query: &str,
        semantic_weight: f32,
        keyword_weight: f32,
    ) -> Result<RankOutcome<RankedCandidate>> {
        self.rank(
            query,
            MatchMode::Hybrid,
            MatchWeights::new(semantic_weight, keyword_weight),
        )
    }

    pub fn rank(
        &self,
        query: &str,
        mode: MatchMode,
        weights: MatchWeights,
    ) -> Result<RankOutcome<RankedCandidate>> {
        let ranker = HybridRanker::new(SemanticRanker::new(self.embedder()?, &self.store));
        ranker.rank_mode(query, mode, weights, &self.db)
    }
}

/// `--root`/`CVM_ROOT`, else the platform data dir, else `./.cvm`.
pub fn resolve_root(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(root) = explicit {
        if root.as_os_str().is_empty() {
            return Err(CvmError::Config("root path is empty".to_string()));
        }
        return Ok(root.to_path_buf());
    }
    Ok(dirs::data_dir().map_or_else(|| PathBuf::from(".cvm"), |dir| dir.join("cvm")))
}
