use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CvmError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub robot: RobotConfig,
}

impl Config {
    /// Load the effective config.
    ///
    /// Defaults, then either the explicit file (`--config` / `CVM_CONFIG`) or
    /// the global file followed by `<root>/config.toml`, then `CVM_*`
    /// environment overrides.
    pub fn load(explicit_path: Option<&Path>, root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("CVM_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_project(root)? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Render the config as TOML, as written by `cvm init`.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|err| CvmError::Serialization(format!("render config: {err}")))
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("cvm/config.toml"))
    }

    fn load_project(root: &Path) -> Result<Option<ConfigPatch>> {
        Self::load_patch(&root.join("config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| CvmError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| CvmError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.search {
            self.search.merge(patch);
        }
        if let Some(patch) = patch.ingest {
            self.ingest.merge(patch);
        }
        if let Some(patch) = patch.robot {
            self.robot.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if env_bool("CVM_ROBOT").unwrap_or(false) {
            self.robot.enabled = true;
        }

        if let Some(value) = env_string("CVM_EMBEDDING_BACKEND") {
            self.search.embedding_backend = value;
        }
        if let Some(value) = env_u32("CVM_EMBEDDING_DIMS")? {
            self.search.embedding_dims = value;
        }
        if let Some(value) = env_f32("CVM_SEMANTIC_WEIGHT")? {
            self.search.semantic_weight = value;
        }
        if let Some(value) = env_f32("CVM_KEYWORD_WEIGHT")? {
            self.search.keyword_weight = value;
        }
        if let Some(value) = env_u32("CVM_TOP_N")? {
            self.search.top_n = value;
        }
        if let Some(value) = env_bool("CVM_RECORD_RESULTS") {
            self.search.record_results = value;
        }

        if let Some(value) = env_string("CVM_RESUME_COLUMN") {
            self.ingest.resume_column = value;
        }
        if let Some(value) = env_string("CVM_CATEGORY_COLUMN") {
            self.ingest.category_column = value;
        }
        if let Some(value) = env_string("CVM_ID_COLUMN") {
            self.ingest.id_column = value;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub embedding_backend: String,
    #[serde(default)]
    pub embedding_dims: u32,
    #[serde(default)]
    pub semantic_weight: f32,
    #[serde(default)]
    pub keyword_weight: f32,
    #[serde(default)]
    pub top_n: u32,
    #[serde(default)]
    pub record_results: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            embedding_backend: "hash".to_string(),
            embedding_dims: 384,
            semantic_weight: 0.7,
            keyword_weight: 0.3,
            top_n: 10,
            record_results: false,
        }
    }
}

impl SearchConfig {
    fn merge(&mut self, patch: SearchPatch) {
        if let Some(value) = patch.embedding_backend {
            self.embedding_backend = value;
        }
        if let Some(value) = patch.embedding_dims {
            self.embedding_dims = value;
        }
        if let Some(value) = patch.semantic_weight {
            self.semantic_weight = value;
        }
        if let Some(value) = patch.keyword_weight {
            self.keyword_weight = value;
        }
        if let Some(value) = patch.top_n {
            self.top_n = value;
        }
        if let Some(value) = patch.record_results {
            self.record_results = value;
        }
    }
}

/// Column names used by `cvm batch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default)]
    pub resume_column: String,
    #[serde(default)]
    pub category_column: String,
    #[serde(default)]
    pub id_column: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            resume_column: "Resume_str".to_string(),
            category_column: "Category".to_string(),
            id_column: "ID".to_string(),
        }
    }
}

impl IngestConfig {
    fn merge(&mut self, patch: IngestPatch) {
        if let Some(value) = patch.resume_column {
            self.resume_column = value;
        }
        if let Some(value) = patch.category_column {
            self.category_column = value;
        }
        if let Some(value) = patch.id_column {
            self.id_column = value;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RobotConfig {
    #[serde(default)]
    pub enabled: bool,
}

impl RobotConfig {
    fn merge(&mut self, patch: RobotPatch) {
        if let Some(value) = patch.enabled {
            self.enabled = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub search: Option<SearchPatch>,
    pub ingest: Option<IngestPatch>,
    pub robot: Option<RobotPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SearchPatch {
    pub embedding_backend: Option<String>,
    pub embedding_dims: Option<u32>,
    pub semantic_weight: Option<f32>,
    pub keyword_weight: Option<f32>,
    pub top_n: Option<u32>,
    pub record_results: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct IngestPatch {
    pub resume_column: Option<String>,
    pub category_column: Option<String>,
    pub id_column: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RobotPatch {
    pub enabled: Option<bool>,
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|value| {
        matches!(
            value.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_u32(key: &str) -> Result<Option<u32>> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<u32>()
            .map(Some)
            .map_err(|err| CvmError::Config(format!("invalid {key} value {value}: {err}"))),
        Err(_) => Ok(None),
    }
}

fn env_f32(key: &str) -> Result<Option<f32>> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<f32>()
            .map(Some)
            .map_err(|err| CvmError::Config(format!("invalid {key} value {value}: {err}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // =========================================================================
    // Defaults
    // =========================================================================

    #[test]
    fn search_config_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.embedding_backend, "hash");
        assert_eq!(config.embedding_dims, 384);
        assert!((config.semantic_weight - 0.7).abs() < f32::EPSILON);
        assert!((config.keyword_weight - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.top_n, 10);
        assert!(!config.record_results);
    }

    #[test]
    fn ingest_config_defaults_match_kaggle_layout() {
        let config = IngestConfig::default();
        assert_eq!(config.resume_column, "Resume_str");
        assert_eq!(config.category_column, "Category");
        assert_eq!(config.id_column, "ID");
    }

    #[test]
    fn config_toml_roundtrip() {
        let config = Config::default();
        let rendered = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.search.embedding_dims, config.search.embedding_dims);
        assert_eq!(parsed.ingest.resume_column, config.ingest.resume_column);
    }

    // =========================================================================
    // Config::load_patch tests (file-based)
    // =========================================================================

    #[test]
    fn load_patch_nonexistent_file() {
        let result = Config::load_patch(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn load_patch_partial_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[search]
semantic_weight = 0.6
keyword_weight = 0.4
"#,
        )
        .unwrap();

        let patch = Config::load_patch(&path).unwrap().unwrap();
        let search = patch.search.unwrap();
        assert_eq!(search.semantic_weight, Some(0.6));
        assert_eq!(search.keyword_weight, Some(0.4));
        assert!(search.embedding_dims.is_none());
        assert!(patch.ingest.is_none());
    }

    #[test]
    fn load_patch_invalid_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "this is not valid toml [[[").unwrap();

        let err = Config::load_patch(&path).unwrap_err();
        assert!(matches!(err, CvmError::Config(_)));
    }

    // =========================================================================
    // Config merge tests
    // =========================================================================

    #[test]
    fn merge_patch_updates_only_given_values() {
        let mut config = Config::default();
        let patch = ConfigPatch {
            search: Some(SearchPatch {
                top_n: Some(25),
                ..Default::default()
            }),
            ingest: Some(IngestPatch {
                resume_column: Some("resume".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        config.merge_patch(patch);

        assert_eq!(config.search.top_n, 25);
        assert_eq!(config.search.embedding_dims, 384);
        assert_eq!(config.ingest.resume_column, "resume");
        assert_eq!(config.ingest.category_column, "Category");
    }

    #[test]
    fn merge_empty_patch_is_noop() {
        let mut config = Config::default();
        config.merge_patch(ConfigPatch::default());
        assert_eq!(config.search.top_n, SearchConfig::default().top_n);
    }

    // =========================================================================
    // Config::load tests (integration)
    // =========================================================================

    #[test]
    fn load_from_explicit_path() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("custom.toml");
        std::fs::write(
            &config_path,
            r#"
[search]
embedding_dims = 128
"#,
        )
        .unwrap();

        let config = Config::load(Some(&config_path), temp.path()).unwrap();
        assert_eq!(config.search.embedding_dims, 128);
    }

    #[test]
    fn load_project_config() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("config.toml"),
            r#"
[ingest]
id_column = "candidate_id"
"#,
        )
        .unwrap();

        let config = Config::load(None, temp.path()).unwrap();
        assert_eq!(config.ingest.id_column, "candidate_id");
    }
}
