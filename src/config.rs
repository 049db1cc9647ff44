use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::chat::{GenerationParams, DEFAULT_STOP};
use crate::recommend::DEFAULT_MIN_DWELL;
use crate::semantic::{DEFAULT_MODEL, DEFAULT_TOP_K};

const CONFIG_FILE: &str = "config.yaml";

const DEFAULT_GENERATION_ENDPOINT: &str = "http://127.0.0.1:8081";
const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 120;
const DEFAULT_LISTEN: &str = "0.0.0.0:5000";

/// Artifact file names, relative to the base path unless absolute.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_movies_file")]
    pub movies_file: String,

    #[serde(default = "default_similarity_file")]
    pub similarity_file: String,

    /// Cache of corpus embeddings
    #[serde(default = "default_vectors_file")]
    pub vectors_file: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            movies_file: default_movies_file(),
            similarity_file: default_similarity_file(),
            vectors_file: default_vectors_file(),
        }
    }
}

fn default_movies_file() -> String {
    "movies.csv".to_string()
}

fn default_similarity_file() -> String {
    "similarity.bin".to_string()
}

fn default_vectors_file() -> String {
    "vectors.bin".to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SemanticSearchConfig {
    /// Model name for embeddings (e.g., "all-MiniLM-L6-v2")
    #[serde(default = "default_semantic_model")]
    pub model: String,

    /// Movies retrieved per chat query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for SemanticSearchConfig {
    fn default() -> Self {
        Self {
            model: default_semantic_model(),
            top_k: default_top_k(),
        }
    }
}

fn default_semantic_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Without a generation server chat answers with the retrieved movies
    #[serde(default)]
    pub enabled: bool,

    /// llama.cpp server root url
    #[serde(default = "default_generation_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_repeat_penalty")]
    pub repeat_penalty: f32,

    #[serde(default = "default_stop")]
    pub stop: Vec<String>,

    /// A timed out generation is answered like a failed one
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_generation_endpoint(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            repeat_penalty: default_repeat_penalty(),
            stop: default_stop(),
            timeout_secs: default_generation_timeout_secs(),
        }
    }
}

impl GenerationConfig {
    pub fn params(&self) -> GenerationParams {
        GenerationParams {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            repeat_penalty: self.repeat_penalty,
            stop: self.stop.clone(),
        }
    }
}

fn default_generation_endpoint() -> String {
    DEFAULT_GENERATION_ENDPOINT.to_string()
}

fn default_max_tokens() -> usize {
    GenerationParams::default().max_tokens
}

fn default_temperature() -> f32 {
    GenerationParams::default().temperature
}

fn default_repeat_penalty() -> f32 {
    GenerationParams::default().repeat_penalty
}

fn default_stop() -> Vec<String> {
    DEFAULT_STOP.iter().map(|s| s.to_string()).collect()
}

fn default_generation_timeout_secs() -> u64 {
    DEFAULT_GENERATION_TIMEOUT_SECS
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InterestsConfig {
    /// Seconds a viewer must stay on a title before it counts as an interest
    #[serde(default = "default_min_dwell_secs")]
    pub min_dwell_secs: u64,
}

impl Default for InterestsConfig {
    fn default() -> Self {
        Self {
            min_dwell_secs: default_min_dwell_secs(),
        }
    }
}

fn default_min_dwell_secs() -> u64 {
    DEFAULT_MIN_DWELL.as_secs()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub semantic_search: SemanticSearchConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub interests: InterestsConfig,
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Config {
    fn validate(&self) -> anyhow::Result<()> {
        if self.semantic_search.top_k == 0 {
            bail!("semantic_search.top_k must be greater than 0");
        }

        let generation = &self.generation;
        if generation.max_tokens == 0 {
            bail!("generation.max_tokens must be greater than 0");
        }
        if !(0.0..=2.0).contains(&generation.temperature) {
            bail!(
                "generation.temperature must be between 0.0 and 2.0, got {}",
                generation.temperature
            );
        }
        if generation.repeat_penalty < 1.0 {
            bail!(
                "generation.repeat_penalty must be at least 1.0, got {}",
                generation.repeat_penalty
            );
        }
        if generation.timeout_secs == 0 {
            bail!("generation.timeout_secs must be greater than 0");
        }

        Ok(())
    }

    /// Reads `config.yaml` under `base_path`, writing defaults first when the
    /// file does not exist.
    pub fn load_with(base_path: &Path) -> anyhow::Result<Self> {
        let path = base_path.join(CONFIG_FILE);

        if !path.exists() {
            log::info!("writing default config to {}", path.display());
            let config = Self {
                base_path: base_path.to_path_buf(),
                ..Default::default()
            };
            config.save()?;
        }

        let config_str = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config: Self = serde_yml::from_str(&config_str).context("config is malformed")?;

        config.base_path = base_path.to_path_buf();
        config.validate()?;

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let path = self.base_path.join(CONFIG_FILE);
        let temp_path = path.with_extension("tmp");

        let config_str = serde_yml::to_string(&self)?;
        std::fs::write(&temp_path, config_str)?;
        std::fs::rename(&temp_path, &path)?;

        Ok(())
    }

    /// Resolves an artifact path against the base path.
    pub fn resolve(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_creates_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_with(dir.path()).unwrap();

        assert!(dir.path().join(CONFIG_FILE).exists());
        assert_eq!(config.semantic_search.top_k, 3);
        assert_eq!(config.generation.max_tokens, 100);
        assert!(!config.generation.enabled);
        assert_eq!(config.interests.min_dwell_secs, 15);
        assert_eq!(config.resolve("movies.csv"), dir.path().join("movies.csv"));
    }

    #[test]
    fn test_partial_config_gets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "generation:\n  enabled: true\n  temperature: 0.2\n",
        )
        .unwrap();

        let config = Config::load_with(dir.path()).unwrap();
        assert!(config.generation.enabled);
        assert!((config.generation.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.generation.stop, default_stop());
        assert_eq!(config.catalog.similarity_file, "similarity.bin");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "generation:\n  repeat_penalty: 0.5\n",
        )
        .unwrap();

        assert!(Config::load_with(dir.path()).is_err());
    }

    #[test]
    fn test_absolute_paths_kept() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_with(dir.path()).unwrap();
        assert_eq!(config.resolve("/data/movies.csv"), PathBuf::from("/data/movies.csv"));
    }
}
