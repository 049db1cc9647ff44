use crate::{
    app::{
        engine::{Engine, Recommender},
        errors::AppError,
    },
    catalog::Catalog,
    chat::{ChatService, LlamaCppClient, ResponseGenerator, TextGenerator},
    config::Config,
    semantic::{Embedder, EmbeddingModel, SemanticRetriever, VectorStorage},
    similarity::{SimilarityIndex, SimilarityMatrix},
};
use anyhow::{anyhow, Context, Result};
use homedir::my_home;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Builds the engine and its parts from config.
///
/// Missing or corrupt artifacts fail here, at startup, never per request.
pub struct AppFactory;

impl AppFactory {
    /// Base directory, created if needed.
    pub fn get_base_path() -> Result<PathBuf> {
        let base_path = match std::env::var("CINEMATCH_BASE_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => {
                let home = my_home()
                    .context("Could not determine home directory")?
                    .ok_or_else(|| anyhow!("Home directory path is empty"))?;
                home.join(".local/share/cinematch")
            }
        };

        std::fs::create_dir_all(&base_path)
            .context("Failed to create application base directory")?;

        Ok(base_path)
    }

    pub fn create_config() -> Result<Config> {
        let base_path = Self::get_base_path()?;
        Config::load_with(&base_path)
    }

    pub fn load_catalog(config: &Config) -> Result<Arc<Catalog>, AppError> {
        let path = config.resolve(&config.catalog.movies_file);
        Ok(Arc::new(Catalog::load(&path)?))
    }

    pub fn create_recommender(config: &Config, catalog: Arc<Catalog>) -> Result<Recommender, AppError> {
        let path = config.resolve(&config.catalog.similarity_file);
        let matrix = SimilarityMatrix::load(&path)?;
        let index = SimilarityIndex::new(catalog, matrix)?;

        Ok(Recommender::new(Arc::new(index)))
    }

    pub fn create_chat(config: &Config, catalog: Arc<Catalog>) -> Result<ChatService, AppError> {
        let embedder: Arc<dyn Embedder> = Arc::new(EmbeddingModel::new(
            &config.semantic_search.model,
            config.base_path().to_path_buf(),
        )?);

        let storage = VectorStorage::new(config.resolve(&config.catalog.vectors_file));
        let retriever = SemanticRetriever::build(catalog, embedder, Some(&storage))?;

        let generator = ResponseGenerator::new(
            Self::create_generation_backend(config)?,
            config.generation.params(),
        );

        Ok(ChatService::new(
            retriever,
            generator,
            config.semantic_search.top_k,
        ))
    }

    fn create_generation_backend(config: &Config) -> Result<Option<Box<dyn TextGenerator>>, AppError> {
        if !config.generation.enabled {
            return Ok(None);
        }

        let client = LlamaCppClient::new(
            &config.generation.endpoint,
            Duration::from_secs(config.generation.timeout_secs),
        )?;
        log::info!("generation backend at {}", config.generation.endpoint);

        Ok(Some(Box::new(client)))
    }

    pub fn create_engine(config: &Config) -> Result<Engine, AppError> {
        let catalog = Self::load_catalog(config)?;
        let recommender = Self::create_recommender(config, catalog.clone())?;
        let chat = Self::create_chat(config, catalog)?;

        Ok(Engine::new(
            recommender,
            chat,
            Duration::from_secs(config.interests.min_dwell_secs),
        ))
    }
}
