use crate::{
    app::{AppError, Engine, HomeFeed},
    recommend::{SeedSources, SessionInterests},
    similarity::DEFAULT_NEIGHBORS,
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tokio::signal;

#[derive(Clone)]
struct SharedState {
    engine: Arc<Engine>,
}

pub fn router(engine: Arc<Engine>) -> Router {
    let shared_state = Arc::new(SharedState { engine });

    Router::new()
        .route("/api/similar", post(similar))
        .route("/api/similarity", post(similarity))
        .route("/api/personalize", post(personalize))
        .route("/api/chat", post(chat))
        .route("/api/suggestions", get(suggestions))
        .route("/api/home", post(home))
        .route("/api/interactions", post(log_interaction))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(shared_state)
}

async fn start_app(engine: Arc<Engine>, listen: String) -> anyhow::Result<()> {
    async fn shutdown_signal() {
        let ctrl_c = async {
            if let Err(err) = signal::ctrl_c().await {
                log::error!("failed to install Ctrl+C handler: {err}");
            }
        };

        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(err) => {
                    log::error!("failed to install signal handler: {err}");
                    std::future::pending::<()>().await;
                }
            }
        };

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
        log::warn!("shutting down");
    }

    let app = router(engine);

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    log::info!("listening on {listen}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Runs the daemon until a shutdown signal.
///
/// The engine outlives the runtime so blocking clients inside it are
/// dropped outside of async context.
pub fn start_daemon(engine: Arc<Engine>, listen: String) -> anyhow::Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(start_app(engine, listen))
}

#[derive(Debug)]
struct HttpError(AppError);

impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        match self.0 {
            AppError::InvalidInput(_) => (
                axum::http::StatusCode::BAD_REQUEST,
                Json(json!({"error": self.0.to_string()})),
            ),
            _ => {
                log::error!("{self:?}");
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": self.0.to_string()})),
                )
            }
        }
        .into_response()
    }
}

impl<E> From<E> for HttpError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimilarRequest {
    pub title: String,
    pub n: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TitlesResponse {
    pub titles: Vec<String>,
}

async fn similar(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<SimilarRequest>,
) -> Json<TitlesResponse> {
    log::debug!("payload: {payload:?}");

    let n = payload.n.unwrap_or(DEFAULT_NEIGHBORS);
    Json(TitlesResponse {
        titles: state.engine.similar_titles(&payload.title, n),
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimilarityRequest {
    pub name: String,
}

/// Neighbor titles joined with `---`, for the autocomplete page.
///
/// The page posts `name=...` as a url-encoded form.
async fn similarity(
    State(state): State<Arc<SharedState>>,
    Form(payload): Form<SimilarityRequest>,
) -> String {
    state
        .engine
        .similar_titles(&payload.name, DEFAULT_NEIGHBORS)
        .join("---")
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonalizeRequest {
    #[serde(default)]
    pub seeds: Vec<String>,
}

async fn personalize(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<PersonalizeRequest>,
) -> Json<TitlesResponse> {
    log::debug!("payload: {payload:?}");

    Json(TitlesResponse {
        titles: state.engine.personalize(&payload.seeds),
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

async fn chat(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<ChatRequest>,
) -> Json<ChatResponse> {
    log::debug!("payload: {payload:?}");

    let engine = state.engine.clone();
    let response =
        tokio::task::block_in_place(move || engine.retrieve_and_answer(&payload.message));

    Json(ChatResponse { response })
}

async fn suggestions(State(state): State<Arc<SharedState>>) -> Json<Vec<String>> {
    Json(state.engine.recommender.suggestions())
}

async fn home(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<SeedSources>,
) -> Json<HomeFeed> {
    log::debug!("payload: {payload:?}");

    Json(state.engine.recommender.home_feed(&payload))
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionRequest {
    pub title: String,
    /// Seconds spent on the title
    pub duration: f64,
    #[serde(default)]
    pub interests: SessionInterests,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InteractionResponse {
    pub recorded: bool,
    pub interests: SessionInterests,
}

async fn log_interaction(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<InteractionRequest>,
) -> Result<Json<InteractionResponse>, HttpError> {
    log::debug!("payload: {payload:?}");

    let dwell = Duration::try_from_secs_f64(payload.duration).map_err(|_| {
        AppError::InvalidInput(format!("invalid duration {}", payload.duration))
    })?;

    let mut interests = payload.interests;
    let recorded = state
        .engine
        .record_interaction(&mut interests, &payload.title, dwell);

    Ok(Json(InteractionResponse {
        recorded,
        interests,
    }))
}
