// HTTP API
// Axum router exposing model listing, diagnostics and the question endpoint


use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::answer::AnswerService;
use crate::config::{CatalogConfig, ServerConfig};
use crate::embeddings::{EmbeddingProvider, ProviderError};
use crate::resolver::{ModelOption, ResolveError, display_options, resolve};
use crate::search::{SearchError, search};
use crate::store::{IndexStore, ModelRegistry};

/// Shared state for request handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ModelRegistry>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub answerer: Arc<dyn AnswerService>,
    pub store: IndexStore,
    pub catalog: CatalogConfig,
    pub top_k: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HomeResponse {
    pub mensaje: String,
    pub modelos_disponibles: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelsResponse<T> {
    pub modelos: Vec<T>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub ruta_vectores: String,
    pub existe: bool,
    pub contenido: Vec<String>,
    pub modelos_cargados: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub modelo: String,
    pub pregunta: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub modelo: String,
    pub pregunta: String,
    pub respuesta: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    ModelNotFound(#[from] ResolveError),

    #[error("La pregunta no puede estar vacía")]
    EmptyQuestion,

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("Error del proveedor: {0}")]
    Provider(#[from] ProviderError),

    #[error("Error interno: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::ModelNotFound(_) => StatusCode::NOT_FOUND,
            Self::EmptyQuestion => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Provider(_) | Self::Search(SearchError::Provider(_)) => StatusCode::BAD_GATEWAY,
            Self::Search(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    #[inline]
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }

        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the application router with CORS and request tracing
#[inline]
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/modelos", get(list_models))
        .route("/modelos/normalizados", get(normalized_models))
        .route("/health", get(health))
        .route("/preguntar", post(ask))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.trim().parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    cors.allow_origin(allowed)
}

/// Bind to the configured address and serve until the process is stopped
#[inline]
pub async fn serve(state: AppState, config: &ServerConfig) -> Result<()> {
    let app = build_router(state, &config.cors_origins);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("MOTOFIX API listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("HTTP server terminated unexpectedly")?;
    Ok(())
}

async fn home(State(state): State<Arc<AppState>>) -> Json<HomeResponse> {
    Json(HomeResponse {
        mensaje: "API de MOTOFIX en ejecución correctamente".to_string(),
        modelos_disponibles: state.registry.names(),
    })
}

async fn list_models(State(state): State<Arc<AppState>>) -> Json<ModelsResponse<String>> {
    Json(ModelsResponse {
        modelos: state.registry.names(),
    })
}

async fn normalized_models(State(state): State<Arc<AppState>>) -> Json<ModelsResponse<ModelOption>> {
    Json(ModelsResponse {
        modelos: display_options(&state.registry.names(), &state.catalog.brand_label),
    })
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let contenido = state.store.listing().unwrap_or_else(|e| {
        warn!("Could not list index directory: {}", e);
        Vec::new()
    });

    Json(HealthResponse {
        ok: true,
        ruta_vectores: state.store.base_dir().display().to_string(),
        existe: state.store.exists(),
        contenido,
        modelos_cargados: state.registry.names(),
    })
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QuestionRequest>,
) -> Result<Json<AnswerResponse>, ApiError> {
    if request.pregunta.trim().is_empty() {
        return Err(ApiError::EmptyQuestion);
    }

    let names = state.registry.names();
    let canonical = resolve(&request.modelo, &names, &state.catalog.brand_prefix)?;
    let index = state
        .registry
        .get(&canonical)
        .ok_or_else(|| ApiError::Internal(format!("model '{}' vanished from registry", canonical)))?;

    info!("Querying model: {}", canonical);

    let embedder = Arc::clone(&state.embedder);
    let answerer = Arc::clone(&state.answerer);
    let question = request.pregunta.clone();
    let top_k = state.top_k;

    let respuesta = tokio::task::spawn_blocking(move || -> Result<String, ApiError> {
        let results = search(&index, embedder.as_ref(), &question, top_k)?;
        let context = results
            .iter()
            .map(|result| result.document.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Ok(answerer.answer(&question, &context)?)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("answer task failed: {}", e)))??;

    Ok(Json(AnswerResponse {
        modelo: canonical,
        pregunta: request.pregunta,
        respuesta,
    }))
}
