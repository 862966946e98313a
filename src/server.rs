//! JSON HTTP server over a [`RecipeEngine`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/normalize` | Normalize an ingredient list |
//! | `POST` | `/recipes/find` | Closest recipe for an ingredient list |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! Request and response bodies are described in [`crate::api`].
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "ingredients_list must be ..." } }
//! ```
//!
//! Error codes: `bad_request` (400), `integrity` (500), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::api::{parse_request, FindRecipeRequest, FindRecipeResponse, NormalizeRequest};
use crate::config::Config;
use crate::engine::RecipeEngine;
use crate::error::PantryError;
use crate::models::NormalizedResult;

#[derive(Clone)]
struct AppState {
    engine: Arc<RecipeEngine>,
}

/// Build the engine from `config` and serve until the process ends.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let engine = Arc::new(RecipeEngine::from_config(config).await?);
    let app = router(engine);

    let bind_addr = &config.server.bind;
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(bind = %bind_addr, "pantry server listening");
    println!("Pantry server listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// The route table, separate from binding so tests can drive it directly.
pub fn router(engine: Arc<RecipeEngine>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/normalize", post(handle_normalize))
        .route("/recipes/find", post(handle_find_recipe))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { engine })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn internal(code: &str, message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: code.to_string(),
        message: message.into(),
    }
}

impl From<PantryError> for AppError {
    fn from(err: PantryError) -> Self {
        match err {
            PantryError::MalformedInput(msg) => bad_request(msg),
            PantryError::Integrity { .. } => {
                error!(error = %err, "catalog integrity violation");
                internal("integrity", err.to_string())
            }
            other => {
                error!(error = %other, "request failed");
                internal("internal", other.to_string())
            }
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<PantryError>() {
            Ok(pantry) => pantry.into(),
            Err(err) => {
                error!(error = %format!("{:#}", err), "request failed");
                internal("internal", err.to_string())
            }
        }
    }
}

fn body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| bad_request(rejection.body_text()))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /normalize ============

async fn handle_normalize(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<NormalizedResult>, AppError> {
    let request: NormalizeRequest = parse_request(body(payload)?)?;
    let result = state
        .engine
        .normalize(request.ingredients_list.into_phrases())
        .await?;
    Ok(Json(result))
}

// ============ POST /recipes/find ============

async fn handle_find_recipe(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<FindRecipeResponse>, AppError> {
    let request: FindRecipeRequest = parse_request(body(payload)?)?;
    let ranked = state
        .engine
        .find_recipe(
            request.ingredients_list.into_phrases(),
            request.num_missing_ingredients_allowed,
        )
        .await?;
    Ok(Json(ranked.into()))
}
