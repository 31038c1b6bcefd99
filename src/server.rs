use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::batch;
use crate::data::{GenerationResult, TimetableConfig};
use crate::error::GenerateError;
use crate::validation;

/// Upper bound on timetables per request.
const MAX_ATTEMPTS: usize = 64;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub config: TimetableConfig,
    #[serde(default = "default_attempts")]
    pub attempts: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_attempts() -> usize {
    1
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub errors: Vec<String>,
}

impl ErrorBody {
    fn new(errors: impl IntoIterator<Item = impl ToString>) -> Self {
        Self {
            errors: errors.into_iter().map(|e| e.to_string()).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

type ApiError = (StatusCode, Json<ErrorBody>);

async fn generate_handler(
    Json(request): Json<GenerateRequest>,
) -> Result<Json<Vec<GenerationResult>>, ApiError> {
    if request.attempts > MAX_ATTEMPTS {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new([format!(
                "at most {} timetables may be requested at once",
                MAX_ATTEMPTS
            )])),
        ));
    }

    // the search is CPU-bound; keep it off the async workers
    let joined = tokio::task::spawn_blocking(move || {
        batch::generate(&request.config, request.attempts, request.seed)
    })
    .await;

    match joined {
        Ok(Ok(results)) => Ok(Json(results)),
        Ok(Err(GenerateError::Config(errors))) => {
            Err((StatusCode::BAD_REQUEST, Json(ErrorBody::new(errors))))
        }
        Ok(Err(err @ GenerateError::Invariant(_))) => {
            error!("Generation failed: {}", err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new([err])),
            ))
        }
        Err(join_err) => {
            error!("Generation task failed: {}", join_err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new(["generation task failed"])),
            ))
        }
    }
}

async fn validate_handler(Json(config): Json<TimetableConfig>) -> Json<ValidationReport> {
    let errors = validation::validate(&config);
    Json(ValidationReport {
        valid: errors.is_empty(),
        errors: errors.iter().map(ToString::to_string).collect(),
    })
}

pub fn router() -> Router {
    Router::new()
        .route("/v1/timetable/generate", post(generate_handler))
        .route("/v1/timetable/validate", post(validate_handler))
}

pub async fn run_server(addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);
    axum::serve(listener, router()).await
}
