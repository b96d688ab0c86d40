use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use tadka_service::{
	Error as ServiceError, InteractionRequest, InteractionResponse, PurgeReport, RecommendRequest,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/recommendations", post(recommend))
		.route("/v1/interactions", post(record_interaction))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new().route("/v1/admin/purge_cooldowns", post(purge_cooldowns)).with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn recommend(
	State(state): State<AppState>,
	Json(payload): Json<RecommendRequest>,
) -> Result<Response, ApiError> {
	let batch = state.service.generate_recommendations(payload).await?;

	Ok(Json(batch).into_response())
}

async fn record_interaction(
	State(state): State<AppState>,
	Json(payload): Json<InteractionRequest>,
) -> Result<Json<InteractionResponse>, ApiError> {
	let response = state.service.record_interaction(payload).await?;

	Ok(Json(response))
}

async fn purge_cooldowns(State(state): State<AppState>) -> Result<Json<PurgeReport>, ApiError> {
	let report = state.service.purge_expired_cooldowns().await?;

	Ok(Json(report))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
		Self { status, error_code, message: message.into() }
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let message = err.to_string();

		match err {
			ServiceError::ProfileNotFound { .. } =>
				Self::new(StatusCode::NOT_FOUND, "PROFILE_NOT_FOUND", message),
			ServiceError::OnboardingIncomplete { .. } =>
				Self::new(StatusCode::CONFLICT, "ONBOARDING_INCOMPLETE", message),
			ServiceError::InsufficientCandidates { .. } =>
				Self::new(StatusCode::SERVICE_UNAVAILABLE, "INSUFFICIENT_CANDIDATES", message),
			ServiceError::RetrievalTimeout { .. } =>
				Self::new(StatusCode::GATEWAY_TIMEOUT, "RETRIEVAL_TIMEOUT", message),
			ServiceError::InvalidRequest { .. } =>
				Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message),
			ServiceError::Provider { .. } => {
				tracing::error!(error = %message, "Provider failure.");

				Self::new(StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", "Upstream provider failed.")
			},
			ServiceError::Storage { .. } | ServiceError::Qdrant { .. } | ServiceError::Scoring { .. } => {
				tracing::error!(error = %message, "Internal failure.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "Internal error.")
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code.to_string(), message: self.message };

		(self.status, Json(body)).into_response()
	}
}
