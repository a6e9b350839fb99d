use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use feedback_core::{EntityStore, FeedbackIntake, FeedbackRecord};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;

pub struct AppState<S> {
    intake: Arc<FeedbackIntake<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            intake: self.intake.clone(),
        }
    }
}

impl<S: EntityStore> AppState<S> {
    pub fn new(intake: FeedbackIntake<S>) -> Self {
        Self {
            intake: Arc::new(intake),
        }
    }
}

pub fn app_router<S: EntityStore>(state: AppState<S>) -> Router {
    let feedback_routes = Router::new().route("/submit_feedback", post(submit_feedback::<S>));

    Router::new()
        .route("/healthz", get(healthz))
        .merge(feedback_routes.clone())
        .nest("/api", feedback_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
    })
}

#[derive(Debug, Serialize)]
struct SubmitFeedbackResponse {
    success: bool,
    data: FeedbackRecord,
}

// The body is read raw so the outcome does not depend on the Content-Type header.
async fn submit_feedback<S: EntityStore>(
    State(state): State<AppState<S>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<SubmitFeedbackResponse>, AppError> {
    let body = body.map_err(|rejection| {
        tracing::info!(
            endpoint = "submit_feedback",
            reason = %rejection.body_text(),
            "Unreadable feedback body"
        );
        AppError::from(rejection)
    })?;

    match state.intake.submit(&body).await {
        Ok(record) => {
            tracing::info!(
                endpoint = "submit_feedback",
                table = state.intake.table(),
                row_key = %record.row_key,
                message_len = record.message.len(),
                "Feedback saved"
            );
            Ok(Json(SubmitFeedbackResponse {
                success: true,
                data: record,
            }))
        }
        Err(error) if error.is_client_error() => {
            tracing::info!(
                endpoint = "submit_feedback",
                body_len = body.len(),
                reason = %error,
                "Rejected feedback submission"
            );
            Err(error.into())
        }
        Err(error) => {
            tracing::error!(
                endpoint = "submit_feedback",
                table = state.intake.table(),
                error = %error,
                "Error saving feedback"
            );
            Err(error.into())
        }
    }
}
