//! Student records HTTP API.
//!
//! - POST   /students
//! - GET    /students
//! - GET    /students/{id}
//! - PUT    /students/{id}
//! - DELETE /students/{id}
//! - GET    /students/{id}/summary
//! - GET    /health

use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{HeaderValue, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{ServiceError, ServiceResult};
use crate::store::registry::SharedStore;
use crate::store::student::{Student, StudentId};
use crate::summary::client::SummaryGenerator;

/// Application state shared across handlers.
pub struct AppState {
    pub store: SharedStore,
    pub generator: SummaryGenerator,
    pub config: Arc<Config>,
}

/// Build the axum router with all API routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/students", get(list_students).post(create_student))
        .route(
            "/students/{id}",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route("/students/{id}/summary", get(student_summary))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    // Credentials forbid wildcards, so mirror the request instead.
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .max_age(Duration::from_secs(600))
}

// ─── Request/Response Types ────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub students: usize,
    pub model: String,
}

/// Unwrap a JSON body and run field validation on it.
fn validated(body: Result<Json<Student>, JsonRejection>) -> ServiceResult<Student> {
    let Json(student) = body.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected request body");
        ServiceError::InvalidBody(rejection.body_text())
    })?;

    if let Err(e) = student.validate() {
        warn!(id = student.id, error = %e, "Student failed validation");
        return Err(e);
    }
    Ok(student)
}

/// Unwrap the `{id}` path segment.
fn student_id(path: Result<Path<StudentId>, PathRejection>) -> ServiceResult<StudentId> {
    let Path(id) = path.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected path parameter");
        ServiceError::InvalidPath(rejection.body_text())
    })?;
    Ok(id)
}

// ─── Route Handlers ────────────────────────────────────────────────────────

async fn create_student(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Student>, JsonRejection>,
) -> ServiceResult<Json<Student>> {
    let student = validated(body)?;
    let created = state.store.write().await.create(student)?;
    Ok(Json(created))
}

async fn list_students(State(state): State<Arc<AppState>>) -> Json<Vec<Student>> {
    let students = state.store.read().await.get_all();
    info!(count = students.len(), "Fetching all students");
    Json(students)
}

async fn get_student(
    State(state): State<Arc<AppState>>,
    path: Result<Path<StudentId>, PathRejection>,
) -> ServiceResult<Json<Student>> {
    let id = student_id(path)?;
    let student = state.store.read().await.get(id)?;
    info!(id, "Fetched student");
    Ok(Json(student))
}

async fn update_student(
    State(state): State<Arc<AppState>>,
    path: Result<Path<StudentId>, PathRejection>,
    body: Result<Json<Student>, JsonRejection>,
) -> ServiceResult<Json<Student>> {
    let id = student_id(path)?;
    let student = validated(body)?;
    let updated = state.store.write().await.update(id, student)?;
    Ok(Json(updated))
}

async fn delete_student(
    State(state): State<Arc<AppState>>,
    path: Result<Path<StudentId>, PathRejection>,
) -> ServiceResult<StatusCode> {
    let id = student_id(path)?;
    state.store.write().await.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn student_summary(
    State(state): State<Arc<AppState>>,
    path: Result<Path<StudentId>, PathRejection>,
) -> ServiceResult<Json<SummaryResponse>> {
    let id = student_id(path)?;
    // The lock guard is a temporary, released before the upstream call.
    let student = state.store.read().await.get(id)?;
    let summary = state.generator.summarize(&student).await?;
    Ok(Json(SummaryResponse { summary }))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        students: state.store.read().await.len(),
        model: state.generator.model().to_string(),
    })
}
