//! Thin HTTP surface over the family stores.
//!
//! Every family gets the same three routes; wire bodies are mementos wrapped as
//! `{"data": ...}`.

pub mod handlers;

use crate::core::CoachError;
use crate::persist::{BusinessStore, CoachStores, CohortStore, EntityStore, MeasurementStore, PersonStore};
use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<String>,
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] CoachError),
}

pub type Result<T> = std::result::Result<T, WebError>;

impl WebError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(err) => match err {
                CoachError::Format(_) | CoachError::DomainInvariant(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CoachError::ReferentialIntegrity { .. } | CoachError::NaturalKeyConflict { .. } => {
                    StatusCode::CONFLICT
                }
                CoachError::UnknownKey { .. } => StatusCode::NOT_FOUND,
                CoachError::Cancelled(_) => StatusCode::GATEWAY_TIMEOUT,
                CoachError::StoreIo(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, code, violations) = match self {
            Self::NotFound(message) => (message, "not_found", Vec::new()),
            Self::Store(CoachError::Format(format)) => (
                format!("malformed {}", format.family),
                "format_error",
                format.violations,
            ),
            Self::Store(err @ CoachError::DomainInvariant(_)) => (err.to_string(), "domain_invariant", Vec::new()),
            Self::Store(err @ CoachError::ReferentialIntegrity { .. }) => {
                (err.to_string(), "referential_integrity", Vec::new())
            }
            Self::Store(err @ CoachError::NaturalKeyConflict { .. }) => {
                (err.to_string(), "natural_key_conflict", Vec::new())
            }
            Self::Store(err @ CoachError::UnknownKey { .. }) => (err.to_string(), "unknown_key", Vec::new()),
            Self::Store(err @ CoachError::Cancelled(_)) => (err.to_string(), "cancelled", Vec::new()),
            // Driver detail stays in the logs.
            Self::Store(CoachError::StoreIo(_)) => {
                ("document store unavailable".to_string(), "store_io", Vec::new())
            }
        };

        let body = Json(ErrorResponse {
            error,
            code: code.to_string(),
            violations,
        });
        (status, body).into_response()
    }
}

/// Routes shared by every family: load one, load many, save.
fn family_routes<S>() -> Router<Arc<S>>
where
    S: EntityStore + 'static,
{
    Router::new()
        .route("/", post(handlers::save::<S>))
        .route("/load-many", post(handlers::load_many::<S>))
        .route("/:key", get(handlers::load_one::<S>))
}

pub fn build_router(stores: CoachStores) -> Router {
    let people = family_routes::<PersonStore>()
        .route("/by-email/:email", get(handlers::person_by_email))
        .with_state(stores.people.clone());
    let businesses = family_routes::<BusinessStore>()
        .route("/administered-by/:person_key", get(handlers::businesses_administered_by))
        .with_state(stores.businesses.clone());
    let cohorts = family_routes::<CohortStore>()
        .route("/for-business/:business_key", get(handlers::cohorts_for_business))
        .with_state(stores.cohorts.clone());
    let measurements = family_routes::<MeasurementStore>()
        .route("/for-subject/:subject_key", get(handlers::measurements_for_subject))
        .with_state(stores.measurements.clone());

    Router::new()
        .route("/health", get(handlers::healthcheck))
        .nest("/api/v1/people", people)
        .nest("/api/v1/businesses", businesses)
        .nest("/api/v1/cohorts", cohorts)
        .nest("/api/v1/measurements", measurements)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
