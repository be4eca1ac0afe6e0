use super::{ApiResponse, Result, WebError};
use crate::codec::Codec;
use crate::core::CoachError;
use crate::persist::{BusinessStore, CohortStore, EntityStore, MeasurementStore, PersonStore, SaveOutcome};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct LoadManyRequest {
    pub keys: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub data: Value,
    pub outcome: String,
}

fn wire_many<S: EntityStore>(store: &S, entities: &[S::Entity]) -> Result<Value> {
    let mementos = store.codec().encode_many(entities);
    serde_json::to_value(mementos).map_err(|err| CoachError::from(err).into())
}

pub async fn healthcheck() -> Json<ApiResponse<Value>> {
    Json(ApiResponse {
        data: json!({"status": "ok"}),
    })
}

pub async fn load_one<S: EntityStore + 'static>(
    State(store): State<Arc<S>>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<Value>>> {
    let entity = store
        .load_one(&key)
        .await?
        .ok_or_else(|| WebError::not_found(format!("{} '{key}' not found", store.family())))?;
    Ok(Json(ApiResponse {
        data: store.codec().to_wire(&entity)?,
    }))
}

pub async fn load_many<S: EntityStore + 'static>(
    State(store): State<Arc<S>>,
    Json(request): Json<LoadManyRequest>,
) -> Result<Json<ApiResponse<Value>>> {
    let entities = store.load_many(&request.keys).await?;
    Ok(Json(ApiResponse {
        data: wire_many(store.as_ref(), &entities)?,
    }))
}

/// Saves a memento. Inserts answer 201; updates and stale writes answer 200 with the
/// stored version.
pub async fn save<S: EntityStore + 'static>(
    State(store): State<Arc<S>>,
    Json(wire): Json<Value>,
) -> Result<(StatusCode, Json<SaveResponse>)> {
    let entity = store.materialize(&wire).await?;
    let report = store.save_reported(&entity, store.default_deadline()).await?;
    let status = match report.outcome {
        SaveOutcome::Inserted => StatusCode::CREATED,
        SaveOutcome::Updated | SaveOutcome::Stale => StatusCode::OK,
    };
    Ok((
        status,
        Json(SaveResponse {
            data: store.codec().to_wire(&report.entity)?,
            outcome: report.outcome.to_string(),
        }),
    ))
}

pub async fn person_by_email(
    State(store): State<Arc<PersonStore>>,
    Path(email): Path<String>,
) -> Result<Json<ApiResponse<Value>>> {
    let person = store
        .load_by_email(&email)
        .await?
        .ok_or_else(|| WebError::not_found(format!("no person with email '{email}'")))?;
    Ok(Json(ApiResponse {
        data: store.codec().to_wire(&person)?,
    }))
}

pub async fn businesses_administered_by(
    State(store): State<Arc<BusinessStore>>,
    Path(person_key): Path<String>,
) -> Result<Json<ApiResponse<Value>>> {
    let businesses = store.load_administered_by(&person_key).await?;
    Ok(Json(ApiResponse {
        data: wire_many(store.as_ref(), &businesses)?,
    }))
}

pub async fn cohorts_for_business(
    State(store): State<Arc<CohortStore>>,
    Path(business_key): Path<String>,
) -> Result<Json<ApiResponse<Value>>> {
    let cohorts = store.load_for_business(&business_key).await?;
    Ok(Json(ApiResponse {
        data: wire_many(store.as_ref(), &cohorts)?,
    }))
}

pub async fn measurements_for_subject(
    State(store): State<Arc<MeasurementStore>>,
    Path(subject_key): Path<String>,
) -> Result<Json<ApiResponse<Value>>> {
    let measurements = store.load_for_subject(&subject_key).await?;
    Ok(Json(ApiResponse {
        data: wire_many(store.as_ref(), &measurements)?,
    }))
}
