//! Application routes: `/api/apps/*`
//!
//! Reads are public. Writes other than publish carry the record's password
//! in the JSON body as `authPassword`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use capupdate_core::error::CatalogError;
use capupdate_core::record::PublicApp;
use capupdate_core::validate::{ApplicationUpdate, NewApplication};

use crate::error::AppError;
use crate::state::AppState;

/// Build the `/api/apps` router.
///
/// Paths:
/// - `GET    /api/apps`: list, newest first
/// - `POST   /api/apps`: publish
/// - `GET    /api/apps/{id}`: fetch
/// - `PUT    /api/apps/{id}`: update (password-gated)
/// - `DELETE /api/apps/{id}`: delete (password-gated)
/// - `POST   /api/apps/{id}/verify`: check a password
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_apps).post(publish_app))
        .route("/{id}", get(get_app).put(update_app).delete(delete_app))
        .route("/{id}/verify", post(verify_password))
}

// ── Request / Response types ─────────────────────────────────────────

/// Successful write response.
#[derive(Debug, Serialize)]
pub struct ActionResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ActionResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }
}

impl ActionResponse<()> {
    fn done() -> Self {
        Self {
            success: true,
            data: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublishedApp {
    pub id: String,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthRequest {
    pub auth_password: String,
}

/// Unwrap a JSON body, turning extractor rejections into our error shape.
///
/// Bodies over the size limit keep their 413; every other rejection is a 400.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge("Request body is too large.".to_owned())
        } else {
            AppError::BadRequest(rejection.body_text())
        }
    })
}

// ── Handlers ─────────────────────────────────────────────────────────

/// `/api/apps/` with an empty id segment, for any method.
pub async fn missing_id() -> AppError {
    CatalogError::InvalidId.into()
}

async fn list_apps(State(state): State<Arc<AppState>>) -> Result<Json<Vec<PublicApp>>, AppError> {
    Ok(Json(state.catalog.list().await?))
}

async fn publish_app(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewApplication>, JsonRejection>,
) -> Result<(StatusCode, Json<ActionResponse<PublishedApp>>), AppError> {
    let input = body(payload)?;
    let id = state.catalog.publish(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ActionResponse::ok(PublishedApp { id })),
    ))
}

async fn get_app(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PublicApp>, AppError> {
    Ok(Json(state.catalog.get(&id).await?))
}

async fn update_app(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<ApplicationUpdate>, JsonRejection>,
) -> Result<Json<ActionResponse<PublicApp>>, AppError> {
    let input = body(payload)?;
    let app = state.catalog.update(&id, input).await?;
    Ok(Json(ActionResponse::ok(app)))
}

async fn delete_app(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<Json<ActionResponse<()>>, AppError> {
    let auth = body(payload)?;
    state.catalog.delete(&id, &auth.auth_password).await?;
    Ok(Json(ActionResponse::done()))
}

async fn verify_password(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<Json<ActionResponse<()>>, AppError> {
    let auth = body(payload)?;
    state.catalog.verify(&id, &auth.auth_password).await?;
    Ok(Json(ActionResponse::done()))
}
