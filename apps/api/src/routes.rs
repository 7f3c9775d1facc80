//! HTTP routes.
//!
//! ```text
//! GET    /health
//! GET    /equipment                 ?ownerId= narrows to one owner
//! POST   /equipment                 X-User-Id
//! GET    /equipment/{id}
//! PUT    /equipment/{id}            X-User-Id, owner only
//! DELETE /equipment/{id}            X-User-Id, owner only
//! PATCH  /equipment/{id}/image      X-User-Id, owner only
//! GET    /auth/user                 ?id= or X-User-Id
//! PUT    /auth/user                 X-User-Id
//! ```
//!
//! Authentication is the caller-supplied `X-User-Id` header; this service
//! trusts it and only compares it against stored owner ids.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use rigshare_core::validation::{
    validate_equipment_patch, validate_image_uri, validate_new_equipment, validate_profile_update,
};
use rigshare_core::{CoreError, Equipment, EquipmentPatch, NewEquipment, ProfileUpdate, UserProfile};
use rigshare_db::Database;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

/// Header carrying the acting user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = if state.config.cors_any {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/equipment", get(list_equipment).post(create_equipment))
        .route(
            "/equipment/{id}",
            get(get_equipment).put(update_equipment).delete(delete_equipment),
        )
        .route("/equipment/{id}/image", patch(set_equipment_image))
        .route("/auth/user", get(get_user).put(update_user))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Request / Response Bodies
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    database: bool,
}

#[derive(Serialize)]
struct SuccessResponse {
    success: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EquipmentFilter {
    owner_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageUpdate {
    image_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct UserLookup {
    id: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Reads `X-User-Id`. Missing or blank means unauthenticated.
fn requester(headers: &HeaderMap) -> ApiResult<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| CoreError::Unauthenticated.into())
}

/// Loads a listing and checks that `user_id` owns it.
async fn owned_equipment(db: &Database, id: &str, user_id: &str) -> ApiResult<Equipment> {
    let equipment = db
        .equipment()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Equipment"))?;
    if !equipment.is_owned_by(user_id) {
        return Err(CoreError::unauthorized("Equipment", id, user_id).into());
    }
    Ok(equipment)
}

// =============================================================================
// Handlers
// =============================================================================

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        database: state.db.health_check().await,
    })
}

async fn list_equipment(
    State(state): State<AppState>,
    Query(filter): Query<EquipmentFilter>,
) -> ApiResult<Json<Vec<Equipment>>> {
    let equipment = match filter.owner_id.as_deref().filter(|id| !id.is_empty()) {
        Some(owner_id) => state.db.equipment().list_by_owner(owner_id).await?,
        None => state.db.equipment().list().await?,
    };
    Ok(Json(equipment))
}

async fn get_equipment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Equipment>> {
    state
        .db
        .equipment()
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Equipment"))
}

async fn create_equipment(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<NewEquipment>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Equipment>)> {
    let user_id = requester(&headers)?;
    let Json(new) = payload?;

    if state.db.users().get(&user_id).await?.is_none() {
        return Err(ApiError::not_found("User"));
    }
    validate_new_equipment(&new)?;

    let created = state.db.equipment().create(&new, &user_id).await?;
    info!(id = %created.id, owner = %user_id, "Equipment created");
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_equipment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<EquipmentPatch>, JsonRejection>,
) -> ApiResult<Json<Equipment>> {
    let user_id = requester(&headers)?;
    let Json(patch) = payload?;

    owned_equipment(&state.db, &id, &user_id).await?;
    validate_equipment_patch(&patch)?;

    let updated = state.db.equipment().update(&id, &patch).await?;
    debug!(%id, "Equipment updated");
    Ok(Json(updated))
}

async fn delete_equipment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<SuccessResponse>> {
    let user_id = requester(&headers)?;
    owned_equipment(&state.db, &id, &user_id).await?;

    state.db.equipment().delete(&id).await?;
    info!(%id, "Equipment deleted");
    Ok(Json(SuccessResponse { success: true }))
}

async fn set_equipment_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<ImageUpdate>, JsonRejection>,
) -> ApiResult<Json<Equipment>> {
    let user_id = requester(&headers)?;
    let Json(body) = payload?;

    owned_equipment(&state.db, &id, &user_id).await?;
    validate_image_uri(&body.image_url)?;

    let updated = state.db.equipment().set_image(&id, &body.image_url).await?;
    Ok(Json(updated))
}

async fn get_user(
    State(state): State<AppState>,
    Query(lookup): Query<UserLookup>,
    headers: HeaderMap,
) -> ApiResult<Json<UserProfile>> {
    let id = match lookup.id.filter(|id| !id.trim().is_empty()) {
        Some(id) => id,
        None => requester(&headers)?,
    };
    state
        .db
        .users()
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User"))
}

async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> ApiResult<Json<UserProfile>> {
    let user_id = requester(&headers)?;
    let Json(update) = payload?;

    validate_profile_update(&update)?;

    let updated = state.db.users().update(&user_id, &update).await?;
    debug!(id = %user_id, "Profile updated");
    Ok(Json(updated))
}

// =============================================================================
// Tests
// =============================================================================
