//! API route handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{StatusCode, Uri};
use axum::Json;
use chrono::Utc;
use tracing::{debug, info};

use shorts_core::installation::{
    generate_installation_id, validate_installation_id, validate_version,
    DEFAULT_CLIENT_VERSION,
};
use shorts_core::{Settings, Statistics};
use shorts_storage::NewInstallation;

use crate::error::{ApiError, Result};
use crate::models::{
    AggregateStatsResponse, HealthResponse, RegisterRequest, RegisterResponse,
    ResetStatisticsRequest, SaveSettingsRequest, SettingsResponse, StatisticsResponse,
    UpdateStatisticsRequest,
};
use crate::state::AppState;

/// Treats empty strings like absent fields.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn require_installation_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(ApiError::missing_installation_id());
    }
    validate_installation_id(id)?;
    Ok(())
}

fn delta(name: &str, value: i64) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| ApiError::BadRequest(format!("{} must be non-negative", name)))
}

/// GET /api/health - Liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /api/extension/register - Register or touch an installation.
///
/// Answers 201 for a new installation and 200 for a known one.
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let Json(req) = payload?;

    let new = NewInstallation {
        installation_id: non_empty(req.installation_id).unwrap_or_else(generate_installation_id),
        version: non_empty(req.version).unwrap_or_else(|| DEFAULT_CLIENT_VERSION.to_string()),
        browser_info: req.browser_info.unwrap_or_default(),
    };
    validate_installation_id(&new.installation_id)?;
    validate_version(&new.version)?;

    let registration = state.db.register_installation(&new)?;
    let status = if registration.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(RegisterResponse {
            installation_id: registration.installation.installation_id,
        }),
    ))
}

/// GET /api/extension/settings/{installation_id} - Stored settings or defaults.
pub async fn get_settings(
    State(state): State<AppState>,
    Path(installation_id): Path<String>,
) -> Result<Json<SettingsResponse>> {
    validate_installation_id(&installation_id)?;

    let response = match state.db.get_settings(&installation_id)? {
        Some(stored) => stored.into(),
        None => {
            debug!(installation_id = %installation_id, "No stored settings, returning defaults");
            SettingsResponse {
                installation_id,
                settings: Settings::default(),
                last_updated: None,
            }
        }
    };

    Ok(Json(response))
}

/// POST /api/extension/settings - Upsert settings.
pub async fn save_settings(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SaveSettingsRequest>, JsonRejection>,
) -> Result<Json<SettingsResponse>> {
    let Json(req) = payload?;
    require_installation_id(&req.installation_id)?;

    let stored = state.db.save_settings(&req.installation_id, req.patch)?;
    info!(
        installation_id = %stored.installation_id,
        hide = stored.settings.hide_shorts,
        block = stored.settings.block_shorts,
        "Settings saved"
    );

    Ok(Json(stored.into()))
}

/// GET /api/extension/statistics/{installation_id} - Stored counters or zeros.
pub async fn get_statistics(
    State(state): State<AppState>,
    Path(installation_id): Path<String>,
) -> Result<Json<StatisticsResponse>> {
    validate_installation_id(&installation_id)?;

    let response = match state.db.get_statistics(&installation_id)? {
        Some(stored) => stored.into(),
        None => StatisticsResponse {
            installation_id,
            statistics: Statistics::zeroed(Utc::now()),
            date: None,
        },
    };

    Ok(Json(response))
}

/// POST /api/extension/statistics/update - Add deltas to the counters.
pub async fn update_statistics(
    State(state): State<AppState>,
    payload: std::result::Result<Json<UpdateStatisticsRequest>, JsonRejection>,
) -> Result<Json<StatisticsResponse>> {
    let Json(req) = payload?;
    require_installation_id(&req.installation_id)?;
    let blocked = delta("blockedDelta", req.blocked_delta)?;
    let hidden = delta("hiddenDelta", req.hidden_delta)?;

    let stored = state
        .db
        .update_statistics(&req.installation_id, blocked, hidden)?;
    debug!(
        installation_id = %req.installation_id,
        blocked,
        hidden,
        "Statistics updated"
    );

    Ok(Json(stored.into()))
}

/// POST /api/extension/statistics/reset - Zero the counters.
pub async fn reset_statistics(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ResetStatisticsRequest>, JsonRejection>,
) -> Result<Json<StatisticsResponse>> {
    let Json(req) = payload?;
    require_installation_id(&req.installation_id)?;

    let stored = state.db.reset_statistics(&req.installation_id)?;
    info!(installation_id = %req.installation_id, "Statistics reset");

    Ok(Json(stored.into()))
}

/// GET /api/admin/statistics/aggregate - Recompute and return the latest snapshot.
pub async fn aggregate_statistics(
    State(state): State<AppState>,
) -> Result<Json<AggregateStatsResponse>> {
    let snapshot = state.db.refresh_aggregate()?;
    Ok(Json(snapshot.into()))
}

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}
