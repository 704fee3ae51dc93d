use crate::admin::{AdminError, SeasonAdmin};
use crate::bracket::WinnerUpdate;
use crate::config::{is_safe_season_name, is_valid_month};
use crate::store::SeasonStore;
use crate::types::*;

use axum::{
    async_trait,
    extract::{FromRequest, Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use std::{path::PathBuf, sync::MutexGuard};
use tower_http::services::ServeDir;
use tracing::error;

// ── Errors ─────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        ApiError { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    fn internal(message: impl Into<String>) -> Self {
        ApiError { status: StatusCode::INTERNAL_SERVER_ERROR, message: message.into() }
    }
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Rejected(message) => ApiError::bad_request(message),
            AdminError::Storage(message) => {
                error!("storage failure: {message}");
                ApiError::internal(message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// `Json` extractor whose rejections answer with the `{ "error": .. }` body.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, St> FromRequest<St> for JsonBody<T>
where
    T: DeserializeOwned,
    St: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &St) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}

// ── Payloads ───────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct SeasonPayload {
    pub season: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NamePayload {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ParticipantPayload {
    pub name: Option<String>,
    pub seed: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPayload {
    /// Round label or stage number.
    pub round: Option<Value>,
    pub match_number: Option<u32>,
    pub winner: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SeasonMetaPayload {
    pub month1: Option<String>,
    pub month2: Option<String>,
}

// ── Helpers ────────────────────────────────────────────────────────────

fn lock_admin<S>(admin: &SharedAdmin<S>) -> Result<MutexGuard<'_, SeasonAdmin<S>>, ApiError> {
    admin.lock().map_err(|e| ApiError::internal(e.to_string()))
}

fn ok() -> Json<Value> {
    Json(json!({ "ok": true }))
}

fn required_name(raw: Option<String>) -> Result<String, ApiError> {
    raw.map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::bad_request("name required"))
}

fn checked_season(raw: &str) -> Result<&str, ApiError> {
    if is_safe_season_name(raw) {
        Ok(raw)
    } else {
        Err(ApiError::bad_request(format!("invalid season name: {raw:?}")))
    }
}

fn round_key(raw: Option<Value>) -> Option<String> {
    match raw? {
        Value::String(label) if !label.trim().is_empty() => Some(label),
        Value::Number(stage) => Some(stage.to_string()),
        _ => None,
    }
}

fn checked_month(raw: Option<String>) -> Result<Option<String>, ApiError> {
    match raw.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()) {
        Some(month) if is_valid_month(&month) => Ok(Some(month)),
        Some(_) => Err(ApiError::bad_request("month1/month2 must be YYYY-MM strings")),
        None => Ok(None),
    }
}

// ── Router ─────────────────────────────────────────────────────────────

pub fn router<S>(admin: SharedAdmin<S>, static_dir: Option<PathBuf>) -> Router
where
    S: SeasonStore + Send + 'static,
{
    let app = Router::new()
        .route("/api/seasons", get(list_seasons::<S>))
        .route("/api/seasons/:season", get(get_season_meta::<S>))
        .route("/api/seasons/:season/bracket", get(get_bracket::<S>))
        .route(
            "/api/admin/seasons",
            post(create_season::<S>).delete(delete_season::<S>),
        )
        .route("/api/admin/seasons/:season", put(update_season_meta::<S>))
        .route(
            "/api/admin/seasons/:season/participants",
            get(list_season_participants::<S>)
                .post(add_season_participant::<S>)
                .delete(remove_season_participant::<S>)
                .put(regenerate_bracket::<S>),
        )
        .route("/api/admin/seasons/:season/matches", put(set_match_winner::<S>))
        .route(
            "/api/admin/seasons/:season/moderators",
            get(list_season_moderators::<S>)
                .post(add_season_moderator::<S>)
                .delete(remove_season_moderator::<S>),
        )
        .route(
            "/api/admin/participants",
            get(list_global_participants::<S>)
                .post(add_global_participant::<S>)
                .delete(remove_global_participant::<S>),
        )
        .route(
            "/api/admin/moderators",
            get(list_global_moderators::<S>)
                .post(add_global_moderator::<S>)
                .delete(remove_global_moderator::<S>),
        )
        .with_state(admin);

    match static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    }
}

// ── Public handlers ────────────────────────────────────────────────────

async fn list_seasons<S: SeasonStore + Send + 'static>(
    State(admin): State<SharedAdmin<S>>,
) -> ApiResult<Vec<String>> {
    let guard = lock_admin(&admin)?;
    Ok(Json(guard.seasons()?))
}

async fn get_season_meta<S: SeasonStore + Send + 'static>(
    State(admin): State<SharedAdmin<S>>,
    Path(season): Path<String>,
) -> ApiResult<SeasonMeta> {
    let season = checked_season(&season)?;
    let guard = lock_admin(&admin)?;
    Ok(Json(guard.season_meta(season)?))
}

async fn get_bracket<S: SeasonStore + Send + 'static>(
    State(admin): State<SharedAdmin<S>>,
    Path(season): Path<String>,
) -> Result<Response, ApiError> {
    let season = checked_season(&season)?;
    let bracket = lock_admin(&admin)?.bracket(season)?;
    if !bracket.has_matches() {
        return Ok((StatusCode::NOT_FOUND, Json(json!({}))).into_response());
    }
    Ok(Json(bracket).into_response())
}

// ── Season admin handlers ──────────────────────────────────────────────

async fn create_season<S: SeasonStore + Send + 'static>(
    State(admin): State<SharedAdmin<S>>,
    JsonBody(body): JsonBody<SeasonPayload>,
) -> ApiResult<Value> {
    let season = body
        .season
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("season required"))?;
    let season = checked_season(&season)?;
    lock_admin(&admin)?.add_season(season)?;
    Ok(ok())
}

async fn delete_season<S: SeasonStore + Send + 'static>(
    State(admin): State<SharedAdmin<S>>,
    JsonBody(body): JsonBody<SeasonPayload>,
) -> ApiResult<Value> {
    let season = body
        .season
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("season required"))?;
    lock_admin(&admin)?.remove_season(&season)?;
    Ok(ok())
}

async fn update_season_meta<S: SeasonStore + Send + 'static>(
    State(admin): State<SharedAdmin<S>>,
    Path(season): Path<String>,
    JsonBody(body): JsonBody<SeasonMetaPayload>,
) -> ApiResult<Value> {
    let season = checked_season(&season)?;
    let meta = SeasonMeta {
        month1: checked_month(body.month1)?,
        month2: checked_month(body.month2)?,
    };
    lock_admin(&admin)?.update_season_meta(season, meta)?;
    Ok(ok())
}

async fn list_season_participants<S: SeasonStore + Send + 'static>(
    State(admin): State<SharedAdmin<S>>,
    Path(season): Path<String>,
) -> ApiResult<Vec<Player>> {
    let season = checked_season(&season)?;
    let guard = lock_admin(&admin)?;
    Ok(Json(guard.season_participants(season)?))
}

async fn add_season_participant<S: SeasonStore + Send + 'static>(
    State(admin): State<SharedAdmin<S>>,
    Path(season): Path<String>,
    JsonBody(body): JsonBody<ParticipantPayload>,
) -> ApiResult<Value> {
    let season = checked_season(&season)?;
    let name = required_name(body.name)?;
    lock_admin(&admin)?.add_season_participant(season, Player::new(name, body.seed))?;
    Ok(ok())
}

async fn remove_season_participant<S: SeasonStore + Send + 'static>(
    State(admin): State<SharedAdmin<S>>,
    Path(season): Path<String>,
    JsonBody(body): JsonBody<NamePayload>,
) -> ApiResult<Value> {
    let season = checked_season(&season)?;
    let name = required_name(body.name)?;
    lock_admin(&admin)?.remove_season_participant(season, &name)?;
    Ok(ok())
}

async fn regenerate_bracket<S: SeasonStore + Send + 'static>(
    State(admin): State<SharedAdmin<S>>,
    Path(season): Path<String>,
) -> ApiResult<Value> {
    let season = checked_season(&season)?;
    lock_admin(&admin)?.regenerate_bracket(season)?;
    Ok(ok())
}

async fn set_match_winner<S: SeasonStore + Send + 'static>(
    State(admin): State<SharedAdmin<S>>,
    Path(season): Path<String>,
    JsonBody(body): JsonBody<MatchPayload>,
) -> ApiResult<Value> {
    let season = checked_season(&season)?;
    let (Some(round), Some(match_number)) = (round_key(body.round), body.match_number.filter(|n| *n > 0)) else {
        return Err(ApiError::bad_request("round, matchNumber required"));
    };
    let update = lock_admin(&admin)?.set_winner(season, &round, match_number, body.winner.as_deref())?;
    let applied = update != WinnerUpdate::NotFound;
    Ok(Json(json!({ "ok": true, "applied": applied })))
}

async fn list_season_moderators<S: SeasonStore + Send + 'static>(
    State(admin): State<SharedAdmin<S>>,
    Path(season): Path<String>,
) -> ApiResult<Vec<Moderator>> {
    let season = checked_season(&season)?;
    let guard = lock_admin(&admin)?;
    Ok(Json(guard.season_moderators(season)?))
}

async fn add_season_moderator<S: SeasonStore + Send + 'static>(
    State(admin): State<SharedAdmin<S>>,
    Path(season): Path<String>,
    JsonBody(body): JsonBody<NamePayload>,
) -> ApiResult<Value> {
    let season = checked_season(&season)?;
    let name = required_name(body.name)?;
    lock_admin(&admin)?.add_season_moderator(season, &name)?;
    Ok(ok())
}

async fn remove_season_moderator<S: SeasonStore + Send + 'static>(
    State(admin): State<SharedAdmin<S>>,
    Path(season): Path<String>,
    JsonBody(body): JsonBody<NamePayload>,
) -> ApiResult<Value> {
    let season = checked_season(&season)?;
    let name = required_name(body.name)?;
    lock_admin(&admin)?.remove_season_moderator(season, &name)?;
    Ok(ok())
}

// ── Global roster handlers ─────────────────────────────────────────────

async fn list_global_participants<S: SeasonStore + Send + 'static>(
    State(admin): State<SharedAdmin<S>>,
) -> ApiResult<Vec<Player>> {
    let guard = lock_admin(&admin)?;
    Ok(Json(guard.global_participants()?))
}

async fn add_global_participant<S: SeasonStore + Send + 'static>(
    State(admin): State<SharedAdmin<S>>,
    JsonBody(body): JsonBody<ParticipantPayload>,
) -> ApiResult<Value> {
    let name = required_name(body.name)?;
    lock_admin(&admin)?.add_global_participant(Player::new(name, body.seed))?;
    Ok(ok())
}

async fn remove_global_participant<S: SeasonStore + Send + 'static>(
    State(admin): State<SharedAdmin<S>>,
    JsonBody(body): JsonBody<NamePayload>,
) -> ApiResult<Value> {
    let name = required_name(body.name)?;
    lock_admin(&admin)?.remove_global_participant(&name)?;
    Ok(ok())
}

async fn list_global_moderators<S: SeasonStore + Send + 'static>(
    State(admin): State<SharedAdmin<S>>,
) -> ApiResult<Vec<Moderator>> {
    let guard = lock_admin(&admin)?;
    Ok(Json(guard.global_moderators()?))
}

async fn add_global_moderator<S: SeasonStore + Send + 'static>(
    State(admin): State<SharedAdmin<S>>,
    JsonBody(body): JsonBody<NamePayload>,
) -> ApiResult<Value> {
    let name = required_name(body.name)?;
    lock_admin(&admin)?.add_global_moderator(&name)?;
    Ok(ok())
}

async fn remove_global_moderator<S: SeasonStore + Send + 'static>(
    State(admin): State<SharedAdmin<S>>,
    JsonBody(body): JsonBody<NamePayload>,
) -> ApiResult<Value> {
    let name = required_name(body.name)?;
    lock_admin(&admin)?.remove_global_moderator(&name)?;
    Ok(ok())
}
