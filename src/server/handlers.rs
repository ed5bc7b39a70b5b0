use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::apis::ModSource;
use crate::auth::{spawn_hash, spawn_verify, validate_registration};
use crate::constants::{DEFAULT_SHOWCASE_LIMIT, PARSE_DEFAULT_LIMIT, PARSE_PAGE_DEFAULT_LIMIT};
use crate::error::StorageError;
use crate::metrics::CatalogMetrics;
use crate::pipeline::{aggregate, IngestReport, IngestionWriter, ModReport};
use crate::query::{self, parse_limit, ModListQuery};
use crate::types::{Category, MinecraftVersion, Mod, NewUser, Paginated, PublicUser};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<String>,
}

impl LimitParams {
    fn or(&self, default: usize) -> usize {
        parse_limit(self.limit.as_deref(), default)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: &'static str,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    #[serde(flatten)]
    pub item: Mod,
    pub redirect_url: String,
}

#[derive(Debug, Serialize)]
pub struct PageIngestReport {
    pub page: usize,
    #[serde(flatten)]
    pub report: IngestReport,
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "modvoyage",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn list_versions(State(state): State<AppState>) -> ApiResult<Json<Vec<MinecraftVersion>>> {
    state
        .store
        .get_minecraft_versions()
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Failed to retrieve Minecraft versions", e))
}

pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    state
        .store
        .get_categories()
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Failed to retrieve categories", e))
}

pub async fn popular_mods(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> ApiResult<Json<Vec<Mod>>> {
    state
        .store
        .get_popular_mods(params.or(DEFAULT_SHOWCASE_LIMIT))
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Failed to retrieve popular mods", e))
}

pub async fn latest_mods(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> ApiResult<Json<Vec<Mod>>> {
    state
        .store
        .get_latest_mods(params.or(DEFAULT_SHOWCASE_LIMIT))
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Failed to retrieve latest mods", e))
}

pub async fn get_mod(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Mod>> {
    let Ok(id) = id.parse::<i64>() else {
        return Err(ApiError::NotFound("Mod not found"));
    };
    state
        .store
        .get_mod(id)
        .await
        .map_err(|e| ApiError::internal("Failed to retrieve mod", e))?
        .map(Json)
        .ok_or(ApiError::NotFound("Mod not found"))
}

pub async fn search_mods(
    State(state): State<AppState>,
    Query(params): Query<ModListQuery>,
) -> ApiResult<Json<Paginated<Mod>>> {
    query::list_mods(state.store.as_ref(), &params)
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Failed to search mods", e))
}

pub async fn download_mod(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DownloadResponse>> {
    let Ok(id) = id.parse::<i64>() else {
        return Err(ApiError::NotFound("Mod not found"));
    };
    let item = state
        .store
        .increment_download_count(id)
        .await
        .map_err(|e| ApiError::internal("Failed to increment download count", e))?
        .ok_or(ApiError::NotFound("Mod not found"))?;

    CatalogMetrics::record_download();
    Ok(Json(DownloadResponse {
        redirect_url: item.source_url.clone(),
        item,
    }))
}

pub async fn parse_curseforge(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Json<ModReport> {
    let batch = state.curseforge.fetch(params.or(PARSE_DEFAULT_LIMIT)).await;
    let report = IngestionWriter::new(state.store.clone())
        .ingest_mods(&batch.mods)
        .await;
    Json(report)
}

pub async fn parse_modrinth(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Json<IngestReport> {
    let batch = state.modrinth.fetch(params.or(PARSE_DEFAULT_LIMIT)).await;
    Json(IngestionWriter::new(state.store.clone()).ingest(&batch).await)
}

pub async fn parse_modrinth_page(
    State(state): State<AppState>,
    Path(page): Path<String>,
    Query(params): Query<LimitParams>,
) -> Json<PageIngestReport> {
    let page = parse_limit(Some(page.as_str()), 1);
    let limit = params.or(PARSE_PAGE_DEFAULT_LIMIT);
    info!("Parsing Modrinth page {} with limit {}", page, limit);

    let batch = state.modrinth.fetch_page(page, limit).await;
    let report = IngestionWriter::new(state.store.clone()).ingest(&batch).await;
    Json(PageIngestReport { page, report })
}

pub async fn parse_all(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Json<IngestReport> {
    let batch = aggregate(&state.sources(), params.or(PARSE_DEFAULT_LIMIT)).await;
    Json(IngestionWriter::new(state.store.clone()).ingest(&batch).await)
}

pub async fn register(
    State(state): State<AppState>,
    body: Option<Json<Credentials>>,
) -> ApiResult<impl IntoResponse> {
    let form = body.map(|Json(form)| form).unwrap_or_default();
    let username = form.username.unwrap_or_default();
    let password = form.password.unwrap_or_default();

    validate_registration(&username, &password).map_err(|errors| ApiError::Validation {
        message: "Invalid user data",
        errors,
    })?;

    let existing = state
        .store
        .get_user_by_username(&username)
        .await
        .map_err(|e| ApiError::internal("Failed to register user", e))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("Username already exists"));
    }

    let password_hash = spawn_hash(password)
        .await
        .map_err(|e| ApiError::internal("Failed to register user", e))?;
    let user = state
        .store
        .create_user(NewUser {
            username,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StorageError::Conflict { .. } => ApiError::Conflict("Username already exists"),
            other => ApiError::internal("Failed to register user", other),
        })?;

    info!("Registered user {}", user.username);
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: "User registered successfully",
            user: user.into(),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    body: Option<Json<Credentials>>,
) -> ApiResult<Json<UserResponse>> {
    let form = body.map(|Json(form)| form).unwrap_or_default();
    let (Some(username), Some(password)) = (
        form.username.filter(|u| !u.is_empty()),
        form.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::BadRequest("Username and password are required"));
    };

    let user = state
        .store
        .get_user_by_username(&username)
        .await
        .map_err(|e| ApiError::internal("Failed to login", e))?
        .ok_or(ApiError::Unauthorized("Invalid username or password"))?;

    let verified = spawn_verify(password, user.password_hash.clone())
        .await
        .map_err(|e| ApiError::internal("Failed to login", e))?;
    if !verified {
        return Err(ApiError::Unauthorized("Invalid username or password"));
    }

    Ok(Json(UserResponse {
        message: "Login successful",
        user: user.into(),
    }))
}

/// There is no session layer, so nobody is ever signed in
pub async fn current_user() -> ApiError {
    ApiError::Unauthorized("Not authenticated")
}
