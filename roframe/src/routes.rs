//! HTTP surface of the frame
//!
//! Two route sets exist: the pairing mode (no credential yet) and the
//! connected frame mode. Both share `/ping`, the static assets and the
//! OpenAPI documentation under `/swagger-ui/frame`.

use crate::pages;
use crate::reload::ReloadHandle;
use crate::setup;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use rofbridge::ZoneBridge;
use rofconfig::{FrameSettings, SettingsStore, validate_settings_form};
use rofroon::RoonAdapter;
use rofserver::Server;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;
use utoipa::OpenApi;

/// Extensions the slideshow will serve
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tiff"];

/// Shared handler state for one instance of the app
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SettingsStore>,
    pub settings: Arc<FrameSettings>,
    pub base_url: String,
    /// Absent in pairing mode
    pub adapter: Option<RoonAdapter>,
    /// Absent in pairing mode
    pub bridge: Option<Arc<ZoneBridge>>,
    pub reload: ReloadHandle,
}

/// Erreur API
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: anyhow::Error,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: anyhow::anyhow!(message.into()),
        }
    }

    pub fn locked() -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            error: anyhow::anyhow!("Settings are locked"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({
                "error": self.error.to_string()
            })),
        )
            .into_response()
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: err.into(),
        }
    }
}

/// Everything the display page needs to configure itself
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DisplayConfig {
    pub name: String,
    pub slideshow_enabled: bool,
    pub images: Vec<String>,
    pub transition_seconds: u32,
    /// Percent chance of showing the clock instead of the next slide
    pub clock_ratio: u32,
    pub clock_size: u32,
    pub clock_offset: u32,
}

/// Current tunables plus the zone picker data
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SettingsView {
    pub name: String,
    pub display_on_hour: u32,
    pub display_off_hour: u32,
    pub display_control: bool,
    pub slideshow_enabled: bool,
    pub slideshow_folder: String,
    pub slideshow_transition_seconds: u32,
    pub slideshow_clock_ratio: u32,
    pub clock_size: u32,
    pub clock_offset: u32,
    pub host: String,
    pub port: u16,
    pub lock_settings: bool,
    pub roon_zone: String,
    pub available_zones: Vec<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UpdateSettingsResponse {
    pub success: bool,
    pub message: String,
}

/// GET /api/frame/display - Configuration de la page d'affichage
#[utoipa::path(
    get,
    path = "/api/frame/display",
    tag = "frame",
    responses(
        (status = 200, description = "Display page configuration", body = DisplayConfig)
    )
)]
async fn display_config(State(state): State<AppState>) -> Json<DisplayConfig> {
    let settings = &state.settings;

    let images = if settings.slideshow_enabled {
        list_slideshow_images(&settings.slideshow_folder)
    } else {
        Vec::new()
    };

    Json(DisplayConfig {
        name: settings.name.clone(),
        slideshow_enabled: settings.slideshow_enabled,
        images,
        transition_seconds: settings.slideshow_transition_seconds,
        clock_ratio: settings.slideshow_clock_ratio,
        clock_size: settings.clock_size,
        clock_offset: settings.clock_offset,
    })
}

/// GET /api/frame/now-playing - Snapshot courant de la zone suivie
#[utoipa::path(
    get,
    path = "/api/frame/now-playing",
    tag = "frame",
    responses(
        (status = 200, description = "Current snapshot, or null when the zone is absent", body = serde_json::Value)
    )
)]
async fn now_playing(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let Some(bridge) = &state.bridge else {
        return Err(ApiError::bad_request("Not connected to Roon"));
    };

    let snapshot = bridge.get_zone_snapshot().await;
    Ok(Json(serde_json::to_value(snapshot)?))
}

/// GET /api/frame/settings - Réglages courants
#[utoipa::path(
    get,
    path = "/api/frame/settings",
    tag = "frame",
    responses(
        (status = 200, description = "Current settings", body = SettingsView)
    )
)]
async fn settings_view(State(state): State<AppState>) -> Json<SettingsView> {
    let settings = &state.settings;

    let available_zones = match &state.adapter {
        Some(adapter) => adapter.zone_names().await,
        None => Vec::new(),
    };

    Json(SettingsView {
        name: settings.name.clone(),
        display_on_hour: settings.display_on_hour,
        display_off_hour: settings.display_off_hour,
        display_control: settings.display_control,
        slideshow_enabled: settings.slideshow_enabled,
        slideshow_folder: settings.slideshow_folder.display().to_string(),
        slideshow_transition_seconds: settings.slideshow_transition_seconds,
        slideshow_clock_ratio: settings.slideshow_clock_ratio,
        clock_size: settings.clock_size,
        clock_offset: settings.clock_offset,
        host: settings.host.clone(),
        port: settings.port,
        lock_settings: settings.lock_settings,
        roon_zone: settings.zone_name.clone(),
        available_zones,
    })
}

/// POST /api/frame/settings - Valide, persiste et applique les réglages
#[utoipa::path(
    post,
    path = "/api/frame/settings",
    tag = "frame",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Settings saved", body = UpdateSettingsResponse),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Settings are locked")
    )
)]
async fn settings_update(
    State(state): State<AppState>,
    Json(form): Json<BTreeMap<String, String>>,
) -> Result<Json<UpdateSettingsResponse>, ApiError> {
    if state.settings.lock_settings {
        return Err(ApiError::locked());
    }

    let mut validated =
        validate_settings_form(&form).map_err(|err| ApiError::bad_request(err.to_string()))?;

    // The zone passes through untouched; changing it is allowed without
    // re-pairing as long as the credential stays the same core's
    if let Some(zone) = form.get("ROON_ZONE") {
        if !zone.trim().is_empty() {
            validated.insert("ROON_ZONE".to_string(), zone.trim().to_string());
        }
    }

    state.store.set_many(validated)?;
    state.reload.request_reload();

    Ok(Json(UpdateSettingsResponse {
        success: true,
        message: "Settings saved, applying...".to_string(),
    }))
}

/// GET /slideshow/{filename} - Service restreint au dossier du diaporama
///
/// Le nom demandé doit être membre du listing du dossier configuré, sinon
/// 404. Aucune traversée possible : on ne compose jamais un chemin à partir
/// d'une entrée qui n'est pas dans le listing.
pub async fn slideshow_pic(
    Path(filename): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let folder = &state.settings.slideshow_folder;

    let listed = std::fs::read_dir(folder)
        .ok()
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .any(|e| e.file_name().to_string_lossy() == filename)
        })
        .unwrap_or(false);

    if !listed {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "File not found"})),
        )
            .into_response();
    }

    match std::fs::read(folder.join(&filename)) {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type_for(&filename))],
            bytes,
        )
            .into_response(),
        Err(err) => {
            warn!(error = %err, filename, "Slideshow image vanished between listing and read");
            (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"error": "File not found"})),
            )
                .into_response()
        }
    }
}

fn content_type_for(filename: &str) -> &'static str {
    match filename.rsplit('.').next().map(|ext| ext.to_lowercase()) {
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ext) if ext == "gif" => "image/gif",
        Some(ext) if ext == "bmp" => "image/bmp",
        Some(ext) if ext == "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// Sorted listing of the images the slideshow may serve
fn list_slideshow_images(folder: &std::path::Path) -> Vec<String> {
    let entries = match std::fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(folder = %folder.display(), error = %err, "Slideshow folder unreadable");
            return Vec::new();
        }
    };

    let mut images: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| {
            name.rsplit('.')
                .next()
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    images.sort();
    images
}

/// API OpenAPI du cadre
#[derive(utoipa::OpenApi)]
#[openapi(
    paths(
        display_config,
        now_playing,
        settings_view,
        settings_update,
        setup::setup_info,
        setup::setup_register,
    ),
    components(schemas(
        DisplayConfig,
        SettingsView,
        UpdateSettingsResponse,
        setup::SetupInfo,
        setup::SetupRequest,
        setup::SetupResponse,
    )),
    tags(
        (name = "frame", description = "Frame display and settings endpoints"),
        (name = "setup", description = "One-time pairing endpoints")
    )
)]
pub struct ApiDoc;

async fn ping() -> serde_json::Value {
    serde_json::json!({"message": "pong"})
}

/// Routes servies tant qu'aucun credential Roon n'existe
pub async fn register_setup_mode(server: &mut Server, state: AppState) {
    server.add_route("/ping", ping).await;
    server.add_redirect("/", "/init").await;
    server.add_handler("/init", pages::init_page).await;
    server.add_dir::<pages::Assets>("/static").await;

    let api = Router::new()
        .route(
            "/setup",
            get(setup::setup_info).post(setup::setup_register),
        )
        .with_state(state);
    server.add_openapi(api, ApiDoc::openapi(), "frame").await;
}

/// Routes du mode connecté
pub async fn register_frame_mode(server: &mut Server, state: AppState) {
    server.add_route("/ping", ping).await;
    server.add_handler("/", pages::index_page).await;
    server
        .add_handler_with_state("/settings", pages::settings_page, state.clone())
        .await;
    server.add_redirect("/init", "/settings").await;
    server.add_dir::<pages::Assets>("/static").await;
    server
        .add_handler_with_state("/slideshow/{filename}", slideshow_pic, state.clone())
        .await;

    let api = Router::new()
        .route("/display", get(display_config))
        .route("/now-playing", get(now_playing))
        .route("/settings", get(settings_view).post(settings_update))
        .with_state(state);
    server.add_openapi(api, ApiDoc::openapi(), "frame").await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_slideshow_images_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.jpg", "a.PNG", "notes.txt", "c.gif", "noext"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let images = list_slideshow_images(dir.path());
        assert_eq!(images, vec!["a.PNG", "b.jpg", "c.gif"]);
    }

    #[test]
    fn test_list_slideshow_images_missing_folder_is_empty() {
        let images = list_slideshow_images(std::path::Path::new("/definitely/not/here"));
        assert!(images.is_empty());
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("a.jpg"), "image/jpeg");
        assert_eq!(content_type_for("a.JPEG"), "image/jpeg");
        assert_eq!(content_type_for("a.png"), "image/png");
        assert_eq!(content_type_for("weird"), "application/octet-stream");
    }
}
