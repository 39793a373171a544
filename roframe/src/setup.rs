//! Pairing flow
//!
//! First boot serves only this surface: a page showing the pairing URL as a
//! QR code, and the endpoint that runs the registration ceremony. The POST
//! blocks until the operator approves the extension in Roon Settings →
//! Extensions — there is no timeout on the human.

use crate::routes::{ApiError, AppState};
use axum::{Json, extract::State};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use qrcode::QrCode;
use qrcode::render::svg;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Pairing page data
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SetupInfo {
    /// URL of the pairing page on the local network
    pub url: String,
    /// QR code for `url` as a data URI, when rendering succeeded
    pub qr_code: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SetupRequest {
    /// Operator-chosen device name
    pub name: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SetupResponse {
    pub message: String,
    /// Zones visible on the core, first one becomes the default
    pub zones: Vec<String>,
}

/// GET /api/frame/setup - URL d'appairage et QR code
#[utoipa::path(
    get,
    path = "/api/frame/setup",
    tag = "setup",
    responses(
        (status = 200, description = "Pairing URL and QR code", body = SetupInfo)
    )
)]
pub async fn setup_info(State(state): State<AppState>) -> Json<SetupInfo> {
    let url = format!("http://{}:{}/init", state.base_url, state.settings.port);

    let qr_code = match qr_data_uri(&url) {
        Ok(data_uri) => Some(data_uri),
        Err(err) => {
            error!(error = %err, "Could not render the pairing QR code");
            None
        }
    };

    Json(SetupInfo { url, qr_code })
}

/// POST /api/frame/setup - Lance la cérémonie d'appairage
///
/// Bloque jusqu'à l'approbation de l'opérateur sur le core. En cas de
/// succès, persiste le credential, choisit la première zone visible comme
/// zone par défaut et déclenche le rechargement de l'instance.
#[utoipa::path(
    post,
    path = "/api/frame/setup",
    tag = "setup",
    request_body = SetupRequest,
    responses(
        (status = 200, description = "Registration successful", body = SetupResponse),
        (status = 400, description = "No core found, or invalid name")
    )
)]
pub async fn setup_register(
    State(state): State<AppState>,
    Json(request): Json<SetupRequest>,
) -> Result<Json<SetupResponse>, ApiError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Name cannot be empty"));
    }

    state.store.set("NAME", name)?;

    info!(name, "Starting Roon registration");
    let zones = rofroon::register(&state.store, name)
        .await
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    if zones.is_empty() {
        return Err(ApiError::bad_request("No Roon zones found"));
    }

    state.store.set("ROON_ZONE", &zones[0])?;
    info!(zone = %zones[0], "Registration successful, reloading");
    state.reload.request_reload();

    Ok(Json(SetupResponse {
        message: "Registration successful".to_string(),
        zones,
    }))
}

fn qr_data_uri(url: &str) -> anyhow::Result<String> {
    let code = QrCode::new(url.as_bytes())?;
    let rendered = code
        .render::<svg::Color>()
        .min_dimensions(240, 240)
        .build();
    Ok(format!(
        "data:image/svg+xml;base64,{}",
        BASE64.encode(rendered.as_bytes())
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_data_uri_shape() {
        let data_uri = qr_data_uri("http://192.168.1.42:5006/init").unwrap();
        assert!(data_uri.starts_with("data:image/svg+xml;base64,"));

        let encoded = data_uri.trim_start_matches("data:image/svg+xml;base64,");
        let decoded = BASE64.decode(encoded).unwrap();
        let svg_text = String::from_utf8(decoded).unwrap();
        assert!(svg_text.contains("<svg"));
    }
}
