//! Embedded UI pages and static assets
//!
//! The UI is static: pages fetch their data from the JSON API and the push
//! channel, nothing is rendered server-side.

use crate::routes::AppState;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect, Response};
use rust_embed::RustEmbed;

/// Frontend assets served under `/static`
#[derive(RustEmbed, Clone)]
#[folder = "static"]
pub struct Assets;

/// Display page
pub async fn index_page() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

/// Pairing page
pub async fn init_page() -> Html<&'static str> {
    Html(include_str!("../static/init.html"))
}

/// Settings page; locked settings bounce back to the display
pub async fn settings_page(State(state): State<AppState>) -> Response {
    if state.settings.lock_settings {
        return Redirect::to("/").into_response();
    }
    Html(include_str!("../static/settings.html")).into_response()
}
