//! Static file serving for the frontend.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
};
use include_dir::{include_dir, Dir};
use serde::Serialize;
use std::sync::Arc;

use crate::qr::CAPTION_MAX_CHARS;
use crate::suggest::SuggestionProvider;
use crate::templates::{self, QrTemplate};

use super::state::AppState;

/// Embedded frontend distribution files.
static FRONTEND_DIST: Dir = include_dir!("$CARGO_MANIFEST_DIR/frontend/dist");

/// Boot data inlined into the page so the first paint needs no API call.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BootData {
    templates: &'static [QrTemplate],
    caption_max_chars: usize,
    search_enabled: bool,
}

/// Serve index.html with a cache-busting parameter and injected boot data.
pub async fn index_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let Some(file) = FRONTEND_DIST.get_file("index.html") else {
        return (StatusCode::NOT_FOUND, "Frontend not built").into_response();
    };

    let contents = String::from_utf8_lossy(file.contents());
    let cache_bust = format!("?v={}", state.boot_time);
    let busted = contents
        .replace(".js\"", &format!(".js{}\"", cache_bust))
        .replace(".css\"", &format!(".css{}\"", cache_bust));

    let boot = BootData {
        templates: templates::all(),
        caption_max_chars: CAPTION_MAX_CHARS,
        search_enabled: state.providers.suggestions.is_ready(),
    };
    let boot_json = match serde_json::to_string(&boot) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize boot data");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Boot data unavailable").into_response();
        }
    };
    let script = format!("<script>window.__REVIEWQR={}</script></head>", boot_json);

    Html(busted.replace("</head>", &script)).into_response()
}

/// Serve static assets from the assets directory.
pub async fn asset_handler(Path(path): Path<String>) -> impl IntoResponse {
    // Strip query params if present
    let clean_path = path.split('?').next().unwrap_or(&path);
    let file_path = format!("assets/{}", clean_path);

    match FRONTEND_DIST.get_file(&file_path) {
        Some(file) => {
            let mime = mime_guess::from_path(clean_path)
                .first_or_octet_stream()
                .to_string();
            (
                [
                    (header::CONTENT_TYPE, mime),
                    (header::CACHE_CONTROL, "public, max-age=31536000".to_string()),
                ],
                file.contents().to_vec(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "Asset not found").into_response(),
    }
}
