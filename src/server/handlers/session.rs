//! Wizard session API handlers.
//!
//! Every mutating endpoint answers with a fresh [`SessionSnapshot`] so the
//! frontend can redraw from a single source of truth. Provider calls run
//! with the session lock released. Session actions re-render the QR block,
//! so they run on the blocking pool.

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::business::BusinessDetails;
use crate::error::ReviewQrError;
use crate::export::{self, EXPORT_FILENAME, ExportArtifact};
use crate::session::WizardSession;
use crate::suggest::{Suggestion, SuggestionProvider};
use crate::templates::QrTemplate;
use crate::wizard::{MapView, WizardFlags};

use super::super::state::AppState;
use super::{ApiError, api_error};

/// Everything the frontend needs to draw one session.
#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub id: String,
    /// False while the places provider is unavailable (search disabled).
    pub ready: bool,
    pub flags: WizardFlags,
    pub details: BusinessDetails,
    pub map: MapView,
    pub search: String,
    pub suggestions: Vec<Suggestion>,
    pub template: &'static QrTemplate,
    /// The URL encoded in the QR code, once visible.
    pub payload: Option<String>,
    pub download: Option<DownloadView>,
}

/// The download dialog as shown.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadView {
    pub email: String,
    pub phone: String,
    pub confirm_enabled: bool,
}

fn snapshot(id: Uuid, session: &WizardSession) -> SessionSnapshot {
    let wizard = session.wizard();
    SessionSnapshot {
        id: id.to_string(),
        ready: session.is_ready(),
        flags: wizard.flags(),
        details: wizard.details().clone(),
        map: wizard.map_view(),
        search: session.feed().value().to_string(),
        suggestions: session.feed().suggestions().cloned().collect(),
        template: wizard.template(),
        payload: wizard.composition().map(|c| c.payload().to_string()),
        download: wizard.export_request().map(|r| DownloadView {
            email: r.email().to_string(),
            phone: r.phone().to_string(),
            confirm_enabled: r.is_confirm_enabled(),
        }),
    }
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| (StatusCode::BAD_REQUEST, "Invalid session ID".to_string()))
}

/// Run `f` against a session on the blocking pool, holding only that
/// session's lock, then snapshot it.
async fn with_session<T, F>(state: &AppState, id: Uuid, f: F) -> Result<(T, SessionSnapshot), ApiError>
where
    T: Send + 'static,
    F: FnOnce(&mut WizardSession) -> Result<T, ReviewQrError> + Send + 'static,
{
    let entry = state
        .session(&id)
        .await
        .ok_or((StatusCode::NOT_FOUND, "Session not found or expired".to_string()))?;
    let mut entry = entry.lock_owned().await;

    tokio::task::spawn_blocking(move || -> Result<(T, SessionSnapshot), ApiError> {
        entry.touch();
        let value = f(&mut entry.session).map_err(api_error)?;
        Ok((value, snapshot(id, &entry.session)))
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Processing error: {}", e)))?
}

/// Apply a synchronous wizard action and return the new snapshot.
async fn act(
    state: &AppState,
    id: &str,
    f: impl FnOnce(&mut WizardSession) -> Result<(), ReviewQrError> + Send + 'static,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let id = parse_id(id)?;
    let ((), snap) = with_session(state, id, f).await?;
    Ok(Json(snap))
}

/// POST /api/session - Start a wizard.
pub async fn create(State(state): State<Arc<AppState>>) -> Result<Json<SessionSnapshot>, ApiError> {
    let id = state.create_session().await;
    let ((), snap) = with_session(&state, id, |_| Ok(())).await?;
    Ok(Json(snap))
}

/// GET /api/session/:id - Current snapshot.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    act(&state, &id, |_| Ok(())).await
}

/// Request body for search input.
#[derive(Debug, Deserialize)]
pub struct InputRequest {
    pub text: String,
}

/// POST /api/session/:id/input - Update the search box and fetch suggestions.
pub async fn input(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<InputRequest>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let id = parse_id(&id)?;
    let (pending, snap) = with_session(&state, id, move |s| s.begin_input(&req.text)).await?;

    let Some(pending) = pending else {
        return Ok(Json(snap));
    };

    let batch = pending
        .provider
        .suggest(&pending.query.input)
        .await
        .map_err(|e| {
            tracing::warn!(input = %pending.query.input, error = %e, "suggestion request failed");
            api_error(e)
        })?;

    let query = pending.query;
    let (_, snap) = with_session(&state, id, move |s| Ok(s.finish_input(&query, batch))).await?;
    Ok(Json(snap))
}

/// Request body for picking a suggestion.
#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub index: usize,
}

/// POST /api/session/:id/select - Pick a suggestion and resolve it.
pub async fn select(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SelectRequest>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let id = parse_id(&id)?;
    let (pending, _) = with_session(&state, id, move |s| s.begin_select(req.index)).await?;

    let result = pending.run().await;

    let ticket = pending.ticket;
    let (_, snap) = with_session(&state, id, move |s| s.finish_select(&ticket, result)).await?;
    Ok(Json(snap))
}

/// POST /api/session/:id/details/confirm-request - "Confirm Business Details".
pub async fn request_details_confirmation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    act(&state, &id, |s| s.request_details_confirmation()).await
}

/// POST /api/session/:id/details/confirm - "Confirm and Proceed".
pub async fn confirm_details(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    act(&state, &id, |s| s.confirm_details()).await
}

/// POST /api/session/:id/details/edit - "Edit Details".
pub async fn edit_details(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    act(&state, &id, |s| s.edit_details()).await
}

/// Request body for caption edits.
#[derive(Debug, Deserialize)]
pub struct CaptionsRequest {
    #[serde(default)]
    pub primary: String,
    #[serde(default)]
    pub secondary: String,
}

/// PUT /api/session/:id/captions - Replace both captions.
pub async fn set_captions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CaptionsRequest>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    act(&state, &id, move |s| s.set_captions(&req.primary, &req.secondary)).await
}

/// Request body for template selection.
#[derive(Debug, Deserialize)]
pub struct TemplateRequest {
    pub id: u32,
}

/// PUT /api/session/:id/template - Switch template.
pub async fn select_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<TemplateRequest>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    act(&state, &id, move |s| s.select_template(req.id)).await
}

/// GET /api/session/:id/preview.png - The block currently on screen.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let (handle, _) = with_session(&state, id, |s| Ok(s.handle().clone())).await?;

    let png = tokio::task::spawn_blocking(move || {
        handle.block().map(export::encode_png).transpose()
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Processing error: {}", e)))?
    .map_err(api_error)?
    .ok_or((StatusCode::NOT_FOUND, "Nothing rendered yet".to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        png,
    ))
}

/// POST /api/session/:id/download - "Download QR Code": open the dialog.
pub async fn request_download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    act(&state, &id, |s| s.request_download()).await
}

/// Request body for the dialog's contact fields.
#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// PUT /api/session/:id/download/contact - Update email and phone.
pub async fn set_contact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ContactRequest>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    act(&state, &id, move |s| s.set_export_contact(&req.email, &req.phone)).await
}

/// POST /api/session/:id/download/cancel - "Cancel".
pub async fn cancel_download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    act(&state, &id, |s| s.cancel_download()).await
}

/// POST /api/session/:id/download/confirm - "Confirm and Download".
///
/// Responds with the PNG as an attachment, or 204 if nothing was rendered.
/// 422 while email or phone is empty.
pub async fn confirm_download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let (handle, _) = with_session(&state, id, |s| {
        if s.wizard().export_request().is_none() {
            return Err(ReviewQrError::InvalidTransition {
                stage: s.wizard().stage().name(),
                action: "confirm download",
            });
        }
        let control = s.confirm_control().ok_or_else(|| {
            ReviewQrError::PreconditionNotMet("email and phone are required".to_string())
        })?;
        s.begin_export(control)
    })
    .await?;

    let exported = tokio::task::spawn_blocking(move || export::export(&handle)).await;

    // The dialog closes whether or not encoding worked.
    with_session(&state, id, |s| s.finish_export()).await?;

    let artifact = exported
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Processing error: {}", e)))?
        .map_err(api_error)?;

    Ok(match artifact {
        Some(artifact) => download_response(artifact),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

fn download_response(artifact: ExportArtifact) -> Response {
    (
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILENAME),
            ),
        ],
        artifact.png,
    )
        .into_response()
}
