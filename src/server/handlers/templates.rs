//! Template catalog handler.

use axum::Json;

use crate::templates::{self, QrTemplate};

/// GET /api/templates - List built-in templates.
pub async fn list() -> Json<&'static [QrTemplate]> {
    Json(templates::all())
}
