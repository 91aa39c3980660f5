//! Page routes - full HTML page renders.

use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use std::sync::Arc;

use super::PageViewQuery;
use crate::helpers::{OptionExt, RouteResult, page_index, validate_page};
use crate::state::AppState;
use crate::templates::{AppTemplate, IndexTemplate};

/// Landing page with upload form.
pub async fn index(State(state): State<Arc<AppState>>) -> IndexTemplate {
    IndexTemplate::new(&state.config.upload)
}

/// Liveness probe.
pub async fn health() -> &'static str {
    "ok"
}

/// Redirect /view/{session_id} to a canonical page URL.
///
/// Also serves the jump-to-page form, which submits `?page=N` (1-based).
pub async fn view_page_redirect(
    Path(session_id): Path<String>,
    Query(query): Query<PageViewQuery>,
) -> Redirect {
    let page = query.page.unwrap_or(1).max(1);
    Redirect::to(&format!("/view/{session_id}/{page}"))
}

/// View a specific page (for direct URL access and browser history).
///
/// URL uses 1-based page numbers for better UX (page 1 = first page).
pub async fn view_page(
    State(state): State<Arc<AppState>>,
    Path((session_id, url_page)): Path<(String, usize)>,
) -> RouteResult<AppTemplate> {
    let page = page_index(url_page)?;

    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    let (filename, page_count, size_warning) = session
        .with_session(|s| {
            (
                s.original_filename.clone(),
                s.pages.len(),
                s.size_warning.clone(),
            )
        })
        .await
        .or_not_found("Session not found")?;

    validate_page(page, page_count)?;

    Ok(AppTemplate::at_page(
        session_id,
        filename,
        page_count,
        page,
        size_warning,
        &state.config.languages,
    ))
}
