//! Recognition route - OCR + translation chain for one page.

use askama::Template;
use axum::{
    extract::{Path, State},
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, error};

use crate::helpers::{OptionExt, ResultExt, RouteResult, html_response, page_index, validate_page};
use crate::state::AppState;
use crate::templates::ResultTemplate;

/// Recognize and translate a page - returns the result panel HTML.
///
/// HTMX: Replaces `#result`. Page number is 1-based and explicit in the URL.
/// Nothing is cached: every click re-runs OCR and both hops.
pub async fn recognize_page(
    State(state): State<Arc<AppState>>,
    Path((session_id, url_page)): Path<(String, usize)>,
) -> RouteResult<Response> {
    let page = page_index(url_page)?;
    debug!("recognize_page: session={}, page={}", session_id, url_page);

    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    let pages = session
        .with_session(|s| Arc::clone(&s.pages))
        .await
        .or_not_found("Session not found")?;
    validate_page(page, pages.len())?;

    let template = match state.translator.process_index(&pages, page).await {
        Ok(outcome) => ResultTemplate::from_outcome(page + 1, &outcome, state.translator.chain().languages()),
        Err(e) => {
            error!("Recognition failed for page {}: {}", page + 1, e);
            ResultTemplate::error(page + 1, e.to_string())
        }
    };

    let html = template.render().or_internal_error()?;
    html_response(html)
}
