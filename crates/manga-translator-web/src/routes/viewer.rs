//! Viewer routes - page image rendering.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::Response,
};
use std::sync::Arc;

use crate::helpers::{OptionExt, ResultExt, RouteResult, validate_page};
use crate::state::AppState;

/// Get page image as PNG or WebP (based on Accept header).
///
/// `page` is 0-based. Pages never change within a session, so the ETag is
/// derived from the upload's content id and the response is immutable.
pub async fn get_page_image(
    State(state): State<Arc<AppState>>,
    Path((session_id, page)): Path<(String, usize)>,
    headers: HeaderMap,
) -> RouteResult<Response> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    // Clone the Arc inside the lock, render outside it
    let pages = session
        .with_session(|s| Arc::clone(&s.pages))
        .await
        .or_not_found("Session not found")?;
    validate_page(page, pages.len())?;

    // Check if browser supports WebP
    let use_webp = headers
        .get(header::ACCEPT)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|s| s.contains("image/webp"));
    let (content_type, format_tag) = if use_webp {
        ("image/webp", "webp")
    } else {
        ("image/png", "png")
    };

    let etag = format!("\"{}-{page}-{format_tag}\"", pages.content_id());

    // Check If-None-Match header for 304 response
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && if_none_match.to_str().ok() == Some(etag.as_str())
    {
        return Response::builder()
            .status(StatusCode::NOT_MODIFIED)
            .header(header::ETAG, etag)
            .body(Body::empty())
            .or_internal_error();
    }

    // Encode in blocking task to avoid blocking async runtime
    let image_data = tokio::task::spawn_blocking(move || -> manga_translator_core::Result<Vec<u8>> {
        let page_image = pages.get(page)?;
        if use_webp {
            Ok(page_image.encode_webp())
        } else {
            page_image.encode_png()
        }
    })
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Encode task panicked: {e}"),
        )
    })?
    .or_internal_error()?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::ETAG, etag)
        .header(header::CACHE_CONTROL, "private, max-age=3600, immutable")
        .header(header::VARY, "Accept")
        .body(Body::from(image_data))
        .or_internal_error()
}
