//! Upload route - size gate, normalization, session creation.

use anyhow::Context;
use askama::Template;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Multipart;
use bytes::Bytes;
use manga_translator_core::{Error as CoreError, UploadedFile};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::helpers::{ResultExt, RouteResult, html_response, is_htmx};
use crate::state::AppState;
use crate::templates::{IndexTemplate, UploadErrorTemplate};

/// Upload a page or chapter - redirects to the viewer (POST-Redirect-GET).
///
/// Supports both HTMX requests (HX-Redirect header) and standard form
/// submissions (303 See Other). Rejected uploads re-render the form with
/// the reason; nothing is kept from a failed upload.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> RouteResult<Response> {
    let htmx = is_htmx(&headers);

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed upload body: {}", e);
                return upload_error(
                    &state,
                    htmx,
                    StatusCode::BAD_REQUEST,
                    format!("Upload failed: {e}"),
                );
            }
        };
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                return upload_error(
                    &state,
                    htmx,
                    StatusCode::BAD_REQUEST,
                    format!("Upload failed: {e}"),
                );
            }
        };

        if data.is_empty() {
            break;
        }

        return match accept_upload(&state, filename.clone(), data).await {
            Ok(session_id) => redirect_to_viewer(htmx, &session_id),
            Err(e) => {
                let status = upload_status(&e);
                if status.is_server_error() {
                    error!("Upload of {} failed: {:#}", filename, e);
                } else {
                    warn!("Rejected upload {}: {:#}", filename, e);
                }
                upload_error(&state, htmx, status, e.to_string())
            }
        };
    }

    upload_error(
        &state,
        htmx,
        StatusCode::BAD_REQUEST,
        "No file uploaded".to_string(),
    )
}

/// Size gate, then normalize on a blocking thread and open a session.
async fn accept_upload(state: &AppState, filename: String, data: Bytes) -> anyhow::Result<String> {
    let size = u64::try_from(data.len()).unwrap_or(u64::MAX);
    let size_warning = state.config.upload.check(size)?.warning();

    let file = UploadedFile::new(filename.clone(), data);
    let normalizer = state.normalizer.clone();
    let pages = tokio::task::spawn_blocking(move || normalizer.normalize(&file))
        .await
        .context("Page decoding task failed")??;

    let page_count = pages.len();
    let kind = pages.kind();
    let session_id = state
        .create_session(pages, filename.clone(), size_warning)
        .await;

    info!(
        "Created session {} for {} ({} {} page(s))",
        session_id,
        filename,
        page_count,
        kind.label()
    );

    Ok(session_id)
}

fn redirect_to_viewer(htmx: bool, session_id: &str) -> RouteResult<Response> {
    let redirect_url = format!("/view/{session_id}/1");

    if htmx {
        // HX-Redirect tells HTMX to do a full page navigation
        Response::builder()
            .status(StatusCode::OK)
            .header("HX-Redirect", redirect_url)
            .body(Body::empty())
            .or_internal_error()
    } else {
        Response::builder()
            .status(StatusCode::SEE_OTHER)
            .header(header::LOCATION, redirect_url)
            .body(Body::empty())
            .or_internal_error()
    }
}

/// 400 when the file itself was rejected, 500 for failures on our side
/// (scratch writes, a crashed decoding task).
fn upload_status(error: &anyhow::Error) -> StatusCode {
    match error.downcast_ref::<CoreError>() {
        Some(e) if e.is_user_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// HTMX gets a fragment for `#upload-status` (200 so it is swapped);
/// plain form posts get the whole page back with `status`.
fn upload_error(
    state: &AppState,
    htmx: bool,
    status: StatusCode,
    message: String,
) -> RouteResult<Response> {
    if htmx {
        let html = UploadErrorTemplate { message }.render().or_internal_error()?;
        html_response(html)
    } else {
        Ok((
            status,
            IndexTemplate::with_error(&state.config.upload, message),
        )
            .into_response())
    }
}
