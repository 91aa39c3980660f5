//! HTTP route handlers for the manga translator web application.
//!
//! All routes return either HTML (full pages or HTMX fragments) or page
//! images. HTML routes use Askama templates from the `templates` module.

mod pages;
mod recognize;
mod upload;
mod viewer;

pub use pages::{health, index, view_page, view_page_redirect};
pub use recognize::recognize_page;
pub use upload::upload_file;
pub use viewer::get_page_image;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, header},
    routing::{get, post},
};
use serde::Deserialize as SerdeDeserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir,
    set_header::SetResponseHeaderLayer, trace::TraceLayer,
};

use crate::state::AppState;

/// Query params for the jump-to-page form.
#[derive(SerdeDeserialize, Default)]
pub struct PageViewQuery {
    /// 1-based page number from the input field
    #[serde(default)]
    pub page: Option<usize>,
}

/// Build the application router.
///
/// The request body limit is twice the hard upload limit, so oversized
/// files still reach the size gate and get a readable message.
pub fn router(state: Arc<AppState>, static_dir: PathBuf) -> Router {
    let body_limit =
        usize::try_from(state.config.upload.hard_limit_bytes.saturating_mul(2)).unwrap_or(usize::MAX);

    Router::new()
        // Pages
        .route("/", get(index))
        .route("/health", get(health))
        .route("/view/{session_id}", get(view_page_redirect))
        .route("/view/{session_id}/{page}", get(view_page))
        // API endpoints
        .route("/api/upload", post(upload_file))
        .route("/api/recognize/{session_id}/{page}", post(recognize_page))
        .route("/api/page/{session_id}/{page}", get(get_page_image))
        // Static files with Cache-Control: no-cache (cache but always revalidate via ETag)
        .nest_service(
            "/static",
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("no-cache"),
                ))
                .service(ServeDir::new(static_dir)),
        )
        // Middleware
        // HTML is never cached; page images set their own headers
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, max-age=0"),
        ))
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::state::tests::{Echo, Fixed, Silent, pages, test_state, test_state_with_config};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, Response, StatusCode};
    use image::{DynamicImage, ImageFormat, RgbImage};
    use manga_translator_core::config::UploadLimits;
    use manga_translator_core::{AppConfig, NO_TEXT_FOUND};
    use std::io::Cursor;
    use tower::ServiceExt;

    const BOUNDARY: &str = "manga-test-boundary";

    fn app(state: Arc<AppState>) -> Router {
        router(state, PathBuf::from("static"))
    }

    fn png_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(12, 18))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn upload_request(filename: &str, data: &[u8], htmx: bool) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let mut builder = Request::post("/api/upload").header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if htmx {
            builder = builder.header("HX-Request", "true");
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn body_text(response: Response<Body>) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let state = Arc::new(test_state(Arc::new(Silent), Arc::new(Echo)));
        let response = app(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn test_index_shows_limits() {
        let state = Arc::new(test_state(Arc::new(Silent), Arc::new(Echo)));
        let response = app(state)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("10 MiB"));
        assert!(html.contains("name=\"file\""));
    }

    #[tokio::test]
    async fn test_unsupported_upload_htmx_fragment() {
        let state = Arc::new(test_state(Arc::new(Silent), Arc::new(Echo)));
        let response = app(state)
            .oneshot(upload_request("notes.txt", b"hello", true))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("unsupported file format: .txt"));
    }

    #[tokio::test]
    async fn test_unsupported_upload_form_fallback() {
        let state = Arc::new(test_state(Arc::new(Silent), Arc::new(Echo)));
        let response = app(state)
            .oneshot(upload_request("notes.txt", b"hello", false))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = body_text(response).await;
        assert!(html.contains("unsupported file format"));
        assert!(html.contains("<form"));
    }

    #[tokio::test]
    async fn test_upload_then_view_and_fetch_page() {
        let state = Arc::new(test_state(Arc::new(Silent), Arc::new(Echo)));

        let response = app(Arc::clone(&state))
            .oneshot(upload_request("page.png", &png_bytes(), false))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
        assert!(location.starts_with("/view/") && location.ends_with("/1"));
        let session_id = location.trim_start_matches("/view/").trim_end_matches("/1").to_string();

        let response = app(Arc::clone(&state))
            .oneshot(Request::get(location.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("page.png"));

        let image_url = format!("/api/page/{session_id}/0");
        let response = app(Arc::clone(&state))
            .oneshot(
                Request::get(image_url.as_str())
                    .header(header::ACCEPT, "image/webp,image/*")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/webp");
        let etag = response.headers()[header::ETAG].clone();

        let response = app(Arc::clone(&state))
            .oneshot(
                Request::get(image_url.as_str())
                    .header(header::ACCEPT, "image/webp")
                    .header(header::IF_NONE_MATCH, etag)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

        let response = app(state)
            .oneshot(
                Request::get(format!("/api/page/{session_id}/1"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    /// State whose limits make a tiny PNG "large" and 5000 bytes "too large".
    fn small_limit_state() -> Arc<AppState> {
        let config = AppConfig {
            upload: UploadLimits {
                soft_limit_bytes: 16,
                hard_limit_bytes: 4096,
            },
            ..AppConfig::default()
        };
        Arc::new(test_state_with_config(config, Arc::new(Silent), Arc::new(Echo)))
    }

    #[tokio::test]
    async fn test_upload_over_hard_limit_is_rejected() {
        let state = small_limit_state();
        let response = app(Arc::clone(&state))
            .oneshot(upload_request("big.png", &[0u8; 5000], false))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = body_text(response).await;
        assert!(html.contains("file is too large (5000 bytes, limit is 4096 bytes)"));
        assert_eq!(state.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_upload_over_soft_limit_shows_warning() {
        let state = small_limit_state();
        let response = app(Arc::clone(&state))
            .oneshot(upload_request("page.png", &png_bytes(), false))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();

        let response = app(state)
            .oneshot(Request::get(location.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("alert-warning"));
        assert!(html.contains("Large file"));
    }

    #[tokio::test]
    async fn test_malformed_multipart_reports_reason() {
        let state = Arc::new(test_state(Arc::new(Silent), Arc::new(Echo)));
        let request = Request::post("/api/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header("HX-Request", "true")
            .body(Body::from("this body never opens a part"))
            .unwrap();

        let response = app(Arc::clone(&state)).oneshot(request).await.unwrap();
        let html = body_text(response).await;
        assert!(html.contains("Upload failed"));
        assert!(!html.contains("No file uploaded"));
        assert_eq!(state.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_page_zero_is_rejected() {
        let state = Arc::new(test_state(Arc::new(Fixed("猫")), Arc::new(Echo)));
        let session_id = state.create_session(pages(2), "vol.cbz".to_string(), None).await;

        let response = app(Arc::clone(&state))
            .oneshot(
                Request::get(format!("/view/{session_id}/0"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app(state)
            .oneshot(
                Request::post(format!("/api/recognize/{session_id}/0"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_png_fallback_without_webp_accept() {
        let state = Arc::new(test_state(Arc::new(Silent), Arc::new(Echo)));
        let session_id = state.create_session(pages(1), "a.cbz".to_string(), None).await;

        let response = app(state)
            .oneshot(
                Request::get(format!("/api/page/{session_id}/0"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    }

    #[tokio::test]
    async fn test_jump_redirect() {
        let state = Arc::new(test_state(Arc::new(Silent), Arc::new(Echo)));
        let response = app(state)
            .oneshot(Request::get("/view/abc?page=4").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.headers()[header::LOCATION], "/view/abc/4");
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let state = Arc::new(test_state(Arc::new(Silent), Arc::new(Echo)));
        let response = app(state)
            .oneshot(Request::get("/view/nope/1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_recognize_runs_both_hops() {
        let state = Arc::new(test_state(Arc::new(Fixed("猫")), Arc::new(Echo)));
        let session_id = state.create_session(pages(2), "vol.cbz".to_string(), None).await;

        let response = app(state)
            .oneshot(
                Request::post(format!("/api/recognize/{session_id}/2"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains("猫"));
        assert!(html.contains("en:猫"));
        assert!(html.contains("ru:en:猫"));
    }

    #[tokio::test]
    async fn test_recognize_blank_page() {
        let state = Arc::new(test_state(Arc::new(Silent), Arc::new(Echo)));
        let session_id = state.create_session(pages(1), "a.png".to_string(), None).await;

        let response = app(state)
            .oneshot(
                Request::post(format!("/api/recognize/{session_id}/1"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let html = body_text(response).await;
        assert_eq!(html.matches(NO_TEXT_FOUND).count(), 3);
    }
}
