//! Helper types and traits for cleaner route handlers.
//!
//! Provides extension traits for converting `Option` and `Result` types
//! into HTTP-appropriate error responses, reducing boilerplate in routes.

use axum::{
    body::Body,
    http::{HeaderMap, StatusCode, header},
    response::Response,
};

/// Standard result type for route handlers returning HTML.
pub type RouteResult<T> = Result<T, (StatusCode, String)>;

/// Extension trait for converting `Option<T>` to `RouteResult<T>`.
pub trait OptionExt<T> {
    /// Returns the contained value or a 404 Not Found error.
    fn or_not_found(self, msg: &str) -> RouteResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, msg: &str) -> RouteResult<T> {
        self.ok_or_else(|| (StatusCode::NOT_FOUND, msg.to_string()))
    }
}

/// Extension trait for converting `Result<T, E>` to `RouteResult<T>`.
pub trait ResultExt<T, E: std::fmt::Display> {
    /// Converts the error to 500 Internal Server Error.
    fn or_internal_error(self) -> RouteResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T, E> for Result<T, E> {
    fn or_internal_error(self) -> RouteResult<T> {
        self.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
    }
}

/// Validate that a 0-based page number is within bounds.
///
/// Returns 400 Bad Request if page >= page_count.
pub fn validate_page(page: usize, page_count: usize) -> RouteResult<()> {
    if page >= page_count {
        Err((
            StatusCode::BAD_REQUEST,
            format!("Page {} out of range (1..={page_count})", page + 1),
        ))
    } else {
        Ok(())
    }
}

/// Convert a 1-based page number from a URL to a 0-based index.
///
/// Page `0` does not exist and is rejected with 400.
pub fn page_index(url_page: usize) -> RouteResult<usize> {
    url_page
        .checked_sub(1)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "Page numbers start at 1".to_string()))
}

/// Whether the request was issued by HTMX.
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.get("HX-Request").is_some()
}

/// Wrap rendered HTML in a 200 response.
pub fn html_response(html: String) -> RouteResult<Response> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .body(Body::from(html))
        .or_internal_error()
}
