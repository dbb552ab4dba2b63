//! Raw preview of a published application.
//!
//! `GET /preview/{id}` returns the stored HTML verbatim. Unknown ids get a
//! small HTML "not found" page instead of the JSON error body so the route
//! stays usable from a browser tab.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use capupdate_core::error::CatalogError;

use crate::error::AppError;
use crate::state::AppState;

/// Build the preview router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/preview/{id}", get(preview_app))
}

async fn preview_app(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    match state.catalog.get(&id).await {
        Ok(app) => Ok(Html(app.html_content).into_response()),
        Err(CatalogError::NotFound { .. } | CatalogError::InvalidId) => {
            Ok((StatusCode::NOT_FOUND, Html(not_found_page(&id))).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

fn not_found_page(id: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\"/>\
         <title>Application not found</title></head>\
         <body style=\"font-family:sans-serif;text-align:center;padding:80px 24px\">\
         <h1>Application not found</h1>\
         <p>No application is published under <code>{}</code>.</p>\
         <p><a href=\"/\">Back to CapUpdate</a></p></body></html>",
        escape_html(id)
    )
}

/// Escape the characters that matter inside HTML text content.
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html_neutralises_markup() {
        assert_eq!(
            escape_html("<script>alert('x')</script>&"),
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;&amp;"
        );
        assert_eq!(escape_html("abc123"), "abc123");
    }

    #[test]
    fn not_found_page_embeds_escaped_id() {
        let page = not_found_page("<b>");
        assert!(page.contains("&lt;b&gt;"));
        assert!(!page.contains("<b>"));
    }
}
