use std::path::Path;

use axum::body::Body;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tokio_util::io::ReaderStream;
use tracing::warn;

use dropgate_gateway::ResolvedResource;

const BUILTIN_NOT_FOUND: &str = "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Not Found</title></head>\n<body><h1>Not Found</h1><p>The requested URL was not found on this server.</p></body></html>\n";

/// Fixed past date sent as `Expires` on not-found responses.
const EXPIRES_IN_THE_PAST: &str = "Wed, 11 Jan 1984 05:00:00 GMT";

/// The HTML body sent with every not-found response on a claimed path.
#[derive(Debug, Clone)]
pub struct NotFoundPage {
    body: Bytes,
}

impl Default for NotFoundPage {
    fn default() -> Self {
        Self {
            body: Bytes::from_static(BUILTIN_NOT_FOUND.as_bytes()),
        }
    }
}

impl NotFoundPage {
    /// Use the given HTML as the page body.
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self { body: body.into() }
    }

    /// Load the page from `path`, falling back to the built-in page when no
    /// path is configured or the file cannot be read.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match std::fs::read(path) {
            Ok(body) => Self::new(body),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "not-found page unreadable, using built-in page");
                Self::default()
            }
        }
    }

    /// Build a 404 response carrying no-cache headers.
    pub fn response(&self) -> Response {
        (
            StatusCode::NOT_FOUND,
            [
                (header::CONTENT_TYPE, "text/html; charset=utf-8"),
                (header::CACHE_CONTROL, "no-cache, must-revalidate, max-age=0"),
                (header::EXPIRES, EXPIRES_IN_THE_PAST),
                (header::PRAGMA, "no-cache"),
            ],
            self.body.clone(),
        )
            .into_response()
    }
}

/// Replace characters that cannot appear inside a quoted header parameter.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.trim().is_empty() {
        "download".to_owned()
    } else {
        cleaned
    }
}

fn content_disposition(file_name: &str) -> HeaderValue {
    let value = format!("attachment; filename=\"{}\"", sanitize_file_name(file_name));
    HeaderValue::from_bytes(value.as_bytes())
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// Stream a redeemed file to the client as an attachment.
///
/// `Content-Length` is taken from the opened handle, so it matches the bytes
/// actually streamed. `HEAD` requests get the headers only. If the file
/// vanished between resolution and opening, the not-found page is sent
/// instead.
pub async fn download_response(
    resource: &ResolvedResource,
    method: &Method,
    not_found: &NotFoundPage,
) -> Response {
    let file = match tokio::fs::File::open(&resource.path).await {
        Ok(file) => file,
        Err(e) => {
            warn!(path = %resource.path.display(), error = %e, "redeemed file could not be opened");
            return not_found.response();
        }
    };
    let len = match file.metadata().await {
        Ok(metadata) => metadata.len(),
        Err(e) => {
            warn!(path = %resource.path.display(), error = %e, "redeemed file metadata unavailable");
            resource.len
        }
    };
    let body = if *method == Method::HEAD {
        Body::empty()
    } else {
        Body::from_stream(ReaderStream::new(file))
    };

    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(
        "content-description",
        HeaderValue::from_static("File Transfer"),
    );
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        content_disposition(&resource.file_name),
    );
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("public"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    response
}
