use std::collections::HashMap;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use bytes::Bytes;
use serde_json::Value;
use tracing::debug;

use super::AppState;
use crate::error::ServerError;

/// Flatten a submission body into field values.
///
/// JSON bodies must be an object; string, number and boolean members are
/// kept. Anything else is read as `application/x-www-form-urlencoded`. An
/// unparseable body yields no fields.
pub fn parse_fields(content_type: Option<&str>, body: &[u8]) -> HashMap<String, String> {
    let is_json = content_type.is_some_and(|ct| ct.trim_start().starts_with("application/json"));
    if is_json {
        let object = match serde_json::from_slice::<serde_json::Map<String, Value>>(body) {
            Ok(object) => object,
            Err(e) => {
                debug!(error = %e, "submission body is not a JSON object");
                return HashMap::new();
            }
        };
        return object
            .into_iter()
            .filter_map(|(name, value)| {
                let value = match value {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((name, value))
            })
            .collect();
    }

    match serde_urlencoded::from_bytes::<Vec<(String, String)>>(body) {
        Ok(pairs) => pairs.into_iter().collect(),
        Err(e) => {
            debug!(error = %e, "submission body is not form-encoded");
            HashMap::new()
        }
    }
}

/// `POST /v1/submissions` -- record a download grant from a form submission.
#[utoipa::path(
    post,
    path = "/v1/submissions",
    tag = "Submissions",
    summary = "Submit a form",
    description = "Records a one-time download grant when the submission carries a token and a resource. Submissions without them are ignored; the response is the same either way.",
    request_body(
        content(
            (super::schemas::SubmissionBody = "application/x-www-form-urlencoded"),
            (super::schemas::SubmissionBody = "application/json")
        )
    ),
    responses(
        (status = 204, description = "Submission processed"),
        (status = 500, description = "State store failure", body = super::schemas::ErrorResponse)
    )
)]
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ServerError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let fields = parse_fields(content_type, &body);
    state.gateway.handle_fields(&fields).await?;
    Ok(StatusCode::NO_CONTENT)
}
