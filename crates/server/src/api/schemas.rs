use dropgate_core::{PathPrefix, ResourceId, Token};
use dropgate_gateway::MetricsSnapshot;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status indicator.
    #[schema(example = "ok")]
    pub status: String,
    /// Current gateway metrics snapshot.
    pub metrics: MetricsResponse,
}

/// Submission, redemption and sweep counters.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MetricsResponse {
    /// Submissions that produced a grant.
    #[schema(example = 120)]
    pub submissions_accepted: u64,
    /// Submissions without a usable token or resource.
    #[schema(example = 3)]
    pub submissions_ignored: u64,
    /// Tokens redeemed and delivered.
    #[schema(example = 97)]
    pub redemptions: u64,
    /// Requests on claimed paths answered with not-found.
    #[schema(example = 11)]
    pub rejections: u64,
    /// Completed sweep runs.
    pub sweeps: u64,
    /// Token entries removed by sweeps.
    pub tokens_swept: u64,
    /// Path entries removed by sweeps.
    pub paths_swept: u64,
}

impl From<MetricsSnapshot> for MetricsResponse {
    fn from(snap: MetricsSnapshot) -> Self {
        Self {
            submissions_accepted: snap.submissions_accepted,
            submissions_ignored: snap.submissions_ignored,
            redemptions: snap.redemptions,
            rejections: snap.rejections,
            sweeps: snap.sweeps,
            tokens_swept: snap.tokens_swept,
            paths_swept: snap.paths_swept,
        }
    }
}

/// A form submission, shown with the default field names.
///
/// Field names are configurable and any other fields are ignored.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionBody {
    /// Token the download link will end with.
    #[schema(example = "630a184616ba0")]
    pub download_token: Token,
    /// Reference to the file to deliver.
    #[schema(example = "42")]
    pub download_resource: ResourceId,
    /// Prefix the link lives under (default `/download`).
    #[schema(example = "/assets/e-books")]
    pub download_path: Option<PathPrefix>,
    /// Minimum lifetime in hours (default 1).
    #[schema(example = 24)]
    pub download_lifetime: Option<f64>,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    #[schema(example = "gateway error: state error: connection error: refused")]
    pub error: String,
}
