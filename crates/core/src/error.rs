use thiserror::Error;

/// Reasons a submission does not produce a download grant.
///
/// These never reach the submitter; they exist so the handler can log why a
/// submission was ignored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("submission has no download token")]
    MissingToken,

    #[error("submission has no resource reference")]
    MissingResource,

    #[error("token cannot be addressed by a download URL")]
    UnaddressableToken,
}
