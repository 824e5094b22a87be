pub mod error;
pub mod record;
pub mod submission;
pub mod target;
pub mod types;

pub use error::SubmissionError;
pub use record::{Grant, TokenRecord};
pub use submission::{
    DEFAULT_LIFETIME_HOURS, DEFAULT_PATH, FieldNames, Submission, SubmissionDefaults,
    lifetime_from_hours,
};
pub use target::RequestTarget;
pub use types::{PathPrefix, ResourceId, Token};
