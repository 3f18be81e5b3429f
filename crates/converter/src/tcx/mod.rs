//! TCX activity codec.
//!
//! [`source`] parses the vendor's activity document into the typed source
//! model with strict schema validation; [`writer`] builds the
//! target-ecosystem document from an enhanced activity.

pub mod source;
pub mod writer;

/// Error type for TCX parsing, validation and building failures.
#[derive(Debug, thiserror::Error)]
pub enum TcxError {
    #[error("failed to parse TCX document: {0}")]
    Parse(String),

    #[error("document contains no activities")]
    NoActivities,

    #[error("expected exactly one activity, found {0}")]
    MultipleActivities(usize),

    #[error("activity is missing its Id")]
    MissingActivityId,

    #[error("failed to build TCX document: {0}")]
    Build(String),
}
