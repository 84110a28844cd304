//! Error taxonomy for role resolution
//!
//! Provider failures are classified using the SDK's `.code()` metadata
//! instead of string matching on Debug format.

use aws_sdk_ec2::error::{ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// Result alias for role resolution operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by role resolution
#[derive(Debug, Error)]
pub enum Error {
    /// Bad or missing caller input
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A matching instance lacked the tag used for grouping
    #[error("instance '{instance_id}' is missing tag '{tag}'")]
    MissingTag { instance_id: String, tag: String },

    /// AWS failure (authentication, rate limit, transport, malformed response)
    #[error("provider error: {message}")]
    Provider {
        code: Option<String>,
        message: String,
    },
}

impl Error {
    /// Check if this is a caller-input error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }

    /// Check if this is a missing-grouping-tag error
    pub fn is_missing_tag(&self) -> bool {
        matches!(self, Error::MissingTag { .. })
    }

    /// AWS error code, when the provider reported one
    pub fn provider_code(&self) -> Option<&str> {
        match self {
            Error::Provider { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

/// Build a provider error from optional code/message metadata.
pub(crate) fn classify_provider_error(code: Option<&str>, message: Option<&str>) -> Error {
    Error::Provider {
        code: code.map(str::to_string),
        message: message.unwrap_or("unknown provider error").to_string(),
    }
}

/// Convert an EC2 SDK error, preserving service metadata when present.
///
/// Transport failures carry no metadata; their Debug form is kept so the
/// underlying cause is not swallowed.
pub(crate) fn provider_error<E>(err: SdkError<E>) -> Error
where
    E: ProvideErrorMetadata + std::fmt::Debug,
{
    let meta = ProvideErrorMetadata::meta(&err);
    match (meta.code(), meta.message()) {
        (None, None) => Error::Provider {
            code: None,
            message: format!("{err:?}"),
        },
        (code, message) => classify_provider_error(code, message),
    }
}
