//! Error taxonomy
//!
//! Every failure the client can observe is a variant of [`Error`]. The
//! classified kinds are expected outcomes and always end up as a
//! [`Envelope::Failure`]; the rest are fatal and surface as `Err`.

use super::envelope::Envelope;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Message used for every client-side missing field failure
pub const MISSING_FIELD_MESSAGE: &str = "Field is required but missing";

/// Metadata of a failed remote call, decoded from the error response
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteFailure {
    pub status: u16,
    pub message: String,
    /// Decoded `data` field of the error body (field -> validation detail)
    pub errors: Map<String, Value>,
    pub request_id: Option<String>,
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.message)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Credential invalid or expired (401)
    #[error("unauthenticated: {0}")]
    Unauthenticated(RemoteFailure),

    /// Credential valid but lacking privilege (403)
    #[error("unauthorized: {0}")]
    Unauthorized(RemoteFailure),

    /// Remote resource absent (404)
    #[error("not found: {0}")]
    NotFound(RemoteFailure),

    /// Payload rejected by the remote side (400 and other 4xx)
    #[error("validation failed: {0}")]
    Validation(RemoteFailure),

    /// Client-side precondition violated before any network call
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// A named or filtered lookup matched nothing
    #[error("no matching record found")]
    NoMatchFound,

    #[error("server error: {0}")]
    Server(RemoteFailure),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unexpected response: {0}")]
    Protocol(String),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// The descriptor cannot be executed in the requested mode
    #[error("invalid descriptor: {0}")]
    Descriptor(String),

    /// The failure handler itself broke while trying to recover
    #[error("failure handler aborted: {0}")]
    Recovery(#[source] anyhow::Error),
}

impl Error {
    /// Classify a non-success status into the matching variant
    pub fn from_status(failure: RemoteFailure) -> Self {
        match failure.status {
            401 => Self::Unauthenticated(failure),
            403 => Self::Unauthorized(failure),
            404 => Self::NotFound(failure),
            400..=499 => Self::Validation(failure),
            _ => Self::Server(failure),
        }
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated(_))
    }

    /// Convert a classified failure into its envelope; fatal errors are
    /// handed back unchanged.
    pub fn into_envelope(self) -> Result<Envelope, Error> {
        match self {
            Self::Unauthenticated(f)
            | Self::Unauthorized(f)
            | Self::NotFound(f)
            | Self::Validation(f) => Ok(Envelope::Failure {
                error: f.status,
                errors: f.errors,
                message: f.message,
            }),
            Self::MissingField(field) => {
                let mut errors = Map::new();
                errors.insert(
                    field.to_string(),
                    Value::String(MISSING_FIELD_MESSAGE.to_string()),
                );
                Ok(Envelope::Failure {
                    error: 400,
                    errors,
                    message: "invalid data".to_string(),
                })
            }
            Self::NoMatchFound => Ok(Envelope::Failure {
                error: 404,
                errors: Map::new(),
                message: "not found".to_string(),
            }),
            fatal => Err(fatal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn failure(status: u16) -> RemoteFailure {
        let mut errors = Map::new();
        errors.insert("name".to_string(), json!({"required": {"message": "required"}}));
        RemoteFailure {
            status,
            message: "invalid data".to_string(),
            errors,
            request_id: Some("req-1".to_string()),
        }
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(Error::from_status(failure(401)), Error::Unauthenticated(_)));
        assert!(matches!(Error::from_status(failure(403)), Error::Unauthorized(_)));
        assert!(matches!(Error::from_status(failure(404)), Error::NotFound(_)));
        assert!(matches!(Error::from_status(failure(400)), Error::Validation(_)));
        assert!(matches!(Error::from_status(failure(409)), Error::Validation(_)));
        assert!(matches!(Error::from_status(failure(500)), Error::Server(_)));
    }

    #[test]
    fn test_remote_failure_keeps_status_and_errors() {
        let envelope = Error::Validation(failure(400)).into_envelope().unwrap();
        match envelope {
            Envelope::Failure { error, errors, message } => {
                assert_eq!(error, 400);
                assert_eq!(message, "invalid data");
                assert!(errors.contains_key("name"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_field_envelope() {
        let envelope = Error::MissingField("id").into_envelope().unwrap();
        assert_eq!(envelope.error_status(), Some(400));
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "status": "failure",
                "error": 400,
                "errors": {"id": MISSING_FIELD_MESSAGE},
                "message": "invalid data"
            })
        );
    }

    #[test]
    fn test_no_match_envelope_has_empty_errors() {
        let envelope = Error::NoMatchFound.into_envelope().unwrap();
        match envelope {
            Envelope::Failure { error, errors, message } => {
                assert_eq!(error, 404);
                assert!(errors.is_empty());
                assert_eq!(message, "not found");
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_fatal_errors_pass_through() {
        let result = Error::Server(failure(503)).into_envelope();
        assert!(matches!(result, Err(Error::Server(_))));

        let result = Error::Descriptor("bad".to_string()).into_envelope();
        assert!(matches!(result, Err(Error::Descriptor(_))));
    }
}
