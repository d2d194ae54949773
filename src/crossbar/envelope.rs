//! Uniform response envelope
//!
//! Every top-level operation answers with an [`Envelope`]; callers never see
//! classified failures as `Err`.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome of a top-level operation.
///
/// Serializes to `{"status": "success", "data": ...}` or
/// `{"status": "failure", "error": 404, "errors": {...}, "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope {
    Success {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
    Failure {
        error: u16,
        #[serde(default)]
        errors: Map<String, Value>,
        message: String,
    },
}

impl Envelope {
    pub fn success(data: Value) -> Self {
        Self::Success { data: Some(data) }
    }

    /// Success without a body (deletes, persists that return no record)
    pub fn done() -> Self {
        Self::Success { data: None }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Success { data } => data.as_ref(),
            Self::Failure { .. } => None,
        }
    }

    pub fn into_data(self) -> Option<Value> {
        match self {
            Self::Success { data } => data,
            Self::Failure { .. } => None,
        }
    }

    pub fn error_status(&self) -> Option<u16> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(*error),
        }
    }

    /// Transform the payload of a successful envelope, leaving failures as-is
    pub fn map_data(self, f: impl FnOnce(Value) -> Value) -> Self {
        match self {
            Self::Success { data: Some(data) } => Self::success(f(data)),
            other => other,
        }
    }

    /// Items of a list response; empty for failures and non-list payloads
    pub fn items(&self) -> &[Value] {
        self.data()
            .and_then(|v| v.as_array())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

/// Undecoded body of a content endpoint (media audio, voicemail recordings)
#[derive(Debug, Clone, PartialEq)]
pub struct RawContent {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// Outcome of a raw download: the content, or the failure envelope a JSON
/// operation would have answered with
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Raw(RawContent),
    Failure(Envelope),
}

impl Content {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Raw(_))
    }

    pub fn raw(&self) -> Option<&RawContent> {
        match self {
            Self::Raw(raw) => Some(raw),
            Self::Failure(_) => None,
        }
    }

    pub fn error_status(&self) -> Option<u16> {
        match self {
            Self::Raw(_) => None,
            Self::Failure(envelope) => envelope.error_status(),
        }
    }
}
