//! HTTP transport for Crossbar REST calls
//!
//! Wraps request bodies in the `{"data": ...}` envelope Crossbar expects,
//! unwraps responses, classifies non-success statuses into [`Error`] and
//! emits the trace lines for every round trip.

use super::envelope::RawContent;
use super::error::{Error, RemoteFailure};
use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::{json, Map, Value};
use std::time::{Duration, Instant};
use url::Url;
use uuid::Uuid;

/// Target of the audit trace events
pub const TRACE_TARGET: &str = "xbar::trace";

/// API version prefix of every Crossbar URL
pub const API_VERSION: &str = "v1";

const AUTH_HEADER: &str = "X-Auth-Token";
const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Strip control characters so a response body stays on one trace line
fn sanitize_for_log(body: &str) -> String {
    body.replace(|c: char| c.is_control() && c != ' ', "")
}

/// Render request headers for the trace, masking the auth token
fn format_headers(headers: &HeaderMap) -> Vec<String> {
    headers
        .iter()
        .map(|(name, value)| {
            if name.as_str().eq_ignore_ascii_case(AUTH_HEADER) {
                format!("{}: ****", name)
            } else {
                format!("{}: {}", name, value.to_str().unwrap_or("<binary>"))
            }
        })
        .collect()
}

/// Decoded success response
#[derive(Debug, Clone)]
pub struct Reply {
    /// The `data` field of the response
    pub data: Value,
    /// Present on authentication responses
    pub auth_token: Option<String>,
    pub request_id: String,
}

/// HTTP client wrapper bound to one Crossbar server
#[derive(Clone)]
pub struct CrossbarHttp {
    client: Client,
    base_url: Url,
}

impl CrossbarHttp {
    /// Create a client for `base` (e.g. `http://10.0.0.1:8000`)
    pub fn new(base: &str, timeout: Option<Duration>) -> Result<Self, Error> {
        let mut builder = Client::builder().user_agent(concat!("xbar/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let base_url = Url::parse(&format!("{}/{}/", base.trim_end_matches('/'), API_VERSION))?;

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a path relative to the versioned API root.
    ///
    /// Dot segments, plain or percent-encoded, are refused: joining would
    /// collapse them onto the parent resource.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        let path = path.trim_start_matches('/');
        if path.split('/').any(is_dot_segment) {
            return Err(Error::Descriptor(format!("`{}` contains a dot segment", path)));
        }
        Ok(self.base_url.join(path)?)
    }

    pub async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        token: Option<&str>,
    ) -> Result<Reply, Error> {
        self.send(Method::GET, path, query, None, token).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<Reply, Error> {
        self.send(Method::DELETE, path, &[], None, token).await
    }

    /// Issue one request and decode the Crossbar envelope
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<Reply, Error> {
        let payload = body.map(Payload::Json).unwrap_or(Payload::Empty);
        let exchange = self.exchange(method, path, query, payload, token).await?;
        decode_reply(&exchange.body, exchange.request_id)
    }

    /// GET a content endpoint and keep its body undecoded
    pub async fn get_raw(&self, path: &str, token: Option<&str>) -> Result<RawContent, Error> {
        let exchange = self.exchange(Method::GET, path, &[], Payload::Empty, token).await?;
        Ok(RawContent {
            bytes: exchange.body,
            content_type: exchange.content_type,
        })
    }

    /// POST an undecoded body (audio, documents); the reply is a regular envelope
    pub async fn post_raw(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
        token: Option<&str>,
    ) -> Result<Reply, Error> {
        let payload = Payload::Raw {
            bytes,
            content_type,
        };
        let exchange = self.exchange(Method::POST, path, &[], payload, token).await?;
        decode_reply(&exchange.body, exchange.request_id)
    }

    /// One round trip: build, trace, classify non-success statuses
    async fn exchange(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        payload: Payload<'_>,
        token: Option<&str>,
    ) -> Result<Exchange, Error> {
        let url = self.url(path)?;
        let local_request_id = Uuid::new_v4().to_string();

        let mut request = self
            .client
            .request(method.clone(), url)
            .header(REQUEST_ID_HEADER, &local_request_id);

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = token {
            request = request.header(AUTH_HEADER, token);
        }
        request = match payload {
            Payload::Empty => request,
            Payload::Json(body) => request.json(&json!({ "data": body })),
            Payload::Raw {
                bytes,
                content_type,
            } => request
                .header(CONTENT_TYPE, content_type)
                .body(bytes.to_vec()),
        };

        let request = request.build()?;
        let url = request.url().clone();
        let request_headers = format_headers(request.headers());

        match payload {
            Payload::Empty => {}
            Payload::Json(body) => {
                tracing::debug!(target: TRACE_TARGET, ">>>> {} {} (application/json) {}", method, url, body)
            }
            Payload::Raw {
                bytes,
                content_type,
            } => tracing::debug!(
                target: TRACE_TARGET,
                ">>>> {} {} ({}) {} bytes",
                method,
                url,
                content_type,
                bytes.len()
            ),
        }

        let started = Instant::now();
        let response = self.client.execute(request).await?;
        let elapsed = started.elapsed();

        let status = response.status();
        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or(local_request_id);
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.bytes().await?;

        tracing::info!(
            target: TRACE_TARGET,
            status = status.as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            request_id = %request_id,
            "{} {}",
            method,
            url
        );

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            let failure = decode_failure(status.as_u16(), status.canonical_reason(), &text, request_id);

            tracing::warn!(target: TRACE_TARGET, ">>>> {} {} HTTP/1.1 len:{}", method, url, payload.len());
            for header in &request_headers {
                tracing::warn!(target: TRACE_TARGET, ">>>> {}", header);
            }
            if let Payload::Json(body) = payload {
                tracing::warn!(target: TRACE_TARGET, ">>>> {}", body);
            }
            tracing::warn!(
                target: TRACE_TARGET,
                "<<<< HTTP/1.1 {} {} request_id:{}",
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
                failure.request_id.as_deref().unwrap_or("-")
            );
            tracing::warn!(target: TRACE_TARGET, "<<<< {}", sanitize_for_log(&text));

            return Err(Error::from_status(failure));
        }

        Ok(Exchange {
            body,
            content_type,
            request_id,
        })
    }
}

/// Request body of one round trip
#[derive(Debug, Clone, Copy)]
enum Payload<'a> {
    Empty,
    /// Wrapped as `{"data": ...}`
    Json(&'a Value),
    Raw {
        bytes: &'a [u8],
        content_type: &'a str,
    },
}

impl Payload<'_> {
    fn len(&self) -> usize {
        match self {
            Payload::Empty => 0,
            Payload::Json(body) => body.to_string().len(),
            Payload::Raw { bytes, .. } => bytes.len(),
        }
    }
}

/// Successful response before decoding
struct Exchange {
    body: Bytes,
    content_type: Option<String>,
    request_id: String,
}

fn is_dot_segment(segment: &str) -> bool {
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    decoded == "." || decoded == ".."
}

/// Unwrap the `data` and `auth_token` fields of a success body
fn decode_reply(body: &[u8], request_id: String) -> Result<Reply, Error> {
    // Handle empty response
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Reply {
            data: Value::Null,
            auth_token: None,
            request_id,
        });
    }

    let mut envelope: Value = serde_json::from_slice(body)?;
    let auth_token = envelope
        .get("auth_token")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());
    let data = envelope
        .get_mut("data")
        .map(Value::take)
        .unwrap_or(Value::Null);

    Ok(Reply {
        data,
        auth_token,
        request_id,
    })
}

/// Decode a Crossbar error body: `{"data": {...}, "message": "...", "error": "400"}`
fn decode_failure(
    status: u16,
    reason: Option<&str>,
    body: &str,
    request_id: String,
) -> RemoteFailure {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    let errors = parsed
        .as_ref()
        .and_then(|v| v.get("data"))
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_else(Map::new);

    let message = parsed
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .or_else(|| reason.map(|r| r.to_lowercase()))
        .unwrap_or_else(|| "error".to_string());

    let request_id = parsed
        .as_ref()
        .and_then(|v| v.get("request_id"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or(request_id);

    RemoteFailure {
        status,
        message,
        errors,
        request_id: Some(request_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_is_rooted_at_api_version() {
        let http = CrossbarHttp::new("http://pbx.example.com:8000/", None).unwrap();
        assert_eq!(
            http.url("accounts/abc/users").unwrap().as_str(),
            "http://pbx.example.com:8000/v1/accounts/abc/users"
        );
        assert_eq!(
            http.url("/about").unwrap().as_str(),
            "http://pbx.example.com:8000/v1/about"
        );
    }

    #[test]
    fn test_dot_segments_are_refused() {
        let http = CrossbarHttp::new("http://pbx.example.com:8000", None).unwrap();
        for path in ["accounts/a/users/..", "accounts/a/users/.", "accounts/a/%2e%2E", "../about"] {
            assert!(matches!(http.url(path), Err(Error::Descriptor(_))), "{}", path);
        }
        assert!(http.url("accounts/a/users/u..1").is_ok());
    }

    #[test]
    fn test_decode_reply_unwraps_data() {
        let body = br#"{"data":{"id":"u1"},"auth_token":"tok","status":"success"}"#;
        let reply = decode_reply(body, "local".to_string()).unwrap();
        assert_eq!(reply.data, json!({"id": "u1"}));
        assert_eq!(reply.auth_token.as_deref(), Some("tok"));

        let reply = decode_reply(b"  ", "local".to_string()).unwrap();
        assert_eq!(reply.data, Value::Null);

        assert!(matches!(decode_reply(b"RIFF\xff", "local".to_string()), Err(Error::Decode(_))));
    }

    #[test]
    fn test_decode_failure_reads_crossbar_body() {
        let body = r#"{"data":{"username":{"unique":{"message":"taken"}}},"error":"400","message":"invalid data","status":"error","request_id":"r-42"}"#;
        let failure = decode_failure(400, Some("Bad Request"), body, "local".to_string());
        assert_eq!(failure.status, 400);
        assert_eq!(failure.message, "invalid data");
        assert!(failure.errors.contains_key("username"));
        assert_eq!(failure.request_id.as_deref(), Some("r-42"));
    }

    #[test]
    fn test_decode_failure_without_body_uses_reason() {
        let failure = decode_failure(401, Some("Unauthorized"), "", "local".to_string());
        assert_eq!(failure.message, "unauthorized");
        assert!(failure.errors.is_empty());
        assert_eq!(failure.request_id.as_deref(), Some("local"));
    }

    #[test]
    fn test_auth_header_is_masked() {
        let mut headers = HeaderMap::new();
        headers.insert("x-auth-token", "secret".parse().unwrap());
        headers.insert("x-request-id", "abc".parse().unwrap());
        let lines = format_headers(&headers);
        assert!(lines.contains(&"x-auth-token: ****".to_string()));
        assert!(lines.contains(&"x-request-id: abc".to_string()));
    }

    #[test]
    fn test_sanitize_strips_newlines() {
        assert_eq!(sanitize_for_log("{\n  \"a\": 1\n}"), "{  \"a\": 1}");
    }
}
