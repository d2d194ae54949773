//! Crossbar Authentication
//!
//! Two ways to obtain an auth token: a token issued earlier (cached from a
//! previous login) together with its account id, or the md5 credentials hash
//! of a user exchanged against `PUT /user_auth`.

use super::error::Error;
use super::http::CrossbarHttp;
use reqwest::Method;
use serde_json::json;
use std::fmt;

/// Result of a successful credential validation
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub account_id: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"****")
            .field("account_id", &self.account_id)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Token issued by an earlier login, assumed valid until a call says otherwise
    PreIssuedToken { token: String, account_id: String },
    /// md5 of `"username:password"` plus the account realm
    Derived { secret_hash: String, realm: String },
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreIssuedToken { account_id, .. } => f
                .debug_struct("PreIssuedToken")
                .field("account_id", account_id)
                .finish_non_exhaustive(),
            Self::Derived { realm, .. } => f
                .debug_struct("Derived")
                .field("realm", realm)
                .finish_non_exhaustive(),
        }
    }
}

impl Credential {
    pub fn token(token: &str, account_id: &str) -> Self {
        Self::PreIssuedToken {
            token: token.to_string(),
            account_id: account_id.to_string(),
        }
    }

    pub fn hashed(secret_hash: &str, realm: &str) -> Self {
        Self::Derived {
            secret_hash: secret_hash.to_string(),
            realm: realm.to_string(),
        }
    }

    /// Build a derived credential from a plain username and password
    pub fn from_login(username: &str, password: &str, realm: &str) -> Self {
        Self::hashed(&credentials_hash(username, password), realm)
    }

    /// Exchange the credential for a session token
    pub async fn validate(&self, http: &CrossbarHttp) -> Result<Session, Error> {
        match self {
            Self::PreIssuedToken { token, account_id } => Ok(Session {
                token: token.clone(),
                account_id: account_id.clone(),
            }),
            Self::Derived { secret_hash, realm } => {
                let body = json!({
                    "credentials": secret_hash,
                    "account_name": realm,
                });
                let reply = http
                    .send(Method::PUT, "user_auth", &[], Some(&body), None)
                    .await?;

                let token = reply.auth_token.ok_or_else(|| {
                    Error::Protocol("user_auth response carried no auth_token".to_string())
                })?;
                let account_id = reply
                    .data
                    .get("account_id")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
                    .ok_or_else(|| {
                        Error::Protocol("user_auth response carried no account_id".to_string())
                    })?;

                tracing::debug!("Authenticated against realm {} as account {}", realm, account_id);
                Ok(Session { token, account_id })
            }
        }
    }
}

/// Crossbar's credentials hash: md5 of `"username:password"`
pub fn credentials_hash(username: &str, password: &str) -> String {
    format!("{:x}", md5::compute(format!("{}:{}", username, password)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_hash() {
        assert_eq!(credentials_hash("user", "pass"), "21a39285884a268d6458e3fdeb08beac");
        assert_eq!(credentials_hash("user", "pass").len(), 32);
    }

    #[test]
    fn test_from_login_builds_derived() {
        let credential = Credential::from_login("alice", "secret", "pbx.example.com");
        match credential {
            Credential::Derived { secret_hash, realm } => {
                assert_eq!(secret_hash, credentials_hash("alice", "secret"));
                assert_eq!(realm, "pbx.example.com");
            }
            other => panic!("expected derived credential, got {:?}", other),
        }
    }

    #[test]
    fn test_debug_hides_secrets() {
        let rendered = format!("{:?}", Credential::token("tok-123", "acct"));
        assert!(!rendered.contains("tok-123"));
        assert!(rendered.contains("acct"));

        let rendered = format!("{:?}", Credential::hashed("abcdef", "realm"));
        assert!(!rendered.contains("abcdef"));
    }

    #[tokio::test]
    async fn test_pre_issued_token_validates_without_network() {
        let http = CrossbarHttp::new("http://127.0.0.1:1", None).unwrap();
        let session = Credential::token("tok", "acct-1").validate(&http).await.unwrap();
        assert_eq!(session.token, "tok");
        assert_eq!(session.account_id, "acct-1");
    }
}
