//! Configuration Management
//!
//! Handles persistent connection settings for xbar.

use crate::crossbar::auth::Credential;
use crate::crossbar::http::CrossbarHttp;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Auth token from an earlier login
    #[serde(default)]
    pub xauth: Option<String>,
    /// Account the cached token belongs to
    #[serde(default)]
    pub auth_account_id: Option<String>,
    /// md5 of `"username:password"`
    #[serde(default)]
    pub usermd5: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub realm: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_scheme() -> String {
    "http".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            scheme: default_scheme(),
            xauth: None,
            auth_account_id: None,
            usermd5: None,
            username: None,
            password: None,
            realm: None,
            timeout_secs: None,
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("xbar").join("config.json"))
    }

    /// Load configuration from disk, then apply environment overrides
    pub fn load() -> Self {
        let mut config = Self::config_path()
            .filter(|path| path.exists())
            .and_then(|path| match std::fs::read_to_string(&path) {
                Ok(content) => match serde_json::from_str::<Config>(&content) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        tracing::warn!("Ignoring malformed config {:?}: {}", path, e);
                        None
                    }
                },
                Err(_) => None,
            })
            .unwrap_or_default();

        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content).with_context(|| format!("writing {:?}", path))?;

        Ok(())
    }

    /// Apply `XBAR_*` overrides from `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("XBAR_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("XBAR_PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!("Ignoring invalid XBAR_PORT {:?}", port),
            }
        }
        if let Some(xauth) = lookup("XBAR_XAUTH") {
            self.xauth = Some(xauth);
        }
        if let Some(account_id) = lookup("XBAR_ACCOUNT_ID") {
            self.auth_account_id = Some(account_id);
        }
    }

    /// Server root, without the API version
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn http(&self) -> Result<CrossbarHttp> {
        CrossbarHttp::new(&self.base_url(), self.timeout())
            .with_context(|| format!("invalid server address {}", self.base_url()))
    }

    /// Pick the credential: cached token first, then hashed, then plain login
    pub fn credential(&self) -> Result<Credential> {
        if let (Some(token), Some(account_id)) = (&self.xauth, &self.auth_account_id) {
            return Ok(Credential::token(token, account_id));
        }

        let Some(realm) = &self.realm else {
            bail!("no credential configured: set xauth and auth_account_id, or a realm with a login");
        };

        match (&self.usermd5, &self.username, &self.password) {
            (Some(hash), _, _) => Ok(Credential::hashed(hash, realm)),
            (None, Some(username), Some(password)) => {
                Ok(Credential::from_login(username, password, realm))
            }
            _ => bail!("realm {} configured without usermd5 or username/password", realm),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crossbar::auth::credentials_hash;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_from_empty_file() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.base_url(), "http://127.0.0.1:8000");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("XBAR_HOST", "pbx.local"),
            ("XBAR_PORT", "8443"),
            ("XBAR_XAUTH", "tok"),
            ("XBAR_ACCOUNT_ID", "acct"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.base_url(), "http://pbx.local:8443");
        assert_eq!(config.credential().unwrap(), Credential::token("tok", "acct"));
    }

    #[test]
    fn test_invalid_port_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == "XBAR_PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.port, 8000);
    }

    #[test]
    fn test_credential_selection() {
        let mut config = Config {
            realm: Some("pbx.example.com".to_string()),
            username: Some("alice".to_string()),
            password: Some("secret".to_string()),
            ..Config::default()
        };
        assert_eq!(
            config.credential().unwrap(),
            Credential::hashed(&credentials_hash("alice", "secret"), "pbx.example.com")
        );

        config.usermd5 = Some("cafe".to_string());
        assert_eq!(
            config.credential().unwrap(),
            Credential::hashed("cafe", "pbx.example.com")
        );
    }

    #[test]
    fn test_missing_credential() {
        assert!(Config::default().credential().is_err());

        let config = Config {
            realm: Some("pbx.example.com".to_string()),
            ..Config::default()
        };
        assert!(config.credential().is_err());
    }
}
