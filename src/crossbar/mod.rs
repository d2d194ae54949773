//! Crossbar API interaction module
//!
//! Transport, authentication and the client that every operation goes
//! through.
//!
//! # Module Structure
//!
//! - [`auth`] - Credentials and their exchange for a session token
//! - [`client`] - Main client; owns the account context and failure handler
//! - [`context`] - Current and authenticated account ids
//! - [`envelope`] - Uniform success/failure response shape
//! - [`error`] - Error taxonomy and its envelope mapping
//! - [`http`] - HTTP utilities for the Crossbar REST API
//! - [`recovery`] - One-shot failure handler for authentication failures
//!
//! # Example
//!
//! ```ignore
//! use xbar::crossbar::{auth::Credential, client::Client, http::CrossbarHttp};
//! use xbar::resource::{Descriptor, ResourceClass};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let http = CrossbarHttp::new("http://10.0.0.1:8000", None)?;
//!     let credential = Credential::from_login("admin", "secret", "pbx.example.com");
//!     let mut client = Client::new(http, credential, None).await;
//!     let users = client.get(&Descriptor::account(None).then(ResourceClass::Users)).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod context;
pub mod envelope;
pub mod error;
pub mod http;
pub mod recovery;

pub use auth::{Credential, Session};
pub use client::Client;
pub use context::AccountContext;
pub use envelope::{Content, Envelope, RawContent};
pub use error::{Error, RemoteFailure};
pub use recovery::{FailureHandler, Revalidate};
