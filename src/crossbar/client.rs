//! Crossbar Client
//!
//! Main client for the Crossbar API: owns the credential, the account
//! context and the one-shot failure handler, and runs every top-level
//! operation through compile → execute → normalize.

use super::auth::{Credential, Session};
use super::context::AccountContext;
use super::envelope::{Content, Envelope};
use super::error::Error;
use super::http::{CrossbarHttp, TRACE_TARGET};
use super::recovery::{FailureHandler, Recovery};
use crate::resource::{compile, Descriptor, Executor, Mode};
use reqwest::Method;
use serde_json::Value;
use std::fmt;

/// Top-level operation, kept whole so it can be re-issued after recovery
#[derive(Clone, Copy)]
enum Operation<'a> {
    Read(&'a Descriptor),
    Mutate(&'a Descriptor, &'a Value),
    Delete(&'a Descriptor),
    Download(&'a Descriptor),
    Upload(&'a Descriptor, &'a [u8], &'a str),
    Raw(&'a Method, &'a str, Option<&'a Value>),
    RawDownload(&'a str),
}

impl fmt::Debug for Operation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(d) => write!(f, "read {:?}", d),
            Self::Mutate(d, _) => write!(f, "mutate {:?}", d),
            Self::Delete(d) => write!(f, "delete {:?}", d),
            Self::Download(d) => write!(f, "download {:?}", d),
            Self::Upload(d, bytes, content_type) => {
                write!(f, "upload {:?} ({}, {} bytes)", d, content_type, bytes.len())
            }
            Self::Raw(method, path, _) => write!(f, "{} {}", method, path),
            Self::RawDownload(path) => write!(f, "GET {} (raw)", path),
        }
    }
}

/// Successful result of one attempt
enum Reply {
    Envelope(Envelope),
    Content(Content),
}

/// What a top-level operation answers with; classified failures fold into it
trait Outcome: Sized {
    fn from_reply(reply: Reply) -> Result<Self, Error>;
    fn failure(envelope: Envelope) -> Self;
}

impl Outcome for Envelope {
    fn from_reply(reply: Reply) -> Result<Self, Error> {
        match reply {
            Reply::Envelope(envelope) => Ok(envelope),
            Reply::Content(_) => Err(Error::Protocol("raw content where an envelope was expected".to_string())),
        }
    }

    fn failure(envelope: Envelope) -> Self {
        envelope
    }
}

impl Outcome for Content {
    fn from_reply(reply: Reply) -> Result<Self, Error> {
        match reply {
            Reply::Content(content) => Ok(content),
            Reply::Envelope(_) => Err(Error::Protocol("an envelope where raw content was expected".to_string())),
        }
    }

    fn failure(envelope: Envelope) -> Self {
        Content::Failure(envelope)
    }
}

/// Main Crossbar client
pub struct Client {
    http: CrossbarHttp,
    credential: Credential,
    session: Option<Session>,
    context: AccountContext,
    authenticated: bool,
    recovery: Recovery,
}

impl Client {
    /// Create a client and validate its credential.
    ///
    /// Never fails because of the credential: check [`Client::is_authenticated`].
    pub async fn new(
        http: CrossbarHttp,
        credential: Credential,
        failure_handler: Option<Box<dyn FailureHandler>>,
    ) -> Self {
        let mut client = Self {
            http,
            credential,
            session: None,
            context: AccountContext::new(),
            authenticated: false,
            recovery: Recovery::new(failure_handler),
        };
        client.validate_credential().await;
        client
    }

    /// Exchange the credential for a session and point the context at its account
    pub async fn validate_credential(&mut self) -> bool {
        match self.credential.validate(&self.http).await {
            Ok(session) => {
                self.context.authenticated_as(&session.account_id);
                self.session = Some(session);
                self.authenticated = true;
            }
            Err(e @ (Error::Unauthenticated(_) | Error::Validation(_))) => {
                tracing::warn!(target: TRACE_TARGET, "Credential rejected: {}", e);
                self.session = None;
                self.authenticated = false;
            }
            Err(e) => {
                tracing::error!(target: TRACE_TARGET, "Could not validate credential: {}", e);
                self.session = None;
                self.authenticated = false;
            }
        }
        self.authenticated
    }

    /// Swap the credential; takes effect at the next validation
    pub fn replace_credential(&mut self, credential: Credential) {
        self.credential = credential;
        self.session = None;
        self.authenticated = false;
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Whether the failure handler is still available
    pub fn can_recover(&self) -> bool {
        self.recovery.is_armed()
    }

    pub fn context(&self) -> &AccountContext {
        &self.context
    }

    /// Switch the account descriptors default to
    pub fn use_account(&mut self, account_id: &str) {
        tracing::debug!("Using account {}", account_id);
        self.context.use_account(account_id);
    }

    pub fn use_account_id(&self) -> Option<&str> {
        self.context.use_account_id()
    }

    pub fn auth_account_id(&self) -> Option<&str> {
        self.context.auth_account_id()
    }

    pub fn http(&self) -> &CrossbarHttp {
        &self.http
    }

    // =========================================================================
    // Top-level operations
    // =========================================================================

    /// Read the resource a descriptor points at
    pub async fn get(&mut self, descriptor: &Descriptor) -> Result<Envelope, Error> {
        self.coordinate(Operation::Read(descriptor)).await
    }

    /// Create (no terminal id) or update (terminal id) a resource
    pub async fn put(&mut self, descriptor: &Descriptor, payload: &Value) -> Result<Envelope, Error> {
        self.coordinate(Operation::Mutate(descriptor, payload)).await
    }

    /// Update a resource; the payload must carry its `id`
    pub async fn post(&mut self, descriptor: &Descriptor, payload: &Value) -> Result<Envelope, Error> {
        if payload.get("id").is_none() {
            return Error::MissingField("id").into_envelope();
        }
        self.put(descriptor, payload).await
    }

    /// Remove the resource a descriptor points at
    pub async fn delete(&mut self, descriptor: &Descriptor) -> Result<Envelope, Error> {
        self.coordinate(Operation::Delete(descriptor)).await
    }

    /// Raw request relative to the API root (e.g. `accounts/{id}/users`)
    pub async fn send(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Envelope, Error> {
        self.coordinate(Operation::Raw(&method, path, body)).await
    }

    /// Download the raw content a descriptor ending in `Raw` points at
    pub async fn download(&mut self, descriptor: &Descriptor) -> Result<Content, Error> {
        self.coordinate(Operation::Download(descriptor)).await
    }

    /// Upload raw content to a descriptor ending in `Raw`
    pub async fn upload(
        &mut self,
        descriptor: &Descriptor,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<Envelope, Error> {
        self.coordinate(Operation::Upload(descriptor, bytes, content_type))
            .await
    }

    /// Raw GET relative to the API root, body kept undecoded
    pub async fn send_raw(&mut self, path: &str) -> Result<Content, Error> {
        self.coordinate(Operation::RawDownload(path)).await
    }

    /// Run an operation, giving the failure handler its single chance on
    /// an authentication failure
    async fn coordinate<T: Outcome>(&mut self, operation: Operation<'_>) -> Result<T, Error> {
        loop {
            let outcome = self.execute(operation).await;

            if let Err(e) = &outcome {
                if e.is_unauthenticated() {
                    self.authenticated = false;
                    if self.recover().await? {
                        tracing::info!("Failure handler recovered, re-issuing {:?}", operation);
                        continue;
                    }
                }
            }

            return match outcome {
                Ok(reply) => T::from_reply(reply),
                Err(e) => e.into_envelope().map(T::failure),
            };
        }
    }

    /// Consume the failure handler, if still armed, and ask it to repair the credential
    async fn recover(&mut self) -> Result<bool, Error> {
        let Some(mut handler) = self.recovery.take() else {
            return Ok(false);
        };

        tracing::info!("Authentication failed, invoking failure handler");
        handler
            .handle_unauthenticated(self)
            .await
            .map_err(Error::Recovery)
    }

    async fn execute(&self, operation: Operation<'_>) -> Result<Reply, Error> {
        let token = self.session.as_ref().map(|s| s.token.as_str());
        let executor = Executor::new(&self.http, token);

        let envelope = match operation {
            Operation::Read(descriptor) => {
                let chain = compile(descriptor, &self.context, Mode::Read)?;
                Envelope::success(executor.read(&chain).await?)
            }
            Operation::Mutate(descriptor, payload) => {
                let chain = compile(descriptor, &self.context, Mode::Mutate)?;
                stored(executor.mutate(&chain, payload).await?)
            }
            Operation::Delete(descriptor) => {
                let chain = compile(descriptor, &self.context, Mode::Delete)?;
                executor.delete(&chain).await?;
                Envelope::done()
            }
            Operation::Download(descriptor) => {
                let chain = compile(descriptor, &self.context, Mode::Read)?;
                let raw = executor.download(&chain).await?;
                return Ok(Reply::Content(Content::Raw(raw)));
            }
            Operation::Upload(descriptor, bytes, content_type) => {
                let chain = compile(descriptor, &self.context, Mode::Mutate)?;
                stored(executor.upload(&chain, bytes, content_type).await?)
            }
            Operation::Raw(method, path, body) => {
                let reply = self.http.send(method.clone(), path, &[], body, token).await?;
                Envelope::success(reply.data)
            }
            Operation::RawDownload(path) => {
                let raw = self.http.get_raw(path, token).await?;
                return Ok(Reply::Content(Content::Raw(raw)));
            }
        };

        Ok(Reply::Envelope(envelope))
    }
}

/// Envelope of a persist: the stored record when it came back with an id
fn stored(record: Option<Value>) -> Envelope {
    match record {
        Some(record) => Envelope::success(record),
        None => Envelope::done(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn offline_client() -> Client {
        let http = CrossbarHttp::new("http://127.0.0.1:1", None).unwrap();
        Client::new(http, Credential::token("tok", "acct-1"), None).await
    }

    #[tokio::test]
    async fn test_pre_issued_token_sets_context() {
        let client = offline_client().await;
        assert!(client.is_authenticated());
        assert_eq!(client.use_account_id(), Some("acct-1"));
        assert_eq!(client.auth_account_id(), Some("acct-1"));
        assert!(!client.can_recover());
    }

    #[tokio::test]
    async fn test_post_without_id_never_leaves_the_client() {
        let mut client = offline_client().await;
        let descriptor = Descriptor::account(None).then_id(crate::resource::ResourceClass::User, "u1");
        let envelope = client.post(&descriptor, &json!({"first_name": "Ann"})).await.unwrap();
        assert_eq!(envelope.error_status(), Some(400));
    }

    #[tokio::test]
    async fn test_delete_without_id_never_leaves_the_client() {
        let mut client = offline_client().await;
        let descriptor = Descriptor::account(None).then(crate::resource::ResourceClass::Device);
        let envelope = client.delete(&descriptor).await.unwrap();
        assert_eq!(envelope.error_status(), Some(400));
    }

    #[tokio::test]
    async fn test_replace_credential_clears_session() {
        let mut client = offline_client().await;
        client.replace_credential(Credential::token("new", "acct-2"));
        assert!(!client.is_authenticated());
        assert!(client.validate_credential().await);
        assert_eq!(client.auth_account_id(), Some("acct-2"));
    }
}
