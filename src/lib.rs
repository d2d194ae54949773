//! Client-side access layer for the Kazoo Crossbar REST API.
//!
//! Operations are described as [`Descriptor`]s, compiled against the
//! client's account context and executed over HTTP. Every top-level call
//! answers with an [`Envelope`]; only transport and protocol breakage
//! surfaces as `Err`.

pub mod api;
pub mod config;
pub mod crossbar;
pub mod resource;

pub use config::Config;
pub use crossbar::{Client, Content, Credential, Envelope, Error, FailureHandler, Revalidate};
pub use resource::{Descriptor, ResourceClass, Segment};
