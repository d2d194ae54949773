//! Auth-Recovery Coordinator state
//!
//! A client may carry one [`FailureHandler`]. The first authentication
//! failure of a top-level call consumes it; whatever it answers, it is never
//! consulted again for the lifetime of that client.

use super::client::Client;
use async_trait::async_trait;

/// Repairs an invalid or expired credential mid-call.
///
/// Return `Ok(true)` when the client should re-issue the failed operation.
/// An `Err` means the recovery mechanism itself is broken and is fatal.
#[async_trait]
pub trait FailureHandler: Send + Sync {
    async fn handle_unauthenticated(&mut self, client: &mut Client) -> anyhow::Result<bool>;
}

/// Handler that simply revalidates the client's current credential
#[derive(Debug, Default, Clone, Copy)]
pub struct Revalidate;

#[async_trait]
impl FailureHandler for Revalidate {
    async fn handle_unauthenticated(&mut self, client: &mut Client) -> anyhow::Result<bool> {
        Ok(client.validate_credential().await)
    }
}

pub(crate) enum Recovery {
    Armed(Box<dyn FailureHandler>),
    Spent,
}

impl Recovery {
    pub(crate) fn new(handler: Option<Box<dyn FailureHandler>>) -> Self {
        match handler {
            Some(handler) => Self::Armed(handler),
            None => Self::Spent,
        }
    }

    /// Take the handler out, leaving the state spent
    pub(crate) fn take(&mut self) -> Option<Box<dyn FailureHandler>> {
        match std::mem::replace(self, Self::Spent) {
            Self::Armed(handler) => Some(handler),
            Self::Spent => None,
        }
    }

    pub(crate) fn is_armed(&self) -> bool {
        matches!(self, Self::Armed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_spends_the_handler() {
        let mut recovery = Recovery::new(Some(Box::new(Revalidate)));
        assert!(recovery.is_armed());
        assert!(recovery.take().is_some());
        assert!(!recovery.is_armed());
        assert!(recovery.take().is_none());
    }

    #[test]
    fn test_no_handler_starts_spent() {
        let mut recovery = Recovery::new(None);
        assert!(!recovery.is_armed());
        assert!(recovery.take().is_none());
    }
}
