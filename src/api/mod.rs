//! Convenience operations
//!
//! Descriptor literals for the everyday Crossbar endpoints, as `impl Client`
//! blocks grouped by area. Every `account_id: Option<&str>` parameter falls
//! back to the client's current account when `None`.
//!
//! - [`accounts`] - Account tree, realms, credits
//! - [`numbers`] - Phone numbers and realm-wide number lookups
//! - [`users`], [`devices`], [`callflows`], [`voicemail`]
//! - [`conferences`], [`queues`], [`media`] (media, menus, directories)
//! - [`integrations`] - Webhooks, connectivity, faxes, resources, events
//! - [`cdrs`] - Call detail records

use crate::crossbar::client::Client;
use crate::crossbar::envelope::Envelope;
use crate::crossbar::error::Error;
use crate::resource::{Descriptor, ResourceClass};
use serde_json::Value;

/// Data of a successful envelope; returns a failure envelope from the
/// enclosing function unchanged.
macro_rules! try_data {
    ($envelope:expr) => {
        match $envelope {
            $crate::crossbar::envelope::Envelope::Success { data } => {
                data.unwrap_or(serde_json::Value::Null)
            }
            failure => return Ok(failure),
        }
    };
}

/// List/get/create/update/delete for an account-scoped resource pair.
macro_rules! account_resource {
    (
        $name:literal, $collection:ident, $entity:ident,
        $list:ident, $get:ident, $create:ident, $update:ident, $delete:ident
    ) => {
        impl $crate::crossbar::client::Client {
            #[doc = concat!("List ", $name, "s")]
            pub async fn $list(
                &mut self,
                account_id: Option<&str>,
            ) -> Result<$crate::crossbar::envelope::Envelope, $crate::crossbar::error::Error> {
                let descriptor = $crate::resource::Descriptor::account(account_id)
                    .then($crate::resource::ResourceClass::$collection);
                self.get(&descriptor).await
            }

            #[doc = concat!("Get one ", $name)]
            pub async fn $get(
                &mut self,
                id: &str,
                account_id: Option<&str>,
            ) -> Result<$crate::crossbar::envelope::Envelope, $crate::crossbar::error::Error> {
                let descriptor = $crate::resource::Descriptor::account(account_id)
                    .then_id($crate::resource::ResourceClass::$entity, id);
                self.get(&descriptor).await
            }

            #[doc = concat!("Create a ", $name)]
            pub async fn $create(
                &mut self,
                data: &serde_json::Value,
                account_id: Option<&str>,
            ) -> Result<$crate::crossbar::envelope::Envelope, $crate::crossbar::error::Error> {
                let descriptor = $crate::resource::Descriptor::account(account_id)
                    .then($crate::resource::ResourceClass::$entity);
                self.put(&descriptor, data).await
            }

            #[doc = concat!("Update a ", $name, "; `data` must carry its `id`")]
            pub async fn $update(
                &mut self,
                id: &str,
                data: &serde_json::Value,
                account_id: Option<&str>,
            ) -> Result<$crate::crossbar::envelope::Envelope, $crate::crossbar::error::Error> {
                let descriptor = $crate::resource::Descriptor::account(account_id)
                    .then_id($crate::resource::ResourceClass::$entity, id);
                self.post(&descriptor, data).await
            }

            #[doc = concat!("Delete a ", $name)]
            pub async fn $delete(
                &mut self,
                id: &str,
                account_id: Option<&str>,
            ) -> Result<$crate::crossbar::envelope::Envelope, $crate::crossbar::error::Error> {
                let descriptor = $crate::resource::Descriptor::account(account_id)
                    .then_id($crate::resource::ResourceClass::$entity, id);
                self.delete(&descriptor).await
            }
        }
    };
}

pub mod accounts;
pub mod callflows;
pub mod cdrs;
pub mod conferences;
pub mod devices;
pub mod integrations;
pub mod media;
pub mod numbers;
pub mod queues;
pub mod users;
pub mod voicemail;

/// First item of a list response, or the not-found envelope when empty
pub fn first_match(envelope: Envelope) -> Result<Envelope, Error> {
    match envelope {
        Envelope::Success {
            data: Some(Value::Array(items)),
        } => match items.into_iter().next() {
            Some(first) => Ok(Envelope::success(first)),
            None => Error::NoMatchFound.into_envelope(),
        },
        other => Ok(other),
    }
}

/// String field of a JSON record
pub(crate) fn str_field<'a>(record: &'a Value, key: &str) -> Option<&'a str> {
    record.get(key).and_then(|v| v.as_str())
}

impl Client {
    /// Server version information
    pub async fn about(&mut self) -> Result<Envelope, Error> {
        self.get(&Descriptor::new().then(ResourceClass::About)).await
    }

    /// List `collection` filtered on `key == value` and keep the first hit
    pub(crate) async fn find_first(
        &mut self,
        collection: ResourceClass,
        filters: &[(&str, &str)],
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        let descriptor =
            Descriptor::account(account_id).then_filtered(collection, filters.iter().copied());
        first_match(self.get(&descriptor).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_match_takes_first_item() {
        let envelope = first_match(Envelope::success(json!([{"id": "a"}, {"id": "b"}]))).unwrap();
        assert_eq!(envelope, Envelope::success(json!({"id": "a"})));
    }

    #[test]
    fn test_first_match_empty_is_not_found() {
        let envelope = first_match(Envelope::success(json!([]))).unwrap();
        assert_eq!(envelope.error_status(), Some(404));
        match envelope {
            Envelope::Failure { errors, message, .. } => {
                assert!(errors.is_empty());
                assert_eq!(message, "not found");
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_first_match_passes_failures_through() {
        let failure = Error::MissingField("id").into_envelope().unwrap();
        assert_eq!(first_match(failure.clone()).unwrap(), failure);
    }
}
