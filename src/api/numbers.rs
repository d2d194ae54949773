//! Phone numbers
//!
//! Realm-wide lookups walk the account tree depth first, one request per
//! account for its numbers and one for its children.

use super::str_field;
use crate::crossbar::client::Client;
use crate::crossbar::envelope::Envelope;
use crate::crossbar::error::Error;
use crate::resource::{Descriptor, ResourceClass};
use serde_json::{Map, Value};

/// Number keys of a `phone_numbers` listing
fn number_keys(listing: &Value) -> Vec<String> {
    listing
        .get("numbers")
        .and_then(|v| v.as_object())
        .map(|numbers| {
            numbers
                .keys()
                .filter(|number| number.as_str() != "id")
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

/// Ids of a `children` listing, in listing order
fn child_ids(children: &Value) -> Vec<String> {
    children
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|child| str_field(child, "id"))
        .map(str::to_string)
        .collect()
}

impl Client {
    pub async fn list_phone_numbers(&mut self, account_id: Option<&str>) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id).then(ResourceClass::PhoneNumbers);
        self.get(&descriptor).await
    }

    /// Get an E.164 number from the account it is assigned to
    pub async fn get_phone_number(
        &mut self,
        e164: &str,
        assigned_account_id: &str,
    ) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(Some(assigned_account_id))
            .then_id(ResourceClass::PhoneNumber, e164);
        self.get(&descriptor).await
    }

    pub async fn delete_phone_number(
        &mut self,
        e164: &str,
        assigned_account_id: &str,
    ) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(Some(assigned_account_id))
            .then_id(ResourceClass::PhoneNumber, e164);
        self.delete(&descriptor).await
    }

    /// Map of number -> owning account id over `realm_id` and all its descendants
    pub async fn realm_numbers(&mut self, realm_id: Option<&str>) -> Result<Envelope, Error> {
        let Some(root) = realm_id.or(self.use_account_id()).map(str::to_string) else {
            return Error::MissingField("account_id").into_envelope();
        };

        let mut numbers = Map::new();
        let mut pending = vec![root];

        while let Some(account_id) = pending.pop() {
            let listing = try_data!(self.list_phone_numbers(Some(&account_id)).await?);
            for number in number_keys(&listing) {
                numbers.insert(number, Value::String(account_id.clone()));
            }

            let children = try_data!(self.children(Some(&account_id)).await?);
            // Reversed so the first child is visited first
            pending.extend(child_ids(&children).into_iter().rev());
        }

        Ok(Envelope::success(Value::Object(numbers)))
    }

    /// Id of the first account, searching from `realm_id` down, that holds `did`
    pub async fn account_id_by_did(
        &mut self,
        did: &str,
        realm_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        let Some(root) = realm_id.or(self.use_account_id()).map(str::to_string) else {
            return Error::MissingField("account_id").into_envelope();
        };

        let mut pending = vec![root];

        while let Some(account_id) = pending.pop() {
            let listing = try_data!(self.list_phone_numbers(Some(&account_id)).await?);
            if number_keys(&listing).iter().any(|number| number == did) {
                tracing::debug!("Number {} belongs to account {}", did, account_id);
                return Ok(Envelope::success(Value::String(account_id)));
            }

            let children = try_data!(self.children(Some(&account_id)).await?);
            pending.extend(child_ids(&children).into_iter().rev());
        }

        Error::NoMatchFound.into_envelope()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_keys_skip_id() {
        let listing = json!({
            "numbers": {"+15551230001": {"state": "in_service"}, "id": "numbers"},
            "cascade_quantity": 0
        });
        assert_eq!(number_keys(&listing), vec!["+15551230001".to_string()]);
        assert!(number_keys(&json!({})).is_empty());
    }

    #[test]
    fn test_child_ids() {
        let children = json!([{"id": "a", "realm": "a.example"}, {"name": "no id"}, {"id": "b"}]);
        assert_eq!(child_ids(&children), vec!["a".to_string(), "b".to_string()]);
    }
}
