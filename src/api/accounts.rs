//! Account tree operations

use super::str_field;
use crate::crossbar::client::Client;
use crate::crossbar::envelope::Envelope;
use crate::crossbar::error::Error;
use crate::resource::{Descriptor, ResourceClass};
use serde_json::{json, Map, Value};

impl Client {
    pub async fn get_account(&mut self, account_id: Option<&str>) -> Result<Envelope, Error> {
        self.get(&Descriptor::account(account_id)).await
    }

    /// Create `data` as a child of `parent_id` (or the current account)
    pub async fn create_account(
        &mut self,
        data: &Value,
        parent_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(parent_id).then(ResourceClass::AddChild);
        self.put(&descriptor, data).await
    }

    /// Update an account; `data` must carry its `id`
    pub async fn update_account(
        &mut self,
        data: &Value,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        self.post(&Descriptor::account(account_id), data).await
    }

    /// Delete an account. Never falls back to the current account.
    pub async fn delete_account(&mut self, account_id: &str) -> Result<Envelope, Error> {
        self.delete(&Descriptor::account(Some(account_id))).await
    }

    pub async fn children(&mut self, account_id: Option<&str>) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id).then(ResourceClass::Children);
        self.get(&descriptor).await
    }

    pub async fn siblings(&mut self, account_id: Option<&str>) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id).then(ResourceClass::Siblings);
        self.get(&descriptor).await
    }

    pub async fn descendants(&mut self, account_id: Option<&str>) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id).then(ResourceClass::Descendants);
        self.get(&descriptor).await
    }

    /// Move `account_id` (or the current account) under `new_parent_id`
    pub async fn set_parent(
        &mut self,
        account_id: Option<&str>,
        new_parent_id: &str,
    ) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id)
            .then_args(ResourceClass::Parent, vec![json!({ "parent": new_parent_id })]);
        self.put(&descriptor, &Value::Null).await
    }

    pub async fn credits(&mut self, account_id: Option<&str>) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id).then(ResourceClass::Credits);
        self.get(&descriptor).await
    }

    /// Map of realm -> account id for the children of `account_id`, plus the
    /// authenticated account's own realm
    pub async fn get_accounts(&mut self, account_id: Option<&str>) -> Result<Envelope, Error> {
        let children = try_data!(self.children(account_id).await?);

        let mut realms = Map::new();
        for child in children.as_array().into_iter().flatten() {
            if let (Some(realm), Some(id)) = (str_field(child, "realm"), str_field(child, "id")) {
                realms.insert(realm.to_string(), Value::String(id.to_string()));
            }
        }

        let Some(auth_account_id) = self.auth_account_id().map(str::to_string) else {
            return Error::MissingField("account_id").into_envelope();
        };
        let own = try_data!(self.get_account(Some(&auth_account_id)).await?);
        if let Some(realm) = str_field(&own, "realm") {
            realms.insert(realm.to_string(), Value::String(auth_account_id));
        }

        tracing::debug!("Resolved {} realms", realms.len());
        Ok(Envelope::success(Value::Object(realms)))
    }

    /// Account id registered for `realm`, among the realms of [`Client::get_accounts`]
    pub async fn account_id_by_realm(
        &mut self,
        realm: &str,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        let realms = try_data!(self.get_accounts(account_id).await?);
        match realms.get(realm) {
            Some(id) => Ok(Envelope::success(id.clone())),
            None => Error::NoMatchFound.into_envelope(),
        }
    }
}
