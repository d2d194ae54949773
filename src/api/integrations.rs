//! Webhooks, PBX connectivity, faxes, carrier resources and event subscriptions

use crate::crossbar::client::Client;
use crate::crossbar::envelope::Envelope;
use crate::crossbar::error::Error;
use crate::resource::{Descriptor, ResourceClass};
use serde_json::{json, Value};

account_resource!(
    "webhook",
    Webhooks,
    Webhook,
    list_webhooks,
    get_webhook,
    create_webhook,
    update_webhook,
    delete_webhook
);

account_resource!(
    "connectivity setting",
    Connectivities,
    Connectivity,
    list_connectivity,
    get_connectivity,
    create_connectivity,
    update_connectivity,
    delete_connectivity
);

/// Body of a webhook that POSTs every `bind_event` to `uri`
pub fn webhook_body(name: &str, uri: &str, bind_event: &str, retries: u32) -> Value {
    json!({
        "name": name,
        "bind_event": bind_event,
        "uri": uri,
        "http_verb": "post",
        "retries": retries,
        "hook": "all",
    })
}

impl Client {
    /// Register a webhook built by [`webhook_body`]
    pub async fn register_webhook(
        &mut self,
        name: &str,
        uri: &str,
        bind_event: &str,
        retries: u32,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        self.create_webhook(&webhook_body(name, uri, bind_event, retries), account_id)
            .await
    }

    /// Outgoing fax jobs
    pub async fn list_faxes(&mut self, account_id: Option<&str>) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id)
            .then(ResourceClass::Faxes)
            .then(ResourceClass::Outgoing);
        self.get(&descriptor).await
    }

    pub async fn get_fax(&mut self, fax_id: &str, account_id: Option<&str>) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id).then_id(ResourceClass::Fax, fax_id);
        self.get(&descriptor).await
    }

    /// Queue a fax; `data` carries the document URL and the destination
    pub async fn send_fax(&mut self, data: &Value, account_id: Option<&str>) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id).then(ResourceClass::Fax);
        self.put(&descriptor, data).await
    }

    /// Carrier resources
    pub async fn list_resources(&mut self, account_id: Option<&str>) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id).then(ResourceClass::Resources);
        self.get(&descriptor).await
    }

    /// Event bindings available for subscription
    pub async fn available_subscriptions(&mut self, account_id: Option<&str>) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id)
            .then(ResourceClass::Events)
            .then(ResourceClass::Available);
        self.get(&descriptor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_body() {
        let body = webhook_body("billing", "https://hooks.example.com/cdr", "authz", 2);
        assert_eq!(body["uri"], "https://hooks.example.com/cdr");
        assert_eq!(body["http_verb"], "post");
        assert_eq!(body["retries"], 2);
        assert_eq!(body["hook"], "all");
    }
}
