//! Voicemail boxes and their messages

use super::str_field;
use crate::crossbar::client::Client;
use crate::crossbar::envelope::{Content, Envelope};
use crate::crossbar::error::Error;
use crate::resource::{Descriptor, ResourceClass};
use serde_json::Value;

account_resource!(
    "voicemail box",
    VMBoxes,
    VMBox,
    list_vmboxes,
    get_vmbox,
    create_vmbox,
    update_vmbox,
    delete_vmbox
);

/// Shallow merge, `detail` wins
fn merged(summary: &Value, detail: Value) -> Value {
    match (summary, detail) {
        (Value::Object(summary), Value::Object(detail)) => {
            let mut record = summary.clone();
            record.extend(detail);
            Value::Object(record)
        }
        (summary, _) => summary.clone(),
    }
}

impl Client {
    pub async fn find_vmbox_by_name(
        &mut self,
        name: &str,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        self.find_first(ResourceClass::VMBoxes, &[("name", name)], account_id)
            .await
    }

    /// Box whose mailbox number is `mailbox`
    pub async fn find_vmbox_by_mailbox(
        &mut self,
        mailbox: &str,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        self.find_first(ResourceClass::VMBoxes, &[("mailbox", mailbox)], account_id)
            .await
    }

    /// Boxes owned by `owner_id`, each merged with its full record
    pub async fn vmboxes_by_owner(
        &mut self,
        owner_id: &str,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id)
            .then_filtered(ResourceClass::VMBoxes, [("owner_id", owner_id)]);
        let listing = try_data!(self.get(&descriptor).await?);

        let mut boxes = Vec::new();
        for summary in listing.as_array().into_iter().flatten() {
            let detail = match str_field(summary, "id") {
                Some(id) => try_data!(self.get_vmbox(id, account_id).await?),
                None => Value::Null,
            };
            boxes.push(merged(summary, detail));
        }

        Ok(Envelope::success(Value::Array(boxes)))
    }

    /// Box matching both mailbox number and pin; not found on a wrong pin
    pub async fn login_vmbox(
        &mut self,
        mailbox: &str,
        pin: &str,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        self.find_first(
            ResourceClass::VMBoxes,
            &[("mailbox", mailbox), ("pin", pin)],
            account_id,
        )
        .await
    }

    pub async fn list_messages(
        &mut self,
        box_id: &str,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id)
            .then_id(ResourceClass::VMBox, box_id)
            .then(ResourceClass::Messages);
        self.get(&descriptor).await
    }

    pub async fn get_message(
        &mut self,
        message_id: &str,
        box_id: &str,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id)
            .then_id(ResourceClass::VMBox, box_id)
            .then_id(ResourceClass::Message, message_id);
        self.get(&descriptor).await
    }

    /// Recording of a message, undecoded
    pub async fn get_message_raw(
        &mut self,
        message_id: &str,
        box_id: &str,
        account_id: Option<&str>,
    ) -> Result<Content, Error> {
        let descriptor = Descriptor::account(account_id)
            .then_id(ResourceClass::VMBox, box_id)
            .then_id(ResourceClass::Message, message_id)
            .then(ResourceClass::Raw);
        self.download(&descriptor).await
    }

    pub async fn delete_message(
        &mut self,
        message_id: &str,
        box_id: &str,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id)
            .then_id(ResourceClass::VMBox, box_id)
            .then_id(ResourceClass::Message, message_id);
        self.delete(&descriptor).await
    }
}
