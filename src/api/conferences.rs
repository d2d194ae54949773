//! Conferences and live participant control

use crate::crossbar::client::Client;
use crate::crossbar::envelope::Envelope;
use crate::crossbar::error::Error;
use crate::resource::{Descriptor, ResourceClass};
use serde_json::Value;

account_resource!(
    "conference",
    Conferences,
    Conference,
    list_conferences,
    get_conference,
    create_conference,
    update_conference,
    delete_conference
);

impl Client {
    pub async fn find_conference_by_name(
        &mut self,
        name: &str,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        self.find_first(ResourceClass::Conferences, &[("name", name)], account_id)
            .await
    }

    /// Live details, including the participant list
    pub async fn conference_participants(
        &mut self,
        conference_id: &str,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id)
            .then_id(ResourceClass::Conference, conference_id)
            .then(ResourceClass::Details);
        self.get(&descriptor).await
    }

    /// Apply `action` (e.g. `mute`, `kick`) to one participant
    pub async fn conference_participant_action(
        &mut self,
        action: &str,
        conference_id: &str,
        participant_id: &str,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id)
            .then_id(ResourceClass::Conference, conference_id)
            .then_args(
                ResourceClass::Action,
                vec![
                    Value::String(action.to_string()),
                    Value::String(participant_id.to_string()),
                ],
            );
        self.get(&descriptor).await
    }
}
