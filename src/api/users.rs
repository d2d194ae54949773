//! Users

use super::str_field;
use crate::crossbar::client::Client;
use crate::crossbar::envelope::Envelope;
use crate::crossbar::error::Error;
use crate::resource::ResourceClass;

account_resource!("user", Users, User, list_users, get_user, create_user, update_user, delete_user);

impl Client {
    pub async fn find_user_by_name(
        &mut self,
        username: &str,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        self.find_first(ResourceClass::Users, &[("username", username)], account_id)
            .await
    }

    /// Id of the user called `username` in the current account
    pub async fn user_id(&mut self, username: &str) -> Result<Option<String>, Error> {
        let envelope = self.find_user_by_name(username, None).await?;
        Ok(envelope
            .data()
            .and_then(|user| str_field(user, "id"))
            .map(str::to_string))
    }
}
