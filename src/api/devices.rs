//! Devices and their registration status

use crate::crossbar::client::Client;
use crate::crossbar::envelope::Envelope;
use crate::crossbar::error::Error;
use crate::resource::{Descriptor, ResourceClass};

account_resource!(
    "device",
    Devices,
    Device,
    list_devices,
    get_device,
    create_device,
    update_device,
    delete_device
);

impl Client {
    /// Registration status of every device
    pub async fn devices_status(&mut self, account_id: Option<&str>) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id)
            .then(ResourceClass::Devices)
            .then(ResourceClass::Status);
        self.get(&descriptor).await
    }

    pub async fn devices_by_owner(
        &mut self,
        owner_id: &str,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id)
            .then_filtered(ResourceClass::Devices, [("owner_id", owner_id)]);
        self.get(&descriptor).await
    }

    /// First device owned by `owner_id`
    pub async fn find_device_by_owner(
        &mut self,
        owner_id: &str,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        self.find_first(ResourceClass::Devices, &[("owner_id", owner_id)], account_id)
            .await
    }

    pub async fn find_device_by_name(
        &mut self,
        name: &str,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        self.find_first(ResourceClass::Devices, &[("name", name)], account_id)
            .await
    }
}
