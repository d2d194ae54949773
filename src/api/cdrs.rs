//! Call detail records

use crate::crossbar::client::Client;
use crate::crossbar::envelope::Envelope;
use crate::crossbar::error::Error;
use crate::resource::{Descriptor, ResourceClass};
use chrono::{DateTime, Utc};
use serde_json::json;

/// Seconds between 0000-01-01 and the Unix epoch
const GREGORIAN_EPOCH_OFFSET: i64 = 62_167_219_200;

/// Crossbar timestamps count seconds from year 0, not 1970
pub fn gregorian_seconds(at: DateTime<Utc>) -> i64 {
    at.timestamp() + GREGORIAN_EPOCH_OFFSET
}

impl Client {
    /// Records matching `filters`; keys are sent as `filter_<key>`
    pub async fn list_cdrs(
        &mut self,
        filters: &[(&str, &str)],
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        let descriptor =
            Descriptor::account(account_id).then_filtered(ResourceClass::Cdrs, filters.iter().copied());
        self.get(&descriptor).await
    }

    /// Records created within `[from, to]`
    pub async fn cdrs_between(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        let window = json!({
            "created_from": gregorian_seconds(from),
            "created_to": gregorian_seconds(to),
        });
        let descriptor = Descriptor::account(account_id).then_args(ResourceClass::Cdrs, vec![window]);
        self.get(&descriptor).await
    }
}
