//! Callflows and the temporal rules they route on

use super::str_field;
use crate::crossbar::client::Client;
use crate::crossbar::envelope::Envelope;
use crate::crossbar::error::Error;
use serde_json::{Map, Value};

account_resource!(
    "callflow",
    Callflows,
    Callflow,
    list_callflows,
    get_callflow,
    create_callflow,
    update_callflow,
    delete_callflow
);

account_resource!(
    "temporal rule",
    TemporalRules,
    TemporalRule,
    list_temporal_rules,
    get_temporal_rule,
    create_temporal_rule,
    update_temporal_rule,
    delete_temporal_rule
);

fn items(listing: &Value) -> impl Iterator<Item = &Value> {
    listing.as_array().into_iter().flatten()
}

/// Number -> callflow id over a callflow listing
fn number_map(callflows: &Value) -> Map<String, Value> {
    let mut map = Map::new();
    for callflow in items(callflows) {
        let Some(id) = str_field(callflow, "id") else {
            continue;
        };
        for number in callflow.get("numbers").and_then(|v| v.as_array()).into_iter().flatten() {
            if let Some(number) = number.as_str() {
                map.insert(number.to_string(), Value::String(id.to_string()));
            }
        }
    }
    map
}

/// Whether any object in the callflow metadata has `pvt_type == kind`
fn references_type(callflow: &Value, kind: &str) -> bool {
    callflow
        .get("metadata")
        .and_then(|v| v.as_object())
        .map(|metadata| {
            metadata
                .values()
                .any(|entry| str_field(entry, "pvt_type") == Some(kind))
        })
        .unwrap_or(false)
}

impl Client {
    /// Map of dialed number -> callflow id
    pub async fn callflow_number_map(&mut self, account_id: Option<&str>) -> Result<Envelope, Error> {
        let callflows = try_data!(self.list_callflows(account_id).await?);
        Ok(Envelope::success(Value::Object(number_map(&callflows))))
    }

    /// Callflows whose `user_id` is `user_id`
    pub async fn callflows_by_user(
        &mut self,
        user_id: &str,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        let callflows = try_data!(self.list_callflows(account_id).await?);
        let matching = items(&callflows)
            .filter(|callflow| str_field(callflow, "user_id") == Some(user_id))
            .cloned()
            .collect();
        Ok(Envelope::success(Value::Array(matching)))
    }

    /// Map of callflow id -> numbers, for callflows referencing an object of
    /// type `kind` (e.g. `"device"`). Fetches every callflow.
    pub async fn callflows_by_type(
        &mut self,
        kind: &str,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        let callflows = try_data!(self.list_callflows(account_id).await?);

        let mut matching = Map::new();
        for summary in items(&callflows) {
            let Some(id) = str_field(summary, "id") else {
                continue;
            };
            let callflow = try_data!(self.get_callflow(id, account_id).await?);
            if references_type(&callflow, kind) {
                let numbers = summary.get("numbers").cloned().unwrap_or(Value::Array(Vec::new()));
                matching.insert(id.to_string(), numbers);
            }
        }

        Ok(Envelope::success(Value::Object(matching)))
    }

    /// Temporal rule called `name`; matched client side
    pub async fn find_temporal_rule_by_name(
        &mut self,
        name: &str,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        let rules = try_data!(self.list_temporal_rules(account_id).await?);
        let found = items(&rules)
            .find(|rule| str_field(rule, "name") == Some(name))
            .cloned();
        match found {
            Some(rule) => Ok(Envelope::success(rule)),
            None => Error::NoMatchFound.into_envelope(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_map() {
        let callflows = json!([
            {"id": "cf1", "numbers": ["100", "+15551230001"]},
            {"id": "cf2", "numbers": ["200"]},
            {"numbers": ["300"]}
        ]);
        let map = number_map(&callflows);
        assert_eq!(map.len(), 3);
        assert_eq!(map["100"], json!("cf1"));
        assert_eq!(map["200"], json!("cf2"));
        assert!(!map.contains_key("300"));
    }

    #[test]
    fn test_references_type() {
        let callflow = json!({
            "id": "cf1",
            "metadata": {
                "u1": {"name": "Ann", "pvt_type": "user"},
                "d1": {"name": "Desk", "pvt_type": "device"}
            }
        });
        assert!(references_type(&callflow, "device"));
        assert!(!references_type(&callflow, "vmbox"));
        assert!(!references_type(&json!({"id": "cf2"}), "device"));
    }
}
