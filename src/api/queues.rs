//! Call-center queues and agents

use crate::crossbar::client::Client;
use crate::crossbar::envelope::Envelope;
use crate::crossbar::error::Error;
use crate::resource::{Descriptor, ResourceClass};
use serde_json::{json, Value};

account_resource!(
    "queue",
    Queues,
    Queue,
    list_queues,
    get_queue,
    create_queue,
    update_queue,
    delete_queue
);

/// Agent ids on a queue record's roster, without `agent_id`
fn roster_without(queue: &Value, agent_id: &str) -> Vec<Value> {
    queue
        .get("agents")
        .and_then(|v| v.as_array())
        .into_iter()
        .flatten()
        .filter(|agent| agent.as_str() != Some(agent_id))
        .cloned()
        .collect()
}

impl Client {
    pub async fn queues_stats(&mut self, account_id: Option<&str>) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id)
            .then(ResourceClass::Queues)
            .then(ResourceClass::Stats);
        self.get(&descriptor).await
    }

    /// Calls currently waiting in any queue
    pub async fn queues_waiting_calls(&mut self, account_id: Option<&str>) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id)
            .then(ResourceClass::Queues)
            .then_args(ResourceClass::Stats, vec![json!({ "status": "waiting" })]);
        self.get(&descriptor).await
    }

    pub async fn list_agents(&mut self, account_id: Option<&str>) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id).then(ResourceClass::Agents);
        self.get(&descriptor).await
    }

    pub async fn get_agent(&mut self, agent_id: &str, account_id: Option<&str>) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id).then_id(ResourceClass::Agent, agent_id);
        self.get(&descriptor).await
    }

    pub async fn agents_stats(&mut self, account_id: Option<&str>) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id)
            .then(ResourceClass::Agents)
            .then(ResourceClass::Stats);
        self.get(&descriptor).await
    }

    /// Recent status of an agent, optionally only entries of one status
    pub async fn agent_status(
        &mut self,
        agent_id: &str,
        status: Option<&str>,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        let query = match status {
            Some(status) => json!({ "status": status, "recent": "true" }),
            None => json!({ "recent": "true" }),
        };
        let descriptor = Descriptor::account(account_id)
            .then_id(ResourceClass::Agent, agent_id)
            .then_args(ResourceClass::Status, vec![query]);
        self.get(&descriptor).await
    }

    /// Replace the roster of a queue
    pub async fn save_roster(
        &mut self,
        queue_id: &str,
        agents: Vec<Value>,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        let descriptor = Descriptor::account(account_id)
            .then_id(ResourceClass::Queue, queue_id)
            .then_args(ResourceClass::Roster, vec![Value::Array(agents)]);
        self.put(&descriptor, &Value::Null).await
    }

    /// Add an agent to a queue's roster, once
    pub async fn login_agent(
        &mut self,
        agent_id: &str,
        queue_id: &str,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        let queue = try_data!(self.get_queue(queue_id, account_id).await?);
        let mut agents = roster_without(&queue, agent_id);
        agents.push(Value::String(agent_id.to_string()));
        tracing::info!("Logging agent {} into queue {}", agent_id, queue_id);
        self.save_roster(queue_id, agents, account_id).await
    }

    pub async fn logout_agent(
        &mut self,
        agent_id: &str,
        queue_id: &str,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        let queue = try_data!(self.get_queue(queue_id, account_id).await?);
        let agents = roster_without(&queue, agent_id);
        tracing::info!("Logging agent {} out of queue {}", agent_id, queue_id);
        self.save_roster(queue_id, agents, account_id).await
    }

    /// Empty a queue's roster
    pub async fn logout_queue(&mut self, queue_id: &str, account_id: Option<&str>) -> Result<Envelope, Error> {
        self.save_roster(queue_id, Vec::new(), account_id).await
    }
}
