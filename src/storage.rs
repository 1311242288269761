//! Agent registry and task log backed by Workers KV.
//!
//! The cascade talks to both through traits so the pure pipeline can be
//! exercised natively against the in-memory drivers.

use crate::models::{Agent, FailureRecord, Task};
use futures_util::future::try_join_all;
use worker::*;

pub const CASCADE_KV_BINDING: &str = "CASCADE_KV";
const REGISTRY_KEY: &str = "agents:registry";
const TASK_KEY_PREFIX: &str = "task:";
const RECENT_INDEX_KEY: &str = "tasks:recent";
/// Newest task ids kept in the recent index; older tasks stay readable by id.
pub const RECENT_INDEX_CAP: usize = 500;
const FAILURE_LOG_KEY: &str = "audit:failures";
pub const FAILURE_LOG_CAP: usize = 100;

#[allow(async_fn_in_trait)]
pub trait AgentRegistry {
    /// Point-in-time view of every agent, in registration order.
    async fn snapshot(&self) -> Result<Vec<Agent>>;

    /// Insert, or replace in place when the id is already registered.
    async fn register(&self, agent: Agent) -> Result<()>;
}

#[allow(async_fn_in_trait)]
pub trait TaskLog {
    async fn append(&self, task: &Task) -> Result<()>;

    async fn get(&self, task_id: &str) -> Result<Option<Task>>;

    /// Up to `limit` tasks, newest first, drawn from the recent index.
    async fn recent(&self, limit: usize) -> Result<Vec<Task>>;
}

/// Cascades that ended in an error, newest first, capped.
#[allow(async_fn_in_trait)]
pub trait FailureLog {
    async fn record_failure(&self, failure: &FailureRecord) -> Result<()>;

    async fn failures(&self) -> Result<Vec<FailureRecord>>;
}

pub(crate) fn upsert_agent(registry: &mut Vec<Agent>, agent: Agent) {
    match registry.iter_mut().find(|a| a.agent_id == agent.agent_id) {
        Some(slot) => *slot = agent,
        None => registry.push(agent),
    }
}

/// Put `task_id` at the head of the index, keeping at most `cap` ids.
pub(crate) fn push_recent(index: &mut Vec<String>, task_id: &str, cap: usize) {
    index.retain(|id| id != task_id);
    index.insert(0, task_id.to_string());
    index.truncate(cap);
}

pub fn task_key(task_id: &str) -> String {
    format!("{TASK_KEY_PREFIX}{task_id}")
}

// ── KV drivers ──────────────────────────────────────────────────

pub struct KvAgentRegistry {
    kv: kv::KvStore,
}

impl KvAgentRegistry {
    pub fn new(kv: kv::KvStore) -> Self {
        Self { kv }
    }
}

impl AgentRegistry for KvAgentRegistry {
    async fn snapshot(&self) -> Result<Vec<Agent>> {
        Ok(self
            .kv
            .get(REGISTRY_KEY)
            .json::<Vec<Agent>>()
            .await?
            .unwrap_or_default())
    }

    // Read-modify-write without CAS: two concurrent registrations can drop one.
    async fn register(&self, agent: Agent) -> Result<()> {
        let mut registry = self.snapshot().await?;
        upsert_agent(&mut registry, agent);
        let text = serde_json::to_string(&registry)
            .map_err(|e| Error::RustError(format!("serialize registry: {e}")))?;
        self.kv.put(REGISTRY_KEY, text)?.execute().await?;
        Ok(())
    }
}

pub struct KvTaskLog {
    kv: kv::KvStore,
}

impl KvTaskLog {
    pub fn new(kv: kv::KvStore) -> Self {
        Self { kv }
    }

    async fn recent_index(&self) -> Result<Vec<String>> {
        Ok(self
            .kv
            .get(RECENT_INDEX_KEY)
            .json::<Vec<String>>()
            .await?
            .unwrap_or_default())
    }
}

impl TaskLog for KvTaskLog {
    async fn append(&self, task: &Task) -> Result<()> {
        let text = serde_json::to_string(task)
            .map_err(|e| Error::RustError(format!("serialize task: {e}")))?;
        self.kv.put(&task_key(&task.task_id), text)?.execute().await?;

        // Same read-modify-write race as the registry: a concurrent append can
        // drop an id from the index, never from the log itself.
        let mut index = self.recent_index().await?;
        push_recent(&mut index, &task.task_id, RECENT_INDEX_CAP);
        let index_text = serde_json::to_string(&index)
            .map_err(|e| Error::RustError(format!("serialize recent index: {e}")))?;
        self.kv.put(RECENT_INDEX_KEY, index_text)?.execute().await?;
        Ok(())
    }

    async fn get(&self, task_id: &str) -> Result<Option<Task>> {
        Ok(self.kv.get(&task_key(task_id)).json::<Task>().await?)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Task>> {
        let mut ids = self.recent_index().await?;
        ids.truncate(limit);

        let reads = ids.iter().map(|id| async move {
            self.kv
                .get(&task_key(id))
                .json::<Task>()
                .await
                .map_err(Error::from)
        });
        let tasks = try_join_all(reads).await?;
        Ok(tasks.into_iter().flatten().collect())
    }
}

impl FailureLog for KvTaskLog {
    async fn record_failure(&self, failure: &FailureRecord) -> Result<()> {
        let mut failures = self.failures().await?;
        failures.insert(0, failure.clone());
        failures.truncate(FAILURE_LOG_CAP);
        let text = serde_json::to_string(&failures)
            .map_err(|e| Error::RustError(format!("serialize failure log: {e}")))?;
        self.kv.put(FAILURE_LOG_KEY, text)?.execute().await?;
        Ok(())
    }

    async fn failures(&self) -> Result<Vec<FailureRecord>> {
        Ok(self
            .kv
            .get(FAILURE_LOG_KEY)
            .json::<Vec<FailureRecord>>()
            .await?
            .unwrap_or_default())
    }
}

// ── In-memory drivers ───────────────────────────────────────────
