use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::entities::{default_max_tasks, Task};

// ── Cascade ─────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CascadeRequest {
    pub mention: String,
    pub org: Option<String>,
    pub repo: Option<String>,
    #[serde(rename = "type")]
    pub source_type: Option<String>,
}

pub const CASCADE_STATUS: &str = "cascaded";
pub const ASSIGNED_TO_QUEUED: &str = "queued";

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CascadeResult {
    pub status: String,
    pub task_id: String,
    /// Agent id, or `"queued"` when nobody was eligible.
    pub assigned_to: String,
    pub organization: String,
    pub department: String,
}

impl CascadeResult {
    pub fn from_task(task: &Task) -> Self {
        Self {
            status: CASCADE_STATUS.into(),
            task_id: task.task_id.clone(),
            assigned_to: task
                .assigned_agent
                .clone()
                .unwrap_or_else(|| ASSIGNED_TO_QUEUED.into()),
            organization: task.organization.clone(),
            department: task.department.as_str().into(),
        }
    }
}

// ── Agent registration ──────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAgent {
    pub agent_id: String,
    pub organization: String,
    pub department: String,
    #[serde(default)]
    pub current_tasks: u32,
    #[serde(default = "default_max_tasks")]
    pub max_tasks: u32,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    super::entities::AGENT_STATUS_ACTIVE.into()
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentRegistered {
    pub agent_id: String,
    pub registered: bool,
    pub registered_at: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AgentList {
    pub agents: Vec<super::entities::Agent>,
}

// ── Task log ────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TaskList {
    pub tasks: Vec<Task>,
}

// ── Audit and stats ─────────────────────────────────────────────

/// A cascade that did not produce a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FailureRecord {
    pub at: String,
    pub status: u16,
    pub error: String,
    pub retryable: bool,
}

/// Aggregates over the recent-task window.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub window_hours: u32,
    pub since: String,
    pub total: u64,
    pub urgent: u64,
    pub failures: u64,
    pub by_status: BTreeMap<String, u64>,
    pub by_department: BTreeMap<String, u64>,
    pub by_organization: BTreeMap<String, u64>,
    /// The window reaches past the oldest indexed task, so counts are a floor.
    pub truncated: bool,
}

// ── Common ─────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ServiceIndex {
    pub service: String,
    pub endpoints: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub service: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    pub retryable: bool,
}
