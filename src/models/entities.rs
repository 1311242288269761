use serde::{Deserialize, Serialize};

// ── Intent vocabulary ───────────────────────────────────────────

/// Primary action extracted from a mention.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Deploy,
    Fix,
    Enhance,
    Test,
    Docs,
    Review,
    Monitor,
    General,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deploy => "deploy",
            Self::Fix => "fix",
            Self::Enhance => "enhance",
            Self::Test => "test",
            Self::Docs => "docs",
            Self::Review => "review",
            Self::Monitor => "monitor",
            Self::General => "general",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Urgent,
    Normal,
}

/// Inner routing scope within an organization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Department {
    Infrastructure,
    Products,
    Testing,
    Documentation,
    Security,
    General,
}

impl Department {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Infrastructure => "infrastructure",
            Self::Products => "products",
            Self::Testing => "testing",
            Self::Documentation => "documentation",
            Self::Security => "security",
            Self::General => "general",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

// ── Intent ──────────────────────────────────────────────────────

/// Structured reading of one mention. Built once per cascade and embedded
/// in the resulting task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    /// Catalog products in catalog order.
    pub products: Vec<String>,
    pub action: Action,
    pub infra_refs: Vec<String>,
    pub urgency: Urgency,
    pub raw_text: String,
}

// ── Agent ───────────────────────────────────────────────────────

pub const AGENT_STATUS_ACTIVE: &str = "active";
pub const DEFAULT_MAX_TASKS: u32 = 10;

/// Registry entry. The cascade only reads these; load counters belong to
/// whoever owns the registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub agent_id: String,
    pub organization: String,
    pub department: String,
    pub status: String,
    #[serde(default)]
    pub current_tasks: u32,
    #[serde(default = "default_max_tasks")]
    pub max_tasks: u32,
    pub registered_at: String,
}

impl Agent {
    pub fn is_active(&self) -> bool {
        self.status == AGENT_STATUS_ACTIVE
    }

    pub fn has_capacity(&self) -> bool {
        self.current_tasks < self.max_tasks
    }
}

pub(crate) fn default_max_tasks() -> u32 {
    DEFAULT_MAX_TASKS
}

// ── Task ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Assigned,
    Queued,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::Queued => "queued",
        }
    }
}

/// Output of one cascade. Written once to the task log, never updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub task_id: String,
    pub intent: Intent,
    pub organization: String,
    pub department: Department,
    pub assigned_agent: Option<String>,
    pub source_repo: Option<String>,
    pub source_type: Option<String>,
    pub status: TaskStatus,
    pub created_at: String,
}
