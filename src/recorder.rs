use crate::clock::Timestamp;
use crate::error::CascadeError;
use crate::models::{Department, Intent, Task, TaskStatus};
use crate::storage::TaskLog;

/// Hook for telling an agent it has new work. Delivery is best effort and
/// cannot fail the cascade.
#[allow(async_fn_in_trait)]
pub trait AgentNotifier {
    async fn notify(&self, agent_id: &str, task: &Task);
}

/// Default notifier: agents pull work, nothing is pushed.
pub struct NoopNotifier;

impl AgentNotifier for NoopNotifier {
    async fn notify(&self, _agent_id: &str, _task: &Task) {}
}

/// Everything the recorder needs besides ids and time.
pub struct TaskDraft {
    pub intent: Intent,
    pub organization: String,
    pub department: Department,
    pub assigned_agent: Option<String>,
    pub source_repo: Option<String>,
    pub source_type: Option<String>,
}

/// Build the task, write it to the log, then notify the assignee.
///
/// Nothing is notified when the write fails. A failed write is a storage
/// error; failing to draw an id is an internal one.
pub async fn record_task<L: TaskLog, N: AgentNotifier>(
    log: &L,
    notifier: &N,
    draft: TaskDraft,
    now: &Timestamp,
) -> Result<Task, CascadeError> {
    let status = if draft.assigned_agent.is_some() {
        TaskStatus::Assigned
    } else {
        TaskStatus::Queued
    };

    let task = Task {
        task_id: generate_task_id(now.millis)?,
        intent: draft.intent,
        organization: draft.organization,
        department: draft.department,
        assigned_agent: draft.assigned_agent,
        source_repo: draft.source_repo,
        source_type: draft.source_type,
        status,
        created_at: now.iso.clone(),
    };

    log.append(&task).await.map_err(CascadeError::Storage)?;

    if let Some(agent_id) = &task.assigned_agent {
        notifier.notify(agent_id, &task).await;
    }
    Ok(task)
}

/// `task_<millis>_<8 hex>`. Unique enough for a log key, not a secret.
fn generate_task_id(millis: u64) -> Result<String, CascadeError> {
    let mut buf = [0u8; 4];
    getrandom::getrandom(&mut buf).map_err(entropy_error)?;
    Ok(format!("task_{millis:013}_{}", hex::encode(buf)))
}

fn entropy_error(err: getrandom::Error) -> CascadeError {
    CascadeError::Internal(format!("failed to generate id: {err}"))
}
