use crate::models::{Agent, Department};

/// Least-loaded active agent in `department` with spare capacity, or `None`
/// when the task should be queued.
///
/// Ties keep registry order. Read-only: the chosen agent's load is not touched.
pub fn select_agent(registry: &[Agent], department: Department) -> Option<String> {
    registry
        .iter()
        .filter(|agent| agent.department == department.as_str())
        .filter(|agent| agent.is_active() && agent.has_capacity())
        // first minimum wins
        .min_by_key(|agent| agent.current_tasks)
        .map(|agent| agent.agent_id.clone())
}
