//! The waterfall: classify → route → resolve department → select → record.

use crate::catalog::Catalog;
use crate::classifier::classify;
use crate::clock::Timestamp;
use crate::models;
use crate::recorder::{record_task, AgentNotifier, TaskDraft};
use crate::routing::{resolve_department, route_organization};
use crate::selector::select_agent;
use crate::storage::{AgentRegistry, TaskLog};
pub use crate::error::CascadeError;

/// Decode a cascade payload. `mention` must be present and a string; the
/// optional fields are passed through untouched.
pub fn parse_cascade_request(body: &str) -> Result<models::CascadeRequest, CascadeError> {
    serde_json::from_str(body).map_err(|e| CascadeError::MalformedInput(e.to_string()))
}

/// Run one mention through the full cascade and persist the resulting task.
///
/// Only the registry read and the log write can fail. An empty eligible set
/// is not a failure: the task is recorded as queued.
pub async fn run_cascade<R, L, N>(
    catalog: &Catalog,
    registry: &R,
    log: &L,
    notifier: &N,
    request: models::CascadeRequest,
    now: &Timestamp,
) -> Result<models::Task, CascadeError>
where
    R: AgentRegistry,
    L: TaskLog,
    N: AgentNotifier,
{
    let intent = classify(catalog, &request.mention);
    let organization = route_organization(catalog, &intent, request.org.as_deref());
    let department = resolve_department(&intent);

    let snapshot = registry.snapshot().await.map_err(CascadeError::Storage)?;
    let assigned_agent = select_agent(&snapshot, department);

    let draft = TaskDraft {
        intent,
        organization,
        department,
        assigned_agent,
        source_repo: request.repo,
        source_type: request.source_type,
    };
    record_task(log, notifier, draft, now).await
}

/// Validate a registration payload and store the agent with its defaults.
pub async fn register_agent<R: AgentRegistry>(
    registry: &R,
    body: models::RegisterAgent,
    now: &Timestamp,
) -> Result<models::Agent, CascadeError> {
    let agent_id = body.agent_id.trim();
    let organization = body.organization.trim();
    let department = body.department.trim().to_ascii_lowercase();
    let status = body.status.trim().to_ascii_lowercase();

    if agent_id.is_empty() {
        return Err(CascadeError::MalformedInput("agentId must not be empty".into()));
    }
    if organization.is_empty() || department.is_empty() {
        return Err(CascadeError::MalformedInput(
            "organization and department are required".into(),
        ));
    }
    if body.max_tasks == 0 {
        return Err(CascadeError::MalformedInput("maxTasks must be positive".into()));
    }

    let agent = models::Agent {
        agent_id: agent_id.to_string(),
        organization: organization.to_string(),
        department,
        status,
        current_tasks: body.current_tasks,
        max_tasks: body.max_tasks,
        registered_at: now.iso.clone(),
    };
    registry
        .register(agent.clone())
        .await
        .map_err(CascadeError::Storage)?;
    Ok(agent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Action, CascadeResult, Department, TaskStatus, Urgency};
    use crate::recorder::NoopNotifier;
    use crate::storage::memory::{MemoryRegistry, MemoryTaskLog};
    use futures::executor::block_on;

    fn now() -> Timestamp {
        Timestamp {
            millis: 1_767_225_600_000,
            iso: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    fn agent(id: &str, department: &str, current: u32) -> models::Agent {
        models::Agent {
            agent_id: id.into(),
            organization: "BlackRoad-OS".into(),
            department: department.into(),
            status: "active".into(),
            current_tasks: current,
            max_tasks: 10,
            registered_at: "2026-01-01T00:00:00Z".into(),
        }
    }

    fn request(mention: &str) -> models::CascadeRequest {
        models::CascadeRequest {
            mention: mention.into(),
            org: None,
            repo: Some("blackroad/os".into()),
            source_type: Some("issue".into()),
        }
    }

    fn cascade(
        registry: &MemoryRegistry,
        log: &MemoryTaskLog,
        mention: &str,
    ) -> Result<models::Task, CascadeError> {
        block_on(run_cascade(
            &Catalog::builtin(),
            registry,
            log,
            &NoopNotifier,
            request(mention),
            &now(),
        ))
    }

    #[test]
    fn product_mention_with_empty_registry_is_queued() {
        let registry = MemoryRegistry::default();
        let log = MemoryTaskLog::default();
        let task = cascade(&registry, &log, "Deploy RoadCommand to production @blackroad").unwrap();

        assert_eq!(task.intent.products, vec!["roadcommand".to_string()]);
        assert_eq!(task.intent.action, Action::Deploy);
        assert_eq!(task.intent.urgency, Urgency::Normal);
        assert_eq!(task.organization, "BlackRoad-OS");
        assert_eq!(task.department, Department::Products);
        assert_eq!(task.status, TaskStatus::Queued);

        let result = CascadeResult::from_task(&task);
        assert_eq!(result.status, "cascaded");
        assert_eq!(result.assigned_to, "queued");
        assert_eq!(result.department, "products");
    }

    #[test]
    fn urgent_fix_goes_to_products_agent() {
        let registry = MemoryRegistry::with_agents(vec![agent("agent-products", "products", 2)]);
        let log = MemoryTaskLog::default();
        let task = cascade(&registry, &log, "urgent fix needed on octavia").unwrap();

        assert_eq!(task.intent.action, Action::Fix);
        assert_eq!(task.department, Department::Products);
        assert_eq!(task.status, TaskStatus::Assigned);
        assert_eq!(
            CascadeResult::from_task(&task).assigned_to,
            "agent-products"
        );
    }

    #[test]
    fn least_loaded_agent_wins() {
        let registry = MemoryRegistry::with_agents(vec![
            agent("heavy", "security", 3),
            agent("light", "security", 1),
        ]);
        let log = MemoryTaskLog::default();
        let task = cascade(&registry, &log, "please audit the login flow").unwrap();
        assert_eq!(task.assigned_agent.as_deref(), Some("light"));
    }

    #[test]
    fn agent_load_is_left_untouched() {
        let registry = MemoryRegistry::with_agents(vec![agent("only", "products", 0)]);
        let log = MemoryTaskLog::default();
        cascade(&registry, &log, "fix the bug").unwrap();
        cascade(&registry, &log, "fix another bug").unwrap();
        assert_eq!(registry.agents.borrow()[0].current_tasks, 0);
    }

    #[test]
    fn recorded_task_round_trips_through_log() {
        let registry = MemoryRegistry::default();
        let log = MemoryTaskLog::default();
        let task = cascade(&registry, &log, "review roadcoin contracts").unwrap();
        let stored = block_on(log.get(&task.task_id)).unwrap().unwrap();

        assert_eq!(stored.organization, task.organization);
        assert_eq!(stored.department, task.department);
        assert_eq!(stored.status, task.status);
        assert_eq!(stored.source_repo.as_deref(), Some("blackroad/os"));
    }

    #[test]
    fn registry_failure_is_storage_error_not_queue() {
        let registry = MemoryRegistry::default();
        registry.fail.set(true);
        let log = MemoryTaskLog::default();
        let err = cascade(&registry, &log, "fix the bug").unwrap_err();

        assert!(matches!(err, CascadeError::Storage(_)));
        assert_eq!(err.status_code(), 503);
        assert!(err.retryable());
        assert!(log.entries.borrow().is_empty());
    }

    #[test]
    fn log_failure_surfaces() {
        let registry = MemoryRegistry::default();
        let log = MemoryTaskLog::default();
        log.fail.set(true);
        let err = cascade(&registry, &log, "fix the bug").unwrap_err();
        assert!(matches!(err, CascadeError::Storage(_)));
    }

    #[test]
    fn parse_requires_string_mention() {
        let ok = parse_cascade_request(r#"{"mention":"ship it","org":"labs","type":"pr"}"#).unwrap();
        assert_eq!(ok.mention, "ship it");
        assert_eq!(ok.source_type.as_deref(), Some("pr"));

        for bad in [r#"{}"#, r#"{"mention": 5}"#, r#"{"mention": null}"#, "not json"] {
            let err = parse_cascade_request(bad).unwrap_err();
            assert!(matches!(err, CascadeError::MalformedInput(_)), "{bad}");
            assert_eq!(err.status_code(), 400);
            assert!(!err.retryable());
        }
    }

    #[test]
    fn registration_applies_defaults() {
        let registry = MemoryRegistry::default();
        let body: models::RegisterAgent = serde_json::from_str(
            r#"{"agentId":"a1","organization":"BlackRoad-OS","department":"Products"}"#,
        )
        .unwrap();
        let agent = block_on(register_agent(&registry, body, &now())).unwrap();

        assert_eq!(agent.current_tasks, 0);
        assert_eq!(agent.max_tasks, 10);
        assert_eq!(agent.status, "active");
        assert_eq!(agent.department, "products");
        assert_eq!(agent.registered_at, "2026-01-01T00:00:00.000Z");
        assert_eq!(registry.agents.borrow().len(), 1);
    }

    #[test]
    fn padded_registration_is_normalized_and_selectable() {
        let registry = MemoryRegistry::default();
        let body: models::RegisterAgent = serde_json::from_str(
            r#"{"agentId":"  a1 ","organization":" BlackRoad-OS ","department":" Products ","status":" Active "}"#,
        )
        .unwrap();
        let agent = block_on(register_agent(&registry, body, &now())).unwrap();

        assert_eq!(agent.agent_id, "a1");
        assert_eq!(agent.organization, "BlackRoad-OS");
        assert_eq!(agent.department, "products");
        assert_eq!(agent.status, "active");

        let log = MemoryTaskLog::default();
        let task = cascade(&registry, &log, "fix the bug").unwrap();
        assert_eq!(task.assigned_agent.as_deref(), Some("a1"));
        assert_eq!(task.status, TaskStatus::Assigned);
    }

    #[test]
    fn registration_rejects_bad_payloads() {
        let registry = MemoryRegistry::default();
        let empty_id = models::RegisterAgent {
            agent_id: " ".into(),
            organization: "o".into(),
            department: "products".into(),
            current_tasks: 0,
            max_tasks: 10,
            status: "active".into(),
        };
        assert!(matches!(
            block_on(register_agent(&registry, empty_id, &now())),
            Err(CascadeError::MalformedInput(_))
        ));

        let no_capacity = models::RegisterAgent {
            agent_id: "a".into(),
            organization: "o".into(),
            department: "products".into(),
            current_tasks: 0,
            max_tasks: 0,
            status: "active".into(),
        };
        assert!(block_on(register_agent(&registry, no_capacity, &now())).is_err());
        assert!(registry.agents.borrow().is_empty());
    }
}
