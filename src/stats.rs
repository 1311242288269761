//! Counts over the recent-task window, served at `/stats`.

use crate::error::CascadeError;
use crate::models::{FailureRecord, Task, TaskStats, Urgency};
use crate::storage::{FailureLog, TaskLog, RECENT_INDEX_CAP};
use std::collections::BTreeMap;

pub const DEFAULT_WINDOW_HOURS: u32 = 24;
pub const MAX_WINDOW_HOURS: u32 = 24 * 30;

/// Aggregate everything created at or after `since` (ISO-8601, same format
/// as `createdAt`, so string order is time order).
///
/// `tasks` is expected newest first; `index_full` says whether older tasks
/// may have fallen off the recent index.
pub fn summarize(
    tasks: &[Task],
    failures: &[FailureRecord],
    since: &str,
    window_hours: u32,
    index_full: bool,
) -> TaskStats {
    let mut by_status = BTreeMap::new();
    let mut by_department = BTreeMap::new();
    let mut by_organization = BTreeMap::new();
    let mut total = 0u64;
    let mut urgent = 0u64;

    for task in tasks.iter().filter(|t| t.created_at.as_str() >= since) {
        total += 1;
        if task.intent.urgency == Urgency::Urgent {
            urgent += 1;
        }
        *by_status.entry(task.status.as_str().to_string()).or_insert(0) += 1;
        *by_department
            .entry(task.department.as_str().to_string())
            .or_insert(0) += 1;
        *by_organization.entry(task.organization.clone()).or_insert(0) += 1;
    }

    let oldest_in_window = tasks
        .last()
        .map(|t| t.created_at.as_str() >= since)
        .unwrap_or(false);

    TaskStats {
        window_hours,
        since: since.to_string(),
        total,
        urgent,
        failures: failures.iter().filter(|f| f.at.as_str() >= since).count() as u64,
        by_status,
        by_department,
        by_organization,
        truncated: index_full && oldest_in_window,
    }
}

pub async fn collect_stats<L>(
    log: &L,
    since: &str,
    window_hours: u32,
) -> Result<TaskStats, CascadeError>
where
    L: TaskLog + FailureLog,
{
    let tasks = log
        .recent(RECENT_INDEX_CAP)
        .await
        .map_err(CascadeError::Storage)?;
    let failures = log.failures().await.map_err(CascadeError::Storage)?;
    let index_full = tasks.len() >= RECENT_INDEX_CAP;
    Ok(summarize(&tasks, &failures, since, window_hours, index_full))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::clock::Timestamp;
    use crate::models::CascadeRequest;
    use crate::recorder::NoopNotifier;
    use crate::storage::memory::{MemoryRegistry, MemoryTaskLog};
    use futures::executor::block_on;

    fn cascade_at(registry: &MemoryRegistry, log: &MemoryTaskLog, mention: &str, iso: &str) {
        let request = CascadeRequest {
            mention: mention.into(),
            org: None,
            repo: None,
            source_type: None,
        };
        let now = Timestamp {
            millis: 1_767_225_600_000,
            iso: iso.into(),
        };
        block_on(crate::cascade::run_cascade(
            &Catalog::builtin(),
            registry,
            log,
            &NoopNotifier,
            request,
            &now,
        ))
        .unwrap();
    }

    fn failure(at: &str) -> FailureRecord {
        FailureRecord {
            at: at.into(),
            status: 503,
            error: "storage unavailable: kv down".into(),
            retryable: true,
        }
    }

    #[test]
    fn counts_by_status_department_and_organization() {
        let registry = MemoryRegistry::default();
        let log = MemoryTaskLog::default();
        cascade_at(&registry, &log, "Deploy RoadCommand to production", "2026-01-02T00:00:00.000Z");
        cascade_at(&registry, &log, "urgent fix needed on octavia", "2026-01-02T01:00:00.000Z");
        cascade_at(&registry, &log, "run the test suite", "2026-01-02T02:00:00.000Z");
        block_on(log.record_failure(&failure("2026-01-02T03:00:00.000Z"))).unwrap();

        let stats = block_on(collect_stats(&log, "2026-01-01T00:00:00.000Z", 48)).unwrap();

        assert_eq!(stats.total, 3);
        assert_eq!(stats.urgent, 1);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.by_status.get("queued"), Some(&3));
        assert_eq!(stats.by_status.get("assigned"), None);
        assert_eq!(stats.by_department.get("products"), Some(&2));
        assert_eq!(stats.by_department.get("testing"), Some(&1));
        assert_eq!(stats.by_organization.get("BlackRoad-OS"), Some(&1));
        assert_eq!(stats.by_organization.get("BlackRoad-Cloud"), Some(&1));
        // "suite" contains "ui"
        assert_eq!(stats.by_organization.get("BlackRoad-Studio"), Some(&1));
        assert!(!stats.truncated);
    }

    #[test]
    fn window_excludes_older_tasks_and_failures() {
        let registry = MemoryRegistry::default();
        let log = MemoryTaskLog::default();
        cascade_at(&registry, &log, "fix the bug", "2026-01-01T00:00:00.000Z");
        cascade_at(&registry, &log, "fix the bug", "2026-01-03T00:00:00.000Z");
        block_on(log.record_failure(&failure("2026-01-01T00:00:00.000Z"))).unwrap();

        let stats = block_on(collect_stats(&log, "2026-01-02T00:00:00.000Z", 24)).unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.failures, 0);
        assert_eq!(stats.window_hours, 24);
    }

    #[test]
    fn assigned_tasks_are_counted_separately() {
        let registry = MemoryRegistry::with_agents(vec![crate::models::Agent {
            agent_id: "p1".into(),
            organization: "BlackRoad-OS".into(),
            department: "products".into(),
            status: "active".into(),
            current_tasks: 0,
            max_tasks: 10,
            registered_at: "2026-01-01T00:00:00Z".into(),
        }]);
        let log = MemoryTaskLog::default();
        cascade_at(&registry, &log, "fix the bug", "2026-01-02T00:00:00.000Z");
        cascade_at(&registry, &log, "update the readme", "2026-01-02T00:00:01.000Z");

        let stats = block_on(collect_stats(&log, "2026-01-01T00:00:00.000Z", 24)).unwrap();
        assert_eq!(stats.by_status.get("assigned"), Some(&1));
        assert_eq!(stats.by_status.get("queued"), Some(&1));
    }

    #[test]
    fn full_index_reaching_into_window_is_truncated() {
        let registry = MemoryRegistry::default();
        let log = MemoryTaskLog::default();
        cascade_at(&registry, &log, "fix the bug", "2026-01-01T00:00:00.000Z");
        cascade_at(&registry, &log, "fix the bug", "2026-01-03T00:00:00.000Z");
        let tasks = block_on(log.recent(10)).unwrap();

        let wide = summarize(&tasks, &[], "2025-12-31T00:00:00.000Z", 72, true);
        assert!(wide.truncated);

        let narrow = summarize(&tasks, &[], "2026-01-02T00:00:00.000Z", 24, true);
        assert!(!narrow.truncated);
        assert_eq!(narrow.total, 1);

        let not_full = summarize(&tasks, &[], "2025-12-31T00:00:00.000Z", 72, false);
        assert!(!not_full.truncated);
    }

    #[test]
    fn storage_failure_surfaces() {
        let log = MemoryTaskLog::default();
        log.fail.set(true);
        let err = block_on(collect_stats(&log, "2026-01-01T00:00:00.000Z", 24)).unwrap_err();
        assert!(matches!(err, CascadeError::Storage(_)));
    }
}
