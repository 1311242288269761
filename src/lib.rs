use worker::*;

pub mod cascade;
pub mod catalog;
pub mod classifier;
pub mod clock;
pub mod error;
pub mod models;
pub mod recorder;
pub mod routing;
pub mod selector;
pub mod stats;
pub mod storage;

use catalog::Catalog;
use clock::Timestamp;
use error::CascadeError;
use recorder::NoopNotifier;
use storage::{AgentRegistry, FailureLog, KvAgentRegistry, KvTaskLog, TaskLog};

const DEFAULT_TASK_LIMIT: usize = 20;
const MAX_TASK_LIMIT: usize = 100;

const ENDPOINTS: &[&str] = &[
    "GET /health",
    "POST /cascade",
    "POST /agents",
    "GET /agents",
    "GET /tasks?limit=N",
    "GET /tasks/:id",
    "GET /stats?hours=N",
];

#[event(fetch)]
pub async fn fetch(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    console_error_panic_hook::set_once();

    let router = Router::new();

    router
        // index + health
        .get("/", |_, _| {
            Response::from_json(&models::ServiceIndex {
                service: "mention-cascade".into(),
                endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
            })
        })
        .get("/health", |_, _| {
            Response::from_json(&models::HealthResponse {
                service: "mention-cascade".into(),
                status: "ok".into(),
            })
        })
        // the cascade
        .post_async("/cascade", |req, ctx| async move {
            match handle_cascade(req, &ctx.env).await {
                Ok(task) => {
                    console_log!(
                        "cascade task={} org={} dept={} assigned={} urgency={:?}",
                        task.task_id,
                        task.organization,
                        task.department.as_str(),
                        task.assigned_agent.as_deref().unwrap_or("queued"),
                        task.intent.urgency
                    );
                    Response::from_json(&models::CascadeResult::from_task(&task))
                }
                Err(err) => {
                    record_failure(&ctx.env, &err).await;
                    error_response(&err)
                }
            }
        })
        // agent registry
        .post_async("/agents", |req, ctx| async move {
            match handle_register(req, &ctx.env).await {
                Ok(agent) => {
                    console_log!(
                        "agent registered id={} org={} dept={} max_tasks={}",
                        agent.agent_id,
                        agent.organization,
                        agent.department,
                        agent.max_tasks
                    );
                    Response::from_json(&models::AgentRegistered {
                        agent_id: agent.agent_id,
                        registered: true,
                        registered_at: agent.registered_at,
                    })
                }
                Err(err) => error_response(&err),
            }
        })
        .get_async("/agents", |_req, ctx| async move {
            let result = async {
                let registry = KvAgentRegistry::new(open_kv(&ctx.env)?);
                registry.snapshot().await.map_err(CascadeError::Storage)
            };
            match result.await {
                Ok(agents) => Response::from_json(&models::AgentList { agents }),
                Err(err) => error_response(&err),
            }
        })
        // task log
        .get_async("/tasks", |req, ctx| async move {
            let url = req.url()?;
            let raw = url
                .query_pairs()
                .find(|(k, _)| k == "limit")
                .map(|(_, v)| v.into_owned());
            let limit = parse_bounded(raw.as_deref(), DEFAULT_TASK_LIMIT, MAX_TASK_LIMIT);
            let result = async {
                let log = KvTaskLog::new(open_kv(&ctx.env)?);
                log.recent(limit).await.map_err(CascadeError::Storage)
            };
            match result.await {
                Ok(tasks) => Response::from_json(&models::TaskList { tasks }),
                Err(err) => error_response(&err),
            }
        })
        .get_async("/tasks/:id", |_req, ctx| async move {
            let Some(id) = ctx.param("id").map(ToString::to_string) else {
                return Response::error("missing task id", 400);
            };
            let result = async {
                let log = KvTaskLog::new(open_kv(&ctx.env)?);
                log.get(&id)
                    .await
                    .map_err(CascadeError::Storage)?
                    .ok_or_else(|| CascadeError::NotFound(format!("task {id}")))
            };
            match result.await {
                Ok(task) => Response::from_json(&task),
                Err(err) => error_response(&err),
            }
        })
        .get_async("/stats", |req, ctx| async move {
            let url = req.url()?;
            let raw = url
                .query_pairs()
                .find(|(k, _)| k == "hours")
                .map(|(_, v)| v.into_owned());
            let hours = parse_bounded(
                raw.as_deref(),
                stats::DEFAULT_WINDOW_HOURS as usize,
                stats::MAX_WINDOW_HOURS as usize,
            ) as u32;
            let since = clock::iso_hours_before(&Timestamp::now(), hours);
            let result = async {
                let log = KvTaskLog::new(open_kv(&ctx.env)?);
                stats::collect_stats(&log, &since, hours).await
            };
            match result.await {
                Ok(summary) => Response::from_json(&summary),
                Err(err) => error_response(&err),
            }
        })
        .run(req, env)
        .await
}

async fn handle_cascade(
    mut req: Request,
    env: &Env,
) -> std::result::Result<models::Task, CascadeError> {
    let body = req
        .text()
        .await
        .map_err(|e| CascadeError::MalformedInput(e.to_string()))?;
    let request = cascade::parse_cascade_request(&body)?;
    let catalog = Catalog::load(env).map_err(CascadeError::Config)?;
    let registry = KvAgentRegistry::new(open_kv(env)?);
    let log = KvTaskLog::new(open_kv(env)?);

    cascade::run_cascade(
        catalog,
        &registry,
        &log,
        &NoopNotifier,
        request,
        &Timestamp::now(),
    )
    .await
}

async fn handle_register(
    mut req: Request,
    env: &Env,
) -> std::result::Result<models::Agent, CascadeError> {
    let body: models::RegisterAgent = req
        .json()
        .await
        .map_err(|e| CascadeError::MalformedInput(e.to_string()))?;
    let registry = KvAgentRegistry::new(open_kv(env)?);
    cascade::register_agent(&registry, body, &Timestamp::now()).await
}

fn open_kv(env: &Env) -> std::result::Result<kv::KvStore, CascadeError> {
    env.kv(storage::CASCADE_KV_BINDING).map_err(|e| {
        CascadeError::Config(format!(
            "missing {} binding: {e}",
            storage::CASCADE_KV_BINDING
        ))
    })
}

/// Best effort: a failed cascade is often a failed KV, so this may not land.
async fn record_failure(env: &Env, err: &CascadeError) {
    let failure = models::FailureRecord {
        at: Timestamp::now().iso,
        status: err.status_code(),
        error: err.to_string(),
        retryable: err.retryable(),
    };
    let written = match open_kv(env) {
        Ok(kv) => KvTaskLog::new(kv)
            .record_failure(&failure)
            .await
            .map_err(CascadeError::Storage),
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        console_error!("failure audit not recorded: {e}");
    }
}

fn error_response(err: &CascadeError) -> Result<Response> {
    let status = err.status_code();
    if status >= 500 {
        console_error!("cascade failed status={status}: {err}");
    }
    Ok(Response::from_json(&err.to_response())?.with_status(status))
}

fn parse_bounded(raw: Option<&str>, default: usize, max: usize) -> usize {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .map(|n| n.clamp(1, max))
        .unwrap_or(default)
}
