use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header::AUTHORIZATION, header::CONTENT_TYPE},
};
use chrono::{DateTime, Duration, Utc};
use crates::{
    domain::{
        entities::subscriptions::SubscriptionEntity,
        repositories::{
            competitors::CompetitorRepository, crawl_queue::CrawlQueueRepository,
            email_logs::EmailLogRepository, subscriptions::SubscriptionRepository,
        },
        value_objects::lifecycle_policy::{LifecyclePolicy, SchedulerSettings},
    },
    infra::email::templates::BuiltinTemplateRenderer,
    testing::{InMemoryStore, RecordingEmailSender},
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;
use worker::{
    axum_http::http_serve::{self, WorkerUseCases},
    config::config_model::{App, Cron, Database, DotEnvyConfig, Email, WorkerServer},
    usecases::{
        due_set_selector::DueSetSelector, lifecycle_transitions::LifecycleTransitionUseCase,
        scheduling_pass::SchedulingPassUseCase,
        subscription_activation::SubscriptionActivationUseCase,
    },
};

const TOKEN: &str = "cron-secret";

fn config(internal_token: Option<&str>) -> Arc<DotEnvyConfig> {
    Arc::new(DotEnvyConfig {
        worker_server: WorkerServer {
            port: 0,
            timeout: 30,
            body_limit: 1,
        },
        database: Database {
            url: "postgres://unused".to_string(),
            max_connections: 1,
        },
        cron: Cron {
            internal_token: internal_token.map(str::to_string),
        },
        email: Email {
            api_url: "https://email.invalid/send".parse().unwrap(),
            api_key: "unused".to_string(),
            from: "alerts@example.com".to_string(),
        },
        app: App {
            base_url: "https://app.example.com".to_string(),
        },
        policy: LifecyclePolicy::default(),
        scheduler: SchedulerSettings::default(),
    })
}

fn app(
    store: &Arc<InMemoryStore>,
    sender: &Arc<RecordingEmailSender>,
    internal_token: Option<&str>,
) -> Router {
    let config = config(internal_token);

    let subscriptions: Arc<dyn SubscriptionRepository + Send + Sync> = store.clone();
    let competitors: Arc<dyn CompetitorRepository + Send + Sync> = store.clone();
    let crawl_queue: Arc<dyn CrawlQueueRepository + Send + Sync> = store.clone();
    let email_logs: Arc<dyn EmailLogRepository + Send + Sync> = store.clone();

    let usecases = WorkerUseCases {
        scheduling: Arc::new(SchedulingPassUseCase::new(
            DueSetSelector::new(
                competitors,
                Arc::clone(&subscriptions),
                config.policy.clone(),
            ),
            crawl_queue,
            config.scheduler.clone(),
        )),
        lifecycle: Arc::new(LifecycleTransitionUseCase::new(
            Arc::clone(&subscriptions),
            email_logs,
            sender.clone(),
            Arc::new(BuiltinTemplateRenderer::new()),
            config.policy.clone(),
            config.scheduler.clone(),
            config.app.base_url.clone(),
        )),
        activation: Arc::new(SubscriptionActivationUseCase::new(subscriptions)),
    };

    http_serve::app(config, usecases).unwrap()
}

fn subscription(
    user_id: Uuid,
    status: &str,
    plan: &str,
    period_end: DateTime<Utc>,
) -> SubscriptionEntity {
    SubscriptionEntity {
        id: Uuid::new_v4(),
        user_id,
        status: status.to_string(),
        plan_identifier: plan.to_string(),
        current_period_start: period_end - Duration::days(14),
        current_period_end: period_end,
        competitor_limit: 3,
        created_at: period_end - Duration::days(14),
        updated_at: period_end - Duration::days(14),
    }
}

async fn post(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn cron_endpoints_require_the_shared_secret() {
    let store = Arc::new(InMemoryStore::new());
    let sender = Arc::new(RecordingEmailSender::new());

    let configured = app(&store, &sender, Some(TOKEN));
    let (status, _) = post(&configured, "/internal/v1/cron/schedule-crawls", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post(
        &configured,
        "/internal/v1/cron/expire-subscriptions",
        Some("wrong"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let unconfigured = app(&store, &sender, None);
    let (status, _) = post(
        &unconfigured,
        "/internal/v1/cron/schedule-crawls",
        Some(TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn scheduling_twice_enqueues_each_competitor_once() {
    let store = Arc::new(InMemoryStore::new());
    let sender = Arc::new(RecordingEmailSender::new());
    let now = Utc::now();

    let owner = store.add_user("owner@example.com", Some("Owner"));
    store.put_subscription(subscription(owner, "active", "pro", now + Duration::days(20)));
    let business = store.add_business(owner, now);
    let never = store.add_competitor(business.id, "https://a.example.com", None, now);
    let stale = store.add_competitor(
        business.id,
        "https://b.example.com",
        Some(now - Duration::days(2)),
        now,
    );
    store.add_competitor(
        business.id,
        "https://fresh.example.com",
        Some(now - Duration::minutes(5)),
        now,
    );

    let lapsed = store.add_user("lapsed@example.com", None);
    store.put_subscription(subscription(lapsed, "expired", "trial", now - Duration::days(30)));
    let lapsed_business = store.add_business(lapsed, now);
    store.add_competitor(lapsed_business.id, "https://c.example.com", None, now);

    let app = app(&store, &sender, Some(TOKEN));

    let (status, first) = post(&app, "/internal/v1/cron/schedule-crawls", Some(TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["status"], "success");
    assert_eq!(first["stats"]["candidates"], 2);
    assert_eq!(first["stats"]["enqueued"], 2);
    assert_eq!(first["stats"]["errors"], 0);
    assert!(first["elapsedMs"].is_u64());

    let queue = store.queue();
    assert_eq!(queue.len(), 2);
    let first_crawl = queue.iter().find(|q| q.competitor_id == never.id).unwrap();
    let recrawl = queue.iter().find(|q| q.competitor_id == stale.id).unwrap();
    assert_eq!(first_crawl.priority, 100);
    assert_eq!(recrawl.priority, 0);

    let (_, second) = post(&app, "/internal/v1/cron/schedule-crawls", Some(TOKEN), None).await;
    assert_eq!(second["stats"]["candidates"], 0);
    assert_eq!(second["stats"]["enqueued"], 0);
    assert_eq!(store.queue().len(), 2);
}

#[tokio::test]
async fn expiration_pass_is_idempotent() {
    let store = Arc::new(InMemoryStore::new());
    let sender = Arc::new(RecordingEmailSender::new());
    let now = Utc::now();

    let trial_user = store.add_user("trial@example.com", Some("Tess"));
    let trial = subscription(trial_user, "trialing", "trial", now - Duration::hours(1));
    store.put_subscription(trial.clone());

    let grace_user = store.add_user("grace@example.com", None);
    let grace = subscription(grace_user, "grace_period", "trial", now - Duration::days(4));
    store.put_subscription(grace.clone());

    let still_in_grace_user = store.add_user("window@example.com", None);
    let in_window = subscription(
        still_in_grace_user,
        "grace_period",
        "trial",
        now - Duration::days(1),
    );
    store.put_subscription(in_window.clone());

    let app = app(&store, &sender, Some(TOKEN));

    let (status, first) = post(
        &app,
        "/internal/v1/cron/expire-subscriptions",
        Some(TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["status"], "success");
    assert_eq!(first["stats"]["trialToGrace"]["transitioned"], 1);
    assert_eq!(first["stats"]["trialToGrace"]["notificationsSent"], 1);
    assert_eq!(first["stats"]["graceToExpired"]["transitioned"], 1);
    assert_eq!(first["stats"]["graceToExpired"]["notificationsSent"], 1);

    assert_eq!(store.subscription(trial.id).unwrap().status, "grace_period");
    assert_eq!(store.subscription(grace.id).unwrap().status, "expired");
    assert_eq!(store.subscription(in_window.id).unwrap().status, "grace_period");

    let sent = sender.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().any(|m| m.to == "trial@example.com" && m.html.contains("Tess")));

    let (_, second) = post(
        &app,
        "/internal/v1/cron/expire-subscriptions",
        Some(TOKEN),
        None,
    )
    .await;
    assert_eq!(second["stats"]["trialToGrace"]["candidates"], 0);
    assert_eq!(second["stats"]["graceToExpired"]["candidates"], 0);
    assert_eq!(sender.sent().len(), 2);
}

#[tokio::test]
async fn failed_notification_keeps_transition_and_is_logged() {
    let store = Arc::new(InMemoryStore::new());
    let sender = Arc::new(RecordingEmailSender::new());
    sender.fail_for("bounce@example.com");
    let now = Utc::now();

    let user = store.add_user("bounce@example.com", None);
    let trial = subscription(user, "trialing", "trial", now - Duration::minutes(10));
    store.put_subscription(trial.clone());

    let app = app(&store, &sender, Some(TOKEN));
    let (status, body) = post(
        &app,
        "/internal/v1/cron/expire-subscriptions",
        Some(TOKEN),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["trialToGrace"]["transitioned"], 1);
    assert_eq!(body["stats"]["trialToGrace"]["errors"], 1);
    assert_eq!(store.subscription(trial.id).unwrap().status, "grace_period");

    let logs = store.email_logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, "failed");
    assert_eq!(logs[0].email_type, "trial_ended");
}

#[tokio::test]
async fn activation_makes_the_current_subscription_active() {
    let store = Arc::new(InMemoryStore::new());
    let sender = Arc::new(RecordingEmailSender::new());
    let now = Utc::now();

    let user = store.add_user("upgrade@example.com", None);
    let grace = subscription(user, "grace_period", "trial", now - Duration::days(2));
    store.put_subscription(grace.clone());

    let app = app(&store, &sender, Some(TOKEN));
    let (status, body) = post(
        &app,
        "/internal/v1/subscriptions/activate",
        Some(TOKEN),
        Some(serde_json::json!({
            "userId": user,
            "planIdentifier": "pro_monthly",
            "competitorLimit": -1,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["subscription"]["status"], "active");
    let stored = store.subscription(grace.id).unwrap();
    assert_eq!(stored.status, "active");
    assert_eq!(stored.competitor_limit, -1);
    assert!(stored.current_period_end > now);
}

#[tokio::test]
async fn health_check_is_public() {
    let store = Arc::new(InMemoryStore::new());
    let sender = Arc::new(RecordingEmailSender::new());
    let app = app(&store, &sender, Some(TOKEN));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health-check")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
