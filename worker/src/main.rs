use anyhow::Result;
use crates::domain::repositories::{
    competitors::CompetitorRepository, crawl_queue::CrawlQueueRepository,
    email_logs::EmailLogRepository, notifications::EmailSender,
    subscriptions::SubscriptionRepository,
};
use crates::infra::{
    db::{
        postgres::postgres_connection,
        repositories::{
            competitors::CompetitorPostgres, crawl_queue::CrawlQueuePostgres,
            email_logs::EmailLogPostgres, subscriptions::SubscriptionPostgres,
        },
    },
    email::{http_email_sender::HttpEmailSender, templates::BuiltinTemplateRenderer},
};
use std::sync::Arc;
use tracing::{error, info};
use worker::{
    axum_http::{self, http_serve::WorkerUseCases},
    config,
    usecases::{
        due_set_selector::DueSetSelector, lifecycle_transitions::LifecycleTransitionUseCase,
        scheduling_pass::SchedulingPassUseCase,
        subscription_activation::SubscriptionActivationUseCase,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(error) = run().await {
        error!("Worker exited with error: {:?}", error);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("worker")?;

    let dotenvy_env = Arc::new(config::config_loader::load()?);
    info!(
        grace_period_days = dotenvy_env.policy.grace_period_days,
        batch_limit = dotenvy_env.scheduler.batch_limit,
        "ENV has been loaded"
    );

    let postgres_pool = postgres_connection::establish_connection(
        &dotenvy_env.database.url,
        dotenvy_env.database.max_connections,
    )?;
    info!("Postgres connection has been established");

    let db_pool_arc = Arc::new(postgres_pool);

    let subscription_repository: Arc<dyn SubscriptionRepository + Send + Sync> =
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool_arc)));
    let competitor_repository: Arc<dyn CompetitorRepository + Send + Sync> =
        Arc::new(CompetitorPostgres::new(Arc::clone(&db_pool_arc)));
    let crawl_queue_repository: Arc<dyn CrawlQueueRepository + Send + Sync> =
        Arc::new(CrawlQueuePostgres::new(Arc::clone(&db_pool_arc)));
    let email_log_repository: Arc<dyn EmailLogRepository + Send + Sync> =
        Arc::new(EmailLogPostgres::new(Arc::clone(&db_pool_arc)));

    let email = &dotenvy_env.email;
    let email_sender: Arc<dyn EmailSender + Send + Sync> = Arc::new(HttpEmailSender::new(
        email.api_url.clone(),
        email.api_key.clone(),
        email.from.clone(),
    )?);

    let selector = DueSetSelector::new(
        competitor_repository,
        Arc::clone(&subscription_repository),
        dotenvy_env.policy.clone(),
    );

    let usecases = WorkerUseCases {
        scheduling: Arc::new(SchedulingPassUseCase::new(
            selector,
            crawl_queue_repository,
            dotenvy_env.scheduler.clone(),
        )),
        lifecycle: Arc::new(LifecycleTransitionUseCase::new(
            Arc::clone(&subscription_repository),
            email_log_repository,
            email_sender,
            Arc::new(BuiltinTemplateRenderer::new()),
            dotenvy_env.policy.clone(),
            dotenvy_env.scheduler.clone(),
            dotenvy_env.app.base_url.clone(),
        )),
        activation: Arc::new(SubscriptionActivationUseCase::new(subscription_repository)),
    };

    axum_http::http_serve::start(dotenvy_env, usecases).await
}
