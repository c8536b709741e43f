use crate::{
    auth::JwtVerifier,
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
    usecases::{
        competitors::CompetitorUseCase, manual_crawl::ManualCrawlUseCase,
        subscriptions::SubscriptionUseCase,
    },
};
use anyhow::Result;
use axum::{
    Extension, Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use crates::{
    domain::repositories::{
        competitors::CompetitorRepository, crawl_queue::CrawlQueueRepository,
        subscriptions::SubscriptionRepository,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            competitors::CompetitorPostgres, crawl_queue::CrawlQueuePostgres,
            subscriptions::SubscriptionPostgres,
        },
    },
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

pub fn app<S, C, Q>(
    config: &DotEnvyConfig,
    subscription_repo: Arc<S>,
    competitor_repo: Arc<C>,
    crawl_queue_repo: Arc<Q>,
) -> Result<Router>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    C: CompetitorRepository + Send + Sync + 'static,
    Q: CrawlQueueRepository + Send + Sync + 'static,
{
    let manual_crawl_usecase = ManualCrawlUseCase::new(
        Arc::clone(&subscription_repo),
        Arc::clone(&competitor_repo),
        crawl_queue_repo,
        config.policy.clone(),
        config.scheduler.crawl_max_attempts,
    );
    let subscriptions_usecase =
        SubscriptionUseCase::new(Arc::clone(&subscription_repo), config.policy.clone());
    let competitors_usecase =
        CompetitorUseCase::new(subscription_repo, competitor_repo, config.policy.clone());

    let jwt_verifier = Arc::new(JwtVerifier::new(&config.auth.jwt_secret));

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/crawls",
            routers::crawls::routes(Arc::new(manual_crawl_usecase)),
        )
        .nest(
            "/api/v1/subscriptions",
            routers::subscriptions::routes(Arc::new(subscriptions_usecase)),
        )
        .nest(
            "/api/v1/competitors",
            routers::competitors::routes(Arc::new(competitors_usecase)),
        )
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(Extension(jwt_verifier))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let app = app(
        &config,
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool))),
        Arc::new(CompetitorPostgres::new(Arc::clone(&db_pool))),
        Arc::new(CrawlQueuePostgres::new(Arc::clone(&db_pool))),
    )?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = ?err, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = ?err, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
