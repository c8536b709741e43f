use crate::{
    axum_http::{default_routers, internal_auth, routers},
    config::config_model::DotEnvyConfig,
    usecases::{
        lifecycle_transitions::LifecycleTransitionUseCase,
        scheduling_pass::SchedulingPassUseCase,
        subscription_activation::SubscriptionActivationUseCase,
    },
};
use anyhow::Result;
use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    routing::get,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::{error, info};

pub struct WorkerUseCases {
    pub scheduling: Arc<SchedulingPassUseCase>,
    pub lifecycle: Arc<LifecycleTransitionUseCase>,
    pub activation: Arc<SubscriptionActivationUseCase>,
}

pub fn app(config: Arc<DotEnvyConfig>, usecases: WorkerUseCases) -> Result<Router> {
    let allowed_origins = vec![
        "http://localhost".parse()?,
        "http://127.0.0.1".parse()?,
        "http://localhost:3000".parse()?,
        "http://127.0.0.1:3000".parse()?,
    ];

    let internal = Router::new()
        .nest(
            "/cron",
            routers::cron::routes(usecases.scheduling, usecases.lifecycle),
        )
        .nest(
            "/subscriptions",
            routers::subscriptions::routes(usecases.activation),
        )
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&config),
            internal_auth::require_internal_token,
        ));

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest("/internal/v1", internal)
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.worker_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.worker_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(allowed_origins),
        )
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

pub async fn start(config: Arc<DotEnvyConfig>, usecases: WorkerUseCases) -> Result<()> {
    let app = app(Arc::clone(&config), usecases)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.worker_server.port));
    let listener = TcpListener::bind(addr).await?;
    info!("Worker HTTP server running on {}", addr);

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
