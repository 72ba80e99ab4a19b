use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use folio::cache::{self, ResponseCache};
use folio::config::AppConfig;
use folio::contact::{handler as contact_handler, ContactMailer};
use folio::github::{self, GithubClient};
use folio::rate::RateGuard;

#[derive(Parser)]
#[command(name = "folio", about = "Self-hosted portfolio API gateway")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(Some(&cli.config))?;

    if let Err(msg) = config.validate() {
        eprintln!("Configuration error: {msg}");
        return Err(msg.into());
    }

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        user = %config.github.username,
        "starting folio"
    );

    // Two-tier response cache (remote tier only when a redis url is configured)
    let response_cache = Arc::new(ResponseCache::new(config.cache.redis_url.as_deref()));

    // Periodic eviction of expired in-process entries
    let sweep_cache = response_cache.clone();
    let sweep_interval = config.cache.sweep_interval_secs;
    let sweep_handle = tokio::spawn(async move {
        cache::sweep_loop(sweep_cache, sweep_interval).await;
    });

    // Advisory guard for the upstream API quota
    let guard = Arc::new(RateGuard::new(
        config.rate_limit.upstream_max_per_hour,
        Duration::from_secs(config.rate_limit.upstream_window_secs),
    ));

    let github_client = Arc::new(GithubClient::new(
        config.github.clone(),
        response_cache.clone(),
        guard.clone(),
    ));

    let mailer = Arc::new(ContactMailer::new(&config.contact));
    if !mailer.is_configured() {
        tracing::warn!("contact delivery not configured, POST /v1/contact will answer 503");
    }

    // Inbound per-IP rate limiters (distinct from the upstream quota guard)
    let api_governor_conf = GovernorConfigBuilder::default()
        .key_extractor(SmartIpKeyExtractor)
        .per_second(config.rate_limit.per_second)
        .burst_size(config.rate_limit.burst_size)
        .finish()
        .expect("failed to build rate limiter config");

    let contact_governor_conf = GovernorConfigBuilder::default()
        .key_extractor(SmartIpKeyExtractor)
        .per_second(config.rate_limit.contact_per_second)
        .burst_size(config.rate_limit.contact_burst_size)
        .finish()
        .expect("failed to build contact rate limiter config");

    // CORS: the site origin when configured, any origin otherwise
    let allow_origin = match &config.server.cors_origin {
        Some(origin) => AllowOrigin::exact(
            origin
                .parse()
                .expect("cors_origin must be a valid header value"),
        ),
        None => AllowOrigin::any(),
    };
    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    // ── GitHub proxy routes (cached, quota-guarded) ──
    let github_routes = Router::new()
        .route("/v1/github/profile", get(github::handler::profile))
        .route("/v1/github/repos", get(github::handler::repos))
        .route(
            "/v1/github/contributions",
            get(github::handler::contributions),
        )
        .layer(GovernorLayer::new(api_governor_conf))
        .with_state(github_client);

    // ── Contact route (stricter inbound limit) ──
    let contact_routes = Router::new()
        .route("/v1/contact", post(contact_handler::submit))
        .layer(GovernorLayer::new(contact_governor_conf))
        .with_state(mailer);

    // ── Health route (public, no upstream calls) ──
    let health_state = Arc::new(HealthState {
        cache: response_cache,
        guard,
    });
    let health_route = Router::new()
        .route("/health", get(health_handler))
        .with_state(health_state);

    let app = Router::new()
        .merge(github_routes)
        .merge(contact_routes)
        .merge(health_route)
        .layer(cors);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweep_handle.abort();
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }

    tracing::info!("shutting down...");
}

// Health shared state
struct HealthState {
    cache: Arc<ResponseCache>,
    guard: Arc<RateGuard>,
}

async fn health_handler(State(state): State<Arc<HealthState>>) -> Json<serde_json::Value> {
    let quotas: serde_json::Map<String, serde_json::Value> = github::ENDPOINTS
        .iter()
        .map(|ep| ((*ep).to_string(), state.guard.remaining(ep).into()))
        .collect();

    Json(serde_json::json!({
        "status": "ok",
        "remote_cache": state.cache.has_remote(),
        "local_entries": state.cache.local_entries(),
        "upstream_remaining": quotas,
    }))
}
