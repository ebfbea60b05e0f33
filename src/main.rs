use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use inkwell::{
    AppState,
    config::Config,
    database::Repositories,
    infrastructure::{CloudinaryHost, HttpMailer},
    middleware::{RateLimiter, log_errors, rate_limit},
    routes::create_router,
    services,
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 过期令牌清理周期
const TOKEN_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    // 设置数据库连接池
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'inkwell';").await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    // 外部服务客户端
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;
    let mailer = Arc::new(HttpMailer::new(http.clone(), &config));
    let media = Arc::new(CloudinaryHost::new(http, &config));

    let redis_client = redis::Client::open(config.redis_url.clone())?;

    let state = AppState::new(config, Repositories::postgres(pool), mailer, media);
    services::users::promote_admins(&state, &state.config.admin_emails).await?;
    spawn_token_purge(state.clone());

    // 设置限流器
    let rate_limiter = Arc::new(RateLimiter::new(redis_client, state.config.clone()));

    // 添加日志中间件和限流中间件
    let router = create_router(state.clone())
        .layer(axum::middleware::from_fn(log_errors))
        .layer(axum::middleware::from_fn_with_state(rate_limiter, rate_limit))
        .layer(TraceLayer::new_for_http());

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    // 启动服务器
    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr).await?,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// 启动时清理一次过期令牌，之后按固定周期清理
fn spawn_token_purge(state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TOKEN_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match state.tokens().purge_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::info!("Purged {} expired verification tokens", n),
                Err(e) => tracing::warn!("Token purge failed: {}", e),
            }
        }
    });
}
