//! Bookshelf API 서버 진입점.
//!
//! 설정을 읽고, 로깅/메트릭을 초기화한 뒤 저장소를 선택해 HTTP 서버를 시작합니다.
//! 서명 비밀키(`APP_SECRET`)가 없으면 요청을 받기 전에 종료합니다.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use shelf_api::auth::AuthConfig;
use shelf_api::metrics::setup_metrics_recorder;
use shelf_api::middleware::{metrics_layer, MetricsLabels};
use shelf_api::openapi::swagger_ui_router;
use shelf_api::repository::run_migrations;
use shelf_api::routes::create_api_router;
use shelf_api::state::AppState;
use shelf_api::storage::LocalCoverStorage;
use shelf_core::{init_logging, AppConfig, LogConfig, ServerConfig};

/// 저장소를 선택해 AppState를 생성합니다.
///
/// `database.url`이 있으면 PostgreSQL(마이그레이션 포함), 없으면 인메모리 저장소.
async fn create_app_state(config: &AppConfig, auth: &AuthConfig) -> anyhow::Result<AppState> {
    let covers = Arc::new(LocalCoverStorage::new(&config.storage.upload_dir));

    let state = match &config.database.url {
        Some(url) => {
            info!("Connecting to PostgreSQL...");
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
                .connect(url)
                .await
                .context("Failed to connect to database")?;

            run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            info!("Database migrations applied");

            AppState::postgres(pool, auth, covers)?
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store (data is lost on restart)");
            AppState::in_memory(auth, covers)?
        }
    };

    Ok(state)
}

/// CORS 레이어 생성.
///
/// `server.cors_origins`(또는 `CORS_ORIGINS`)가 비어 있으면 모든 origin을 허용합니다.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = server
        .cors_origin_list()
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    let restricted = !origins.is_empty();
    let allow_origin = if restricted {
        info!("CORS configured with {} allowed origins", origins.len());
        AllowOrigin::list(origins)
    } else {
        warn!("CORS origins not set, allowing any origin (development mode)");
        AllowOrigin::any()
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(restricted)
        .max_age(Duration::from_secs(3600))
}

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> String {
    handle.render()
}

/// 전체 라우터 생성.
fn create_router(state: Arc<AppState>, metrics_handle: PrometheusHandle, config: &AppConfig) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    let api_router = create_api_router()
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.storage.max_upload_bytes));

    Router::new()
        .merge(metrics_router)
        .merge(api_router)
        // 업로드된 표지 (읽기 전용)
        .nest_service(
            &config.storage.public_path,
            ServeDir::new(&config.storage.upload_dir),
        )
        .merge(swagger_ui_router())
        .layer(middleware::from_fn_with_state(
            MetricsLabels::new(&config.storage.public_path),
            metrics_layer,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.request_timeout_secs),
        ))
        .layer(cors_layer(&config.server))
}

/// OpenAPI 스펙 내보내기 처리.
///
/// `--export-openapi` 플래그 또는 `EXPORT_OPENAPI` 환경변수가 설정된 경우
/// OpenAPI JSON 스펙을 stdout으로 출력하고 `true`를 반환합니다.
fn handle_export_openapi() -> anyhow::Result<bool> {
    use shelf_api::openapi::ApiDoc;
    use utoipa::OpenApi as _;

    let export_flag = std::env::args().any(|arg| arg == "--export-openapi");
    let export_env = std::env::var("EXPORT_OPENAPI")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    if export_flag || export_env {
        let json = serde_json::to_string_pretty(&ApiDoc::openapi())?;
        println!("{}", json);
        return Ok(true);
    }

    Ok(false)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    if handle_export_openapi()? {
        return Ok(());
    }

    let config = AppConfig::load_default().context("Failed to load configuration")?;

    init_logging(LogConfig::from_settings(&config.logging).with_env_overrides())
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Starting Bookshelf API server...");

    // 서명 비밀키가 없으면 요청을 받기 전에 종료
    let auth = match AuthConfig::from_settings(&config.auth) {
        Ok(auth) => auth,
        Err(e) => {
            error!(error = %e, "Invalid auth configuration, refusing to start");
            return Err(e.into());
        }
    };

    let metrics_handle = setup_metrics_recorder().context("Failed to install metrics recorder")?;
    info!("Prometheus metrics recorder initialized");

    let state = create_app_state(&config, &auth).await?;
    info!(store = state.store_kind, "Application state created");

    let app = create_router(Arc::new(state), metrics_handle, &config);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(%addr, "API server listening");
    info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 반환합니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
