//! 시그널 브리지 서버.
//!
//! `POST /signal` HTTP 서버와 텔레그램 명령어 리스너를 함께 실행합니다.

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use signal_api::metrics::setup_metrics_recorder;
use signal_api::middleware::metrics_layer;
use signal_api::routes::create_api_router;
use signal_api::services::spawn_bot_listener;
use signal_api::state::AppState;
use signal_core::{init_logging_from_env, BridgeConfig};

/// 봇 리스너 종료 대기 한도.
const LISTENER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Prometheus 메트릭 엔드포인트 핸들러.
async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> String {
    handle.render()
}

/// 전체 라우터 생성.
fn create_router(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    // 메트릭 라우터 (별도 상태)
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    Router::new()
        .merge(metrics_router)
        .merge(create_api_router().with_state(state))
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    init_logging_from_env().map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {e}"))?;

    info!("Starting signal bridge...");

    let config = BridgeConfig::from_env().map_err(|e| {
        error!(error = %e, "설정을 불러오지 못했습니다. 환경 변수를 확인하세요.");
        e
    })?;

    let addr = config.server.socket_addr().map_err(|e| {
        error!(
            host = %config.server.host,
            port = config.server.port,
            error = %e,
            "소켓 주소 설정이 유효하지 않습니다. HOST, PORT 환경변수를 확인하세요."
        );
        e
    })?;

    // Prometheus 메트릭 레코더 설정
    let metrics_handle = setup_metrics_recorder()?;
    info!("Prometheus metrics recorder initialized");

    info!(
        admins = config.admin_ids.len(),
        secret_required = config.secret_required(),
        concurrency = config.broadcast.concurrency,
        delivery_timeout_secs = config.broadcast.delivery_timeout.as_secs(),
        "Configuration loaded"
    );
    if !config.secret_required() {
        warn!("WEBHOOK_SECRET이 비어 있어 /signal 요청을 인증 없이 받습니다.");
    }

    let state = Arc::new(AppState::new(config));

    // 봇 리스너 시작
    let shutdown_token = CancellationToken::new();
    let bot_task = spawn_bot_listener(&state, shutdown_token.clone());

    let app = create_router(state, metrics_handle);

    info!(%addr, "Signal server listening");
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .await?;

    info!("Server shutdown initiated, stopping bot listener...");

    // 서버가 다른 이유로 끝났을 때도 리스너를 멈춤
    shutdown_token.cancel();

    match tokio::time::timeout(LISTENER_SHUTDOWN_TIMEOUT, bot_task).await {
        Ok(Ok(())) => info!("Bot listener stopped"),
        Ok(Err(e)) => error!(error = %e, "Bot listener task failed"),
        Err(_) => warn!("Bot listener shutdown timeout, forcing shutdown"),
    }

    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM을 받거나 `shutdown_token`이 취소되면 반환하고,
/// 반환 시 토큰을 취소해 봇 리스너에 종료를 전파합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
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
        _ = shutdown_token.cancelled() => {}
    }

    shutdown_token.cancel();
}
