//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `POST /signal` - 시그널 수신 및 구독자 브로드캐스트
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)

pub mod health;
pub mod signal;

pub use health::{health_router, HealthResponse};
pub use signal::{signal_router, SignalResponse, SECRET_HEADER};

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .merge(signal_router())
}
