//! HTTP 요청 metrics middleware.
//!
//! 라벨에는 요청 경로 대신 매칭된 라우트 템플릿을 쓰고,
//! 어떤 라우트에도 매칭되지 않은 요청은 `unmatched` 하나로 묶습니다.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::metrics::{record_http_duration, record_http_request, record_http_response};

/// 매칭되지 않은 요청의 라우트 라벨.
const UNMATCHED_ROUTE: &str = "unmatched";

/// HTTP 메트릭을 수집하는 미들웨어 레이어.
///
/// `Router::layer`로 붙여야 라우팅 이후에 실행되어 `MatchedPath`를 볼 수 있습니다.
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());

    record_http_request(&method, &route);

    let response = next.run(request).await;

    let status = response.status().as_u16();
    record_http_response(&method, &route, status_class(status));
    record_http_duration(&method, &route, start.elapsed().as_secs_f64());

    response
}

/// 상태 코드를 `2xx`/`4xx` 같은 클래스로 묶습니다.
fn status_class(status: u16) -> &'static str {
    match status {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}
