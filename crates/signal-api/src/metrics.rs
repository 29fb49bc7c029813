//! Prometheus 메트릭 설정 및 유틸리티.
//!
//! HTTP 요청 메트릭과 시그널 브로드캐스트 메트릭을 수집하고 `/metrics` 엔드포인트로 노출합니다.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use signal_notification::BroadcastReport;

/// Prometheus 메트릭 레코더를 설정하고 핸들을 반환합니다.
///
/// # Errors
///
/// 레코더가 이미 설치되어 있거나 버킷 설정이 잘못되면 에러를 반환합니다.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0],
        )?
        .install_recorder()
}

// ============================================================================
// HTTP 메트릭 헬퍼 함수
// ============================================================================

/// HTTP 요청 카운터 증가.
pub fn record_http_request(method: &str, path: &str) {
    counter!("http_requests_total", "method" => method.to_string(), "path" => path.to_string())
        .increment(1);
}

/// HTTP 응답 카운터 증가 (`status`는 "2xx" 같은 상태 클래스).
pub fn record_http_response(method: &str, path: &str, status: &'static str) {
    counter!(
        "http_responses_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status
    )
    .increment(1);
}

/// HTTP 요청 지속 시간 기록.
pub fn record_http_duration(method: &str, path: &str, duration_secs: f64) {
    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

// ============================================================================
// 시그널 메트릭 헬퍼 함수
// ============================================================================

/// 시그널 요청 결과 카운터 증가 ("accepted" | "forbidden" | "invalid").
pub fn record_signal_request(result: &'static str) {
    counter!("signal_requests_total", "result" => result).increment(1);
}

/// 브로드캐스트 결과 기록.
pub fn record_broadcast(report: &BroadcastReport) {
    counter!("signal_deliveries_total", "outcome" => "delivered")
        .increment(report.delivered() as u64);
    counter!("signal_deliveries_total", "outcome" => "failed").increment(report.failed() as u64);
}
