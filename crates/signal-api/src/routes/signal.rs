//! 시그널 수신 endpoint.
//!
//! 외부 시스템이 `POST /signal`로 시그널을 보내면 공유 시크릿을 확인하고,
//! 본문을 검증한 뒤 현재 구독자 전원에게 메시지를 브로드캐스트합니다.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use signal_core::Signal;

use crate::error::{bad_request, forbidden, ApiResult};
use crate::metrics::{record_broadcast, record_signal_request};
use crate::state::AppState;

/// 공유 시크릿 헤더 이름.
pub const SECRET_HEADER: &str = "x-secret";

/// 시그널 처리 성공 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignalResponse {
    /// 항상 "ok"
    pub status: String,
    /// 전송을 시도한 구독자 수
    pub sent_to: usize,
}

/// 시그널 수신 및 브로드캐스트.
///
/// POST /signal
///
/// 개별 전송 실패는 응답에 영향을 주지 않으며 `sent_to`는 시도한 수입니다.
pub async fn receive_signal(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<SignalResponse>> {
    let provided = headers.get(SECRET_HEADER).map(|v| v.as_bytes());
    if !state.config.authorize(provided) {
        warn!(header_present = provided.is_some(), "Signal rejected: invalid secret");
        record_signal_request("forbidden");
        return Err(forbidden("INVALID_SECRET", "Invalid secret"));
    }

    let signal = Signal::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Signal rejected: invalid body");
        record_signal_request("invalid");
        bad_request(&e)
    })?;

    let text = signal.render_message();
    let recipients = state.registry.snapshot().await;

    info!(
        pair = %signal.pair,
        direction = %signal.direction,
        recipients = recipients.len(),
        "Broadcasting signal"
    );

    let report = state.broadcaster.broadcast(recipients, &text).await;
    record_signal_request("accepted");
    record_broadcast(&report);

    Ok(Json(SignalResponse {
        status: "ok".to_string(),
        sent_to: report.attempted(),
    }))
}

/// 시그널 라우터 생성.
pub fn signal_router() -> Router<Arc<AppState>> {
    Router::new().route("/signal", post(receive_signal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiErrorResponse;
    use crate::state::create_test_state;
    use crate::test_support::RecordingSender;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        response::Response,
    };
    use signal_core::ChatId;
    use tower::ServiceExt;

    const VALID_BODY: &str =
        r#"{"pair":"EURUSD","direction":"CALL","expiry_minutes":5,"note":"strong"}"#;

    fn app(state: Arc<AppState>) -> Router {
        signal_router().with_state(state)
    }

    fn signal_request(secret: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/signal")
            .header("content-type", "application/json");
        if let Some(secret) = secret {
            builder = builder.header("X-Secret", secret);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_valid_signal_broadcasts_to_subscribers() {
        let sender = Arc::new(RecordingSender::default());
        let state = Arc::new(create_test_state(Some("abc"), sender.clone()));
        state.registry.add(ChatId(1)).await;
        state.registry.add(ChatId(2)).await;

        let response = app(state)
            .oneshot(signal_request(Some("abc"), VALID_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: SignalResponse = json_body(response).await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.sent_to, 2);

        let sent = sender.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|(_, text)| {
            text == "📊 Signal\nPair: EURUSD\nDirection: CALL\nExpiry: 5m\nNote: strong"
        }));
    }

    #[tokio::test]
    async fn test_wrong_secret_is_forbidden() {
        let sender = Arc::new(RecordingSender::default());
        let state = Arc::new(create_test_state(Some("abc"), sender.clone()));
        state.registry.add(ChatId(1)).await;

        let response = app(state)
            .oneshot(signal_request(Some("xyz"), VALID_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body: ApiErrorResponse = json_body(response).await;
        assert_eq!(body.code, "INVALID_SECRET");
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn test_missing_secret_header_is_forbidden() {
        let sender = Arc::new(RecordingSender::default());
        let state = Arc::new(create_test_state(Some("abc"), sender.clone()));

        let response = app(state)
            .oneshot(signal_request(None, VALID_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn test_secret_check_skipped_when_unconfigured() {
        let sender = Arc::new(RecordingSender::default());
        let state = Arc::new(create_test_state(None, sender.clone()));
        state.registry.add(ChatId(7)).await;

        let response = app(state)
            .oneshot(signal_request(Some("anything"), VALID_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(sender.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_note_renders_empty() {
        let sender = Arc::new(RecordingSender::default());
        let state = Arc::new(create_test_state(None, sender.clone()));
        state.registry.add(ChatId(1)).await;

        let response = app(state)
            .oneshot(signal_request(
                None,
                r#"{"pair":"BTCUSD","direction":"PUT","expiry_minutes":15}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let sent = sender.sent();
        assert_eq!(
            sent[0].1,
            "📊 Signal\nPair: BTCUSD\nDirection: PUT\nExpiry: 15m\nNote: "
        );
    }

    #[tokio::test]
    async fn test_missing_field_is_bad_request() {
        let sender = Arc::new(RecordingSender::default());
        let state = Arc::new(create_test_state(None, sender.clone()));
        state.registry.add(ChatId(1)).await;

        let response = app(state)
            .oneshot(signal_request(
                None,
                r#"{"pair":"EURUSD","expiry_minutes":5}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ApiErrorResponse = json_body(response).await;
        assert_eq!(body.code, "MISSING_FIELDS");
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let sender = Arc::new(RecordingSender::default());
        let state = Arc::new(create_test_state(None, sender.clone()));

        let response = app(state)
            .oneshot(signal_request(None, "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ApiErrorResponse = json_body(response).await;
        assert_eq!(body.code, "INVALID_BODY");
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_fail_request() {
        let sender = Arc::new(RecordingSender::failing_for([ChatId(1)]));
        let state = Arc::new(create_test_state(None, sender.clone()));
        state.registry.add(ChatId(1)).await;
        state.registry.add(ChatId(2)).await;

        let response = app(state)
            .oneshot(signal_request(None, VALID_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: SignalResponse = json_body(response).await;
        assert_eq!(body.sent_to, 2);

        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, ChatId(2));
    }

    #[tokio::test]
    async fn test_no_subscribers_returns_zero() {
        let sender = Arc::new(RecordingSender::default());
        let state = Arc::new(create_test_state(None, sender));

        let response = app(state)
            .oneshot(signal_request(None, VALID_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: SignalResponse = json_body(response).await;
        assert_eq!(body.sent_to, 0);
    }
}
