//! 설정 관리.
//!
//! 모든 설정은 환경 변수에서 읽습니다. 봇 토큰이 없으면 프로세스를 시작하지 않습니다.
//!
//! # 환경 변수
//!
//! - `BOT_TOKEN` (또는 `TELEGRAM_BOT_TOKEN`): 텔레그램 봇 토큰 (필수)
//! - `ADMIN_IDS`: 쉼표로 구분된 관리자 ID 목록 (예약, 현재 미사용)
//! - `WEBHOOK_SECRET`: `X-Secret` 헤더와 비교할 공유 시크릿 (비어 있으면 검사 생략)
//! - `HOST`: 바인딩 주소 (기본값: `0.0.0.0`)
//! - `PORT`: 리스닝 포트 (기본값: `8000`)
//! - `TELEGRAM_API_URL`: Bot API 기본 URL (기본값: `https://api.telegram.org`)
//! - `DELIVERY_TIMEOUT_SECS`: 수신자별 전송 타임아웃 (기본값: 10)
//! - `BROADCAST_CONCURRENCY`: 동시 전송 수 (기본값: 16)

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::{ConfigError, ConfigResult};

/// 텔레그램 Bot API 기본 URL.
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// 서버 설정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    /// 소켓 주소 반환.
    ///
    /// # Errors
    /// `host:port` 형식이 유효하지 않으면 `AddrParseError`를 반환합니다.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// 브로드캐스트 설정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastConfig {
    /// 수신자별 전송 타임아웃
    pub delivery_timeout: Duration,
    /// 동시에 진행할 최대 전송 수
    pub concurrency: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            delivery_timeout: Duration::from_secs(10),
            concurrency: 16,
        }
    }
}

/// 애플리케이션 설정.
#[derive(Debug)]
pub struct BridgeConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 브로드캐스트 설정
    pub broadcast: BroadcastConfig,
    /// 봇 토큰
    pub bot_token: SecretString,
    /// Bot API 기본 URL
    pub telegram_api_url: String,
    /// 관리자 ID 목록 (예약)
    pub admin_ids: Vec<i64>,
    /// 공유 시크릿 (빈 값이면 `None`)
    pub shared_secret: Option<SecretString>,
}

impl BridgeConfig {
    /// 환경 변수에서 설정을 생성합니다.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 임의의 키-값 조회 함수로 설정을 생성합니다.
    ///
    /// 빈 문자열은 설정되지 않은 것으로 취급합니다.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bot_token = get("BOT_TOKEN")
            .or_else(|| get("TELEGRAM_BOT_TOKEN"))
            .ok_or(ConfigError::Missing("BOT_TOKEN"))?;

        let admin_ids = match get("ADMIN_IDS") {
            Some(raw) => parse_admin_ids(&raw)?,
            None => Vec::new(),
        };

        let defaults = ServerConfig::default();
        let server = ServerConfig {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or("PORT", get("PORT"), defaults.port)?,
        };

        let defaults = BroadcastConfig::default();
        let timeout_secs: u64 = parse_or(
            "DELIVERY_TIMEOUT_SECS",
            get("DELIVERY_TIMEOUT_SECS"),
            defaults.delivery_timeout.as_secs(),
        )?;
        let concurrency: usize = parse_or(
            "BROADCAST_CONCURRENCY",
            get("BROADCAST_CONCURRENCY"),
            defaults.concurrency,
        )?;
        if concurrency == 0 {
            return Err(ConfigError::Invalid {
                name: "BROADCAST_CONCURRENCY",
                value: "0".to_string(),
                reason: "1 이상이어야 합니다".to_string(),
            });
        }

        let telegram_api_url = get("TELEGRAM_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string());

        Ok(Self {
            server,
            broadcast: BroadcastConfig {
                delivery_timeout: Duration::from_secs(timeout_secs),
                concurrency,
            },
            bot_token: SecretString::from(bot_token),
            telegram_api_url,
            admin_ids,
            // 공백도 유효한 시크릿
            shared_secret: lookup("WEBHOOK_SECRET")
                .filter(|v| !v.is_empty())
                .map(SecretString::from),
        })
    }

    /// 공유 시크릿 검사가 활성화되어 있는지 확인합니다.
    pub fn secret_required(&self) -> bool {
        self.shared_secret.is_some()
    }

    /// 요청 헤더 값이 공유 시크릿과 일치하는지 확인합니다.
    ///
    /// 시크릿이 설정되지 않았으면 항상 `true`입니다.
    /// 설정된 경우 헤더가 없거나 바이트 단위로 다르면 `false`입니다.
    pub fn authorize(&self, provided: Option<&[u8]>) -> bool {
        match &self.shared_secret {
            None => true,
            Some(secret) => provided == Some(secret.expose_secret().as_bytes()),
        }
    }
}

fn parse_or<T>(name: &'static str, raw: Option<String>, default: T) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}

fn parse_admin_ids(raw: &str) -> ConfigResult<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>().map_err(|e| ConfigError::Invalid {
                name: "ADMIN_IDS",
                value: s.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_bot_token_is_fatal() {
        let result = BridgeConfig::from_lookup(lookup(&[("PORT", "9000")]));
        assert!(matches!(result, Err(ConfigError::Missing("BOT_TOKEN"))));

        let result = BridgeConfig::from_lookup(lookup(&[("BOT_TOKEN", "  ")]));
        assert!(matches!(result, Err(ConfigError::Missing("BOT_TOKEN"))));
    }

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::from_lookup(lookup(&[("BOT_TOKEN", "123:abc")])).unwrap();

        assert_eq!(config.bot_token.expose_secret(), "123:abc");
        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.broadcast, BroadcastConfig::default());
        assert_eq!(config.telegram_api_url, DEFAULT_TELEGRAM_API_URL);
        assert!(config.admin_ids.is_empty());
        assert!(!config.secret_required());
    }

    #[test]
    fn test_fallback_token_variable() {
        let config =
            BridgeConfig::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "999:xyz")])).unwrap();
        assert_eq!(config.bot_token.expose_secret(), "999:xyz");
    }

    #[test]
    fn test_full_configuration() {
        let config = BridgeConfig::from_lookup(lookup(&[
            ("BOT_TOKEN", "123:abc"),
            ("ADMIN_IDS", "1, 2,-1003"),
            ("WEBHOOK_SECRET", "abc"),
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("DELIVERY_TIMEOUT_SECS", "3"),
            ("BROADCAST_CONCURRENCY", "4"),
            ("TELEGRAM_API_URL", "http://localhost:8081/"),
        ]))
        .unwrap();

        assert_eq!(config.admin_ids, vec![1, 2, -1003]);
        assert!(config.secret_required());
        assert_eq!(
            config.server.socket_addr().unwrap(),
            "127.0.0.1:9000".parse().unwrap()
        );
        assert_eq!(config.broadcast.delivery_timeout, Duration::from_secs(3));
        assert_eq!(config.broadcast.concurrency, 4);
        assert_eq!(config.telegram_api_url, "http://localhost:8081");
    }

    #[test]
    fn test_invalid_values() {
        let result = BridgeConfig::from_lookup(lookup(&[("BOT_TOKEN", "t"), ("PORT", "http")]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));

        let result =
            BridgeConfig::from_lookup(lookup(&[("BOT_TOKEN", "t"), ("ADMIN_IDS", "1,abc")]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                name: "ADMIN_IDS",
                ..
            })
        ));

        let result = BridgeConfig::from_lookup(lookup(&[
            ("BOT_TOKEN", "t"),
            ("BROADCAST_CONCURRENCY", "0"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_authorize() {
        let open = BridgeConfig::from_lookup(lookup(&[("BOT_TOKEN", "t")])).unwrap();
        assert!(open.authorize(None));
        assert!(open.authorize(Some(b"anything")));

        let guarded = BridgeConfig::from_lookup(lookup(&[
            ("BOT_TOKEN", "t"),
            ("WEBHOOK_SECRET", "abc"),
        ]))
        .unwrap();
        assert!(guarded.authorize(Some(b"abc")));
        assert!(!guarded.authorize(Some(b"xyz")));
        assert!(!guarded.authorize(Some(b"abc ")));
        assert!(!guarded.authorize(None));

        let blank = BridgeConfig::from_lookup(lookup(&[
            ("BOT_TOKEN", "t"),
            ("WEBHOOK_SECRET", " "),
        ]))
        .unwrap();
        assert!(blank.secret_required());
        assert!(!blank.authorize(None));
        assert!(!blank.authorize(Some(b"")));
        assert!(blank.authorize(Some(b" ")));

        let empty = BridgeConfig::from_lookup(lookup(&[
            ("BOT_TOKEN", "t"),
            ("WEBHOOK_SECRET", ""),
        ]))
        .unwrap();
        assert!(!empty.secret_required());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = BridgeConfig::from_lookup(lookup(&[
            ("BOT_TOKEN", "123:very-secret"),
            ("WEBHOOK_SECRET", "hunter2"),
        ]))
        .unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("very-secret"));
        assert!(!debug.contains("hunter2"));
    }
}
