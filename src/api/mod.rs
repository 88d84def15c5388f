//! # 외부 인테이크 API 접근 계층
//!
//! 폼, 카테고리, 응답, 인증 정보의 저장은 모두 외부 API가 맡습니다.
//! 이 서버는 요청/응답 계약만 알고, 내부 구현은 블랙박스로 취급합니다.
//!
//! `IntakeApi` 트레이트가 그 계약이고, 구현은 두 가지입니다:
//! - `http::HttpIntakeApi`: reqwest로 실제 API를 호출
//! - `memory::InMemoryIntakeApi`: 프로세스 안에서 같은 계약을 흉내 냄 (테스트, 로컬 개발)
//!
//! 라우트 핸들러는 `Arc<dyn IntakeApi>`만 알기 때문에 어느 구현이든 바꿔 끼울 수 있습니다.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::{
    AuthResponse, CategoryInfo, FormSchema, GeneralGroup, LoginRequest, RegisterRequest,
    StoredResponse, SubmissionPayload,
};

pub use http::HttpIntakeApi;
pub use memory::InMemoryIntakeApi;

/// 외부 API 호출 실패
///
/// `Display`가 곧 사용자에게 보여줄 메시지입니다.
/// 서버가 메시지를 주지 않은 경우에는 `with_fallback()`으로 작업별 일반 메시지를 채웁니다.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// 연결 실패, 타임아웃 등 전송 계층 에러
    #[error("{message}")]
    Transport { message: String },

    /// 서버가 2xx가 아닌 상태 코드로 응답
    #[error("{message}")]
    Status { status: u16, message: String },

    /// 응답 본문을 기대한 모양으로 해석할 수 없음
    #[error("{0}")]
    Decode(String),
}

impl ApiError {
    /// 메시지가 비어 있으면 작업별 일반 메시지로 채웁니다.
    ///
    /// 예: `err.with_fallback("Login failed")`
    pub fn with_fallback(self, generic: &str) -> Self {
        match self {
            ApiError::Status { status, message } if message.trim().is_empty() => ApiError::Status {
                status,
                message: generic.to_string(),
            },
            ApiError::Transport { message } if message.trim().is_empty() => ApiError::Transport {
                message: generic.to_string(),
            },
            ApiError::Decode(message) if message.trim().is_empty() => {
                ApiError::Decode(generic.to_string())
            }
            other => other,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport {
                message: e.to_string(),
            }
        }
    }
}

/// 에러 응답 본문에서 서버가 준 메시지를 최대한 찾아냅니다.
///
/// 순서: `message` → `error`(문자열) → `error.message` → 없음
pub fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| value.get("error").and_then(Value::as_str))
        .or_else(|| {
            value
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
        })
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}

/// 외부 인테이크 API 계약
///
/// `token`이 있는 메서드는 인증이 필요한 호출이며, Bearer 토큰으로 전달됩니다.
/// 토큰이 진짜인지는 외부 API가 매 요청마다 판단합니다.
#[async_trait]
pub trait IntakeApi: Send + Sync {
    /// 공유 ID로 폼을 가져옵니다.
    async fn form_by_share_id(&self, share_id: &str) -> Result<FormSchema, ApiError>;

    /// 폼의 무비 카테고리와 무비 이름을 가져옵니다.
    async fn category_for_form(&self, share_id: &str) -> Result<CategoryInfo, ApiError>;

    /// 모든 폼 앞에 표시되는 공유 필드 그룹들을 가져옵니다.
    async fn general_groups(&self) -> Result<Vec<GeneralGroup>, ApiError>;

    /// 폼의 제출 기록을 가져옵니다. `form_id == 0`이면 전체.
    async fn responses_for_form(
        &self,
        form_id: i64,
        token: &str,
    ) -> Result<Vec<StoredResponse>, ApiError>;

    /// 응답을 multipart로 제출합니다. 성공 응답은 불투명한 값입니다.
    async fn submit_form(
        &self,
        form_id: &str,
        payload: SubmissionPayload,
        token: Option<&str>,
    ) -> Result<Value, ApiError>;

    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError>;

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError>;

    /// 폼을 저장합니다. 새 폼이면 `id`가 부여된 폼이 돌아옵니다.
    async fn save_form(&self, form: &FormSchema, token: &str) -> Result<FormSchema, ApiError>;

    async fn delete_form(&self, form_id: i64, token: &str) -> Result<(), ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_message_prefers_message_then_error() {
        assert_eq!(
            extract_message(r#"{"message":"Invalid credentials","error":"x"}"#).as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(
            extract_message(r#"{"error":"User exists"}"#).as_deref(),
            Some("User exists")
        );
        assert_eq!(
            extract_message(r#"{"error":{"code":"c","message":"nested"}}"#).as_deref(),
            Some("nested")
        );
        assert_eq!(extract_message("<html>502</html>"), None);
        assert_eq!(extract_message(r#"{"message":"  "}"#), None);
    }

    #[test]
    fn fallback_only_fills_empty_messages() {
        let empty = ApiError::Status {
            status: 500,
            message: String::new(),
        };
        assert_eq!(empty.with_fallback("Login failed").to_string(), "Login failed");

        let given = ApiError::Status {
            status: 401,
            message: "Wrong password".into(),
        };
        assert_eq!(given.with_fallback("Login failed").to_string(), "Wrong password");
    }
}
