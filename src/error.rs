//! # 에러 처리 모듈
//!
//! 애플리케이션에서 발생할 수 있는 모든 에러 타입을 정의합니다.
//! Rust에서는 예외(exception) 대신 `Result<T, E>` 타입으로 에러를 처리합니다.
//!
//! 이 모듈의 핵심:
//! - `AppError` 열거형(enum): 모든 에러 종류를 하나의 타입으로 통합
//! - `IntoResponse` 구현: 에러를 HTTP 응답으로 자동 변환
//!
//! 에러는 세 갈래로 나뉩니다:
//! 1. 검증 에러 (`Validation`): 필수 항목 누락. 응답자가 고쳐서 다시 제출할 수 있습니다.
//! 2. 외부 API 에러 (`Upstream`): 로그인/저장/제출/조회 실패. 서버가 준 메시지를 그대로 전달합니다.
//! 3. 손상된 데이터: 에러로 만들지 않고 빈 목록으로 대체합니다 (`services::normalize` 참고).

use axum::{
    http::StatusCode,                   // HTTP 상태 코드 (200, 404, 500 등)
    response::{IntoResponse, Redirect, Response}, // Axum의 응답 변환 트레이트
    Json,                               // JSON 응답 래퍼
};
use serde_json::json; // json! 매크로: JSON 객체를 간편하게 생성
use thiserror::Error; // thiserror: 커스텀 에러 타입을 쉽게 만들어주는 매크로 크레이트

use crate::api::ApiError;

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 각 에러 variant는 적절한 HTTP 상태 코드와 메시지로 변환됩니다.
/// 핸들러에서 `Result<T, AppError>`를 반환하면,
/// Axum이 자동으로 `IntoResponse`를 호출하여 HTTP 응답으로 변환합니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 요청한 리소스를 찾을 수 없음 (HTTP 404)
    #[error("Resource not found")]
    NotFound,

    /// 잘못된 요청 (HTTP 400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 필수 항목이 비어 있음 (HTTP 422)
    /// `missing`에는 비어 있는 필드의 라벨이 표시 순서대로 들어갑니다.
    #[error("Please fill in required fields: {}", missing.join(", "))]
    Validation { missing: Vec<String> },

    /// 외부 인테이크 API 호출 실패
    /// 외부 API가 4xx로 거절했으면 그 상태 코드를, 연결 실패나 5xx면 502를 씁니다.
    /// #[from]: ApiError → AppError::Upstream 자동 변환
    #[error("{0}")]
    Upstream(#[from] ApiError),

    /// 인증 실패 (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 관리자 세션이 끝남 (HTTP 303)
    /// 로그아웃한 뒤 드래프트에 접근하면 랜딩 페이지로 돌려보냅니다.
    #[error("Redirect to {0}")]
    Redirect(&'static str),

    /// 리소스 충돌 (HTTP 409)
    /// 저장/제출이 이미 진행 중일 때 중복 요청을 막는 데 사용합니다.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),

    /// 데이터베이스 오류 (HTTP 500)
    /// #[from]: sqlx::Error를 AppError로 자동 변환합니다.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 파일 입출력 오류 (HTTP 500)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for AppError {
    /// AppError를 HTTP 응답으로 변환합니다.
    ///
    /// 내부 에러(Database, IO, Internal)는 실제 에러 내용을 로그에만 기록하고,
    /// 클라이언트에는 일반적인 메시지만 반환합니다.
    /// 외부 API 에러는 반대로 서버가 준 메시지를 그대로 보여줍니다.
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            AppError::BadRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", msg.clone())
            }
            // to_string()이 "Please fill in required fields: 이름, 挙式日" 형태를 만듭니다.
            AppError::Validation { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "missing_required",
                self.to_string(),
            ),
            AppError::Upstream(ref e) => {
                // 잘못된 비밀번호(401), 중복 가입(400) 등은 클라이언트 쪽 문제이므로 그대로 전달
                let status = e
                    .status()
                    .filter(|s| (400..500).contains(s))
                    .and_then(|s| StatusCode::from_u16(s).ok())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                if status == StatusCode::BAD_GATEWAY {
                    tracing::error!("Upstream error: {:?}", e);
                } else {
                    tracing::warn!("Upstream rejected request: {:?}", e);
                }
                (status, "upstream_error", e.to_string())
            }
            AppError::Unauthorized(ref msg) => {
                (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone())
            }
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            // 본문 없이 Location 헤더만 보냅니다.
            AppError::Redirect(to) => return Redirect::to(to).into_response(),
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Io(ref e) => {
                tracing::error!("IO error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "io_error",
                    "An IO error occurred".to_string(),
                )
            }
        };

        // 결과: { "error": { "code": "missing_required", "message": "..." } }
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_labels() {
        let err = AppError::Validation {
            missing: vec!["新郎のお名前".to_string(), "挙式日".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Please fill in required fields: 新郎のお名前, 挙式日"
        );
        assert_eq!(
            err.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn upstream_keeps_server_message() {
        let err = AppError::from(ApiError::Status {
            status: 400,
            message: "Email already registered".to_string(),
        });
        assert_eq!(err.to_string(), "Email already registered");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn upstream_client_errors_pass_through_and_others_are_bad_gateway() {
        let status_of = |e: ApiError| AppError::from(e).into_response().status();

        let wrong_password = ApiError::Status {
            status: 401,
            message: "Invalid credentials".to_string(),
        };
        assert_eq!(status_of(wrong_password), StatusCode::UNAUTHORIZED);

        let server_down = ApiError::Status {
            status: 503,
            message: String::new(),
        }
        .with_fallback("Login failed");
        assert_eq!(status_of(server_down), StatusCode::BAD_GATEWAY);

        let refused = ApiError::Transport {
            message: "connection refused".to_string(),
        };
        assert_eq!(status_of(refused), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_of(ApiError::Decode("bad json".to_string())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn redirect_sends_see_other_to_landing() {
        let response = AppError::Redirect("/").into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/");
    }
}
