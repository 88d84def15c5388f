//! # 인증 추출기 (Extractor)
//!
//! - `CurrentSession`: Bearer 토큰으로 세션을 찾습니다. 토큰이 없거나 모르는 토큰이면 익명.
//! - `AdminUser`: 관리자만 통과. 그 외에는 랜딩 페이지로 303 리다이렉트합니다.
//!
//! 서버가 재시작되면 메모리의 세션 목록은 비지만,
//! 자격증명 테이블에 남아 있는 토큰은 첫 요청에서 세션으로 복원됩니다.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::db;
use crate::error::AppError;
use crate::models::SessionUser;
use crate::routes::AppState;
use crate::services::session::{gate, Access, Session, SessionState, LANDING_PAGE};

/// `Authorization: Bearer <token>`에서 토큰을 꺼냅니다.
pub fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// 요청을 보낸 쪽의 세션
#[derive(Debug, Clone)]
pub struct CurrentSession {
    /// 인증된 경우에만 Some — 외부 API 호출에 그대로 전달합니다.
    pub token: Option<String>,
    pub token_hash: Option<String>,
    pub session: Arc<Session>,
}

impl CurrentSession {
    pub fn state(&self) -> SessionState {
        self.session.current()
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.state().user().cloned()
    }

    pub(crate) fn anonymous() -> Self {
        Self {
            token: None,
            token_hash: None,
            session: Arc::new(Session::new()),
        }
    }
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(Self::anonymous());
        };
        let token_hash = db::hash_token(&token);

        let session = match state.sessions.get(&token_hash).await {
            Some(session) => session,
            None => match db::find_credential(&state.pool, &token_hash).await? {
                Some(user) => {
                    tracing::debug!(user_id = %user.id, "restored session from stored credential");
                    state.sessions.sign_in(&token_hash, user).await
                }
                None => return Ok(Self::anonymous()),
            },
        };

        Ok(Self {
            token: Some(token),
            token_hash: Some(token_hash),
            session,
        })
    }
}

/// 관리자 세션 — 빌더와 응답 뷰어 핸들러가 요구합니다.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub user: SessionUser,
    pub token: String,
    pub token_hash: String,
    pub session: Arc<Session>,
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = CurrentSession::from_request_parts(parts, state).await?;

        match (gate(&current.state()), current.token, current.token_hash) {
            (Access::Granted(user), Some(token), Some(token_hash)) => Ok(Self {
                user,
                token,
                token_hash,
                session: current.session,
            }),
            (Access::Redirect(to), ..) => Err(AppError::Redirect(to)),
            // 익명 세션은 관리자일 수 없으므로 여기에 오지 않습니다.
            _ => Err(AppError::Redirect(LANDING_PAGE)),
        }
    }
}
