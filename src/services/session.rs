//! # 세션 컨텍스트와 관리자 게이트
//!
//! 로그인 상태를 여기저기서 직접 읽지 않고, 하나의 `Session` 값을 주입받아
//! `current()`로 읽고 `subscribe()`로 변화를 구독합니다.
//!
//! ```text
//! Anonymous ──sign_in(user)──→ Authenticated { user }
//!     ▲                              │
//!     └────────── sign_out() ────────┘   (로그아웃, 자격증명 삭제)
//! ```
//!
//! `tokio::sync::watch` 채널을 쓰므로 구독자(예: 그 자격증명으로 연 빌더 드래프트)는
//! 로그아웃을 즉시 관찰합니다. 다른 탭에서의 로그아웃 알림과 같은 역할입니다.
//!
//! 게이트는 역할만 확인합니다. 토큰이 진짜인지는 외부 API가 매 요청마다 판단합니다.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{watch, RwLock};

use crate::models::SessionUser;

/// 관리자가 아닌 사용자를 돌려보내는 곳
pub const LANDING_PAGE: &str = "/";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Anonymous,
    Authenticated { user: SessionUser },
}

impl SessionState {
    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            SessionState::Anonymous => None,
            SessionState::Authenticated { user } => Some(user),
        }
    }
}

/// 관리자 화면 접근 판정 결과
#[derive(Debug, Clone, PartialEq)]
pub enum Access {
    Granted(SessionUser),
    /// 랜딩 페이지로 리다이렉트
    Redirect(&'static str),
}

/// `Authenticated { role: "admin" }`만 통과합니다.
pub fn gate(state: &SessionState) -> Access {
    match state.user() {
        Some(user) if user.is_admin() => Access::Granted(user.clone()),
        _ => Access::Redirect(LANDING_PAGE),
    }
}

#[derive(Debug)]
pub struct Session {
    tx: watch::Sender<SessionState>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::Anonymous);
        Self { tx }
    }

    pub fn current(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    pub fn sign_in(&self, user: SessionUser) {
        // send_replace: 구독자가 없어도 값은 바뀝니다.
        self.tx.send_replace(SessionState::Authenticated { user });
    }

    pub fn sign_out(&self) {
        self.tx.send_replace(SessionState::Anonymous);
    }
}

/// 자격증명(토큰 해시) → 세션
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 토큰 해시에 대한 세션을 인증 상태로 만듭니다. 없으면 새로 만듭니다.
    pub async fn sign_in(&self, token_hash: &str, user: SessionUser) -> Arc<Session> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(token_hash.to_string())
            .or_insert_with(|| Arc::new(Session::new()))
            .clone();
        session.sign_in(user);
        session
    }

    pub async fn get(&self, token_hash: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(token_hash).cloned()
    }

    /// 세션을 로그아웃시키고 목록에서 뺍니다. 구독자는 `Anonymous`를 받습니다.
    pub async fn sign_out(&self, token_hash: &str) -> bool {
        match self.sessions.write().await.remove(token_hash) {
            Some(session) => {
                session.sign_out();
                true
            }
            None => false,
        }
    }
}
