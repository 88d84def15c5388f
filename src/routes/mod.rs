//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들을 모아둔 모듈입니다.
//! Axum에서 핸들러는 HTTP 요청을 받아 응답을 반환하는 async 함수입니다.
//!
//! 각 하위 모듈:
//! - `auth`: 로그인, 가입, 로그아웃, 현재 세션 조회
//! - `forms`: 공유 링크로 폼 열기, 채우기 세션 시작 (공개)
//! - `fill`: 채우기 세션의 응답 입력/파일 업로드/제출 (공개)
//! - `builder`: 폼 빌더 드래프트 편집과 저장 (관리자)
//! - `responses`: 저장된 응답 목록/상세, 공유 링크, 폼 삭제 (관리자)
//! - `health`: 서버 상태 확인 (헬스체크)
//! - `idle`: 오래 쓰이지 않은 채우기 세션과 드래프트 정리

pub mod auth;
pub mod builder;
pub mod fill;
pub mod forms;
pub mod health;
pub mod idle;
pub mod responses;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::SqlitePool;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tokio::time::Instant;
use uuid::Uuid;

use crate::api::IntakeApi;
use crate::error::AppError;
use crate::services::renderer::FillSession;
use crate::services::session::SessionRegistry;
use crate::services::uploads::UploadStore;

pub use builder::Draft;

/// ID → 잠글 수 있는 항목. 항목마다 따로 잠그므로 서로 다른 세션은 서로를 기다리지 않습니다.
pub type Registry<T> = Arc<RwLock<HashMap<Uuid, Arc<Entry<T>>>>>;

/// 레지스트리 항목 하나: 값과 마지막으로 요청이 닿은 시각
pub struct Entry<T> {
    item: Mutex<T>,
    touched: Mutex<Instant>,
}

impl<T> Entry<T> {
    pub fn new(item: T) -> Arc<Self> {
        Arc::new(Self {
            item: Mutex::new(item),
            touched: Mutex::new(Instant::now()),
        })
    }

    pub async fn lock(&self) -> MutexGuard<'_, T> {
        self.item.lock().await
    }

    async fn touch(&self) {
        *self.touched.lock().await = Instant::now();
    }

    /// 마지막 접근 시각
    pub async fn touched(&self) -> Instant {
        *self.touched.lock().await
    }
}

/// 애플리케이션 공유 상태
///
/// 모든 요청 핸들러가 `State(state): State<AppState>`로 접근합니다.
/// 필드가 모두 `Arc`이거나 내부적으로 `Arc`를 쓰므로 clone 비용이 작습니다.
#[derive(Clone)]
pub struct AppState {
    /// SQLite 연결 풀 (자격증명 저장소)
    pub pool: SqlitePool,
    /// 외부 인테이크 API — HTTP 구현 또는 인메모리 구현
    pub api: Arc<dyn IntakeApi>,
    /// 제출 전 업로드 파일 스테이징
    pub uploads: UploadStore,
    /// 토큰 해시 → 로그인 세션
    pub sessions: Arc<SessionRegistry>,
    /// 편집 중인 폼 빌더 드래프트
    pub drafts: Registry<Draft>,
    /// 진행 중인 채우기 세션
    pub fills: Registry<FillSession>,
    /// 공유 링크의 출처 (끝에 '/' 없음)
    pub public_origin: String,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        api: Arc<dyn IntakeApi>,
        uploads: UploadStore,
        public_origin: String,
    ) -> Self {
        Self {
            pool,
            api,
            uploads,
            sessions: Arc::new(SessionRegistry::new()),
            drafts: Arc::default(),
            fills: Arc::default(),
            public_origin,
        }
    }
}

/// 레지스트리에서 항목 하나를 꺼내고 접근 시각을 갱신합니다. 없으면 404.
pub(crate) async fn lookup<T>(registry: &Registry<T>, id: Uuid) -> Result<Arc<Entry<T>>, AppError> {
    let entry = registry
        .read()
        .await
        .get(&id)
        .cloned()
        .ok_or(AppError::NotFound)?;
    entry.touch().await;
    Ok(entry)
}

/// `/api/v1` 아래에 붙는 API 라우터
///
/// 파일 업로드 경로만 axum 기본 본문 상한(2 MB) 대신 `max_upload_bytes`를 씁니다.
/// 축하 영상이나 사진 원본은 수백 MB가 될 수 있습니다.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    // axum 0.8부터 경로 파라미터는 `{id}` 형식입니다.

    // 인증 (가입, 로그인, 로그아웃, 현재 세션)
    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me));

    // 공개: 공유 링크로 폼을 열고 채우기
    let public_routes = Router::new()
        .route("/forms/{share_id}", get(forms::get_form))
        .route("/forms/{share_id}/fill", post(forms::start_fill))
        .route("/fill/{id}", get(fill::get_fill).delete(fill::close_fill))
        .route("/fill/{id}/answers/{key}", put(fill::set_answer))
        .route(
            "/fill/{id}/files/{uid}",
            post(fill::upload_files).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/fill/{id}/files/{uid}/{index}", delete(fill::remove_file))
        .route("/fill/{id}/submit", post(fill::submit))
        .route("/fill/{id}/dismiss", post(fill::dismiss_error))
        .route("/fill/{id}/reset", post(fill::reset_fill));

    // 관리자: 폼 빌더 드래프트
    let builder_routes = Router::new()
        .route("/admin/drafts", post(builder::create_draft))
        .route(
            "/admin/drafts/{id}",
            get(builder::get_draft)
                .patch(builder::patch_draft)
                .delete(builder::delete_draft),
        )
        .route("/admin/drafts/{id}/fields", post(builder::add_field))
        .route(
            "/admin/drafts/{id}/fields/{uid}",
            patch(builder::update_field).delete(builder::delete_field),
        )
        .route("/admin/drafts/{id}/fields/{uid}/move", post(builder::move_field))
        .route(
            "/admin/drafts/{id}/fields/{uid}/duplicate",
            post(builder::duplicate_field),
        )
        .route("/admin/drafts/{id}/save", post(builder::save_draft));

    // 관리자: 응답 뷰어, 공유 링크, 폼 삭제
    let admin_routes = Router::new()
        .route("/admin/forms/{form_id}", delete(responses::delete_form))
        .route(
            "/admin/forms/{form_id}/responses",
            get(responses::list_responses),
        )
        .route(
            "/admin/forms/{form_id}/responses/{response_id}",
            get(responses::get_response),
        )
        .route("/admin/forms/{form_id}/share", get(responses::share_link));

    Router::new()
        .merge(auth_routes)
        .merge(public_routes)
        .merge(builder_routes)
        .merge(admin_routes)
        .route("/health", get(health::health_check))
        .with_state(state)
}
