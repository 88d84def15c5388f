//! # 웨딩 영상 인테이크 서버 진입점
//!
//! 웨딩 영상 제작에 필요한 자료(두 사람의 정보, 사진, 파일)를 받는 폼 서버입니다.
//! 폼과 응답의 저장은 외부 인테이크 API가 맡고, 이 서버는 그 앞에서
//! 폼 편집(빌더), 폼 채우기(렌더러), 응답 보기(뷰어), 관리자 게이트를 담당합니다.
//!
//! 이 파일이 수행하는 작업:
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. SQLite 데이터베이스 연결 풀 생성 (자격증명 저장소)
//! 4. 데이터베이스 마이그레이션 실행
//! 5. 업로드 스테이징 디렉토리 생성
//! 6. 외부 인테이크 API 구현 선택
//! 7. 유휴 세션 정리 태스크 시작
//! 8. API 라우터 설정
//! 9. HTTP 서버 시작

// ── 모듈 선언 ──
mod api;
mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use config::Config;
use routes::AppState;
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::{HttpIntakeApi, IntakeApi};
use crate::services::uploads::{UploadStore, PREVIEW_PREFIX};

/// 유휴 세션을 확인하는 주기
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1단계: 환경변수 로딩 ──
    // .env 파일이 없어도 에러 없이 넘어갑니다.
    dotenvy::dotenv().ok();

    // ── 2단계: 로깅(tracing) 초기화 ──
    // RUST_LOG가 없으면 이 크레이트와 tower_http, axum을 debug 레벨로 설정
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wedding_intake=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // ── 3단계: 설정 로딩 ──
    let config = Config::from_env()?;
    tracing::info!("Starting wedding intake server on {}:{}", config.host, config.port);

    // ── 4단계: SQLite 연결 풀 생성 ──
    // 로그인 자격증명만 저장하므로 연결 수는 적어도 충분합니다.
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    // ── 5단계: 데이터베이스 마이그레이션 실행 ──
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    // ── 6단계: 업로드 스테이징 디렉토리 생성 ──
    // 응답자가 고른 파일은 제출 전까지 여기에 머무르고, 미리보기 URL로 서빙됩니다.
    let uploads_path = Path::new(&config.uploads_path);
    if !uploads_path.exists() {
        tokio::fs::create_dir_all(uploads_path).await?;
        tracing::info!("Created uploads directory: {}", config.uploads_path);
    }

    // ── 7단계: 외부 인테이크 API 선택 ──
    // `INTAKE_API_URL=memory:`이면 외부 API 없이 프로세스 안의 구현을 씁니다.
    let api: Arc<dyn IntakeApi> = if config.uses_memory_api() {
        tracing::warn!("Using in-memory intake API; nothing will be persisted");
        match &config.dev_admin {
            Some((email, password)) => {
                tracing::info!("Seeded development admin: {}", email);
                Arc::new(api::memory::with_dev_admin(email, password).await)
            }
            None => Arc::new(api::InMemoryIntakeApi::new()),
        }
    } else {
        tracing::info!("Using intake API at {}", config.intake_api_url);
        Arc::new(HttpIntakeApi::new(&config.intake_api_url))
    };

    // ── 8단계: 애플리케이션 상태(State) 생성 ──
    let uploads = UploadStore::new(&config.uploads_path);
    let previews = ServeDir::new(uploads.root());
    let state = AppState::new(pool, api, uploads, config.public_origin.clone());

    // ── 9단계: 유휴 세션 정리 태스크 ──
    // 브라우저를 닫고 떠난 응답자의 세션과 스테이징 파일이 쌓이지 않도록 합니다.
    routes::idle::spawn_sweeper(state.clone(), SWEEP_INTERVAL, config.idle_timeout);

    // ── 10단계: API 라우터 설정 ──
    let api_routes = routes::router(state, config.max_upload_bytes);

    // ── 11단계: CORS 미들웨어 설정 ──
    // 개발 환경에서는 모두 허용합니다. 프로덕션에서는 PUBLIC_ORIGIN만 허용해야 합니다.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .nest("/api/v1", api_routes)
        // 스테이징된 업로드 파일의 미리보기
        .nest_service(PREVIEW_PREFIX, previews)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // ── 12단계: 서버 시작 ──
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
