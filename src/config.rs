//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 서버 설정값을 읽어오는 모듈입니다.
//! `.env` 파일이나 시스템 환경변수에서 값을 가져옵니다.
//!
//! 설정 항목:
//! - `DATABASE_URL`: 자격증명 저장용 SQLite 데이터베이스 경로
//! - `INTAKE_API_URL`: 외부 인테이크 API의 기본 URL (`memory:`이면 인메모리 구현 사용)
//! - `PUBLIC_ORIGIN`: 공유 링크(`<origin>/forms/<formId>`)에 쓰는 출처
//! - `UPLOADS_PATH`: 응답자가 올린 파일을 제출 전까지 보관하는 디렉토리
//! - `HOST`: 서버 바인딩 주소
//! - `PORT`: 서버 포트 번호
//! - `DEV_ADMIN_EMAIL`, `DEV_ADMIN_PASSWORD`: 인메모리 API에 미리 넣어 둘 관리자 계정 (선택)
//! - `MAX_UPLOAD_BYTES`: 파일 업로드 요청 하나의 최대 본문 크기 (기본 512 MiB)
//! - `IDLE_TIMEOUT_SECS`: 이 시간 동안 요청이 없는 채우기 세션/드래프트를 정리 (기본 3시간)

use std::env;
use std::time::Duration;

/// 업로드 요청 본문의 기본 상한: 512 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// 유휴 세션의 기본 수명: 3시간
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 3 * 60 * 60;

/// 애플리케이션 전체 설정을 담는 구조체
///
/// 서버 시작 시 환경변수에서 한 번 읽어온 후,
/// 애플리케이션 전체에서 공유됩니다.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 데이터베이스 파일 경로 (예: "sqlite:data/intake.db")
    pub database_url: String,
    /// 외부 인테이크 API 기본 URL (예: "https://api.example.com/api")
    pub intake_api_url: String,
    /// 공유 링크에 사용할 공개 출처 (기본값: "http://localhost:5173")
    pub public_origin: String,
    /// 업로드 스테이징 디렉토리 경로
    pub uploads_path: String,
    /// 서버가 바인딩할 호스트 주소 (기본값: "0.0.0.0")
    pub host: String,
    /// 서버 포트 번호 (기본값: 3000)
    pub port: u16,
    /// 인메모리 API 전용 개발 관리자 (이메일, 비밀번호). 둘 다 있어야 Some.
    pub dev_admin: Option<(String, String)>,
    /// 업로드 요청 하나의 최대 크기 (바이트)
    pub max_upload_bytes: usize,
    /// 마지막 요청 후 세션을 정리하기까지의 시간
    pub idle_timeout: Duration,
}

impl Config {
    /// 환경변수에서 설정값을 읽어 Config 인스턴스를 생성합니다.
    ///
    /// # 에러
    /// `DATABASE_URL`과 `INTAKE_API_URL`은 필수이며, 없으면 에러가 발생합니다.
    /// 나머지 설정은 기본값이 있어 환경변수가 없어도 동작합니다.
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            intake_api_url: env::var("INTAKE_API_URL")?,
            // 끝의 '/'를 제거해 두면 "<origin>/forms/<id>"를 만들 때 '//'가 생기지 않습니다.
            public_origin: env::var("PUBLIC_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string())
                .trim_end_matches('/')
                .to_string(),
            uploads_path: env::var("UPLOADS_PATH")
                .unwrap_or_else(|_| "data/uploads".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000), // 파싱 실패 시 기본값
            dev_admin: env::var("DEV_ADMIN_EMAIL")
                .ok()
                .zip(env::var("DEV_ADMIN_PASSWORD").ok()),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            idle_timeout: Duration::from_secs(
                env::var("IDLE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS),
            ),
        })
    }

    /// 인메모리 API를 사용할지 여부
    ///
    /// 로컬 개발 시 `INTAKE_API_URL=memory:`로 외부 API 없이 서버를 띄울 수 있습니다.
    pub fn uses_memory_api(&self) -> bool {
        self.intake_api_url == "memory:"
    }
}
