//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 데이터베이스와 직접 상호작용하는 함수들을 모아둔 모듈입니다.
//! 라우트 핸들러(routes/)와 인증 미들웨어에서 이 모듈의 함수를 호출합니다.
//!
//! 폼과 응답은 외부 API가 저장하므로, 로컬 DB에는 로그인 자격증명만 있습니다.
//! - `credentials`: 토큰 해시 → 사용자 정보

pub mod credentials;

// `crate::db::find_credential`처럼 바로 접근할 수 있게 재공개합니다.
pub use credentials::*;
