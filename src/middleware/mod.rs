//! # 미들웨어 모듈
//!
//! - `auth`: Bearer 토큰 → 세션, 관리자 게이트 (Axum Extractor로 구현)

pub mod auth;
