//! # 데이터 모델 모듈
//!
//! 애플리케이션에서 사용하는 데이터 구조체(struct)들을 정의합니다.
//! 각 하위 모듈은 특정 도메인의 데이터 타입을 담당합니다:
//! - `field`: 질문 하나(Field)와 필드 타입, 옵션, 참고 이미지
//! - `form`: 폼 스키마, 공유 필드 그룹, 카테고리
//! - `response`: 응답 맵과 제출(Submission) 와이어 페이로드
//! - `stored`: 외부 API에 저장된 응답의 읽기 모델
//! - `user`: 로그인 사용자와 인증 요청/응답
//!
//! `pub use X::*;`는 하위 모듈의 모든 공개 항목을
//! 이 모듈에서 바로 접근할 수 있게 재공개(re-export)합니다.
//! 예: `crate::models::field::Field` 대신 `crate::models::Field`로 접근 가능

pub mod field;
pub mod form;
pub mod response;
pub mod stored;
pub mod user;

pub use field::*;
pub use form::*;
pub use response::*;
pub use stored::*;
pub use user::*;
