//! # 서비스 계층
//!
//! HTTP와 무관한 도메인 로직을 모아둔 모듈입니다.
//! 라우트 핸들러는 요청을 해석한 뒤 이 모듈의 상태 기계에 일을 맡깁니다.
//!
//! 각 하위 모듈:
//! - `normalize`: 외부 API가 주는 "JSON이 담긴 문자열" 같은 값을 정규 형태로 바꾸기
//! - `field_kind`: 필드 타입별 렌더링/검증/인코딩
//! - `builder`: 폼 빌더 (관리자의 편집 상태)
//! - `renderer`: 폼 렌더러와 채우기 세션 (응답자의 응답 맵)
//! - `viewer`: 저장된 응답 목록/상세 보기
//! - `session`: 로그인 세션 컨텍스트와 관리자 게이트
//! - `uploads`: 제출 전 업로드 파일의 스테이징

pub mod builder;
pub mod field_kind;
pub mod normalize;
pub mod renderer;
pub mod session;
pub mod uploads;
pub mod viewer;
