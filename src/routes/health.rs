//! # 헬스체크(Health Check) 핸들러
//!
//! 서버가 정상적으로 동작하는지 확인하는 엔드포인트입니다.
//!
//! ## 엔드포인트
//! - `GET /api/v1/health` → `{ "status": "ok", "active_fills": 3, "open_drafts": 1 }`
//!
//! 주로 다음 용도로 사용됩니다:
//! - 로드밸런서의 서버 상태 확인
//! - 컨테이너 오케스트레이터(Docker)의 헬스체크
//! - 메모리에 떠 있는 채우기 세션/드래프트 수 확인

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::routes::AppState;

/// `GET /health` — 서버 상태를 확인합니다.
///
/// 외부 API는 호출하지 않습니다. 외부 API가 죽어 있어도 이 서버는 "ok"입니다.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let active_fills = state.fills.read().await.len();
    let open_drafts = state.drafts.read().await.len();

    Json(json!({
        "status": "ok",
        "active_fills": active_fills,
        "open_drafts": open_drafts
    }))
}
