//! # 유휴 세션 정리
//!
//! 응답자가 브라우저를 닫으면 `DELETE /fill/{id}`는 오지 않습니다.
//! 주기적으로 레지스트리를 훑어 `max_idle` 동안 요청이 없던 항목을 치웁니다.
//!
//! - 채우기 세션: 레지스트리에서 빼고 스테이징 디렉토리를 지웁니다.
//! - 드래프트: 레지스트리에서 빼면 `Drop`이 로그아웃 감시 태스크를 멈춥니다.
//!
//! 요청 핸들러가 들고 있는 항목(제출 중 등)은 건너뜁니다.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

use super::{AppState, Registry};

/// 정리 결과
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Swept {
    pub fills: usize,
    pub drafts: usize,
}

/// 한 번 훑어서 유휴 항목을 치웁니다.
pub async fn sweep_idle(state: &AppState, max_idle: Duration) -> Swept {
    let fills = take_idle(&state.fills, max_idle).await;
    for id in &fills {
        if let Err(e) = state.uploads.teardown(*id).await {
            tracing::warn!(fill_id = %id, error = %e, "failed to remove staged uploads");
        }
        tracing::info!(fill_id = %id, "idle fill session expired");
    }

    let drafts = take_idle(&state.drafts, max_idle).await;
    for id in &drafts {
        tracing::info!(draft_id = %id, "idle draft expired");
    }

    Swept {
        fills: fills.len(),
        drafts: drafts.len(),
    }
}

/// `every`마다 `sweep_idle()`을 부르는 백그라운드 태스크
pub fn spawn_sweeper(state: AppState, every: Duration, max_idle: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let swept = sweep_idle(&state, max_idle).await;
            if swept != Swept::default() {
                tracing::debug!(fills = swept.fills, drafts = swept.drafts, "idle sweep");
            }
        }
    })
}

async fn take_idle<T>(registry: &Registry<T>, max_idle: Duration) -> Vec<Uuid> {
    let now = Instant::now();
    let mut entries = registry.write().await;

    let mut idle = Vec::new();
    for (id, entry) in entries.iter() {
        // 레지스트리 밖에 복제본이 있으면 처리 중인 요청이 있다는 뜻
        if Arc::strong_count(entry) > 1 {
            continue;
        }
        if now.duration_since(entry.touched().await) >= max_idle {
            idle.push(*id);
        }
    }
    for id in &idle {
        entries.remove(id);
    }
    idle
}
