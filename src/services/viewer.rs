//! # 응답 뷰어 (Response Viewer)
//!
//! 폼 하나에 쌓인 제출 기록을 읽기 전용으로 보여주는 2단계 상태 기계입니다.
//!
//! ```text
//! List ──select(id)──→ Detail ──back()──→ List
//! ```
//!
//! 로딩(`loading`)은 List/Detail과 별개의 일시적인 상태입니다.
//! 처음 열 때와 다시 불러올 때 켜졌다가, 결과가 오면 꺼집니다.
//!
//! 저장된 답변의 배열 필드는 배열일 수도, JSON 문자열일 수도 있습니다.
//! 해석할 수 없으면 빈 목록으로 보여주고 로그만 남깁니다.

use serde::Serialize;
use serde_json::Value;

use super::normalize::{option_label, parse_list};
use crate::api::{ApiError, IntakeApi};
use crate::error::AppError;
use crate::models::{StoredAnswer, StoredResponse};

pub const ANONYMOUS: &str = "匿名";
pub const NO_EMAIL: &str = "メールなし";
pub const UNTITLED: &str = "無題";
pub const NO_ANSWER: &str = "回答がありません";

#[derive(Debug, Clone, PartialEq, Eq)]
enum ViewerState {
    List,
    Detail { response_id: String },
}

/// 목록의 한 줄: `提出日時 — 이름 (이메일) — 폼 제목`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseSummary {
    pub id: String,
    pub submitted_at: Option<String>,
    pub name: String,
    pub email: String,
    pub form_title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileLink {
    pub name: String,
    pub url: Option<String>,
}

/// 상세 화면의 답변 하나
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerView {
    pub question: String,
    pub text: Option<String>,
    pub checkbox_selections: Vec<String>,
    pub multiple_choice_selection: Option<String>,
    pub images: Vec<String>,
    pub files: Vec<FileLink>,
    pub image_responses: Vec<String>,
    /// 아무것도 답하지 않은 항목에는 "回答がありません"이 들어갑니다.
    pub placeholder: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseDetail {
    pub id: String,
    pub submitted_at: Option<String>,
    pub respondent_name: String,
    pub respondent_email: String,
    pub answers: Vec<AnswerView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewerPage {
    List { items: Vec<ResponseSummary> },
    Detail { response: ResponseDetail },
}

/// 뷰어가 지금 보여주는 화면 — 로딩/에러 상태와 함께
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerSnapshot {
    pub form_id: i64,
    pub loading: bool,
    pub error: Option<String>,
    #[serde(flatten)]
    pub page: ViewerPage,
}

#[derive(Debug, Clone)]
pub struct ResponseViewer {
    form_id: i64,
    responses: Vec<StoredResponse>,
    state: ViewerState,
    loading: bool,
    error: Option<String>,
}

impl ResponseViewer {
    /// `form_id == 0`이면 모든 폼의 응답을 봅니다.
    pub fn new(form_id: i64) -> Self {
        Self {
            form_id,
            responses: Vec::new(),
            state: ViewerState::List,
            loading: false,
            error: None,
        }
    }

    pub fn responses(&self) -> &[StoredResponse] {
        &self.responses
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn begin_load(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// 불러온 결과를 반영합니다. 실패하면 기존 목록은 그대로 두고 에러를 기록합니다.
    ///
    /// 상세 화면에서 보던 응답이 새 목록에 없으면 목록으로 돌아갑니다.
    pub fn finish_load(&mut self, result: Result<Vec<StoredResponse>, ApiError>) -> Result<(), AppError> {
        self.loading = false;
        match result {
            Ok(responses) => {
                self.responses = responses;
                if let ViewerState::Detail { response_id } = &self.state {
                    if !self.responses.iter().any(|r| &r.id == response_id) {
                        self.state = ViewerState::List;
                    }
                }
                Ok(())
            }
            Err(e) => {
                let e = e.with_fallback("Failed to load responses");
                self.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    pub async fn load(&mut self, api: &dyn IntakeApi, token: &str) -> Result<(), AppError> {
        self.begin_load();
        let result = api.responses_for_form(self.form_id, token).await;
        self.finish_load(result)
    }

    pub fn select(&mut self, response_id: &str) -> Result<(), AppError> {
        if !self.responses.iter().any(|r| r.id == response_id) {
            return Err(AppError::NotFound);
        }
        self.state = ViewerState::Detail {
            response_id: response_id.to_string(),
        };
        Ok(())
    }

    pub fn back(&mut self) {
        self.state = ViewerState::List;
    }

    pub fn view(&self) -> ViewerSnapshot {
        let selected = match &self.state {
            ViewerState::List => None,
            ViewerState::Detail { response_id } => {
                self.responses.iter().find(|r| &r.id == response_id)
            }
        };
        let page = match selected {
            Some(response) => ViewerPage::Detail {
                response: detail(response),
            },
            None => ViewerPage::List {
                items: self.responses.iter().map(summarize).collect(),
            },
        };
        ViewerSnapshot {
            form_id: self.form_id,
            loading: self.loading,
            error: self.error.clone(),
            page,
        }
    }
}

/// 문자열이면 그대로, null/빈 문자열이면 None, 그 밖의 값은 JSON 텍스트로
fn value_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn non_empty(text: Option<&String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty()).cloned()
}

pub fn summarize(response: &StoredResponse) -> ResponseSummary {
    let respondent = response.respondent.as_ref();
    // 질문에 "Name"이 들어간 답변 → 응답자 이름 → 匿名
    let name = response
        .answers
        .iter()
        .find(|a| a.question.as_deref().is_some_and(|q| q.contains("Name")))
        .and_then(|a| value_text(a.answer_text.as_ref()))
        .or_else(|| non_empty(respondent.and_then(|r| r.name.as_ref())))
        .unwrap_or_else(|| ANONYMOUS.to_string());

    ResponseSummary {
        id: response.id.clone(),
        submitted_at: response.submitted_at.clone(),
        name,
        email: non_empty(respondent.and_then(|r| r.email.as_ref()))
            .unwrap_or_else(|| NO_EMAIL.to_string()),
        form_title: non_empty(response.form.as_ref().and_then(|f| f.title.as_ref()))
            .unwrap_or_else(|| UNTITLED.to_string()),
    }
}

pub fn detail(response: &StoredResponse) -> ResponseDetail {
    let respondent = response.respondent.as_ref();
    ResponseDetail {
        id: response.id.clone(),
        submitted_at: response.submitted_at.clone(),
        respondent_name: non_empty(respondent.and_then(|r| r.name.as_ref()))
            .unwrap_or_else(|| ANONYMOUS.to_string()),
        respondent_email: non_empty(respondent.and_then(|r| r.email.as_ref()))
            .unwrap_or_else(|| NO_EMAIL.to_string()),
        answers: response
            .answers
            .iter()
            .enumerate()
            .map(|(idx, answer)| answer_view(idx, answer))
            .collect(),
    }
}

fn answer_view(idx: usize, answer: &StoredAnswer) -> AnswerView {
    let images = parse_list(answer.image_urls.as_ref(), "imageUrls")
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect::<Vec<_>>();
    let files = parse_list(answer.files.as_ref(), "files")
        .iter()
        .enumerate()
        .map(|(i, entry)| file_link(i, entry))
        .collect::<Vec<_>>();
    let checkbox_selections = parse_list(answer.checkbox_selections.as_ref(), "checkboxSelections")
        .iter()
        .map(option_label)
        .collect::<Vec<_>>();
    let image_responses = parse_list(answer.image_responses.as_ref(), "imageResponses")
        .iter()
        .map(option_label)
        .collect::<Vec<_>>();
    let text = value_text(answer.answer_text.as_ref());
    let multiple_choice_selection = non_empty(answer.multiple_choice_selection.as_ref());

    let unanswered = text.is_none()
        && images.is_empty()
        && files.is_empty()
        && checkbox_selections.is_empty()
        && multiple_choice_selection.is_none()
        && image_responses.is_empty();

    AnswerView {
        question: non_empty(answer.question.as_ref())
            .unwrap_or_else(|| format!("Question {}", idx + 1)),
        text,
        checkbox_selections,
        multiple_choice_selection,
        images,
        files,
        image_responses,
        placeholder: unanswered.then_some(NO_ANSWER),
    }
}

/// 저장된 파일 항목: 경로 문자열, 또는 `filename`/`originalname`을 가진 객체
fn file_link(idx: usize, entry: &Value) -> FileLink {
    if let Some(path) = entry.as_str() {
        return FileLink {
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            url: Some(path.to_string()),
        };
    }
    let filename = entry.get("filename").and_then(Value::as_str);
    let name = filename
        .or_else(|| entry.get("originalname").and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| format!("file-{}", idx + 1));
    FileLink {
        name,
        url: filename.map(|f| format!("/uploads/{f}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryIntakeApi;
    use crate::models::{FormRef, Respondent, SessionUser, ADMIN_ROLE};
    use serde_json::json;

    fn stored(id: &str, answers: Vec<StoredAnswer>) -> StoredResponse {
        StoredResponse {
            id: id.into(),
            submitted_at: Some("2026-05-03T09:30:00.000Z".into()),
            respondent: Some(Respondent {
                name: Some("Hanako".into()),
                email: None,
            }),
            form: Some(FormRef { title: None }),
            answers,
        }
    }

    fn viewer_with(responses: Vec<StoredResponse>) -> ResponseViewer {
        let mut viewer = ResponseViewer::new(12);
        viewer.begin_load();
        assert!(viewer.is_loading());
        viewer.finish_load(Ok(responses)).unwrap();
        assert!(!viewer.is_loading());
        viewer
    }

    #[test]
    fn list_detail_list_keeps_responses() {
        let mut viewer = viewer_with(vec![stored("1", vec![]), stored("2", vec![])]);
        let before = viewer.responses().to_vec();

        viewer.select("2").unwrap();
        match viewer.view().page {
            ViewerPage::Detail { response } => assert_eq!(response.id, "2"),
            other => panic!("expected detail, got {other:?}"),
        }
        viewer.back();

        assert_eq!(viewer.responses(), before.as_slice());
        match viewer.view().page {
            ViewerPage::List { items } => assert_eq!(items.len(), 2),
            other => panic!("expected list, got {other:?}"),
        }
        assert!(matches!(viewer.select("404"), Err(AppError::NotFound)));
    }

    #[test]
    fn malformed_image_urls_render_as_no_images() {
        let answer = StoredAnswer {
            question: Some("前撮り写真".into()),
            image_urls: Some(json!("[\"/uploads/a.jpg\"")),
            ..Default::default()
        };
        let view = answer_view(0, &answer);
        assert!(view.images.is_empty());
        assert_eq!(view.placeholder, Some(NO_ANSWER));

        let good = StoredAnswer {
            image_urls: Some(json!("[\"/uploads/a.jpg\",\"/uploads/b.jpg\"]")),
            ..Default::default()
        };
        let view = answer_view(1, &good);
        assert_eq!(view.images.len(), 2);
        assert_eq!(view.question, "Question 2");
        assert_eq!(view.placeholder, None);
    }

    #[test]
    fn summary_falls_back_in_order() {
        let named = stored(
            "1",
            vec![StoredAnswer {
                question: Some("Groom Name".into()),
                answer_text: Some(json!("太郎")),
                ..Default::default()
            }],
        );
        let summary = summarize(&named);
        assert_eq!(summary.name, "太郎");
        assert_eq!(summary.email, NO_EMAIL);
        assert_eq!(summary.form_title, UNTITLED);

        assert_eq!(summarize(&stored("2", vec![])).name, "Hanako");

        let mut anonymous = stored("3", vec![]);
        anonymous.respondent = None;
        assert_eq!(summarize(&anonymous).name, ANONYMOUS);
    }

    #[test]
    fn file_entries_accept_paths_and_objects() {
        let answer = StoredAnswer {
            files: Some(json!([
                "/uploads/2026/plan.pdf",
                { "filename": "abc123.pdf", "originalname": "席次表.pdf" },
                { "originalname": "memo.txt" },
                {}
            ])),
            checkbox_selections: Some(json!("[\"白黒\",{\"label\":\"セピア\"}]")),
            ..Default::default()
        };
        let view = answer_view(0, &answer);
        assert_eq!(
            view.files,
            vec![
                FileLink { name: "plan.pdf".into(), url: Some("/uploads/2026/plan.pdf".into()) },
                FileLink { name: "abc123.pdf".into(), url: Some("/uploads/abc123.pdf".into()) },
                FileLink { name: "memo.txt".into(), url: None },
                FileLink { name: "file-4".into(), url: None },
            ]
        );
        assert_eq!(view.checkbox_selections, vec!["白黒", "セピア"]);
    }

    #[test]
    fn failed_reload_keeps_list_and_reports_error() {
        let mut viewer = viewer_with(vec![stored("1", vec![])]);
        viewer.select("1").unwrap();
        viewer.begin_load();
        assert!(viewer.view().loading);
        viewer
            .finish_load(Err(ApiError::Transport { message: String::new() }))
            .unwrap_err();

        let snapshot = viewer.view();
        assert!(!snapshot.loading);
        assert_eq!(snapshot.error.as_deref(), Some("Failed to load responses"));
        assert!(matches!(snapshot.page, ViewerPage::Detail { .. }));

        viewer.finish_load(Ok(vec![])).unwrap();
        assert!(matches!(viewer.view().page, ViewerPage::List { .. }));
    }

    #[tokio::test]
    async fn load_uses_admin_token() {
        let api = InMemoryIntakeApi::new();
        api.seed_response(12, stored("1", vec![])).await;
        api.seed_response(13, stored("2", vec![])).await;
        api.seed_user(
            SessionUser {
                id: "1".into(),
                name: "Planner".into(),
                email: "planner@example.com".into(),
                role: ADMIN_ROLE.into(),
            },
            "secret",
        )
        .await;
        let token = api
            .login(&crate::models::LoginRequest {
                email: "planner@example.com".into(),
                password: "secret".into(),
            })
            .await
            .unwrap()
            .token;

        let mut viewer = ResponseViewer::new(12);
        viewer.load(&api, &token).await.unwrap();
        assert_eq!(viewer.responses().len(), 1);

        let mut all = ResponseViewer::new(0);
        all.load(&api, &token).await.unwrap();
        assert_eq!(all.responses().len(), 2);

        let mut denied = ResponseViewer::new(12);
        denied.load(&api, "bogus").await.unwrap_err();
        assert_eq!(denied.view().error.as_deref(), Some("Unauthorized"));
    }
}
