//! # 필드 타입별 동작 (render / validate / encode)
//!
//! 필드 타입마다 세 가지 능력을 하나의 트레이트로 묶습니다:
//! - `control()`: 화면 구성과 무관한 입력 컨트롤 설명을 만듭니다 (render)
//! - `is_missing()`: 필수 항목 검사에서 "비어 있음"을 판정합니다 (validate)
//! - `encode()`: 응답 값을 제출용 답변 항목으로 바꿉니다 (encode)
//!
//! 어떤 구현을 쓸지는 `kind_of()` 한 번의 조회로 정해집니다.
//! 기본 폼의 필드든 공유 그룹의 필드든 같은 경로를 탑니다.

use serde::Serialize;

use crate::models::{
    labels, answer_is_missing, AdminImage, AnswerEntry, AnswerText, AnswerValue, Attachment,
    Field, FieldType, FileMeta, ResponseMap, CHECKBOXES_SUFFIX, CHOICE_SUFFIX,
};

/// 입력 컨트롤 설명 — 클라이언트가 실제 위젯을 그릴 때 참고합니다.
///
/// `#[serde(tag = "control")]`: `{ "control": "radio_group", ... }` 형태로 직렬화
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum Control {
    Heading {
        text: String,
    },
    Section {
        title: String,
        body: String,
    },
    TextInput {
        placeholder: String,
        hint: String,
    },
    TextArea {
        placeholder: String,
        hint: String,
        rows: u8,
    },
    RadioGroup {
        name: String,
        options: Vec<String>,
    },
    CheckboxGroup {
        options: Vec<String>,
    },
    Select {
        placeholder: String,
        options: Vec<String>,
    },
    DatePicker,
    TimePicker,
    FilePicker {
        accept: Option<String>,
        multiple: bool,
        max_files: Option<usize>,
        note: String,
        reference_images: Vec<AdminImage>,
        checkbox_key: Option<String>,
        checkbox_options: Vec<String>,
        choice_key: Option<String>,
        choice_question: String,
        choice_options: Vec<String>,
    },
}

/// 렌더링된 필드 하나 — 라벨/필수 여부 + 컨트롤
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedField {
    pub uid: String,
    pub label: String,
    pub required: bool,
    #[serde(flatten)]
    pub control: Control,
}

/// 필드 타입 하나의 동작
pub trait FieldKind: Sync {
    fn control(&self, field: &Field) -> Control;

    /// 응답자가 값을 입력하는 필드인지 여부 (제목/섹션은 false)
    fn accepts_input(&self) -> bool {
        true
    }

    fn is_missing(&self, value: Option<&AnswerValue>) -> bool {
        self.accepts_input() && answer_is_missing(value)
    }

    /// 값을 답변 항목으로 인코딩합니다. 인코딩할 수 없는 값이면 None.
    ///
    /// 업로드 타입은 `attachments`에 multipart 파일 파트를 추가합니다.
    fn encode(
        &self,
        field: &Field,
        value: &AnswerValue,
        responses: &ResponseMap,
        attachments: &mut Vec<Attachment>,
    ) -> Option<AnswerEntry>;
}

/// 필드 타입 → 동작 구현
pub fn kind_of(field_type: FieldType) -> &'static dyn FieldKind {
    match field_type {
        FieldType::Title => &Heading,
        FieldType::Section => &SectionBlock,
        FieldType::ShortAnswer => &FreeText { multiline: false },
        FieldType::Paragraph => &FreeText { multiline: true },
        FieldType::MultipleChoice => &SingleChoice,
        FieldType::Checkboxes => &MultiChoice,
        FieldType::Dropdown => &Dropdown,
        FieldType::Date => &Temporal { time: false },
        FieldType::Time => &Temporal { time: true },
        FieldType::FileUpload => &Upload { images: false },
        FieldType::ImageUpload => &Upload { images: true },
    }
}

/// 필드 하나를 렌더링합니다.
pub fn render(field: &Field) -> RenderedField {
    RenderedField {
        uid: field.uid.clone(),
        label: field.label.clone(),
        required: field.required,
        control: kind_of(field.field_type).control(field),
    }
}

/// 텍스트성 값은 그대로, 목록은 목록으로 — 가공하지 않은 답변
fn raw_text(value: &AnswerValue) -> Option<AnswerText> {
    match value {
        AnswerValue::Text(text) => Some(AnswerText::Single(text.clone())),
        AnswerValue::Selections(items) => Some(AnswerText::Many(items.clone())),
        AnswerValue::Files(_) => None,
    }
}

fn text_entry(field: &Field, text: Option<AnswerText>) -> Option<AnswerEntry> {
    let mut entry = AnswerEntry::bare(&field.uid, field.field_type);
    entry.text = Some(text?);
    Some(entry)
}

struct Heading;

impl FieldKind for Heading {
    fn control(&self, field: &Field) -> Control {
        Control::Heading {
            text: field.label.clone(),
        }
    }

    fn accepts_input(&self) -> bool {
        false
    }

    fn encode(&self, _: &Field, _: &AnswerValue, _: &ResponseMap, _: &mut Vec<Attachment>) -> Option<AnswerEntry> {
        None
    }
}

struct SectionBlock;

impl FieldKind for SectionBlock {
    fn control(&self, field: &Field) -> Control {
        // 섹션에서는 placeholder가 본문 역할을 합니다.
        Control::Section {
            title: field.label.clone(),
            body: field.placeholder.clone(),
        }
    }

    fn accepts_input(&self) -> bool {
        false
    }

    fn encode(&self, _: &Field, _: &AnswerValue, _: &ResponseMap, _: &mut Vec<Attachment>) -> Option<AnswerEntry> {
        None
    }
}

struct FreeText {
    multiline: bool,
}

impl FieldKind for FreeText {
    fn control(&self, field: &Field) -> Control {
        let placeholder = field.placeholder.clone();
        let hint = field.ex_placeholder.clone();
        if self.multiline {
            Control::TextArea {
                placeholder,
                hint,
                rows: 4,
            }
        } else {
            Control::TextInput { placeholder, hint }
        }
    }

    fn encode(&self, field: &Field, value: &AnswerValue, _: &ResponseMap, _: &mut Vec<Attachment>) -> Option<AnswerEntry> {
        text_entry(field, raw_text(value))
    }
}

struct SingleChoice;

impl FieldKind for SingleChoice {
    fn control(&self, field: &Field) -> Control {
        Control::RadioGroup {
            name: format!("field_{}", field.uid),
            options: field.option_labels(),
        }
    }

    fn encode(&self, field: &Field, value: &AnswerValue, _: &ResponseMap, _: &mut Vec<Attachment>) -> Option<AnswerEntry> {
        // 선택된 옵션 문자열 하나
        let selected = match value {
            AnswerValue::Text(text) => text.clone(),
            AnswerValue::Selections(items) => items.first()?.clone(),
            AnswerValue::Files(_) => return None,
        };
        text_entry(field, Some(AnswerText::Single(selected)))
    }
}

struct MultiChoice;

impl FieldKind for MultiChoice {
    fn control(&self, field: &Field) -> Control {
        Control::CheckboxGroup {
            options: field.option_labels(),
        }
    }

    fn encode(&self, field: &Field, value: &AnswerValue, _: &ResponseMap, _: &mut Vec<Attachment>) -> Option<AnswerEntry> {
        // 항상 목록으로 — 단일 값은 원소 하나짜리 목록으로 감쌉니다.
        let selected = match value {
            AnswerValue::Text(text) => vec![text.clone()],
            AnswerValue::Selections(items) => items.clone(),
            AnswerValue::Files(_) => return None,
        };
        text_entry(field, Some(AnswerText::Many(selected)))
    }
}

struct Dropdown;

impl FieldKind for Dropdown {
    fn control(&self, field: &Field) -> Control {
        Control::Select {
            placeholder: field.placeholder.clone(),
            options: field.option_labels(),
        }
    }

    fn encode(&self, field: &Field, value: &AnswerValue, _: &ResponseMap, _: &mut Vec<Attachment>) -> Option<AnswerEntry> {
        text_entry(field, raw_text(value))
    }
}

struct Temporal {
    time: bool,
}

impl FieldKind for Temporal {
    fn control(&self, _: &Field) -> Control {
        if self.time {
            Control::TimePicker
        } else {
            Control::DatePicker
        }
    }

    fn encode(&self, field: &Field, value: &AnswerValue, _: &ResponseMap, _: &mut Vec<Attachment>) -> Option<AnswerEntry> {
        text_entry(field, raw_text(value))
    }
}

struct Upload {
    images: bool,
}

impl Upload {
    fn key_prefix(&self) -> &'static str {
        if self.images {
            "image"
        } else {
            "file"
        }
    }
}

impl FieldKind for Upload {
    fn control(&self, field: &Field) -> Control {
        let cap = field.upload_cap();
        let (checkbox_key, checkbox_options, choice_key, choice_question, choice_options) =
            if self.images {
                (
                    (!field.checkbox_options.is_empty())
                        .then(|| format!("{}{CHECKBOXES_SUFFIX}", field.uid)),
                    labels(&field.checkbox_options),
                    (!field.choice_options.is_empty())
                        .then(|| format!("{}{CHOICE_SUFFIX}", field.uid)),
                    field.choice_question.clone(),
                    labels(&field.choice_options),
                )
            } else {
                (None, Vec::new(), None, String::new(), Vec::new())
            };

        Control::FilePicker {
            accept: self.images.then(|| "image/*".to_string()),
            multiple: cap.map_or(true, |n| n > 1),
            max_files: cap,
            note: field.content.clone(),
            reference_images: field.visible_admin_images().to_vec(),
            checkbox_key,
            checkbox_options,
            choice_key,
            choice_question,
            choice_options,
        }
    }

    fn encode(
        &self,
        field: &Field,
        value: &AnswerValue,
        responses: &ResponseMap,
        attachments: &mut Vec<Attachment>,
    ) -> Option<AnswerEntry> {
        let AnswerValue::Files(files) = value else {
            return None;
        };
        if files.is_empty() {
            return None;
        }

        // 파일마다 결정적인 키 "<prefix>_<uid>_<index>"로 multipart 파트를 붙입니다.
        let metas: Vec<FileMeta> = files
            .iter()
            .enumerate()
            .map(|(idx, file)| {
                let key = format!("{}_{}_{}", self.key_prefix(), field.uid, idx);
                attachments.push(Attachment {
                    key: key.clone(),
                    file: file.clone(),
                });
                FileMeta {
                    name: file.name.clone(),
                    content_type: file.content_type.clone(),
                    size: file.size,
                    file_key: key,
                }
            })
            .collect();

        let mut entry = AnswerEntry::bare(&field.uid, field.field_type);
        if self.images {
            entry.image_data = Some(metas);
            // 하위 응답은 독립 항목이 아니라 부모 답변 안에 접어 넣습니다.
            entry.checkbox_selections = responses
                .get(&format!("{}{CHECKBOXES_SUFFIX}", field.uid))
                .filter(|v| !v.is_empty())
                .and_then(|v| match v {
                    AnswerValue::Selections(items) => Some(items.clone()),
                    AnswerValue::Text(text) => Some(vec![text.clone()]),
                    AnswerValue::Files(_) => None,
                });
            entry.multiple_choice_selection = responses
                .get(&format!("{}{CHOICE_SUFFIX}", field.uid))
                .filter(|v| !v.is_empty())
                .and_then(|v| match v {
                    AnswerValue::Text(text) => Some(text.clone()),
                    AnswerValue::Selections(items) => items.first().cloned(),
                    AnswerValue::Files(_) => None,
                });
        } else {
            entry.file_data = Some(metas);
        }
        Some(entry)
    }
}
