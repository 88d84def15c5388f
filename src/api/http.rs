//! reqwest 기반 `IntakeApi` 구현

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{extract_message, ApiError, IntakeApi};
use crate::models::{
    AuthResponse, CategoryInfo, FormSchema, GeneralGroup, LoginRequest, RegisterRequest,
    StoredResponse, SubmissionPayload,
};

#[derive(Debug, Clone)]
pub struct HttpIntakeApi {
    client: Client,
    base_url: String,
}

impl HttpIntakeApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            message: extract_message(&body).unwrap_or_default(),
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl IntakeApi for HttpIntakeApi {
    async fn form_by_share_id(&self, share_id: &str) -> Result<FormSchema, ApiError> {
        self.send_json(self.client.get(self.url(&format!("/forms/share/{share_id}"))))
            .await
            .map_err(|e| e.with_fallback("Form not found"))
    }

    async fn category_for_form(&self, share_id: &str) -> Result<CategoryInfo, ApiError> {
        self.send_json(self.client.get(self.url(&format!("/forms/{share_id}/category"))))
            .await
            .map_err(|e| e.with_fallback("Form not found"))
    }

    async fn general_groups(&self) -> Result<Vec<GeneralGroup>, ApiError> {
        self.send_json(self.client.get(self.url("/general-forms")))
            .await
            .map_err(|e| e.with_fallback("Form not found"))
    }

    async fn responses_for_form(
        &self,
        form_id: i64,
        token: &str,
    ) -> Result<Vec<StoredResponse>, ApiError> {
        let request = self
            .client
            .get(self.url(&format!("/forms/{form_id}/responses")))
            .bearer_auth(token);
        // 응답이 null이면 빈 목록으로 취급합니다.
        let body: Option<Vec<StoredResponse>> = self
            .send_json(request)
            .await
            .map_err(|e| e.with_fallback("Failed to load responses"))?;
        Ok(body.unwrap_or_default())
    }

    async fn submit_form(
        &self,
        form_id: &str,
        payload: SubmissionPayload,
        token: Option<&str>,
    ) -> Result<Value, ApiError> {
        let mut form = multipart::Form::new();
        for (key, value) in payload.text_parts {
            form = form.text(key, value);
        }
        for part in payload.file_parts {
            let file = multipart::Part::bytes(part.bytes)
                .file_name(part.file_name)
                .mime_str(&part.content_type)
                .map_err(|e| ApiError::Decode(e.to_string()))?;
            form = form.part(part.key, file);
        }

        let mut request = self
            .client
            .post(self.url(&format!("/forms/{form_id}/submit")))
            .multipart(form);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = self
            .send(request)
            .await
            .map_err(|e| e.with_fallback("Failed to submit form"))?;
        // 성공 응답 본문은 해석하지 않고 그대로 전달합니다. 비어 있으면 null.
        let text = response.text().await?;
        Ok(serde_json::from_str(&text).unwrap_or(Value::Null))
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.send_json(self.client.post(self.url("/auth/login")).json(request))
            .await
            .map_err(|e| e.with_fallback("Login failed"))
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.send_json(self.client.post(self.url("/auth/register")).json(request))
            .await
            .map_err(|e| e.with_fallback("Login failed"))
    }

    async fn save_form(&self, form: &FormSchema, token: &str) -> Result<FormSchema, ApiError> {
        // 새 폼은 POST, 이미 저장된 폼은 PUT
        let request = match form.id {
            Some(id) => self.client.put(self.url(&format!("/forms/{id}"))),
            None => self.client.post(self.url("/forms")),
        };
        self.send_json(request.bearer_auth(token).json(form))
            .await
            .map_err(|e| e.with_fallback("フォームの保存に失敗しました"))
    }

    async fn delete_form(&self, form_id: i64, token: &str) -> Result<(), ApiError> {
        let request = self
            .client
            .delete(self.url(&format!("/forms/{form_id}")))
            .bearer_auth(token);
        self.send(request)
            .await
            .map_err(|e| e.with_fallback("Failed to delete form"))?;
        Ok(())
    }
}
