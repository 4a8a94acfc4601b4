use async_trait::async_trait;
use chatstore::Message;
use log::debug;
use serde_json::{Value, json};
use thiserror::Error;
use url::form_urlencoded;

use crate::api::proxy::{BackendProxy, HttpTransport, ProxyError, ProxyRequest, Transport};
use crate::models::*;
use crate::normalize::{
    first_text, normalize_alumni, normalize_chat_history, normalize_chat_message, normalize_record,
    normalize_school, normalize_state, unwrap_envelope, unwrap_list,
};

pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered with a non-2xx status.
    #[error("{message} (status {status})")]
    Status { status: u16, message: String },
    #[error(transparent)]
    Unavailable(#[from] ProxyError),
    #[error("unexpected response from backend: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

/// Human readable message carried by an error body: `message`, then `error`
/// (plain or `{message}`), then `msg`.
pub fn error_message(body: &Value) -> Option<String> {
    if let Value::String(text) = body {
        let text = text.trim();
        return (!text.is_empty()).then(|| text.to_string());
    }
    first_text(body, &["message", "error", "error.message", "msg"])
}

fn encode(segment: &str) -> String {
    form_urlencoded::byte_serialize(segment.as_bytes()).collect()
}

#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError>;
    async fn register(&self, request: &RegisterRequest) -> Result<Value, ApiError>;
    async fn forgot_password(&self, request: &ForgotPasswordRequest) -> Result<Value, ApiError>;
    async fn get_alumni(&self, id: &str) -> Result<AlumniProfile, ApiError>;
    async fn update_alumni(
        &self,
        id: &str,
        changeset: &ProfileChangeset,
    ) -> Result<AlumniProfile, ApiError>;
    async fn chat_history(&self, with_user: &str) -> Result<Vec<Message>, ApiError>;
    /// Returns the stored message when the backend echoes it back.
    async fn send_chat(&self, to: &str, content: &str) -> Result<Option<Message>, ApiError>;
    async fn states(&self) -> Result<Vec<State>, ApiError>;
    async fn schools(&self, state_id: &str) -> Result<Vec<School>, ApiError>;
    async fn list_educations(&self) -> Result<Vec<Education>, ApiError>;
    async fn save_education(&self, education: &Education) -> Result<Education, ApiError>;
    async fn delete_education(&self, id: &str) -> Result<(), ApiError>;
    async fn list_experiences(&self) -> Result<Vec<Experience>, ApiError>;
    async fn save_experience(&self, experience: &Experience) -> Result<Experience, ApiError>;
    async fn delete_experience(&self, id: &str) -> Result<(), ApiError>;
}

pub struct BackendClient<T: Transport = HttpTransport> {
    proxy: BackendProxy<T>,
    token: Option<String>,
}

impl<T: Transport> BackendClient<T> {
    pub fn new(proxy: BackendProxy<T>) -> Self {
        Self { proxy, token: None }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    async fn call(&self, endpoint: &str, request: ProxyRequest) -> Result<Value, ApiError> {
        let request = match &self.token {
            Some(token) => request.with_bearer(token),
            None => request,
        };

        let response = self.proxy.request(endpoint, &request).await?;

        if !response.is_success() {
            let message =
                error_message(&response.body).unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());
            debug!("{endpoint} rejected with status {}: {message}", response.status);
            return Err(ApiError::Status {
                status: response.status,
                message,
            });
        }

        Ok(response.body)
    }

    async fn list_records<R: ProfileRecord>(&self) -> Result<Vec<R>, ApiError> {
        let body = self.call(R::KIND.collection_path(), ProxyRequest::get()).await?;

        let records = unwrap_list(&body, R::KIND.envelope_key())
            .iter()
            .map(|value| normalize_record(value, R::KIND.item_key()))
            .collect::<Result<Vec<R>, _>>()?;

        Ok(records)
    }

    async fn save_record<R: ProfileRecord>(&self, record: &R) -> Result<R, ApiError> {
        let body = serde_json::to_value(record)?;
        let path = R::KIND.collection_path();

        let (endpoint, request) = match record.record_id() {
            Some(id) => (format!("{path}/{}", encode(id)), ProxyRequest::put(body)),
            None => (path.to_string(), ProxyRequest::post(body)),
        };

        let response = self.call(&endpoint, request).await?;

        Ok(normalize_record(&response, R::KIND.item_key())?)
    }

    async fn delete_record(&self, kind: RecordKind, id: &str) -> Result<(), ApiError> {
        let endpoint = format!("{}/{}", kind.collection_path(), encode(id));
        self.call(&endpoint, ProxyRequest::delete()).await?;
        Ok(())
    }
}

#[async_trait]
impl<T: Transport> BackendApi for BackendClient<T> {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let body = self
            .call("/api/auth/login", ProxyRequest::post(serde_json::to_value(request)?))
            .await?;

        let token = first_text(&body, &["token", "accessToken", "data.token", "data.accessToken"])
            .ok_or_else(|| ApiError::Decode("login response carries no token".to_string()))?;

        let user = ["user", "alumni", "data.user", "data.alumni"]
            .iter()
            .find_map(|key| {
                key.split('.')
                    .try_fold(&body, |value, part| value.get(part))
                    .filter(|v| v.is_object())
            })
            .map(normalize_alumni);

        Ok(LoginResponse { token, user })
    }

    async fn register(&self, request: &RegisterRequest) -> Result<Value, ApiError> {
        self.call("/api/auth/register", ProxyRequest::post(serde_json::to_value(request)?))
            .await
    }

    async fn forgot_password(&self, request: &ForgotPasswordRequest) -> Result<Value, ApiError> {
        self.call(
            "/api/auth/forgot-password",
            ProxyRequest::post(serde_json::to_value(request)?),
        )
        .await
    }

    async fn get_alumni(&self, id: &str) -> Result<AlumniProfile, ApiError> {
        let body = self
            .call(&format!("/api/alumni/{}", encode(id)), ProxyRequest::get())
            .await?;
        Ok(normalize_alumni(&body))
    }

    async fn update_alumni(
        &self,
        id: &str,
        changeset: &ProfileChangeset,
    ) -> Result<AlumniProfile, ApiError> {
        let body = self
            .call(
                &format!("/api/alumni/{}", encode(id)),
                ProxyRequest::put(serde_json::to_value(changeset)?),
            )
            .await?;
        Ok(normalize_alumni(&body))
    }

    async fn chat_history(&self, with_user: &str) -> Result<Vec<Message>, ApiError> {
        let body = self
            .call(
                &format!("/api/chat/history?userId={}", encode(with_user)),
                ProxyRequest::get(),
            )
            .await?;
        Ok(normalize_chat_history(&body))
    }

    async fn send_chat(&self, to: &str, content: &str) -> Result<Option<Message>, ApiError> {
        let body = self
            .call(
                "/api/chat/send",
                ProxyRequest::post(json!({ "receiverId": to, "content": content })),
            )
            .await?;

        let record = unwrap_envelope(&body, "message");
        Ok(record
            .is_object()
            .then(|| normalize_chat_message(record))
            .filter(|message| !message.id.is_empty() && !message.content.is_empty()))
    }

    async fn states(&self) -> Result<Vec<State>, ApiError> {
        let body = self.call("/api/states", ProxyRequest::get()).await?;
        Ok(unwrap_list(&body, "states").iter().map(normalize_state).collect())
    }

    async fn schools(&self, state_id: &str) -> Result<Vec<School>, ApiError> {
        let body = self
            .call(
                &format!("/api/states/{}/schools", encode(state_id)),
                ProxyRequest::get(),
            )
            .await?;
        Ok(unwrap_list(&body, "schools").iter().map(normalize_school).collect())
    }

    async fn list_educations(&self) -> Result<Vec<Education>, ApiError> {
        self.list_records().await
    }

    async fn save_education(&self, education: &Education) -> Result<Education, ApiError> {
        self.save_record(education).await
    }

    async fn delete_education(&self, id: &str) -> Result<(), ApiError> {
        self.delete_record(RecordKind::Education, id).await
    }

    async fn list_experiences(&self) -> Result<Vec<Experience>, ApiError> {
        self.list_records().await
    }

    async fn save_experience(&self, experience: &Experience) -> Result<Experience, ApiError> {
        self.save_record(experience).await
    }

    async fn delete_experience(&self, id: &str) -> Result<(), ApiError> {
        self.delete_record(RecordKind::Experience, id).await
    }
}
