use chrono::{Datelike, Utc};
use log::{error, warn};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

use crate::api::backend::{ApiError, BackendApi, GENERIC_ERROR_MESSAGE};
use crate::models::*;

pub const SERVER_UNAVAILABLE_MESSAGE: &str = "Server unavailable. Please try again later.";
pub const VALIDATION_MESSAGE: &str = "Please correct the highlighted fields.";
const MIN_PASSWORD_LENGTH: usize = 6;

/// What a route handler hands back to the page: an HTTP status and a JSON
/// body. Error bodies always carry a `message`.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResponse {
    pub status: u16,
    pub body: Value,
}

impl RouteResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "message": message }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }

    /// Per-field messages of a 400 response.
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        self.body
            .get("errors")
            .and_then(Value::as_object)
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl From<ApiError> for RouteResponse {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Status { status, message } => {
                warn!("backend rejected request with {status}: {message}");
                RouteResponse::error(status, &message)
            }
            ApiError::Unavailable(e) => {
                error!("{e}");
                RouteResponse::error(503, SERVER_UNAVAILABLE_MESSAGE)
            }
            ApiError::Decode(e) => {
                error!("cannot decode backend response: {e}");
                RouteResponse::error(502, GENERIC_ERROR_MESSAGE)
            }
        }
    }
}

/// Collects field level validation failures.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Map<String, Value>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| Value::String(message.to_string()));
    }

    pub fn require(&mut self, field: &str, value: &str, label: &str) {
        if value.trim().is_empty() {
            self.add(field, &format!("{label} is required"));
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        self.require(field, value, "Email");
        if !value.trim().is_empty() && !is_valid_email(value) {
            self.add(field, "Enter a valid email address");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    fn into_result(self) -> Result<(), RouteResponse> {
        if self.errors.is_empty() {
            return Ok(());
        }
        Err(RouteResponse {
            status: 400,
            body: json!({ "message": VALIDATION_MESSAGE, "errors": self.errors }),
        })
    }
}

pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn is_valid_phone(phone: &str) -> bool {
    let digits: String = phone.chars().filter(|c| !matches!(c, ' ' | '-' | '+')).collect();
    (10..=13).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

fn to_body<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Unwraps a handler result into the response the page sees.
fn respond(result: Result<Value, ApiError>) -> RouteResponse {
    match result {
        Ok(body) => RouteResponse::ok(body),
        Err(e) => e.into(),
    }
}

macro_rules! validate {
    ($errors:expr) => {
        if let Err(response) = $errors.into_result() {
            return response;
        }
    };
}

pub async fn login<B: BackendApi + ?Sized>(api: &B, request: &LoginRequest) -> RouteResponse {
    let mut errors = FieldErrors::new();
    errors.email("email", &request.email);
    errors.require("password", &request.password, "Password");
    validate!(errors);

    respond(api.login(request).await.map(|login| {
        json!({
            "token": login.token,
            "user": login.user.as_ref().map(to_body),
        })
    }))
}

pub async fn register<B: BackendApi + ?Sized>(api: &B, request: &RegisterRequest) -> RouteResponse {
    let mut errors = FieldErrors::new();
    errors.require("fullName", &request.full_name, "Full name");
    errors.email("email", &request.email);
    if request.password.len() < MIN_PASSWORD_LENGTH {
        errors.add(
            "password",
            &format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
        );
    }
    if let Some(phone) = &request.phone {
        if !is_valid_phone(phone) {
            errors.add("phone", "Enter a valid phone number");
        }
    }
    if request.school_id.as_deref().is_none_or(|id| id.trim().is_empty()) {
        errors.add("schoolId", "Select your school");
    }
    match request.kind {
        RegistrationKind::Alumni => {
            let current_year = Utc::now().year() as u16;
            match request.batch {
                Some(batch) if (1950..=current_year).contains(&batch) => {}
                Some(_) => errors.add("batch", "Enter a valid passing year"),
                None => errors.add("batch", "Passing year is required"),
            }
        }
        RegistrationKind::ExEmployee => {
            if request.designation.as_deref().is_none_or(|d| d.trim().is_empty()) {
                errors.add("designation", "Designation is required");
            }
        }
    }
    validate!(errors);

    respond(api.register(request).await.map(|body| {
        if body.is_null() {
            json!({ "message": "Registration successful" })
        } else {
            body
        }
    }))
}

pub async fn forgot_password<B: BackendApi + ?Sized>(
    api: &B,
    request: &ForgotPasswordRequest,
) -> RouteResponse {
    let mut errors = FieldErrors::new();
    errors.email("email", &request.email);
    validate!(errors);

    respond(api.forgot_password(request).await.map(|body| {
        if body.get("message").is_some() {
            body
        } else {
            json!({ "message": "If the email is registered, a reset link has been sent." })
        }
    }))
}

pub async fn get_profile<B: BackendApi + ?Sized>(api: &B, id: &str) -> RouteResponse {
    if id.trim().is_empty() {
        return RouteResponse::error(400, "Missing alumni id");
    }
    respond(api.get_alumni(id).await.map(|profile| to_body(&profile)))
}

pub async fn update_profile<B: BackendApi + ?Sized>(
    api: &B,
    id: &str,
    changeset: &ProfileChangeset,
) -> RouteResponse {
    if id.trim().is_empty() {
        return RouteResponse::error(400, "Missing alumni id");
    }
    let mut errors = FieldErrors::new();
    if changeset.is_empty() {
        errors.add("profile", "Nothing to update");
    }
    if let Some(name) = &changeset.full_name {
        errors.require("fullName", name, "Full name");
    }
    if let Some(phone) = &changeset.phone {
        if !is_valid_phone(phone) {
            errors.add("phone", "Enter a valid phone number");
        }
    }
    validate!(errors);

    respond(api.update_alumni(id, changeset).await.map(|profile| to_body(&profile)))
}

pub async fn chat_history<B: BackendApi + ?Sized>(api: &B, with_user: &str) -> RouteResponse {
    if with_user.trim().is_empty() {
        return RouteResponse::error(400, "Missing conversation partner");
    }
    respond(
        api.chat_history(with_user)
            .await
            .map(|messages| json!({ "messages": to_body(&messages) })),
    )
}

pub async fn send_chat<B: BackendApi + ?Sized>(api: &B, to: &str, content: &str) -> RouteResponse {
    let mut errors = FieldErrors::new();
    errors.require("receiverId", to, "Recipient");
    errors.require("content", content, "Message");
    validate!(errors);

    respond(
        api.send_chat(to, content.trim())
            .await
            .map(|message| json!({ "message": message.as_ref().map(to_body) })),
    )
}

pub async fn states<B: BackendApi + ?Sized>(api: &B) -> RouteResponse {
    respond(api.states().await.map(|states| json!({ "states": to_body(&states) })))
}

pub async fn schools<B: BackendApi + ?Sized>(api: &B, state_id: &str) -> RouteResponse {
    if state_id.trim().is_empty() {
        return RouteResponse::error(400, "Missing state id");
    }
    respond(
        api.schools(state_id)
            .await
            .map(|schools| json!({ "schools": to_body(&schools) })),
    )
}

pub async fn list_records<B: BackendApi + ?Sized>(api: &B, kind: RecordKind) -> RouteResponse {
    let result = match kind {
        RecordKind::Education => api.list_educations().await.map(|r| to_body(&r)),
        RecordKind::Experience => api.list_experiences().await.map(|r| to_body(&r)),
    };
    respond(result.map(|records| {
        let mut body = Map::new();
        body.insert(kind.envelope_key().to_string(), records);
        Value::Object(body)
    }))
}

pub async fn save_education<B: BackendApi + ?Sized>(api: &B, education: &Education) -> RouteResponse {
    let mut errors = FieldErrors::new();
    errors.require("institution", &education.institution, "Institution");
    if let (Some(start), Some(end)) = (education.start_year, education.end_year) {
        if end < start {
            errors.add("endYear", "End year cannot be before start year");
        }
    }
    validate!(errors);

    respond(
        api.save_education(education)
            .await
            .map(|saved| json!({ "education": to_body(&saved) })),
    )
}

pub async fn save_experience<B: BackendApi + ?Sized>(
    api: &B,
    experience: &Experience,
) -> RouteResponse {
    let mut errors = FieldErrors::new();
    errors.require("company", &experience.company, "Company");
    errors.require("title", &experience.title, "Title");
    if experience.current && experience.end_date.is_some() {
        errors.add("endDate", "A current position has no end date");
    }
    validate!(errors);

    respond(
        api.save_experience(experience)
            .await
            .map(|saved| json!({ "experience": to_body(&saved) })),
    )
}

pub async fn delete_record<B: BackendApi + ?Sized>(api: &B, kind: RecordKind, id: &str) -> RouteResponse {
    if id.trim().is_empty() {
        return RouteResponse::error(400, "Missing record id");
    }
    let result = match kind {
        RecordKind::Education => api.delete_education(id).await,
        RecordKind::Experience => api.delete_experience(id).await,
    };
    respond(result.map(|()| json!({ "message": format!("{kind} removed") })))
}
