use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::profile::AlumniProfile;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub token: String,
    pub user: Option<AlumniProfile>,
}

/// Which registration tab the form was submitted from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, ValueEnum, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RegistrationKind {
    /// Graduated from one of the member schools.
    #[default]
    Alumni,
    /// Former employee of a member school.
    ExEmployee,
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(rename = "type")]
    pub kind: RegistrationKind,
    pub full_name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_id: Option<String>,
    /// Passing-out year for alumni.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<u16>,
    /// Designation held at the school, ex-employees only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}
