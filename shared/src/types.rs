//! API request and response types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use crate::validation::{validate_date, FieldOrder};
use validator::Validate;

// ============================================================================
// Common
// ============================================================================

/// Single message body, used for errors and simple acknowledgements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub msg: String,
}

impl MessageResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

/// Validation failure body: one entry per failed rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorsResponse {
    pub errors: Vec<MessageResponse>,
}

// ============================================================================
// Authentication
// ============================================================================

/// Issued credential
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Please include a valid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Please enter a password with 6 or more characters"))]
    pub password: String,
}

impl FieldOrder for RegisterRequest {
    const FIELDS: &'static [&'static str] = &["name", "email", "password"];
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "Please include a valid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl FieldOrder for LoginRequest {
    const FIELDS: &'static [&'static str] = &["email", "password"];
}

/// Account as returned to its owner (never carries the password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub date: DateTime<Utc>,
}

// ============================================================================
// Profiles
// ============================================================================

/// Create-or-update profile request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProfileRequest {
    pub company: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
    pub githubusername: Option<String>,
    /// Comma separated list, e.g. "rust, go, sql"
    #[serde(default)]
    #[validate(length(min = 1, message = "Skills is required"))]
    pub skills: String,
    pub youtube: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    #[serde(alias = "linkein")]
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
}

impl FieldOrder for ProfileRequest {
    const FIELDS: &'static [&'static str] = &["status", "skills"];
}

/// Social links stored alongside a profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
}

/// Add experience request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ExperienceRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Company is required"))]
    pub company: String,
    pub location: Option<String>,
    /// `YYYY-MM-DD`
    #[validate(
        required(message = "From date is required"),
        length(min = 1, message = "From date is required"),
        custom(function = "validate_date", message = "From date is not a valid date")
    )]
    pub from: Option<String>,
    /// `YYYY-MM-DD`; blank means no end date
    #[validate(custom(function = "validate_date", message = "To date is not a valid date"))]
    pub to: Option<String>,
    #[serde(default)]
    pub current: bool,
    pub description: Option<String>,
}

impl FieldOrder for ExperienceRequest {
    const FIELDS: &'static [&'static str] = &["title", "company", "from", "to"];
}

/// Add education request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct EducationRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "School is required"))]
    pub school: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Degree is required"))]
    pub degree: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Field of study is required"))]
    pub fieldofstudy: String,
    /// `YYYY-MM-DD`
    #[validate(
        required(message = "From date is required"),
        length(min = 1, message = "From date is required"),
        custom(function = "validate_date", message = "From date is not a valid date")
    )]
    pub from: Option<String>,
    /// `YYYY-MM-DD`; blank means no end date
    #[validate(custom(function = "validate_date", message = "To date is not a valid date"))]
    pub to: Option<String>,
    #[serde(default)]
    pub current: bool,
    pub description: Option<String>,
}

impl FieldOrder for EducationRequest {
    const FIELDS: &'static [&'static str] = &["school", "degree", "fieldofstudy", "from", "to"];
}

/// Public view of a profile's owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileOwner {
    pub id: String,
    pub name: String,
    pub avatar: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceResponse {
    pub id: String,
    pub title: String,
    pub company: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub from: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    pub current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EducationResponse {
    pub id: String,
    pub school: String,
    pub degree: String,
    pub fieldofstudy: String,
    pub from: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    pub current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Full profile response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub id: String,
    pub user: ProfileOwner,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub status: String,
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub githubusername: Option<String>,
    pub social: SocialLinks,
    pub experience: Vec<ExperienceResponse>,
    pub education: Vec<EducationResponse>,
    pub date: DateTime<Utc>,
}

/// Repository summary returned by the GitHub lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubRepo {
    pub name: String,
    pub html_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub watchers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
}

// ============================================================================
// Posts
// ============================================================================

/// Create post / add comment request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct TextRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Text is required"))]
    pub text: String,
}

impl FieldOrder for TextRequest {
    const FIELDS: &'static [&'static str] = &["text"];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeResponse {
    pub user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: String,
    pub user: String,
    pub text: String,
    pub name: String,
    pub avatar: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: String,
    pub user: String,
    pub text: String,
    pub name: String,
    pub avatar: String,
    pub likes: Vec<LikeResponse>,
    pub comments: Vec<CommentResponse>,
    pub date: DateTime<Utc>,
}
