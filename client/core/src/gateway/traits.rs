//! Gateway Traits
//!
//! Trait definitions and value types for the Async Gateway. Each request
//! envelope is built for one call and dropped afterwards.
//!
//! # Design Philosophy
//!
//! The gateway is split by consumer: the session machine only ever sees
//! [`AuthGateway`], the post synchronizer only ever sees [`PostGateway`].
//! Both are injected at construction so tests can substitute a scripted
//! implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::GatewayError;
use crate::models::{Post, PostId, UserId};

/// Status value a login response carries on success
pub const LOGIN_SUCCESS_STATUS: &str = "success";

// ============================================
// Request Envelopes
// ============================================

/// Login attempt
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    /// Digits-only phone number
    pub phone_number: String,
    /// Password, sent verbatim
    pub password: String,
}

impl LoginRequest {
    /// Create a login request
    pub fn new(phone_number: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("phone_number", &self.phone_number)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// New post submission
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PostRequest {
    /// Post title
    pub title: String,
    /// Post body
    pub content: String,
    /// Author's user ID
    pub user_id: UserId,
    /// Industry tag
    pub industry: String,
}

impl PostRequest {
    /// Create a post submission
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        user_id: UserId,
        industry: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            user_id,
            industry: industry.into(),
        }
    }
}

/// Edit of an existing post
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EditPostRequest {
    /// Post being edited
    pub post_id: PostId,
    /// Replacement title
    pub title: String,
    /// Replacement body
    pub content: String,
}

impl EditPostRequest {
    /// Create an edit request
    pub fn new(post_id: PostId, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            post_id,
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Post deletion
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DeleteRequest {
    /// Post being deleted
    pub post_id: PostId,
}

impl DeleteRequest {
    /// Create a delete request
    #[must_use]
    pub fn new(post_id: PostId) -> Self {
        Self { post_id }
    }
}

/// Like toggle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LikeRequest {
    /// Post being liked or unliked
    pub post_id: PostId,
    /// User toggling the like
    pub user_id: UserId,
}

impl LikeRequest {
    /// Create a like toggle request
    #[must_use]
    pub fn new(post_id: PostId, user_id: UserId) -> Self {
        Self { post_id, user_id }
    }
}

/// Report of an offending post
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportRequest {
    /// Post being reported
    pub post_id: PostId,
    /// Reporting user
    pub user_id: UserId,
    /// Free-text reason
    pub reason: String,
}

impl ReportRequest {
    /// Create a report request
    pub fn new(post_id: PostId, user_id: UserId, reason: impl Into<String>) -> Self {
        Self {
            post_id,
            user_id,
            reason: reason.into(),
        }
    }
}

// ============================================
// Response Payloads
// ============================================

/// Login response body
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// `"success"` or anything else
    pub status: String,
    /// Server message
    pub message: String,
}

impl LoginResponse {
    /// A successful login
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: LOGIN_SUCCESS_STATUS.to_string(),
            message: message.into(),
        }
    }

    /// A rejected login
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            status: "failure".to_string(),
            message: message.into(),
        }
    }

    /// Whether the server accepted the credentials
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == LOGIN_SUCCESS_STATUS
    }
}

/// Acknowledgement of a mutating post operation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Human-readable server message, if any
    pub message: Option<String>,
}

impl Ack {
    /// Acknowledgement with a message
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

/// Structured report response body
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportResponse {
    /// Whether the report was accepted
    pub success: bool,
    /// Message on success
    pub message: Option<String>,
    /// Error on failure
    pub error: Option<String>,
}

impl ReportResponse {
    /// Accepted report
    #[must_use]
    pub fn accepted(message: Option<String>) -> Self {
        Self {
            success: true,
            message,
            error: None,
        }
    }

    /// Refused report
    #[must_use]
    pub fn refused(error: Option<String>) -> Self {
        Self {
            success: false,
            message: None,
            error,
        }
    }
}

// ============================================
// Gateway Traits
// ============================================

/// Authentication half of the Async Gateway
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Attempt a login
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, GatewayError>;
}

/// Board half of the Async Gateway
///
/// Implement this trait to back the post synchronizer with a real server.
#[async_trait]
pub trait PostGateway: Send + Sync {
    /// Gateway name used in logs
    fn name(&self) -> &str;

    /// Fetch the full post list in server order
    async fn load_posts(&self) -> Result<Vec<Post>, GatewayError>;

    /// Fetch a single post
    async fn load_post(&self, post_id: PostId) -> Result<Post, GatewayError>;

    /// Create a post
    async fn save_post(&self, request: &PostRequest) -> Result<Ack, GatewayError>;

    /// Edit a post
    async fn edit_post(&self, request: &EditPostRequest) -> Result<Ack, GatewayError>;

    /// Delete a post
    async fn delete_post(&self, request: &DeleteRequest) -> Result<Ack, GatewayError>;

    /// Toggle the like state of a post for a user
    ///
    /// The new like state is not part of the contract; callers reconcile by
    /// reloading.
    async fn like_post(&self, request: &LikeRequest) -> Result<Ack, GatewayError>;

    /// Report a post
    async fn report_post(&self, request: &ReportRequest) -> Result<ReportResponse, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_status() {
        assert!(LoginResponse::success("welcome").is_success());
        assert!(!LoginResponse::rejected("nope").is_success());
        let odd = LoginResponse {
            status: "SUCCESS".to_string(),
            message: String::new(),
        };
        assert!(!odd.is_success());
    }

    #[test]
    fn test_login_request_debug_redacts_password() {
        let request = LoginRequest::new("01012345678", "hunter2");
        let debug = format!("{request:?}");
        assert!(debug.contains("01012345678"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_report_response_builders() {
        let ok = ReportResponse::accepted(Some("thanks".to_string()));
        assert!(ok.success);
        assert_eq!(ok.error, None);

        let refused = ReportResponse::refused(Some("duplicate".to_string()));
        assert!(!refused.success);
        assert_eq!(refused.error.as_deref(), Some("duplicate"));
    }
}
