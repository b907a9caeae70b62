//! Board Models
//!
//! The post record shared by the gateway contract and the published
//! collection state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned post identifier
pub type PostId = u64;

/// Server-assigned user identifier
pub type UserId = u64;

/// A board post as the server reports it
///
/// `like_count` is unsigned so it can never go negative. `is_liked` reflects
/// the last server-confirmed like state for the current user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Unique post ID
    pub id: PostId,
    /// Post title
    pub title: String,
    /// Post body
    pub content: String,
    /// Author's user ID
    pub author_id: UserId,
    /// Industry tag chosen when the post was written
    pub industry_tag: String,
    /// Number of likes
    pub like_count: u32,
    /// Whether the current user likes this post
    pub is_liked: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create a post with no likes, stamped now
    pub fn new(
        id: PostId,
        title: impl Into<String>,
        content: impl Into<String>,
        author_id: UserId,
        industry_tag: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            content: content.into(),
            author_id,
            industry_tag: industry_tag.into(),
            like_count: 0,
            is_liked: false,
            created_at: Utc::now(),
        }
    }

    /// Set the like state
    #[must_use]
    pub fn with_likes(mut self, like_count: u32, is_liked: bool) -> Self {
        self.like_count = like_count;
        self.is_liked = is_liked;
        self
    }

    /// Like state as `(is_liked, like_count)`
    #[must_use]
    pub fn like_state(&self) -> (bool, u32) {
        (self.is_liked, self.like_count)
    }
}
