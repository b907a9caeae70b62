//! Post Collection Synchronizer
//!
//! Owns the in-memory post list and the selected post, runs board operations
//! against the injected [`PostGateway`], and reconciles local state with
//! what the server confirms.
//!
//! # Consistency model
//!
//! - The list is refreshed wholesale (`load_posts` replaces it, never merges).
//! - Mutations are not applied locally; the list or post is reloaded after
//!   the server acknowledges them.
//! - Operations are not serialized. Two overlapping fetches race, and with
//!   [`FetchOrdering::LastWriteWins`] whichever response is applied last
//!   wins. [`FetchOrdering::DiscardStale`] tags each fetch with a sequence
//!   number and drops responses older than the newest one already applied.
//! - `status_message` and `report_result` are transient: each operation
//!   overwrites them, and consumers clear them explicitly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::PostsConfig;
use crate::errors::{GatewayError, SyncError};
use crate::gateway::{
    Ack, DeleteRequest, EditPostRequest, LikeRequest, PostGateway, PostRequest, ReportRequest,
    ReportResponse,
};
use crate::models::{Post, PostId, UserId};
use crate::scope::Disposable;
use crate::state::StateCell;

/// Report result when the server accepts without a message
pub const REPORT_ACCEPTED: &str = "Your report has been received.";
/// Report result when the server refuses without an error text
pub const REPORT_FAILED: &str = "The report could not be filed.";
/// Report result when the server answers without a body
pub const REPORT_EMPTY_RESPONSE: &str = "The server response was empty.";

/// Published board state
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCollectionState {
    /// Posts in server order
    pub posts: Vec<Post>,
    /// Post shown on the detail screen
    pub selected_post: Option<Post>,
    /// Outcome text of the last operation, until cleared
    pub status_message: Option<String>,
    /// Outcome text of the last report, until cleared
    pub report_result: Option<String>,
}

impl PostCollectionState {
    /// Find a post in the list
    #[must_use]
    pub fn post(&self, post_id: PostId) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == post_id)
    }
}

/// How overlapping fetches of the same kind are reconciled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOrdering {
    /// Apply every response in arrival order
    #[default]
    LastWriteWins,
    /// Drop responses to fetches older than the newest applied one
    DiscardStale,
}

impl std::str::FromStr for FetchOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "last_write_wins" => Ok(Self::LastWriteWins),
            "discard_stale" => Ok(Self::DiscardStale),
            other => Err(format!("unknown fetch ordering: {other}")),
        }
    }
}

/// Result of a like toggle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeOutcome {
    /// Whether the server accepted the toggle
    pub succeeded: bool,
    /// Like state after the toggle, or the last known one on failure
    pub is_liked: bool,
    /// Like count after the toggle, or the last known one on failure
    pub like_count: u32,
}

/// Monotonic ticket counter for one kind of fetch
#[derive(Default)]
struct FetchSequence {
    issued: AtomicU64,
    applied: AtomicU64,
}

impl FetchSequence {
    fn issue(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Whether a response to `ticket` may be applied; records it if so
    ///
    /// Called under the state lock, so check and record are one step.
    fn admit(&self, ticket: u64, ordering: FetchOrdering) -> bool {
        let applied = self.applied.load(Ordering::Acquire);
        if ordering == FetchOrdering::DiscardStale && ticket < applied {
            return false;
        }
        self.applied.store(applied.max(ticket), Ordering::Release);
        true
    }
}

/// The board state machine
pub struct PostSynchronizer<G: PostGateway> {
    gateway: Arc<G>,
    state: StateCell<PostCollectionState>,
    ordering: FetchOrdering,
    list_fetches: FetchSequence,
    detail_fetches: FetchSequence,
}

impl<G: PostGateway> PostSynchronizer<G> {
    /// Create a synchronizer with an empty collection
    pub fn new(gateway: Arc<G>, config: &PostsConfig) -> Self {
        Self {
            gateway,
            state: StateCell::default(),
            ordering: config.fetch_ordering,
            list_fetches: FetchSequence::default(),
            detail_fetches: FetchSequence::default(),
        }
    }

    /// Current state
    pub fn state(&self) -> PostCollectionState {
        self.state.snapshot()
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<PostCollectionState> {
        self.state.subscribe()
    }

    /// Configured fetch ordering
    pub fn ordering(&self) -> FetchOrdering {
        self.ordering
    }

    // ============================================
    // Transient fields
    // ============================================

    /// Show a status message
    pub fn set_status_message(&self, message: impl Into<String>) {
        let message = message.into();
        self.state.update(|s| s.status_message = Some(message));
    }

    /// Clear the status message
    pub fn clear_status_message(&self) {
        self.state.update(|s| s.status_message = None);
    }

    /// Clear the report result
    pub fn clear_report_result(&self) {
        self.state.update(|s| s.report_result = None);
    }

    fn fail(&self, operation: &str, cause: &SyncError) {
        tracing::warn!(gateway = self.gateway.name(), operation, error = %cause, "Post operation failed");
        self.set_status_message(format!("Failed to {operation}: {cause}"));
    }

    // ============================================
    // Fetches
    // ============================================

    /// Reload the full list
    ///
    /// On failure the list is left as it was and a status message is shown.
    pub async fn load_posts(&self) {
        self.refresh_posts().await;
    }

    /// Reload one post into `selected_post`
    ///
    /// On failure the previous selection is left as it was.
    pub async fn load_post_by_id(&self, post_id: PostId) {
        self.refresh_post(post_id).await;
    }

    /// Fetch the list and apply it; returns the fetched list if it was applied
    async fn refresh_posts(&self) -> Option<Vec<Post>> {
        let ticket = self.list_fetches.issue();
        tracing::debug!(ticket, "Loading posts");
        let result = self.gateway.load_posts().await.map_err(SyncError::from);

        let mut applied = None;
        self.state.update_if(|s| {
            if !self.list_fetches.admit(ticket, self.ordering) {
                tracing::debug!(ticket, "Discarding stale post list");
                return false;
            }
            match &result {
                Ok(posts) => {
                    s.posts.clone_from(posts);
                    applied = Some(posts.clone());
                }
                Err(cause) => s.status_message = Some(format!("Failed to load posts: {cause}")),
            }
            true
        });

        if let Err(cause) = &result {
            tracing::warn!(gateway = self.gateway.name(), error = %cause, "Loading posts failed");
        }
        applied
    }

    /// Fetch one post and select it; returns the post if it was applied
    async fn refresh_post(&self, post_id: PostId) -> Option<Post> {
        let ticket = self.detail_fetches.issue();
        tracing::debug!(post_id, ticket, "Loading post");
        let result = self.gateway.load_post(post_id).await.map_err(SyncError::from);

        let mut applied = None;
        self.state.update_if(|s| {
            if !self.detail_fetches.admit(ticket, self.ordering) {
                tracing::debug!(post_id, ticket, "Discarding stale post detail");
                return false;
            }
            match &result {
                Ok(post) => {
                    s.selected_post = Some(post.clone());
                    applied = Some(post.clone());
                }
                Err(cause) => s.status_message = Some(format!("Failed to load post: {cause}")),
            }
            true
        });

        if let Err(cause) = &result {
            tracing::warn!(gateway = self.gateway.name(), post_id, error = %cause, "Loading post failed");
        }
        applied
    }

    // ============================================
    // Mutations
    // ============================================

    /// Shared handling of an acknowledged mutation
    ///
    /// A 2xx without a body still counts as success, just without a message.
    fn acknowledge(&self, operation: &str, result: Result<Ack, GatewayError>) -> bool {
        match result {
            Ok(ack) => {
                self.state.update(|s| s.status_message = ack.message);
                true
            }
            Err(GatewayError::EmptyBody) => {
                self.state.update(|s| s.status_message = None);
                true
            }
            Err(e) => {
                self.fail(operation, &SyncError::from(e));
                false
            }
        }
    }

    /// Create a post, then reload the list
    pub async fn save_post(&self, title: &str, content: &str, user_id: UserId, industry: &str) {
        let request = PostRequest::new(title, content, user_id, industry);
        let result = self.gateway.save_post(&request).await;
        if self.acknowledge("save post", result) {
            tracing::info!(user_id, industry, "Post saved");
            self.load_posts().await;
        }
    }

    /// Edit a post, then reload it
    pub async fn edit_post(&self, post_id: PostId, title: &str, content: &str) {
        let request = EditPostRequest::new(post_id, title, content);
        let result = self.gateway.edit_post(&request).await;
        if self.acknowledge("edit post", result) {
            tracing::info!(post_id, "Post edited");
            self.load_post_by_id(post_id).await;
        }
    }

    /// Delete a post, then reload the list
    pub async fn delete_post(&self, post_id: PostId) {
        let result = self.gateway.delete_post(&DeleteRequest::new(post_id)).await;
        if self.acknowledge("delete post", result) {
            tracing::info!(post_id, "Post deleted");
            self.load_posts().await;
        }
    }

    // ============================================
    // Likes
    // ============================================

    /// Optimistically bump a post's like count in the list, without a server call
    ///
    /// Nothing reconciles this; [`PostSynchronizer::toggle_like`] is the
    /// server-backed path.
    pub fn increment_like(&self, post_id: PostId) {
        self.adjust_like_count(post_id, |count| count.saturating_add(1));
    }

    /// Optimistically drop a post's like count in the list, never below zero
    pub fn decrement_like(&self, post_id: PostId) {
        self.adjust_like_count(post_id, |count| count.saturating_sub(1));
    }

    fn adjust_like_count(&self, post_id: PostId, f: impl Fn(u32) -> u32) {
        self.state.update_if(|s| {
            let Some(post) = s.posts.iter_mut().find(|p| p.id == post_id) else {
                return false;
            };
            post.like_count = f(post.like_count);
            true
        });
    }

    /// Last known like state for a post: the selection if it is that post,
    /// otherwise the list entry
    fn last_known_like(&self, post_id: PostId) -> Option<(bool, u32)> {
        self.state.read(|s| {
            s.selected_post
                .as_ref()
                .filter(|p| p.id == post_id)
                .or_else(|| s.post(post_id))
                .map(Post::like_state)
        })
    }

    /// Toggle a like on the server and reconcile
    ///
    /// On success the post and the list are reloaded concurrently and both
    /// settle before this returns. On failure the pre-toggle state is
    /// reported.
    pub async fn toggle_like(&self, post_id: PostId, user_id: UserId) -> LikeOutcome {
        let before = self.last_known_like(post_id);
        let result = self.gateway.like_post(&LikeRequest::new(post_id, user_id)).await;

        match result {
            Ok(_) | Err(GatewayError::EmptyBody) => {
                let (detail, list) =
                    tokio::join!(self.refresh_post(post_id), self.refresh_posts());
                let (is_liked, like_count) = detail
                    .as_ref()
                    .map(Post::like_state)
                    .or_else(|| {
                        list.as_deref()
                            .and_then(|posts| posts.iter().find(|p| p.id == post_id))
                            .map(Post::like_state)
                    })
                    .or_else(|| self.last_known_like(post_id))
                    .unwrap_or_default();
                tracing::debug!(post_id, user_id, is_liked, like_count, "Like toggled");
                LikeOutcome {
                    succeeded: true,
                    is_liked,
                    like_count,
                }
            }
            Err(e) => {
                let cause = SyncError::from(e);
                tracing::warn!(post_id, user_id, error = %cause, "Like toggle failed");
                let (is_liked, like_count) = before.unwrap_or_default();
                LikeOutcome {
                    succeeded: false,
                    is_liked,
                    like_count,
                }
            }
        }
    }

    // ============================================
    // Reports
    // ============================================

    /// Report a post; the outcome lands in `report_result`
    pub async fn report_post(&self, post_id: PostId, user_id: UserId, reason: &str) {
        let request = ReportRequest::new(post_id, user_id, reason);
        let text = match self.gateway.report_post(&request).await {
            Ok(ReportResponse {
                success: true,
                message,
                ..
            }) => message.unwrap_or_else(|| REPORT_ACCEPTED.to_string()),
            Ok(ReportResponse {
                success: false,
                error,
                ..
            }) => error.unwrap_or_else(|| REPORT_FAILED.to_string()),
            Err(GatewayError::EmptyBody) => REPORT_EMPTY_RESPONSE.to_string(),
            Err(GatewayError::Status { code, reason }) => {
                tracing::warn!(post_id, code, %reason, "Report rejected by server");
                format!("Server error: {code}")
            }
            Err(GatewayError::Transport(e)) => {
                tracing::warn!(post_id, error = %e, "Report failed");
                format!("Error while reporting: {e}")
            }
        };
        self.state.update(|s| s.report_result = Some(text));
    }
}

impl<G: PostGateway> Disposable for PostSynchronizer<G> {
    fn dispose(&self) {
        self.state.dispose();
    }
}
