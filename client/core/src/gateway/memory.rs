//! In-Process Gateway
//!
//! [`MemoryAuth`] and [`MemoryBoard`] implement the gateway traits against
//! in-memory data. They back the headless surface and the test suites, so
//! they also carry scripting hooks:
//!
//! - call counting per operation
//! - queued [`Fault`]s returned instead of the next response
//! - [`Gate`]s that hold the next response until released, which lets a
//!   caller reorder concurrent responses deterministically
//!
//! A held call computes its response when it arrives and delivers it when
//! the gate opens, the way a slow network delivers a response the server
//! already produced.

use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::traits::{
    Ack, AuthGateway, DeleteRequest, EditPostRequest, LikeRequest, LoginRequest, LoginResponse,
    PostGateway, PostRequest, ReportRequest, ReportResponse,
};
use crate::errors::GatewayError;
use crate::models::{Post, PostId, UserId};

/// Gateway operations that can be counted, faulted or held
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    /// `AuthGateway::login`
    Login,
    /// `PostGateway::load_posts`
    LoadPosts,
    /// `PostGateway::load_post`
    LoadPost,
    /// `PostGateway::save_post`
    SavePost,
    /// `PostGateway::edit_post`
    EditPost,
    /// `PostGateway::delete_post`
    DeletePost,
    /// `PostGateway::like_post`
    LikePost,
    /// `PostGateway::report_post`
    ReportPost,
}

/// A scripted failure returned instead of the next response
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fault {
    /// Non-2xx status
    Status(u16, String),
    /// 2xx without a body
    EmptyBody,
    /// Transport failure with the given cause
    Transport(String),
}

impl Fault {
    fn into_error(self) -> GatewayError {
        match self {
            Self::Status(code, reason) => GatewayError::status(code, reason),
            Self::EmptyBody => GatewayError::EmptyBody,
            Self::Transport(cause) => GatewayError::transport(cause),
        }
    }
}

/// Handle on a held gateway call
///
/// Dropping the gate without releasing it also lets the call through.
pub struct Gate {
    arrived: Option<oneshot::Receiver<()>>,
    release: Option<oneshot::Sender<()>>,
}

impl Gate {
    /// Wait until the held call has arrived at the gateway
    pub async fn arrived(&mut self) {
        if let Some(rx) = self.arrived.take() {
            let _ = rx.await;
        }
    }

    /// Deliver the held response
    pub fn release(mut self) {
        if let Some(tx) = self.release.take() {
            let _ = tx.send(());
        }
    }
}

struct HeldCall {
    arrived: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

/// Per-operation call bookkeeping shared by both in-process gateways
#[derive(Default)]
struct Script {
    calls: HashMap<GatewayOp, usize>,
    faults: HashMap<GatewayOp, VecDeque<Fault>>,
    holds: HashMap<GatewayOp, VecDeque<HeldCall>>,
}

impl Script {
    /// Record a call; returns the scripted fault and hold for it, if any
    fn begin(&mut self, op: GatewayOp) -> (Option<Fault>, Option<HeldCall>) {
        *self.calls.entry(op).or_insert(0) += 1;
        let fault = self.faults.get_mut(&op).and_then(VecDeque::pop_front);
        let held = self.holds.get_mut(&op).and_then(VecDeque::pop_front);
        (fault, held)
    }

    fn calls(&self, op: GatewayOp) -> usize {
        self.calls.get(&op).copied().unwrap_or(0)
    }

    fn push_fault(&mut self, op: GatewayOp, fault: Fault) {
        self.faults.entry(op).or_default().push_back(fault);
    }

    fn hold(&mut self, op: GatewayOp) -> Gate {
        let (arrived_tx, arrived_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        self.holds.entry(op).or_default().push_back(HeldCall {
            arrived: arrived_tx,
            release: release_rx,
        });
        Gate {
            arrived: Some(arrived_rx),
            release: Some(release_tx),
        }
    }
}

/// Wait on a held call, if there is one
async fn deliver<T>(held: Option<HeldCall>, result: Result<T, GatewayError>) -> Result<T, GatewayError> {
    if let Some(held) = held {
        let _ = held.arrived.send(());
        let _ = held.release.await;
    }
    result
}

// ============================================================================
// MemoryAuth
// ============================================================================

struct AuthInner {
    accounts: HashMap<String, String>,
    script: Script,
}

/// In-process [`AuthGateway`] over a fixed account list
pub struct MemoryAuth {
    inner: Mutex<AuthInner>,
}

impl MemoryAuth {
    /// Create a gateway with no accounts
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(AuthInner {
                accounts: HashMap::new(),
                script: Script::default(),
            }),
        }
    }

    /// Create a gateway with a single account
    pub fn with_account(phone_number: impl Into<String>, password: impl Into<String>) -> Self {
        let auth = Self::new();
        auth.add_account(phone_number, password);
        auth
    }

    /// Register an account
    pub fn add_account(&self, phone_number: impl Into<String>, password: impl Into<String>) {
        self.inner
            .lock()
            .accounts
            .insert(phone_number.into(), password.into());
    }

    /// Number of login calls received
    pub fn login_calls(&self) -> usize {
        self.inner.lock().script.calls(GatewayOp::Login)
    }

    /// Fail the next login call with `fault`
    pub fn fail_next(&self, fault: Fault) {
        self.inner.lock().script.push_fault(GatewayOp::Login, fault);
    }

    /// Hold the next login response until the returned gate is released
    pub fn hold_next(&self) -> Gate {
        self.inner.lock().script.hold(GatewayOp::Login)
    }
}

impl Default for MemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthGateway for MemoryAuth {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, GatewayError> {
        let (result, held) = {
            let mut inner = self.inner.lock();
            let (fault, held) = inner.script.begin(GatewayOp::Login);
            let result = match fault {
                Some(fault) => Err(fault.into_error()),
                None => match inner.accounts.get(&request.phone_number) {
                    Some(password) if *password == request.password => {
                        Ok(LoginResponse::success("Logged in"))
                    }
                    _ => Ok(LoginResponse::rejected("Phone number or password is incorrect")),
                },
            };
            (result, held)
        };
        deliver(held, result).await
    }
}

// ============================================================================
// MemoryBoard
// ============================================================================

struct BoardData {
    posts: Vec<Post>,
    next_id: PostId,
    likes: HashSet<(PostId, UserId)>,
    reports: HashSet<(PostId, UserId)>,
}

impl BoardData {
    fn find_mut(&mut self, post_id: PostId) -> Result<&mut Post, GatewayError> {
        self.posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| GatewayError::status(404, "Not Found"))
    }
}

struct BoardInner {
    data: BoardData,
    script: Script,
}

/// In-process [`PostGateway`]
///
/// Newest posts come first. `is_liked` on each post reflects the user who
/// last toggled it, which is the current user in a single-user session.
pub struct MemoryBoard {
    inner: Mutex<BoardInner>,
}

impl MemoryBoard {
    /// Create an empty board
    #[must_use]
    pub fn new() -> Self {
        Self::with_posts(Vec::new())
    }

    /// Create a board seeded with posts (given in server order)
    #[must_use]
    pub fn with_posts(posts: Vec<Post>) -> Self {
        let next_id = posts.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        Self {
            inner: Mutex::new(BoardInner {
                data: BoardData {
                    posts,
                    next_id,
                    likes: HashSet::new(),
                    reports: HashSet::new(),
                },
                script: Script::default(),
            }),
        }
    }

    /// Current server-side posts
    pub fn posts(&self) -> Vec<Post> {
        self.inner.lock().data.posts.clone()
    }

    /// Insert a post directly, bypassing the gateway contract
    pub fn insert(&self, post: Post) {
        let mut inner = self.inner.lock();
        inner.data.next_id = inner.data.next_id.max(post.id + 1);
        inner.data.posts.insert(0, post);
    }

    /// Number of calls received for `op`
    pub fn calls(&self, op: GatewayOp) -> usize {
        self.inner.lock().script.calls(op)
    }

    /// Fail the next `op` call with `fault`
    pub fn fail_next(&self, op: GatewayOp, fault: Fault) {
        self.inner.lock().script.push_fault(op, fault);
    }

    /// Hold the next `op` response until the returned gate is released
    pub fn hold_next(&self, op: GatewayOp) -> Gate {
        self.inner.lock().script.hold(op)
    }

    /// Run one scripted call against the board data
    async fn call<T>(
        &self,
        op: GatewayOp,
        respond: impl FnOnce(&mut BoardData) -> Result<T, GatewayError>,
    ) -> Result<T, GatewayError> {
        let (result, held) = {
            let mut inner = self.inner.lock();
            let (fault, held) = inner.script.begin(op);
            let result = match fault {
                Some(fault) => Err(fault.into_error()),
                None => respond(&mut inner.data),
            };
            (result, held)
        };
        tracing::trace!(?op, ok = result.is_ok(), held = held.is_some(), "Memory board call");
        deliver(held, result).await
    }
}

impl Default for MemoryBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostGateway for MemoryBoard {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load_posts(&self) -> Result<Vec<Post>, GatewayError> {
        self.call(GatewayOp::LoadPosts, |data| Ok(data.posts.clone()))
            .await
    }

    async fn load_post(&self, post_id: PostId) -> Result<Post, GatewayError> {
        self.call(GatewayOp::LoadPost, |data| {
            data.find_mut(post_id).map(|post| post.clone())
        })
        .await
    }

    async fn save_post(&self, request: &PostRequest) -> Result<Ack, GatewayError> {
        self.call(GatewayOp::SavePost, |data| {
            let post = Post::new(
                data.next_id,
                request.title.clone(),
                request.content.clone(),
                request.user_id,
                request.industry.clone(),
            );
            data.next_id += 1;
            data.posts.insert(0, post);
            Ok(Ack::with_message("Post saved"))
        })
        .await
    }

    async fn edit_post(&self, request: &EditPostRequest) -> Result<Ack, GatewayError> {
        self.call(GatewayOp::EditPost, |data| {
            let post = data.find_mut(request.post_id)?;
            post.title.clone_from(&request.title);
            post.content.clone_from(&request.content);
            Ok(Ack::with_message("Post updated"))
        })
        .await
    }

    async fn delete_post(&self, request: &DeleteRequest) -> Result<Ack, GatewayError> {
        self.call(GatewayOp::DeletePost, |data| {
            let before = data.posts.len();
            data.posts.retain(|p| p.id != request.post_id);
            if data.posts.len() == before {
                return Err(GatewayError::status(404, "Not Found"));
            }
            data.likes.retain(|(post_id, _)| *post_id != request.post_id);
            Ok(Ack::with_message("Post deleted"))
        })
        .await
    }

    async fn like_post(&self, request: &LikeRequest) -> Result<Ack, GatewayError> {
        self.call(GatewayOp::LikePost, |data| {
            let key = (request.post_id, request.user_id);
            let now_liked = !data.likes.contains(&key);
            let post = data.find_mut(request.post_id)?;
            if now_liked {
                post.like_count += 1;
            } else {
                post.like_count = post.like_count.saturating_sub(1);
            }
            post.is_liked = now_liked;
            if now_liked {
                data.likes.insert(key);
            } else {
                data.likes.remove(&key);
            }
            Ok(Ack::default())
        })
        .await
    }

    async fn report_post(&self, request: &ReportRequest) -> Result<ReportResponse, GatewayError> {
        self.call(GatewayOp::ReportPost, |data| {
            data.find_mut(request.post_id)?;
            if data.reports.insert((request.post_id, request.user_id)) {
                Ok(ReportResponse::accepted(Some("Report received".to_string())))
            } else {
                Ok(ReportResponse::refused(Some("duplicate".to_string())))
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_auth_accepts_known_account() {
        let auth = MemoryAuth::with_account("0101234", "pw");
        let ok = auth.login(&LoginRequest::new("0101234", "pw")).await.unwrap();
        assert!(ok.is_success());
        let bad = auth.login(&LoginRequest::new("0101234", "nope")).await.unwrap();
        assert!(!bad.is_success());
        assert_eq!(auth.login_calls(), 2);
    }

    #[tokio::test]
    async fn test_fault_is_consumed_once() {
        let board = MemoryBoard::new();
        board.fail_next(GatewayOp::LoadPosts, Fault::Status(500, "boom".into()));

        let first = board.load_posts().await;
        assert!(matches!(first, Err(GatewayError::Status { code: 500, .. })));
        assert!(board.load_posts().await.unwrap().is_empty());
        assert_eq!(board.calls(GatewayOp::LoadPosts), 2);
    }

    #[tokio::test]
    async fn test_like_toggles_per_user() {
        let board = MemoryBoard::with_posts(vec![Post::new(1, "t", "c", 9, "Cafe")]);

        board.like_post(&LikeRequest::new(1, 5)).await.unwrap();
        let liked = board.load_post(1).await.unwrap();
        assert_eq!(liked.like_state(), (true, 1));

        board.like_post(&LikeRequest::new(1, 5)).await.unwrap();
        let unliked = board.load_post(1).await.unwrap();
        assert_eq!(unliked.like_state(), (false, 0));
    }

    #[tokio::test]
    async fn test_duplicate_report_is_refused() {
        let board = MemoryBoard::with_posts(vec![Post::new(1, "t", "c", 9, "Cafe")]);
        let request = ReportRequest::new(1, 5, "spam");

        assert!(board.report_post(&request).await.unwrap().success);
        let again = board.report_post(&request).await.unwrap();
        assert!(!again.success);
        assert_eq!(again.error.as_deref(), Some("duplicate"));
    }

    #[tokio::test]
    async fn test_missing_post_is_404() {
        let board = MemoryBoard::new();
        let err = board.load_post(42).await.unwrap_err();
        assert!(matches!(err, GatewayError::Status { code: 404, .. }));
    }

    #[tokio::test]
    async fn test_held_call_waits_for_release() {
        let board = std::sync::Arc::new(MemoryBoard::new());
        let mut gate = board.hold_next(GatewayOp::SavePost);

        let task = tokio::spawn({
            let board = std::sync::Arc::clone(&board);
            async move { board.save_post(&PostRequest::new("a", "b", 1, "Cafe")).await }
        });

        gate.arrived().await;
        // Response computed on arrival, delivered on release
        assert_eq!(board.posts().len(), 1);
        assert!(!task.is_finished());

        gate.release();
        let ack = task.await.unwrap().unwrap();
        assert_eq!(ack.message.as_deref(), Some("Post saved"));
    }
}
