//! Blindsjn Core - Headless State Synchronization for the community client
//!
//! This crate holds the part of the client that is real state-machine logic:
//! driving local state, dispatching asynchronous gateway calls, reconciling
//! server responses, and publishing exactly one UI condition at a time.
//! Rendering, navigation and styling live in whatever surface subscribes to
//! the published state.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Presentation Surface                      │
//! │        (subscribes to watch receivers, forwards intents)      │
//! └───────────────┬───────────────────────────────▲──────────────┘
//!                 │ intents                       │ published state
//! ┌───────────────▼───────────────────────────────┴──────────────┐
//! │                        ScreenScope                            │
//! │  ┌──────────────────────┐      ┌───────────────────────────┐ │
//! │  │   SessionMachine     │      │     PostSynchronizer      │ │
//! │  │ (login, auto-login)  │      │ (board CRUD, like, report)│ │
//! │  └──────┬────────┬──────┘      └─────────────┬─────────────┘ │
//! └─────────┼────────┼───────────────────────────┼───────────────┘
//!           │        │                           │
//!   ┌───────▼──┐ ┌───▼─────────────┐     ┌───────▼──────┐
//!   │AuthGateway│ │ CredentialStore │     │ PostGateway  │
//!   └──────────┘ └─────────────────┘     └──────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`SessionMachine`]: authentication form state and login orchestration
//! - [`PostSynchronizer`]: post list / detail state and board operations
//! - [`StateCell`]: the published, disposable state both machines own
//! - [`TagSelection`]: tag picker state for the post composer
//! - [`ScreenScope`]: task scope that cancels in-flight work on teardown
//! - [`AuthGateway`] / [`PostGateway`]: injected asynchronous RPC capabilities
//! - [`CredentialStore`] / [`NetworkMonitor`]: injected platform capabilities
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use blindsjn_core::{
//!     gateway::{MemoryAuth, MemoryBoard},
//!     MemoryCredentialStore, ScreenScope, SessionMachine, StaticNetwork,
//!     ClientConfig,
//! };
//!
//! let config = ClientConfig::from_env();
//! let session = SessionMachine::new(
//!     Arc::new(MemoryAuth::with_account("01012345678", "secret")),
//!     Arc::new(MemoryCredentialStore::new()),
//!     Arc::new(StaticNetwork::online()),
//!     &config.session,
//! );
//! let scope = ScreenScope::new(session);
//! let mut state = scope.machine().subscribe();
//! scope.launch(|m| async move { m.login("01012345678", "secret").await });
//! state.changed().await?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod credentials;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod posts;
pub mod scope;
pub mod session;
pub mod state;
pub mod tags;

pub use config::{
    default_config_path, load_config, load_config_from_path, ClientConfig, ClientToml,
    ConfigError, ConfigOverrides, ConfigSource, PostsConfig, SessionConfig,
};
pub use credentials::{
    CredentialStore, Credentials, MemoryCredentialStore, NetworkMonitor, StaticNetwork,
};
pub use errors::{GatewayError, SyncError};
pub use gateway::{
    Ack, AuthGateway, DeleteRequest, EditPostRequest, LikeRequest, LoginRequest, LoginResponse,
    PostGateway, PostRequest, ReportRequest, ReportResponse,
};
pub use models::{Post, PostId, UserId};
pub use posts::{FetchOrdering, LikeOutcome, PostCollectionState, PostSynchronizer};
pub use scope::{Disposable, ScreenScope};
pub use session::{LoginOutcome, Popup, SessionMachine, SessionPhase, SessionState};
pub use state::StateCell;
pub use tags::{TagSelection, TagSelectionState};
