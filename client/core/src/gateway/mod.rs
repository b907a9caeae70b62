//! Async Gateway
//!
//! The asynchronous RPC capability the state machines talk to. The core only
//! depends on the request/response contract per operation; the wire format is
//! whatever an implementation chooses.
//!
//! # Available Gateways
//!
//! - **Memory**: in-process board and account list, used by the headless
//!   surface and by tests (call counting, fault injection, held responses)
//!
//! # Usage
//!
//! ```ignore
//! use blindsjn_core::gateway::{MemoryBoard, PostGateway};
//!
//! let board = MemoryBoard::new();
//! let posts = board.load_posts().await?;
//! ```

mod memory;
mod traits;

pub use memory::{Fault, Gate, GatewayOp, MemoryAuth, MemoryBoard};
pub use traits::{
    Ack, AuthGateway, DeleteRequest, EditPostRequest, LikeRequest, LoginRequest, LoginResponse,
    PostGateway, PostRequest, ReportRequest, ReportResponse,
};
