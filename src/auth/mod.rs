//! Client-side authentication state.
//!
//! Provides:
//! - [`SessionStore`]: the token + profile pair of the current user
//! - [`SessionStorage`] backends: file, in-memory, and a no-op backend for
//!   non-interactive contexts
//! - [`RouteGuard`]: redirect decision for anonymous users

pub mod guard;
pub mod session;
pub mod storage;

pub use guard::{GuardDecision, RouteGuard, LOGIN_PATH};
pub use session::{AuthPayload, Session, SessionStore, UserProfile};
pub use storage::{FileStorage, MemoryStorage, NoopStorage, SessionStorage, SESSION_RECORD_KEY};
