//! Authenticated API client for the expense management backend.
//!
//! - [`auth`]: session state, its durable mirror, and the route guard
//! - [`api`]: request dispatch, response envelope handling, typed endpoints
//! - [`config`]: base address and data directory resolution

pub mod api;
pub mod auth;
pub mod config;

pub use api::{ApiError, RequestDispatcher, RequestOptions, ResponseEnvelope};
pub use auth::{SessionStore, UserProfile};
pub use config::ClientConfig;
