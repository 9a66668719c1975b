//! HTTP access to the expense backend.
//!
//! ## Design
//! - [`RequestDispatcher`] composes headers from the caller's options and the
//!   [`SessionStore`](crate::auth::SessionStore), performs one reqwest call
//!   and hands the result to the [`envelope`] resolvers.
//! - Responses may be bare JSON or wrapped in `{message, data, paging,
//!   errors}`; the shape is detected per response, never declared.
//! - Failures are returned as [`ApiError`], never logged or retried here.

pub mod auth;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod expenses;

pub use auth::AuthApi;
pub use dispatcher::{RequestDispatcher, RequestOptions};
pub use envelope::{classify, RawResponse, ResponseEnvelope, ResponseShape};
pub use error::ApiError;
pub use expenses::{
    Approval, ApprovalStatus, Expense, ExpenseApi, ExpenseDetail, ExpensePage, ExpenseQuery, ExpenseStatus,
    NewExpense, PageMetadata,
};
