//! Expense endpoints under `/api/expenses`.
//!
//! All calls require a signed-in session. Amounts are whole rupiah.

use super::dispatcher::{RequestDispatcher, RequestOptions};
use super::envelope::ResponseEnvelope;
use super::error::ApiError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const EXPENSES_PATH: &str = "/api/expenses";

/// Page size used when the caller asks for none.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

// ── Models ──────────────────────────────────────────────────────

/// Lifecycle state of an expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    AwaitingApproval,
    Approved,
    Rejected,
    AutoApproved,
    Completed,
}

impl ExpenseStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::AwaitingApproval => "awaiting_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::AutoApproved => "auto_approved",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ExpenseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "awaiting_approval" => Ok(Self::AwaitingApproval),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "auto_approved" => Ok(Self::AutoApproved),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown expense status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub amount_idr: i64,
    /// Server-formatted amount, e.g. `Rp 1.250.000`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_idr_formatted: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
    pub status: ExpenseStatus,
    #[serde(default)]
    pub requires_approval: bool,
    #[serde(default)]
    pub auto_approved: bool,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

/// Outcome recorded by an approver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Approved,
    Rejected,
}

/// A manager's decision on an expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Approval {
    pub id: String,
    pub expense_id: String,
    pub approver_id: String,
    pub status: ApprovalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseDetail {
    #[serde(flatten)]
    pub expense: Expense,
    #[serde(default)]
    pub approvals: Vec<Approval>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub amount_idr: i64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
}

/// Paging block of list responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageMetadata {
    pub current_page: u32,
    pub page_size: u32,
    pub total_item: u64,
    pub total_page: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Filter and paging for [`ExpenseApi::list`]. Zero page or size fall back
/// to the first page and the default size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseQuery {
    pub status: Option<ExpenseStatus>,
    pub page: u32,
    pub size: u32,
}

impl ExpenseQuery {
    fn to_query_string(&self) -> String {
        let page = self.page.max(1);
        let size = if self.size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.size
        };
        let mut query = format!("page={page}&size={size}");
        if let Some(status) = self.status {
            query.push_str("&status=");
            query.push_str(status.label());
        }
        query
    }
}

/// One page of expenses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpensePage {
    pub items: Vec<Expense>,
    pub paging: PageMetadata,
}

#[derive(Debug, Clone, Serialize)]
struct DecisionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
}

// ── Client ──────────────────────────────────────────────────────

pub struct ExpenseApi<'a> {
    dispatcher: &'a RequestDispatcher,
}

impl<'a> ExpenseApi<'a> {
    pub fn new(dispatcher: &'a RequestDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Submit a new expense.
    pub async fn create(&self, expense: &NewExpense) -> Result<Expense, ApiError> {
        let options = RequestOptions::post().json(expense)?;
        self.dispatcher.request(EXPENSES_PATH, options).await
    }

    /// List expenses visible to the current user, with paging.
    pub async fn list(&self, query: &ExpenseQuery) -> Result<ExpensePage, ApiError> {
        let path = format!("{EXPENSES_PATH}?{}", query.to_query_string());
        let envelope: ResponseEnvelope<Vec<Expense>, PageMetadata> = self
            .dispatcher
            .request_with_meta(&path, RequestOptions::get())
            .await?;
        Ok(ExpensePage {
            items: envelope.data.unwrap_or_default(),
            paging: envelope.paging.unwrap_or_default(),
        })
    }

    pub async fn get(&self, id: &str) -> Result<ExpenseDetail, ApiError> {
        self.dispatcher
            .request(&expense_path(id, None)?, RequestOptions::get())
            .await
    }

    /// Approve an expense awaiting approval (managers only).
    pub async fn approve(&self, id: &str, notes: Option<&str>) -> Result<Expense, ApiError> {
        self.decide(id, "approve", notes).await
    }

    /// Reject an expense awaiting approval (managers only).
    pub async fn reject(&self, id: &str, notes: Option<&str>) -> Result<Expense, ApiError> {
        self.decide(id, "reject", notes).await
    }

    /// Unauthenticated liveness check; returns the raw body.
    pub async fn health(&self) -> Result<Value, ApiError> {
        self.dispatcher
            .request("/health", RequestOptions::get().without_auth())
            .await
    }

    async fn decide(&self, id: &str, action: &str, notes: Option<&str>) -> Result<Expense, ApiError> {
        let options = RequestOptions::put().json(&DecisionRequest { notes })?;
        self.dispatcher
            .request(&expense_path(id, Some(action))?, options)
            .await
    }
}

/// Path of one expense, optionally followed by an action. The id is encoded
/// as a single segment so it can never leave `/api/expenses/`.
fn expense_path(id: &str, action: Option<&str>) -> Result<String, ApiError> {
    if id.is_empty() || id == "." || id == ".." {
        return Err(ApiError::InvalidRequest(format!("expense id '{id}'")));
    }
    let mut path = format!("{EXPENSES_PATH}/{}", urlencoding::encode(id));
    if let Some(action) = action {
        path.push('/');
        path.push_str(action);
    }
    Ok(path)
}
