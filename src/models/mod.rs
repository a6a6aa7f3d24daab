//! Records exchanged with the cellar backend.

pub mod dashboard;
pub mod inventory_transaction;
pub mod operation_log;
pub mod pagination;
pub mod timestamp;
pub mod user;
pub mod wine;

use serde::{Deserialize, Serialize};

pub use dashboard::{
    AlertCounts, DashboardSummary, DistributionDimension, ImportReport, StockDistribution,
    StockTrend, TrendQuery,
};
pub use inventory_transaction::{
    InventoryTransaction, TransactionDraft, TransactionQuery, TransactionRequest, TransactionType,
};
pub use operation_log::{LogQuery, OperationLog};
pub use pagination::Page;
pub use user::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, NewUser, ProfileUpdate,
    ResetPasswordRequest, StatusToggle, TokenResponse, User, UserQuery, UserRole, UserUpdate,
};
pub use wine::{Wine, WineDraft, WinePatch, WineQuery, DEFAULT_LOW_STOCK_THRESHOLD};

/// Three-way stock badge used by the wine list filter.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StockStatus {
    Normal,
    Low,
    Out,
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}
