//! Tally Domain - Core business types
//!
//! This crate defines the domain model for the Tally budgeting client.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod budgeting;
pub mod error;
pub mod request;
pub mod response;
pub mod route;
pub mod settings;

pub use auth::{
    AuthError, LoginCredential, LoginPayload, LoginResponse, User, UserResponse, token_preview,
};
pub use budgeting::{
    ApiEnvelope, BudgetingTransaction, CategoryShare, MonthlySpendingSummary, MonthlySummary,
    OverviewResponse, OverviewTransaction, TransactionQuery, TransactionsResponse, YearlySummary,
    rank_categories, round_balance, split_ranking,
};
pub use error::{DomainError, DomainResult};
pub use route::{GuardDecision, MenuItem, Route, menu_items};
pub use settings::{APP_STORAGE_KEY, StorageKey, ThemeMode, cloud_storage_supported};
