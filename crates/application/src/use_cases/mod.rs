//! Application use cases (business logic orchestration).

mod fetch_current_user;
mod load_overview;
mod load_transactions;
mod navigate;

pub use fetch_current_user::FetchCurrentUser;
pub use load_overview::{LoadOverview, LoadOverviewOutput, TOP_CATEGORIES};
pub use load_transactions::LoadTransactions;
pub use navigate::Navigate;
