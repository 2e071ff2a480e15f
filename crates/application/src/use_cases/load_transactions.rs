//! Load transactions use case.

use tally_domain::{TransactionQuery, TransactionsResponse};

use crate::api_client::ApiClient;
use crate::error::ApplicationResult;

const TRANSACTIONS_PATH: &str = "/budgeting/transactions";

/// Lists this year's transactions, optionally filtered.
pub struct LoadTransactions {
    api: ApiClient,
}

impl LoadTransactions {
    /// Creates a new `LoadTransactions` use case.
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Executes the use case. Empty filters are not sent.
    ///
    /// # Errors
    ///
    /// Returns an error if the transactions cannot be fetched or decoded.
    pub async fn execute(&self, query: &TransactionQuery) -> ApplicationResult<TransactionsResponse> {
        let response: TransactionsResponse =
            self.api.get_json(TRANSACTIONS_PATH, query.to_pairs()).await?;
        tracing::debug!(count = response.transactions_count, "Transactions loaded");
        Ok(response)
    }
}
