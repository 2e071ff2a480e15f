//! Load overview use case.

use tally_domain::{CategoryShare, OverviewResponse, rank_categories, split_ranking};

use crate::api_client::ApiClient;
use crate::error::ApplicationResult;

/// Number of categories shown before the ranking is expanded.
pub const TOP_CATEGORIES: usize = 5;

const OVERVIEW_PATH: &str = "/budgeting/overview";

/// Output of [`LoadOverview`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOverviewOutput {
    /// The overview as sent by the server.
    pub overview: OverviewResponse,
    /// Spending categories of the current month, largest first.
    pub ranking: Vec<CategoryShare>,
}

impl LoadOverviewOutput {
    /// Returns the leading categories and the collapsed rest.
    #[must_use]
    pub fn split_ranking(&self) -> (&[CategoryShare], &[CategoryShare]) {
        split_ranking(&self.ranking, TOP_CATEGORIES)
    }
}

/// Loads the monthly overview and ranks this month's spending.
pub struct LoadOverview {
    api: ApiClient,
}

impl LoadOverview {
    /// Creates a new `LoadOverview` use case.
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Executes the use case.
    ///
    /// # Errors
    ///
    /// Returns an error if the overview cannot be fetched or decoded.
    pub async fn execute(&self) -> ApplicationResult<LoadOverviewOutput> {
        let overview: OverviewResponse = self.api.get_json(OVERVIEW_PATH, Vec::new()).await?;
        let ranking = rank_categories(
            &overview.year_summary.monthly_spending_summaries,
            overview.month,
        );
        tracing::debug!(
            month = overview.month,
            transactions = overview.month_transactions_count,
            categories = ranking.len(),
            "Overview loaded"
        );
        Ok(LoadOverviewOutput { overview, ranking })
    }
}
