//! Budgeting API payloads and the derived figures shown in the overview.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Envelope wrapping every budgeting API response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Payload.
    pub data: T,
}

/// Transaction listed in the monthly overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewTransaction {
    /// Transaction id.
    pub id: i64,
    /// Absolute amount.
    pub amount: f64,
    /// Category name.
    pub category: String,
    /// True for income, false for spending.
    pub is_income: bool,
    /// Booking date.
    pub date: NaiveDate,
    /// Free-text description.
    pub description: String,
}

/// Income and spending totals of one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// Month number, 1-based.
    pub month: u32,
    /// Total income.
    pub income: f64,
    /// Total spending.
    pub spending: f64,
}

/// Spending of one category across the twelve months of a year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySpendingSummary {
    /// Category name.
    pub name: String,
    /// Twelve monthly amounts, January first.
    pub amounts: Vec<f64>,
}

/// Year-to-date summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlySummary {
    /// Calendar year.
    pub year: u32,
    /// One entry per month that has transactions.
    pub monthly_summaries: Vec<MonthlySummary>,
    /// Spending per category.
    pub monthly_spending_summaries: Vec<MonthlySpendingSummary>,
}

/// Payload of `GET /budgeting/overview`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    /// ISO currency code.
    pub currency: String,
    /// Current month, 1-based.
    pub month: u32,
    /// Income minus spending, rounded to cents.
    pub month_balance: f64,
    /// Income of the current month.
    pub month_income: f64,
    /// Spending of the current month.
    pub month_spending: f64,
    /// Transactions of the current month, newest first.
    pub month_transactions: Vec<OverviewTransaction>,
    /// Number of transactions this month.
    pub month_transactions_count: u32,
    /// Totals of the current month.
    pub month_summary: MonthlySummary,
    /// Year-to-date figures.
    pub year_summary: YearlySummary,
}

/// Transaction row of the statistics view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetingTransaction {
    /// Transaction id.
    pub id: i64,
    /// Absolute amount.
    pub amount: f64,
    /// Category name.
    pub category: String,
    /// True for income, false for spending.
    pub is_income: bool,
    /// Booking date.
    pub date: NaiveDate,
    /// Free-text description.
    pub description: String,
    /// Running balance up to and including this transaction.
    #[serde(rename = "accumulatdedAmount", alias = "accumulatedAmount")]
    pub accumulated_amount: f64,
}

/// Payload of `GET /budgeting/transactions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsResponse {
    /// ISO currency code.
    pub currency: String,
    /// Calendar year.
    pub year: u32,
    /// Number of transactions returned.
    pub transactions_count: u32,
    /// Every category seen this year, sorted.
    pub transactions_categories: Vec<String>,
    /// Matching transactions, newest first.
    pub transactions: Vec<BudgetingTransaction>,
}

/// Filters of `GET /budgeting/transactions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionQuery {
    /// Exact category name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Case-insensitive description substring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TransactionQuery {
    /// Returns the non-empty filters as query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        [("category", &self.category), ("description", &self.description)]
            .into_iter()
            .filter_map(|(name, value)| {
                value
                    .as_deref()
                    .filter(|v| !v.is_empty())
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }
}

/// A category's share of one month's spending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    /// Category name.
    pub name: String,
    /// Amount spent.
    pub value: f64,
    /// Percentage of the month's total spending.
    pub percentage: f64,
}

/// Ranks categories by spending in `month` (1-based).
///
/// Categories without spending that month are dropped; the rest are sorted
/// by amount, largest first, and given their share of the total. `month`
/// is 1-based; month 0 ranks nothing.
#[must_use]
pub fn rank_categories(summaries: &[MonthlySpendingSummary], month: u32) -> Vec<CategoryShare> {
    let Some(index) = month.checked_sub(1) else {
        return Vec::new();
    };
    let index = index as usize;

    let mut ranked: Vec<(String, f64)> = summaries
        .iter()
        .map(|s| (s.name.clone(), s.amounts.get(index).copied().unwrap_or(0.0)))
        .filter(|(_, value)| *value > 0.0)
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let total: f64 = ranked.iter().map(|(_, value)| value).sum();

    ranked
        .into_iter()
        .map(|(name, value)| CategoryShare {
            name,
            value,
            percentage: if total > 0.0 { value / total * 100.0 } else { 0.0 },
        })
        .collect()
}

/// Splits a ranking into the first `n` entries and the rest.
#[must_use]
pub fn split_ranking(ranking: &[CategoryShare], n: usize) -> (&[CategoryShare], &[CategoryShare]) {
    ranking.split_at(n.min(ranking.len()))
}

/// Income minus spending, rounded to cents.
#[must_use]
pub fn round_balance(income: f64, spending: f64) -> f64 {
    ((income - spending) * 100.0).round() / 100.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn summary(name: &str, month_index: usize, value: f64) -> MonthlySpendingSummary {
        let mut amounts = vec![0.0; 12];
        amounts[month_index] = value;
        MonthlySpendingSummary {
            name: name.to_string(),
            amounts,
        }
    }

    #[test]
    fn ranking_sorts_and_drops_empty_categories() {
        let summaries = vec![
            summary("Food", 2, 50.0),
            summary("Rent", 2, 150.0),
            summary("Travel", 5, 300.0),
        ];

        let ranked = rank_categories(&summaries, 3);
        let names: Vec<_> = ranked.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Rent", "Food"]);
        assert_eq!(ranked[0].percentage, 75.0);
        assert_eq!(ranked[1].percentage, 25.0);
    }

    #[test]
    fn ranking_of_month_without_spending_is_empty() {
        let summaries = vec![summary("Food", 0, 10.0)];
        assert!(rank_categories(&summaries, 12).is_empty());
        assert!(rank_categories(&[], 1).is_empty());
    }

    #[test]
    fn month_zero_ranks_nothing() {
        let summaries = vec![summary("Food", 0, 10.0)];
        assert!(rank_categories(&summaries, 0).is_empty());
        assert_eq!(rank_categories(&summaries, 1).len(), 1);
    }

    #[test]
    fn split_ranking_handles_short_lists() {
        let ranked = rank_categories(&[summary("Food", 0, 10.0)], 1);
        let (top, rest) = split_ranking(&ranked, 5);
        assert_eq!(top.len(), 1);
        assert!(rest.is_empty());
    }

    #[test]
    fn balance_is_rounded_to_cents() {
        assert_eq!(round_balance(10.126, 0.0), 10.13);
        assert_eq!(round_balance(10.0, 12.5), -2.5);
    }

    #[test]
    fn transaction_query_skips_empty_filters() {
        let query = TransactionQuery {
            category: Some("Food".to_string()),
            description: Some(String::new()),
        };
        assert_eq!(
            query.to_pairs(),
            vec![("category".to_string(), "Food".to_string())]
        );
        assert!(TransactionQuery::default().to_pairs().is_empty());
    }

    #[test]
    fn transactions_response_accepts_server_spelling() {
        let body = json!({
            "data": {
                "currency": "EUR",
                "year": 2025,
                "transactionsCount": 1,
                "transactionsCategories": ["Food"],
                "transactions": [{
                    "id": 1,
                    "amount": 12.0,
                    "category": "Food",
                    "isIncome": false,
                    "date": "2025-03-04",
                    "description": "Groceries",
                    "accumulatdedAmount": -12.0
                }]
            }
        });

        let parsed: ApiEnvelope<TransactionsResponse> = serde_json::from_value(body).unwrap();
        let tx = &parsed.data.transactions[0];
        assert_eq!(tx.accumulated_amount, -12.0);
        assert_eq!(tx.date, NaiveDate::from_ymd_opt(2025, 3, 4).unwrap());
    }

    #[test]
    fn overview_year_summary_is_snake_case() {
        let body = json!({
            "currency": "EUR",
            "month": 3,
            "monthBalance": 10.0,
            "monthIncome": 20.0,
            "monthSpending": 10.0,
            "monthTransactions": [],
            "monthTransactionsCount": 0,
            "monthSummary": {"month": 3, "income": 20.0, "spending": 10.0},
            "yearSummary": {
                "year": 2025,
                "monthly_summaries": [{"month": 3, "income": 20.0, "spending": 10.0}],
                "monthly_spending_summaries": [{"name": "Food", "amounts": [0.0, 0.0, 10.0]}]
            }
        });

        let overview: OverviewResponse = serde_json::from_value(body).unwrap();
        assert_eq!(overview.year_summary.monthly_summaries.len(), 1);
        let ranked = rank_categories(&overview.year_summary.monthly_spending_summaries, overview.month);
        assert_eq!(ranked[0].name, "Food");
    }
}
