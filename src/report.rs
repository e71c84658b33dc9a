use crate::api_client::{Account, AdsApi, ReportRow};
use crate::error::Error;
use crate::query::{budget_fields, budget_report_query, currency_query};
use log::debug;
use serde_json::Value;
use std::collections::HashSet;

/// Stand-in for a field the report left empty.
pub const NOT_AVAILABLE: &str = "N/A";

const BUDGET_ID: &str = "BudgetId";
const CURRENCY_CODE: &str = "AccountCurrencyCode";

/// One budget row, values ordered like the report's field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetRecord {
    pub budget_id: String,
    pub values: Vec<String>,
}

/// Deduplicated budget rows of one account.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BudgetReport {
    pub records: Vec<BudgetRecord>,
    /// Last filter evaluated, quoted in the "no campaigns" notification.
    pub last_query: Option<String>,
}

impl BudgetReport {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn field_value(row: &ReportRow, field: &str) -> String {
    match row.get(field) {
        None | Some(Value::Null) => NOT_AVAILABLE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Merges per-query result sets keeping the first row seen for each budget.
pub fn dedupe_budgets<I>(result_sets: I, fields: &[String]) -> Vec<BudgetRecord>
where
    I: IntoIterator<Item = Vec<ReportRow>>,
{
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for row in result_sets.into_iter().flatten() {
        let budget_id = field_value(&row, BUDGET_ID);
        if seen.contains(&budget_id) {
            continue;
        }
        seen.insert(budget_id.clone());
        records.push(BudgetRecord {
            budget_id,
            values: fields.iter().map(|f| field_value(&row, f)).collect(),
        });
    }

    records
}

/// Issues one budget report per filter, in order, and merges the results.
pub async fn fetch_budget_report(
    api: &dyn AdsApi,
    account: &Account,
    filters: &[String],
    metrics: &[String],
) -> Result<BudgetReport, Error> {
    let fields = budget_fields(metrics);
    let mut result_sets = Vec::with_capacity(filters.len());

    for filter in filters {
        let rows = api
            .report(account, &budget_report_query(&fields, filter))
            .await?;
        debug!("{} rows for account {} with {}", rows.len(), account.id, filter);
        result_sets.push(rows);
    }

    let records = dedupe_budgets(result_sets, &fields);
    debug!(
        "Budgets kept for account {}: {}",
        account.id,
        records
            .iter()
            .map(|record| record.budget_id.as_str())
            .collect::<Vec<_>>()
            .join(",")
    );

    Ok(BudgetReport {
        records,
        last_query: filters.last().cloned(),
    })
}

pub async fn fetch_currency_code(api: &dyn AdsApi, account: &Account) -> Result<String, Error> {
    let rows = api.report(account, &currency_query()).await?;
    rows.first()
        .map(|row| field_value(row, CURRENCY_CODE))
        .ok_or_else(|| Error::NoData {
            message: format!("No currency code reported for account {}", account.id),
        })
}
