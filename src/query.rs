use crate::dates::DateRange;
use crate::input::split_list;

pub const BUDGET_REPORT: &str = "BUDGET_PERFORMANCE_REPORT";
pub const ACCOUNT_REPORT: &str = "ACCOUNT_PERFORMANCE_REPORT";

/// Fields selected ahead of the configured metrics in every budget report.
pub const BUDGET_FIELDS: [&str; 3] = ["BudgetName", "BudgetId", "BudgetReferenceCount"];
pub const AMOUNT_FIELD: &str = "Amount";

/// Which associated campaigns a query keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignStatusPolicy {
    EnabledOnly,
    EnabledAndPaused,
}

impl CampaignStatusPolicy {
    pub fn from_ignore_paused(ignore_paused_campaigns: bool) -> Self {
        if ignore_paused_campaigns {
            CampaignStatusPolicy::EnabledOnly
        } else {
            CampaignStatusPolicy::EnabledAndPaused
        }
    }

    fn predicate(self) -> &'static str {
        match self {
            CampaignStatusPolicy::EnabledOnly => "AssociatedCampaignStatus = ENABLED",
            CampaignStatusPolicy::EnabledAndPaused => {
                "AssociatedCampaignStatus IN ['ENABLED','PAUSED']"
            }
        }
    }
}

fn quote(term: &str) -> String {
    format!("\"{}\"", term.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Builds the WHERE ... DURING filters for one account.
///
/// Each include term yields its own filter so results are the union over terms;
/// exclude terms are ANDed into every filter.
pub fn build_filters(
    dates: &DateRange,
    campaign_name_contains: &str,
    campaign_name_does_not_contain: &str,
    policy: CampaignStatusPolicy,
) -> Vec<String> {
    let mut base = format!("WHERE BudgetStatus != REMOVED AND {}", policy.predicate());
    for term in split_list(campaign_name_does_not_contain) {
        base.push_str(" AND AssociatedCampaignName DOES_NOT_CONTAIN_IGNORE_CASE ");
        base.push_str(&quote(&term));
    }

    let contains = split_list(campaign_name_contains);
    let filters = if contains.is_empty() {
        vec![base]
    } else {
        contains
            .iter()
            .map(|term| {
                format!(
                    "{} AND AssociatedCampaignName CONTAINS_IGNORE_CASE {}",
                    base,
                    quote(term)
                )
            })
            .collect()
    };

    filters
        .into_iter()
        .map(|filter| format!("{} DURING {}", filter, dates))
        .collect()
}

/// Ordered field list of the budget report: fixed budget fields, metrics, then Amount.
pub fn budget_fields(metrics: &[String]) -> Vec<String> {
    BUDGET_FIELDS
        .iter()
        .map(|f| f.to_string())
        .chain(metrics.iter().cloned())
        .chain(std::iter::once(AMOUNT_FIELD.to_string()))
        .collect()
}

pub fn budget_report_query(fields: &[String], filter: &str) -> String {
    format!("SELECT {} FROM {} {}", fields.join(","), BUDGET_REPORT, filter)
}

pub fn currency_query() -> String {
    format!("SELECT AccountCurrencyCode FROM {}", ACCOUNT_REPORT)
}
