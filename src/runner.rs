use crate::api_client::{Account, AdsApi, ApiClient};
use crate::config::{Config, INPUT_SHEET, OUTPUT_HEADER_ROW, OUTPUT_SHEET};
use crate::dates::{self, DateRange};
use crate::error::Error;
use crate::input::{load_config_rows, ConfigRow};
use crate::notifier::{self, notify_contacts, Notifier};
use crate::query::{build_filters, CampaignStatusPolicy};
use crate::report::{fetch_budget_report, fetch_currency_code, BudgetRecord};
use crate::sheet::{HeaderIndex, Sheet, Spreadsheet};
use crate::writer::{SheetWriter, WriteOutcome};
use chrono::Utc;
use chrono_tz::Tz;
use log::{info, warn};

const TIME_RUN: &str = "Time Run";
const TIME_RUN_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Deployment-time settings threaded through the row loop.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub policy: CampaignStatusPolicy,
    pub metrics: Vec<String>,
    pub time_zone: Option<Tz>,
    pub stamp_time_run: bool,
    pub continue_on_row_error: bool,
}

impl RunSettings {
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        Ok(RunSettings {
            policy: CampaignStatusPolicy::from_ignore_paused(config.ignore_paused_campaigns),
            metrics: config.metrics.clone(),
            time_zone: config
                .time_zone
                .as_deref()
                .map(dates::parse_time_zone)
                .transpose()?,
            stamp_time_run: config.stamp_time_run,
            continue_on_row_error: config.continue_on_row_error,
        })
    }
}

pub async fn run_budget_report(config: Config) -> Result<(), Error> {
    info!("Checking spreadsheet: {} is valid.", config.spreadsheet);
    let spreadsheet = Spreadsheet::open(&config.spreadsheet)?;
    let input = spreadsheet.sheet_by_name(INPUT_SHEET)?;
    let output = spreadsheet.sheet_by_name(OUTPUT_SHEET)?;
    spreadsheet.check_writable(OUTPUT_SHEET)?;

    let settings = RunSettings::from_config(&config)?;
    let api = ApiClient::new(&config);
    let notifier = notifier::from_config(&config);
    let mut writer = SheetWriter::new(output);

    process_rows(&api, notifier.as_ref(), &input, &mut writer, &settings).await
}

/// Processes every active input row in order. The first fatal row error ends the run,
/// leaving rows already written in place.
pub async fn process_rows<S: Sheet>(
    api: &dyn AdsApi,
    notifier: &dyn Notifier,
    input: &dyn Sheet,
    writer: &mut SheetWriter<S>,
    settings: &RunSettings,
) -> Result<(), Error> {
    let tz = match settings.time_zone {
        Some(tz) => tz,
        None => dates::parse_time_zone(&api.current_account().await?.time_zone)?,
    };
    let output_header = HeaderIndex::new(OUTPUT_SHEET, &writer.sheet().row(OUTPUT_HEADER_ROW));
    let time_run_column = output_header.position(TIME_RUN);
    if settings.stamp_time_run && time_run_column.is_none() {
        warn!("No '{}' column in the output sheet, not stamping", TIME_RUN);
    }

    let rows = load_config_rows(input)?;

    info!("Verifying each row of data...");
    for row in &rows {
        let outcome = match process_row(api, notifier, row, writer, settings, tz).await {
            Ok(outcome) => outcome,
            Err(err) if settings.continue_on_row_error && is_row_error(&err) => {
                warn!("Skipping account {}: {}", row.account_id, err);
                continue;
            }
            Err(err) => return Err(err),
        };

        if let (true, Some(column), WriteOutcome::Written(n)) =
            (settings.stamp_time_run, time_run_column, outcome)
        {
            if n > 0 {
                let now = Utc::now().with_timezone(&tz).format(TIME_RUN_FORMAT);
                if let Err(err) = writer.stamp_time_run(column, &now.to_string()) {
                    warn!("Could not stamp time run: {}", err);
                }
            }
        }
    }

    if writer.is_full() {
        warn!("Output sheet ran out of space, rerun in an empty spreadsheet");
    }
    info!("Success.");
    Ok(())
}

fn is_row_error(err: &Error) -> bool {
    matches!(
        err,
        Error::AccountNotFound { .. } | Error::InvalidDate { .. } | Error::InvalidDateRange { .. }
    )
}

async fn process_row<S: Sheet>(
    api: &dyn AdsApi,
    notifier: &dyn Notifier,
    row: &ConfigRow,
    writer: &mut SheetWriter<S>,
    settings: &RunSettings,
    tz: Tz,
) -> Result<WriteOutcome, Error> {
    let contacts = row.contacts();
    let account = resolve_account(api, notifier, row, &contacts).await?;
    info!("Processing account {} ({})", account.name, account.id);
    let dates = validate_dates(notifier, row, &contacts, tz).await?;

    let filters = build_filters(
        &dates,
        &row.campaign_name_contains,
        &row.campaign_name_does_not_contain,
        settings.policy,
    );
    let report = fetch_budget_report(api, &account, &filters, &settings.metrics).await?;

    if report.is_empty() {
        let body = format!(
            "No campaigns found with the given settings: {}",
            report.last_query.as_deref().unwrap_or_default()
        );
        notify_contacts(notifier, &contacts, &row.account_name, &body).await;
        return Ok(WriteOutcome::Written(0));
    }

    let currency_code = fetch_currency_code(api, &account).await?;
    let rows = output_rows(row, &report.records, &currency_code);
    info!("{:?}", rows);

    Ok(writer.write_rows(&rows))
}

async fn resolve_account(
    api: &dyn AdsApi,
    notifier: &dyn Notifier,
    row: &ConfigRow,
    contacts: &[String],
) -> Result<Account, Error> {
    match api.find_account(&row.account_id).await? {
        Some(account) => Ok(account),
        None => {
            let body = format!("Could not find account with ID: {}.", row.account_id);
            notify_contacts(notifier, contacts, &row.account_name, &body).await;
            Err(Error::AccountNotFound {
                account_id: row.account_id.clone(),
            })
        }
    }
}

async fn validate_dates(
    notifier: &dyn Notifier,
    row: &ConfigRow,
    contacts: &[String],
    tz: Tz,
) -> Result<DateRange, Error> {
    let today = dates::today_in(tz);
    match dates::normalize(&row.start_date, &row.end_date, tz, today) {
        Err(Error::InvalidDateRange {
            start_date,
            end_date,
        }) => {
            let body = format!(
                "Invalid date ranges (yyyyMMdd): End Date: {} precedes Start date: {}",
                end_date, start_date
            );
            notify_contacts(notifier, contacts, &row.account_name, &body).await;
            Err(Error::InvalidDateRange {
                start_date,
                end_date,
            })
        }
        result => result,
    }
}

/// Account name and ID, the budget fields, then the currency code.
pub fn output_rows(
    row: &ConfigRow,
    records: &[BudgetRecord],
    currency_code: &str,
) -> Vec<Vec<String>> {
    records
        .iter()
        .map(|record| {
            let mut cells = vec![row.account_name.clone(), row.account_id.clone()];
            cells.extend(record.values.iter().cloned());
            cells.push(currency_code.to_string());
            cells
        })
        .collect()
}
