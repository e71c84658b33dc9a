use clap::{ArgAction, Args as ClapArgs};

const DEFAULT_API_URL: &str = "https://ads-reporting.example.com";
const DEFAULT_METRICS: &str = "AverageCpc,Clicks,Conversions,Cost,Ctr,Impressions";

/// Value shipped in deployment templates; running with it is a configuration error.
pub const PLACEHOLDER_SPREADSHEET: &str = "YOUR-SPREADSHEET-HERE";

pub const INPUT_SHEET: &str = "Input";
pub const OUTPUT_SHEET: &str = "Output";

// 1-based sheet rows
pub const INPUT_HEADER_ROW: usize = 1;
pub const INPUT_DATA_ROW: usize = 3;
pub const OUTPUT_HEADER_ROW: usize = 2;

#[derive(ClapArgs, Clone, Debug)]
pub struct Config {
    /// Directory holding one CSV file per sheet (Input.csv, Output.csv)
    #[arg(long, env = "SPREADSHEET")]
    pub(crate) spreadsheet: String,

    #[arg(long, default_value = DEFAULT_API_URL, env = "API_URL")]
    pub(crate) api_url: String,

    #[arg(long, env = "API_TOKEN")]
    pub(crate) api_token: String,

    /// Mail relay endpoint; notifications are only logged when unset
    #[arg(long, env = "NOTIFY_URL")]
    pub(crate) notify_url: Option<String>,

    /// Set to false to include paused campaigns in the data
    #[arg(long, default_value_t = true, action = ArgAction::Set, env = "IGNORE_PAUSED_CAMPAIGNS")]
    pub(crate) ignore_paused_campaigns: bool,

    /// Metrics are written onto the output sheet in this order
    #[arg(long, default_value = DEFAULT_METRICS, value_delimiter = ',', env = "METRICS")]
    pub(crate) metrics: Vec<String>,

    /// Overrides the manager account's time zone
    #[arg(long, env = "TIME_ZONE")]
    pub(crate) time_zone: Option<String>,

    #[arg(long, default_value_t = false, action = ArgAction::Set, env = "STAMP_TIME_RUN")]
    pub(crate) stamp_time_run: bool,

    /// Log account and date failures and move on to the next row instead of aborting
    #[arg(long, default_value_t = false, action = ArgAction::Set, env = "CONTINUE_ON_ROW_ERROR")]
    pub(crate) continue_on_row_error: bool,
}

#[cfg(test)]
impl Config {
    pub fn for_tests(spreadsheet: &str) -> Self {
        Config {
            spreadsheet: spreadsheet.to_string(),
            api_url: "https://api.example.com".to_string(),
            api_token: "test_token".to_string(),
            notify_url: None,
            ignore_paused_campaigns: true,
            metrics: DEFAULT_METRICS.split(',').map(str::to_string).collect(),
            time_zone: None,
            stamp_time_run: false,
            continue_on_row_error: false,
        }
    }
}
