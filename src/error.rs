use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Problem with {spreadsheet}: {message}")]
    Configuration {
        spreadsheet: String,
        message: String,
    },

    #[error("Column '{column}' not found in the {sheet} sheet header")]
    MissingColumn { sheet: String, column: String },

    #[error("Could not find account with ID: {account_id}")]
    AccountNotFound { account_id: String },

    #[error("The date supplied {date} is invalid")]
    InvalidDate { date: String },

    #[error("Invalid date ranges: End Date {end_date} precedes Start Date {start_date}")]
    InvalidDateRange {
        start_date: String,
        end_date: String,
    },

    #[error("Unknown time zone '{0}'")]
    InvalidTimeZone(String),

    #[error("This action would increase the number of cells in the worksheet above the limit of {limit} cells")]
    SheetCapacityExceeded { limit: usize },

    #[error("Could not write to sheet: {message}")]
    SheetWrite { message: String },

    #[error("API responded with error: {0}")]
    ApiFailure(#[from] reqwest::Error),

    #[error("Failed to parse URL: {0}")]
    UrlParsingFailed(#[from] url::ParseError),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("{message}")]
    NoData { message: String },
}
