use crate::config::{INPUT_DATA_ROW, INPUT_HEADER_ROW, INPUT_SHEET};
use crate::error::Error;
use crate::sheet::{HeaderIndex, Sheet};

pub const STATUS: &str = "Status";
pub const ACCOUNT_ID: &str = "Account ID";
pub const ACCOUNT_NAME: &str = "Account Name";
pub const CAMPAIGN_NAME_CONTAINS: &str = "Campaign Name Contains";
pub const CAMPAIGN_NAME_DOES_NOT_CONTAIN: &str = "Campaign Name Doesn't Contain";
pub const CONTACT_EMAILS: &str = "Contact email(s)";
pub const START_DATE: &str = "Start Date";
pub const END_DATE: &str = "End Date";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowStatus {
    Active,
    Paused,
    /// Any other text; treated like an active row.
    Other(String),
}

impl From<&str> for RowStatus {
    fn from(value: &str) -> Self {
        match value.trim() {
            "Active" => RowStatus::Active,
            "Paused" => RowStatus::Paused,
            other => RowStatus::Other(other.to_string()),
        }
    }
}

/// One configured account row from the input sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRow {
    pub status: RowStatus,
    pub account_id: String,
    pub account_name: String,
    pub campaign_name_contains: String,
    pub campaign_name_does_not_contain: String,
    pub contact_emails: String,
    pub start_date: String,
    pub end_date: String,
}

impl ConfigRow {
    pub fn is_paused(&self) -> bool {
        self.status == RowStatus::Paused
    }

    /// Contact addresses, trimmed, empty entries dropped.
    pub fn contacts(&self) -> Vec<String> {
        split_list(&self.contact_emails)
    }
}

/// Splits a comma-separated cell into trimmed, non-empty items.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

struct InputColumns {
    status: usize,
    account_id: usize,
    account_name: usize,
    contains: usize,
    does_not_contain: usize,
    contact_emails: usize,
    start_date: usize,
    end_date: usize,
}

impl InputColumns {
    fn resolve(index: &HeaderIndex) -> Result<Self, Error> {
        Ok(InputColumns {
            status: index.require(STATUS)?,
            account_id: index.require(ACCOUNT_ID)?,
            account_name: index.require(ACCOUNT_NAME)?,
            contains: index.require(CAMPAIGN_NAME_CONTAINS)?,
            does_not_contain: index.require(CAMPAIGN_NAME_DOES_NOT_CONTAIN)?,
            contact_emails: index.require(CONTACT_EMAILS)?,
            start_date: index.require(START_DATE)?,
            end_date: index.require(END_DATE)?,
        })
    }

    fn read(&self, row: &[String]) -> ConfigRow {
        let cell = |idx: usize| row.get(idx).map(|v| v.trim().to_string()).unwrap_or_default();

        ConfigRow {
            status: RowStatus::from(cell(self.status).as_str()),
            account_id: cell(self.account_id),
            account_name: cell(self.account_name),
            campaign_name_contains: cell(self.contains),
            campaign_name_does_not_contain: cell(self.does_not_contain),
            contact_emails: cell(self.contact_emails),
            start_date: cell(self.start_date),
            end_date: cell(self.end_date),
        }
    }
}

/// Reads the configured rows of the input sheet, skipping paused and blank rows.
///
/// # Errors
/// [`Error::MissingColumn`] when one of the expected headers is absent.
pub fn load_config_rows(sheet: &dyn Sheet) -> Result<Vec<ConfigRow>, Error> {
    let header = sheet.row(INPUT_HEADER_ROW);
    let columns = InputColumns::resolve(&HeaderIndex::new(INPUT_SHEET, &header))?;

    Ok(sheet
        .rows_from(INPUT_DATA_ROW)
        .iter()
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .map(|row| columns.read(row))
        .filter(|row| !row.is_paused())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::MockSheet;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn header() -> Vec<String> {
        strings(&[
            "End Date",
            "Account Name",
            "Account ID",
            "Status",
            "Campaign Name Contains",
            "Campaign Name Doesn't Contain",
            "Contact email(s)",
            "Start Date",
        ])
    }

    fn mock_sheet(header: Vec<String>, rows: Vec<Vec<String>>) -> MockSheet {
        let mut sheet = MockSheet::new();
        sheet
            .expect_row()
            .withf(|row| *row == INPUT_HEADER_ROW)
            .return_const(header);
        sheet
            .expect_rows_from()
            .withf(|row| *row == INPUT_DATA_ROW)
            .return_const(rows);
        sheet
    }

    #[test]
    fn test_load_config_rows_by_header_name() {
        let rows = vec![strings(&[
            "2024-01-31",
            "Shoes Ltd",
            "123-456-7890",
            "Active",
            "Brand",
            "Generic, Test",
            "a@example.com, b@example.com",
            "2024-01-01",
        ])];
        let sheet = mock_sheet(header(), rows);

        let config_rows = load_config_rows(&sheet).unwrap();
        assert_eq!(
            config_rows,
            vec![ConfigRow {
                status: RowStatus::Active,
                account_id: "123-456-7890".to_string(),
                account_name: "Shoes Ltd".to_string(),
                campaign_name_contains: "Brand".to_string(),
                campaign_name_does_not_contain: "Generic, Test".to_string(),
                contact_emails: "a@example.com, b@example.com".to_string(),
                start_date: "2024-01-01".to_string(),
                end_date: "2024-01-31".to_string(),
            }]
        );
        assert_eq!(
            config_rows[0].contacts(),
            vec!["a@example.com", "b@example.com"]
        );
    }

    #[test]
    fn test_load_config_rows_missing_header() {
        let mut header = header();
        header.retain(|h| h != "Contact email(s)");
        let sheet = mock_sheet(header, vec![]);

        assert!(matches!(
            load_config_rows(&sheet).unwrap_err(),
            Error::MissingColumn { column, .. } if column == CONTACT_EMAILS
        ));
    }

    #[test]
    fn test_load_config_rows_short_and_blank_rows() {
        let rows = vec![
            strings(&["", "", "", "", ""]),
            strings(&["", "Short", "1", "Active"]),
        ];
        let sheet = mock_sheet(header(), rows);

        let config_rows = load_config_rows(&sheet).unwrap();
        assert_eq!(config_rows.len(), 1);
        assert_eq!(config_rows[0].account_name, "Short");
        assert_eq!(config_rows[0].start_date, "");
        assert!(config_rows[0].contacts().is_empty());
    }

    #[test]
    fn test_load_config_rows_skips_paused() {
        let rows = vec![
            strings(&["", "Paused Ltd", "1", "Paused"]),
            strings(&["", "Other Ltd", "2", "Enabled"]),
        ];
        let sheet = mock_sheet(header(), rows);

        let config_rows = load_config_rows(&sheet).unwrap();
        assert_eq!(config_rows.len(), 1);
        assert_eq!(config_rows[0].account_id, "2");
        assert_eq!(config_rows[0].status, RowStatus::Other("Enabled".to_string()));
    }

    #[test]
    fn test_row_status_from_text() {
        assert_eq!(RowStatus::from(" Paused "), RowStatus::Paused);
        assert_eq!(RowStatus::from("Active"), RowStatus::Active);
        assert_eq!(RowStatus::from("paused"), RowStatus::Other("paused".to_string()));
    }

    #[test]
    fn test_split_list() {
        assert!(split_list("").is_empty());
        assert!(split_list(" , ").is_empty());
        assert_eq!(split_list("Brand, Generic"), vec!["Brand", "Generic"]);
    }
}
