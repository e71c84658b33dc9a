use crate::config::Config;
use crate::error::Error;
use log::debug;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A report row: field name to raw value. Missing or null fields have no value.
pub type ReportRow = Map<String, Value>;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AdsApi: Send + Sync + 'static {
    /// Fetches the manager account the run executes under.
    async fn current_account(&self) -> Result<Account, Error>;

    /// Looks up one child account by its external ID.
    /// # Returns
    /// `Ok(None)` when no account matches.
    async fn find_account(&self, account_id: &str) -> Result<Option<Account>, Error>;

    /// Runs a report query against an account.
    /// # Arguments
    /// * `account` - The account selected for the query.
    /// * `query` - `SELECT fields FROM report WHERE predicates DURING start,end`.
    /// # Returns
    /// The report rows in the order the API returned them.
    async fn report(&self, account: &Account, query: &str) -> Result<Vec<ReportRow>, Error>;
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct Accounts {
    accounts: Vec<Account>,
}

#[derive(Serialize)]
struct ReportRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct ReportResponse {
    rows: Vec<ReportRow>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        ApiClient {
            client: Client::new(),
            base_url: config.api_url.to_string(),
            token: config.api_token.to_string(),
        }
    }

    fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| Error::UrlParsingFailed(url::ParseError::SetHostOnCannotBeABaseUrl))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.token)
    }
}

#[async_trait::async_trait]
impl AdsApi for ApiClient {
    async fn current_account(&self) -> Result<Account, Error> {
        let url = self.url(&["accounts", "current"])?;

        let resp = self
            .authorized(self.client.get(url))
            .send()
            .await?
            .error_for_status()?;

        Ok(resp.json::<Account>().await?)
    }

    async fn find_account(&self, account_id: &str) -> Result<Option<Account>, Error> {
        let mut url = self.url(&["accounts"])?;
        url.query_pairs_mut().append_pair("ids", account_id);

        let resp = self
            .authorized(self.client.get(url))
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            _ => {
                let accounts = resp.error_for_status()?.json::<Accounts>().await?;
                Ok(accounts.accounts.into_iter().next())
            }
        }
    }

    async fn report(&self, account: &Account, query: &str) -> Result<Vec<ReportRow>, Error> {
        let url = self.url(&["accounts", account.id.as_str(), "reports"])?;
        debug!("Querying account {}: {}", account.id, query);

        let resp = self
            .authorized(self.client.post(url))
            .json(&ReportRequest { query })
            .send()
            .await?
            .error_for_status()?;

        Ok(resp.json::<ReportResponse>().await?.rows)
    }
}
