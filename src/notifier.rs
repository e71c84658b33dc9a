use crate::config::Config;
use crate::error::Error;
use log::{info, warn};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;

const SUBJECT_PREFIX: &str = "Bid Strategy Performance Monitor: error with account";

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Sends a message to every address in `to`. Delivery is not confirmed.
    async fn send(&self, to: &[String], subject: &str, body: &str) -> Result<(), Error>;
}

pub fn account_error_subject(account_name: &str) -> String {
    format!("{} {}", SUBJECT_PREFIX, account_name)
}

/// Sends through `notifier`, logging instead of failing when delivery breaks.
pub async fn notify_contacts(
    notifier: &dyn Notifier,
    to: &[String],
    account_name: &str,
    body: &str,
) {
    if to.is_empty() {
        warn!("No contacts for account {}, not sent: {}", account_name, body);
        return;
    }
    let subject = account_error_subject(account_name);
    if let Err(err) = notifier.send(to, &subject, body).await {
        warn!("Failed to notify {}: {}", to.join(","), err);
    }
}

/// Posts messages to a mail relay as JSON.
#[derive(Clone)]
pub struct MailRelayNotifier {
    client: Client,
    url: String,
    token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MailMessage<'a> {
    to: String,
    subject: &'a str,
    html_body: &'a str,
}

impl MailRelayNotifier {
    pub fn new(url: &str, config: &Config) -> Self {
        MailRelayNotifier {
            client: Client::new(),
            url: url.to_string(),
            token: config.api_token.to_string(),
        }
    }

    fn request(&self, message: &MailMessage<'_>) -> RequestBuilder {
        self.client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(message)
    }
}

#[async_trait::async_trait]
impl Notifier for MailRelayNotifier {
    async fn send(&self, to: &[String], subject: &str, body: &str) -> Result<(), Error> {
        let message = MailMessage {
            to: to.join(","),
            subject,
            html_body: body,
        };

        self.request(&message)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

/// Writes messages to the log; used when no relay is configured.
#[derive(Clone, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &[String], subject: &str, body: &str) -> Result<(), Error> {
        info!("Notification to {}: {}: {}", to.join(","), subject, body);
        Ok(())
    }
}

pub fn from_config(config: &Config) -> Box<dyn Notifier> {
    match &config.notify_url {
        Some(url) => Box::new(MailRelayNotifier::new(url, config)),
        None => Box::new(LogNotifier),
    }
}
