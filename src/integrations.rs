//! Weather, news and mail integrations.

use crate::config::IntegrationsConfig;
use crate::error::{ArjunError, Result};
use std::time::Duration;
use tracing::debug;

/// Number of headlines requested from the news service.
pub const HEADLINE_COUNT: usize = 5;

/// Mail queries the assistant understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailRequest {
    Summary,
    Search(String),
    Important,
    Attachments { days: u32 },
}

/// Third-party data sources.
pub trait Integrations: Send + Sync {
    /// Short conditions line for `city` (e.g. `"Sunny +31°C ↗11km/h"`).
    ///
    /// # Errors
    ///
    /// Returns an error when the service is unreachable or rejects the city.
    fn weather(&self, city: &str) -> Result<String>;

    /// Current top headline titles.
    ///
    /// # Errors
    ///
    /// Returns an error when the news service is unconfigured or unreachable.
    fn headlines(&self) -> Result<Vec<String>>;

    /// Spoken-ready answer for a mail query.
    ///
    /// # Errors
    ///
    /// Returns an error when no mail account is connected.
    fn mail(&self, request: &MailRequest) -> Result<String>;
}

/// HTTP-backed integrations (wttr.in and NewsAPI).
pub struct HttpIntegrations {
    weather_url: String,
    news_api_key: String,
    news_country: String,
    news_url: String,
    agent: ureq::Agent,
}

impl HttpIntegrations {
    #[must_use]
    pub fn new(config: &IntegrationsConfig) -> Self {
        Self {
            weather_url: config.weather_url.trim_end_matches('/').to_owned(),
            news_api_key: config.news_api_key.clone(),
            news_country: config.news_country.clone(),
            news_url: "https://newsapi.org".to_owned(),
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(config.timeout_s.max(1)))
                .build(),
        }
    }

    /// Point news requests at a different host.
    #[must_use]
    pub fn with_news_url(mut self, url: impl Into<String>) -> Self {
        self.news_url = url.into().trim_end_matches('/').to_owned();
        self
    }
}

impl Integrations for HttpIntegrations {
    fn weather(&self, city: &str) -> Result<String> {
        let url = format!(
            "{}/{}?format=%C+%t+%w",
            self.weather_url,
            urlencoding::encode(city.trim())
        );
        debug!(%url, "fetching weather");
        let text = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| ArjunError::Integration(format!("weather request failed: {e}")))?
            .into_string()
            .map_err(|e| ArjunError::Integration(format!("weather response unreadable: {e}")))?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ArjunError::Integration(format!("no weather for '{city}'")));
        }
        Ok(text.to_owned())
    }

    fn headlines(&self) -> Result<Vec<String>> {
        if self.news_api_key.is_empty() {
            return Err(ArjunError::Integration(
                "news API key is not configured".to_owned(),
            ));
        }
        let page_size = HEADLINE_COUNT.to_string();
        let text = self
            .agent
            .get(&format!("{}/v2/top-headlines", self.news_url))
            .query("country", &self.news_country)
            .query("language", "en")
            .query("pageSize", &page_size)
            .set("X-Api-Key", &self.news_api_key)
            .call()
            .map_err(|e| ArjunError::Integration(format!("news request failed: {e}")))?
            .into_string()
            .map_err(|e| ArjunError::Integration(format!("news response unreadable: {e}")))?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| ArjunError::Integration(format!("invalid news response: {e}")))?;
        parse_headlines(&value)
    }

    fn mail(&self, _request: &MailRequest) -> Result<String> {
        Err(ArjunError::Integration(
            "mail is not configured".to_owned(),
        ))
    }
}

/// Titles from a NewsAPI `top-headlines` body.
fn parse_headlines(value: &serde_json::Value) -> Result<Vec<String>> {
    if value["status"].as_str() != Some("ok") {
        let message = value["message"].as_str().unwrap_or("unknown error");
        return Err(ArjunError::Integration(format!("news service error: {message}")));
    }
    let titles: Vec<String> = value["articles"]
        .as_array()
        .map(|articles| {
            articles
                .iter()
                .filter_map(|a| a["title"].as_str())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();
    Ok(titles)
}
