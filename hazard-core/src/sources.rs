use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use crate::config::FeedConfig;
use crate::error::FetchError;
use crate::records::{DisasterAlert, HazardRecord, QuakeEvent, WeatherWarning};

/// One upstream feed. Adapters are stateless: every tick re-invokes `fetch`
/// with the shared HTTP client and gets a fully normalized batch back.
#[async_trait]
pub trait SourceAdapter: Send + Sync + 'static {
    type Record: HazardRecord;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
    fn poll_interval(&self) -> Duration;
    async fn fetch(&self, client: &Client) -> Result<Vec<Self::Record>, FetchError>;
}

async fn fetch_json(client: &Client, url: &str, timeout: Duration) -> Result<Value, FetchError> {
    let response = client.get(url).timeout(timeout).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status, url.to_owned()));
    }
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// USGS earthquake summary feed (GeoJSON).
pub struct UsgsQuakeSource {
    config: FeedConfig,
}

impl UsgsQuakeSource {
    pub fn new(config: FeedConfig) -> Self {
        Self { config }
    }

    fn normalize(&self, payload: &Value) -> Result<Vec<QuakeEvent>, FetchError> {
        let features = payload
            .get("features")
            .and_then(Value::as_array)
            .ok_or(FetchError::Shape("missing features array"))?;

        let mut records = Vec::with_capacity(features.len());
        for feature in features {
            match QuakeEvent::from_feature(feature) {
                Some(record) => records.push(record),
                None => warn!(
                    source = self.name(),
                    raw_id = ?feature.get("id"),
                    "dropping malformed earthquake entry"
                ),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl SourceAdapter for UsgsQuakeSource {
    type Record = QuakeEvent;

    fn name(&self) -> &'static str {
        "usgs-quakes"
    }

    fn poll_interval(&self) -> Duration {
        self.config.poll_interval()
    }

    async fn fetch(&self, client: &Client) -> Result<Vec<QuakeEvent>, FetchError> {
        let payload = fetch_json(client, &self.config.url, self.config.request_timeout()).await?;
        self.normalize(&payload)
    }
}

/// NWS active weather alerts feed.
pub struct NwsWeatherSource {
    config: FeedConfig,
}

impl NwsWeatherSource {
    pub fn new(config: FeedConfig) -> Self {
        Self { config }
    }

    fn normalize(&self, payload: &Value) -> Result<Vec<WeatherWarning>, FetchError> {
        let features = payload
            .get("features")
            .and_then(Value::as_array)
            .ok_or(FetchError::Shape("missing features array"))?;

        let mut records = Vec::with_capacity(features.len());
        for feature in features {
            match WeatherWarning::from_feature(feature) {
                Some(record) => records.push(record),
                None => warn!(
                    source = self.name(),
                    raw_id = ?feature.get("id"),
                    "dropping malformed weather alert entry"
                ),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl SourceAdapter for NwsWeatherSource {
    type Record = WeatherWarning;

    fn name(&self) -> &'static str {
        "nws-weather"
    }

    fn poll_interval(&self) -> Duration {
        self.config.poll_interval()
    }

    async fn fetch(&self, client: &Client) -> Result<Vec<WeatherWarning>, FetchError> {
        let payload = fetch_json(client, &self.config.url, self.config.request_timeout()).await?;
        self.normalize(&payload)
    }
}

/// ReliefWeb disaster registry listing.
pub struct ReliefWebSource {
    config: FeedConfig,
}

impl ReliefWebSource {
    pub fn new(config: FeedConfig) -> Self {
        Self { config }
    }

    fn normalize(&self, payload: &Value) -> Result<Vec<DisasterAlert>, FetchError> {
        let entries = payload
            .get("data")
            .and_then(Value::as_array)
            .ok_or(FetchError::Shape("missing data array"))?;

        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            match DisasterAlert::from_entry(entry) {
                Some(record) => records.push(record),
                None => warn!(
                    source = self.name(),
                    raw_id = ?entry.get("id"),
                    "dropping malformed disaster entry"
                ),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl SourceAdapter for ReliefWebSource {
    type Record = DisasterAlert;

    fn name(&self) -> &'static str {
        "reliefweb-disasters"
    }

    fn poll_interval(&self) -> Duration {
        self.config.poll_interval()
    }

    async fn fetch(&self, client: &Client) -> Result<Vec<DisasterAlert>, FetchError> {
        let payload = fetch_json(client, &self.config.url, self.config.request_timeout()).await?;
        self.normalize(&payload)
    }
}
