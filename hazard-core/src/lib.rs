pub mod config;
pub mod error;
pub mod notify;
pub mod pipeline;
pub mod records;
pub mod sources;
pub mod store;

pub use config::{AppConfig, FeedConfig, FeedsConfig, NotifyConfig, SmsConfig};
pub use error::{DeliveryError, FetchError, PipelineError};
pub use notify::{DeliveryChannel, Notifier, SmsChannel, WebhookChannel};
pub use pipeline::{run_tick, Pipeline, PipelineHandle};
pub use records::{DisasterAlert, HazardRecord, QuakeEvent, Severity, WeatherWarning};
pub use sources::{NwsWeatherSource, ReliefWebSource, SourceAdapter, UsgsQuakeSource};
pub use store::CategoryStore;
