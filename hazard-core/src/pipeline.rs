use std::sync::Arc;

use reqwest::Client;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::PipelineError;
use crate::notify::Notifier;
use crate::records::{DisasterAlert, HazardRecord, QuakeEvent, WeatherWarning};
use crate::sources::{NwsWeatherSource, ReliefWebSource, SourceAdapter, UsgsQuakeSource};
use crate::store::CategoryStore;

/// The fetch → merge → notify pipeline. One instance owns the per-category
/// stores for the process; the read-serving layer gets store handles from
/// here rather than reaching into shared globals.
pub struct Pipeline {
    config: AppConfig,
    client: Client,
    notifier: Arc<Notifier>,
    quakes: CategoryStore<QuakeEvent>,
    weather: CategoryStore<WeatherWarning>,
    disasters: CategoryStore<DisasterAlert>,
}

impl Pipeline {
    pub fn new(config: AppConfig, client: Client, notifier: Notifier) -> Self {
        let capacity = config.cache_capacity;
        Self {
            config,
            client,
            notifier: Arc::new(notifier),
            quakes: CategoryStore::new(capacity),
            weather: CategoryStore::new(capacity),
            disasters: CategoryStore::new(capacity),
        }
    }

    pub fn quakes(&self) -> CategoryStore<QuakeEvent> {
        self.quakes.clone()
    }

    pub fn weather(&self) -> CategoryStore<WeatherWarning> {
        self.weather.clone()
    }

    pub fn disasters(&self) -> CategoryStore<DisasterAlert> {
        self.disasters.clone()
    }

    /// Start one polling loop per source as background tasks.
    pub fn spawn(&self) -> PipelineHandle {
        let (cancel_tx, _) = broadcast::channel(1);

        let joins = vec![
            spawn_source_loop(
                UsgsQuakeSource::new(self.config.feeds.quakes.clone()),
                self.quakes.clone(),
                self.client.clone(),
                self.notifier.clone(),
                cancel_tx.subscribe(),
            ),
            spawn_source_loop(
                NwsWeatherSource::new(self.config.feeds.weather.clone()),
                self.weather.clone(),
                self.client.clone(),
                self.notifier.clone(),
                cancel_tx.subscribe(),
            ),
            spawn_source_loop(
                ReliefWebSource::new(self.config.feeds.disasters.clone()),
                self.disasters.clone(),
                self.client.clone(),
                self.notifier.clone(),
                cancel_tx.subscribe(),
            ),
        ];

        PipelineHandle { cancel_tx, joins }
    }
}

pub struct PipelineHandle {
    cancel_tx: broadcast::Sender<()>,
    joins: Vec<JoinHandle<()>>,
}

impl PipelineHandle {
    /// Signal every source loop to stop after its current tick and wait for
    /// them to finish; in-flight work is never aborted.
    pub async fn stop(self) -> Result<(), PipelineError> {
        let _ = self.cancel_tx.send(());
        for join in self.joins {
            join.await?;
        }
        Ok(())
    }
}

fn spawn_source_loop<A>(
    adapter: A,
    store: CategoryStore<A::Record>,
    client: Client,
    notifier: Arc<Notifier>,
    mut cancel_rx: broadcast::Receiver<()>,
) -> JoinHandle<()>
where
    A: SourceAdapter,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(adapter.poll_interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel_rx.recv() => {
                    info!(source = adapter.name(), "source loop shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    run_tick(&adapter, &store, &client, &notifier).await;
                }
            }
        }
    })
}

/// One full tick for one source: fetch, merge into the category cache,
/// compute the not-yet-notified subset, dispatch an alert per fresh record.
/// Every failure is absorbed here so the loop always reaches its next tick.
pub async fn run_tick<A>(
    adapter: &A,
    store: &CategoryStore<A::Record>,
    client: &Client,
    notifier: &Notifier,
) where
    A: SourceAdapter,
{
    let batch = match adapter.fetch(client).await {
        Ok(batch) => batch,
        Err(err) => {
            warn!(source = adapter.name(), error = %err, "fetch failed, skipping tick");
            return;
        }
    };

    let fetched = batch.len();
    let cached = store.merge(batch.clone()).await;
    let fresh = store.seen_delta(&batch).await;

    for record in &fresh {
        notifier
            .notify(&record.alert_title(), &record.alert_body())
            .await;
    }

    info!(
        source = adapter.name(),
        fetched,
        cached,
        fresh = fresh.len(),
        "tick complete"
    );
}
