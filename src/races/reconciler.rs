use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use crate::config::{ApiConfig, RacesConfig};
use crate::data::expired::ExpiredRaceIds;
use crate::data::racing_api::RaceSource;
use crate::data::types::{RaceSummary, RacesResponse};
use crate::timing::calculator::calculate_race_time;
use crate::timing::clock::ClockReader;

#[derive(Debug, Clone)]
pub struct ReconcilerSettings {
    pub threshold_secs: i64,
    pub refetch_interval: Duration,
    pub fetch_batch_size: u32,
}

impl ReconcilerSettings {
    pub fn from_config(races: &RacesConfig, api: &ApiConfig) -> Self {
        Self {
            threshold_secs: races.expiration_threshold_secs,
            refetch_interval: races.refetch_interval(),
            fetch_batch_size: api.fetch_batch_size,
        }
    }
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self::from_config(&RacesConfig::default(), &ApiConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryState {
    Loading,
    /// Always the filtered collection, never the raw response
    Success(Vec<RaceSummary>),
    Error(String),
}

/// What the board gets to see on a given tick
#[derive(Debug, Clone, PartialEq)]
pub struct RacesView {
    pub races: Vec<RaceSummary>,
    state: ViewState,
}

#[derive(Debug, Clone, PartialEq)]
enum ViewState {
    Loading,
    Success,
    Error(String),
}

impl RacesView {
    pub fn loading() -> Self {
        Self {
            races: Vec::new(),
            state: ViewState::Loading,
        }
    }

    pub fn success(races: Vec<RaceSummary>) -> Self {
        Self {
            races,
            state: ViewState::Success,
        }
    }

    /// Errors never carry races
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            races: Vec::new(),
            state: ViewState::Error(message.into()),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state == ViewState::Loading
    }

    pub fn is_success(&self) -> bool {
        self.state == ViewState::Success
    }

    pub fn is_error(&self) -> bool {
        matches!(self.state, ViewState::Error(_))
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            ViewState::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Walk `next_to_go_ids` in order, dropping ids already expired and
/// ratcheting newly expired ones into `expired`.
pub fn filter_next_to_go(
    response: &RacesResponse,
    expired: &ExpiredRaceIds,
    threshold_secs: i64,
    now_seconds: i64,
) -> Vec<RaceSummary> {
    let mut active = Vec::with_capacity(response.data.next_to_go_ids.len());

    for race_id in &response.data.next_to_go_ids {
        let Some(race) = response.data.race_summaries.get(race_id) else {
            debug!("No summary for next-to-go id {}", race_id);
            continue;
        };

        if expired.contains(race_id) {
            continue;
        }

        let result = calculate_race_time(race.start_seconds(), threshold_secs, now_seconds);
        if result.should_remove {
            expired.insert(race_id);
            continue;
        }

        active.push(race.clone());
    }

    active
}

/// Owns the displayable race list and the session's expired-id memory
pub struct RaceListReconciler<S> {
    source: S,
    clock: ClockReader,
    settings: ReconcilerSettings,
    expired: ExpiredRaceIds,
    state: RwLock<QueryState>,
    fetch_lock: Mutex<()>,
    refetch_requested: Notify,
}

impl<S: RaceSource> RaceListReconciler<S> {
    pub fn new(source: S, clock: ClockReader, settings: ReconcilerSettings) -> Self {
        Self {
            source,
            clock,
            settings,
            expired: ExpiredRaceIds::new(),
            state: RwLock::new(QueryState::Loading),
            fetch_lock: Mutex::new(()),
            refetch_requested: Notify::new(),
        }
    }

    /// Fetch and filter once. Concurrent callers are serialized.
    pub async fn refetch(&self) {
        let _guard = self.fetch_lock.lock().await;

        let next = match self.source.fetch_next_races(self.settings.fetch_batch_size).await {
            Ok(response) => {
                let now = self.clock.now();
                let races = filter_next_to_go(
                    &response,
                    &self.expired,
                    self.settings.threshold_secs,
                    now,
                );
                info!(
                    "Fetched {} next-to-go races, {} displayable ({} expired this session)",
                    response.data.next_to_go_ids.len(),
                    races.len(),
                    self.expired.len()
                );
                QueryState::Success(races)
            }
            Err(e) => {
                warn!("Next races fetch failed: {}", e);
                QueryState::Error(e.to_string())
            }
        };

        *self.state.write().await = next;
    }

    /// Called by a row once it has expired. Only the first call per race id
    /// has any effect; it schedules a refetch.
    pub fn remove_expired_race(&self, race: &RaceSummary) -> bool {
        if !self.expired.insert(&race.race_id) {
            return false;
        }
        info!("Removing expired race {} ({} R{})", race.race_id, race.meeting_name, race.race_number);
        self.refetch_requested.notify_one();
        true
    }

    /// Wake the refetch loop now (user retry)
    pub fn request_refetch(&self) {
        self.refetch_requested.notify_one();
    }

    /// Current state. Expired ids are re-checked here so a removal shows up
    /// before the next fetch lands.
    pub async fn snapshot(&self) -> RacesView {
        match &*self.state.read().await {
            QueryState::Loading => RacesView::loading(),
            QueryState::Success(races) => RacesView::success(
                races
                    .iter()
                    .filter(|race| !self.expired.contains(&race.race_id))
                    .cloned()
                    .collect(),
            ),
            QueryState::Error(message) => RacesView::failed(message.clone()),
        }
    }

    #[cfg(test)]
    pub fn expired(&self) -> &ExpiredRaceIds {
        &self.expired
    }

    /// Periodic refetch loop. Fetches immediately, then on every interval
    /// or wake-up. Runs until the task is aborted.
    pub async fn run(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.settings.refetch_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = self.refetch_requested.notified() => {
                    interval.reset();
                }
            }
            self.refetch().await;
        }
    }
}
