use std::collections::{HashMap, HashSet};
use crate::data::types::RaceSummary;
use crate::timing::calculator::calculate_race_time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierState {
    /// Armed: the next expiration will fire
    Active,
    /// Fired for the current expiration episode
    Notified,
}

/// Edge detector for one row's `should_remove` verdict.
///
/// Fires at most once per contiguous run of `should_remove == true`, and
/// re-arms as soon as the verdict drops back to false.
#[derive(Debug, Clone)]
pub struct ExpirationNotifier {
    state: NotifierState,
    start_seconds: i64,
}

impl ExpirationNotifier {
    pub fn new(start_seconds: i64) -> Self {
        Self {
            state: NotifierState::Active,
            start_seconds,
        }
    }

    /// Feed the latest verdict. Returns true when the removal callback must fire.
    pub fn update(&mut self, should_remove: bool) -> bool {
        match (self.state, should_remove) {
            (NotifierState::Active, true) => {
                self.state = NotifierState::Notified;
                true
            }
            (NotifierState::Notified, false) => {
                self.state = NotifierState::Active;
                false
            }
            _ => false,
        }
    }

    #[allow(dead_code)]
    pub fn state(&self) -> NotifierState {
        self.state
    }

    pub fn start_seconds(&self) -> i64 {
        self.start_seconds
    }
}

/// Per-race notifiers owned by whoever owns the visible race list
pub struct ExpirationTracker {
    threshold_secs: i64,
    notifiers: HashMap<String, ExpirationNotifier>,
}

impl ExpirationTracker {
    pub fn new(threshold_secs: i64) -> Self {
        Self {
            threshold_secs,
            notifiers: HashMap::new(),
        }
    }

    /// Run one tick over the visible rows and return the races that just
    /// expired. Rows that left the view drop their notifier; a row whose
    /// advertised start changed starts over from `Active`.
    pub fn observe<'a, I>(&mut self, rows: I, now_seconds: i64) -> Vec<RaceSummary>
    where
        I: IntoIterator<Item = &'a RaceSummary>,
    {
        let mut seen = HashSet::new();
        let mut expired = Vec::new();

        for race in rows {
            let start = race.start_seconds();
            let notifier = self
                .notifiers
                .entry(race.race_id.clone())
                .or_insert_with(|| ExpirationNotifier::new(start));

            if notifier.start_seconds() != start {
                *notifier = ExpirationNotifier::new(start);
            }

            let result = calculate_race_time(start, self.threshold_secs, now_seconds);
            if notifier.update(result.should_remove) {
                expired.push(race.clone());
            }
            seen.insert(race.race_id.as_str());
        }

        self.notifiers.retain(|id, _| seen.contains(id.as_str()));
        expired
    }

    #[allow(dead_code)]
    pub fn state_of(&self, race_id: &str) -> Option<NotifierState> {
        self.notifiers.get(race_id).map(ExpirationNotifier::state)
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}
