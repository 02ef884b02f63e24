use dashmap::DashSet;
use tracing::debug;

/// Race ids that have expired during this session.
///
/// Membership only ever grows. An id that lands here is suppressed from every
/// later fetch, even if the upstream still lists it inside the grace window.
pub struct ExpiredRaceIds {
    ids: DashSet<String>,
}

impl ExpiredRaceIds {
    pub fn new() -> Self {
        Self {
            ids: DashSet::new(),
        }
    }

    /// Returns true only for the call that actually added the id
    pub fn insert(&self, race_id: &str) -> bool {
        if self.ids.contains(race_id) {
            return false;
        }
        let added = self.ids.insert(race_id.to_string());
        if added {
            debug!("Race {} marked expired", race_id);
        }
        added
    }

    pub fn contains(&self, race_id: &str) -> bool {
        self.ids.contains(race_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl Default for ExpiredRaceIds {
    fn default() -> Self {
        Self::new()
    }
}
