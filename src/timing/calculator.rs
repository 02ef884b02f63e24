use chrono::Utc;

/// Races closer than this to their start are flagged as starting soon
pub const STARTING_SOON_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceTimeResult {
    /// Countdown or elapsed text shown in the Time column
    pub time_string: String,
    /// Seconds until start: positive = future, zero or negative = elapsed
    pub time_diff: i64,
    pub has_started: bool,
    /// Started at least `threshold` seconds ago
    pub should_remove: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceStatus {
    Upcoming,
    StartingSoon,
    Started,
}

impl RaceTimeResult {
    pub fn status(&self) -> RaceStatus {
        if self.has_started {
            RaceStatus::Started
        } else if self.time_diff < STARTING_SOON_SECS {
            RaceStatus::StartingSoon
        } else {
            RaceStatus::Upcoming
        }
    }
}

/// Classify a race against an explicit `now`.
///
/// A race starting exactly at `now` counts as started. Removal is
/// boundary-inclusive, and a non-positive threshold removes a race as soon
/// as it starts.
pub fn calculate_race_time(start_seconds: i64, threshold_seconds: i64, now_seconds: i64) -> RaceTimeResult {
    let time_diff = start_seconds.saturating_sub(now_seconds);
    let has_started = time_diff <= 0;
    let elapsed = time_diff.unsigned_abs();

    let should_remove = has_started && i128::from(elapsed) >= i128::from(threshold_seconds);

    let time_string = if has_started {
        format!("Started {}m {}s ago", elapsed / 60, elapsed % 60)
    } else {
        format!("{}m {}s To Start", time_diff / 60, time_diff % 60)
    };

    RaceTimeResult {
        time_string,
        time_diff,
        has_started,
        should_remove,
    }
}

/// Current Unix time in whole seconds
pub fn now_seconds() -> i64 {
    Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_started_and_remove_invariants() {
        let starts = [-5_000, -61, -60, -1, 0, 1, 59, 60, 61, 1_000, 1_700_000_000];
        let thresholds = [1, 30, 60, 120, 3_600];
        let nows = [-1_000, 0, 1, 60, 1_000, 1_700_000_060];

        for &s in &starts {
            for &t in &thresholds {
                for &n in &nows {
                    let result = calculate_race_time(s, t, n);
                    assert_eq!(result.time_diff, s - n);
                    assert_eq!(result.has_started, s - n <= 0, "s={} t={} n={}", s, t, n);
                    assert_eq!(
                        result.should_remove,
                        result.has_started && (s - n).abs() >= t,
                        "s={} t={} n={}",
                        s,
                        t,
                        n
                    );
                }
            }
        }
    }

    #[test]
    fn test_removal_boundary() {
        let at_threshold = calculate_race_time(1000, 60, 1060);
        assert_eq!(at_threshold.time_diff, -60);
        assert!(at_threshold.has_started);
        assert!(at_threshold.should_remove);

        let just_before = calculate_race_time(1000, 60, 1059);
        assert!(just_before.has_started);
        assert!(!just_before.should_remove);
    }

    #[test]
    fn test_starting_now_counts_as_started() {
        let result = calculate_race_time(1000, 60, 1000);
        assert_eq!(result.time_diff, 0);
        assert!(result.has_started);
        assert!(!result.should_remove);
        assert_eq!(result.time_string, "Started 0m 0s ago");
    }

    #[test]
    fn test_non_positive_threshold_removes_once_started() {
        assert!(calculate_race_time(1000, 0, 1000).should_remove);
        assert!(calculate_race_time(1000, -10, 1000).should_remove);
        assert!(!calculate_race_time(1000, -10, 999).should_remove);
    }

    #[test]
    fn test_time_strings() {
        let x = 1_700_000_000;
        assert_eq!(calculate_race_time(x, 60, x - 300).time_string, "5m 0s To Start");
        assert_eq!(calculate_race_time(x, 60, x + 70).time_string, "Started 1m 10s ago");
        assert_eq!(calculate_race_time(x, 60, x - 59).time_string, "0m 59s To Start");
        assert_eq!(calculate_race_time(x, 60, x - 3_725).time_string, "62m 5s To Start");
    }

    #[test]
    fn test_status() {
        let x = 10_000;
        assert_eq!(calculate_race_time(x, 60, x - 300).status(), RaceStatus::Upcoming);
        assert_eq!(calculate_race_time(x, 60, x - 60).status(), RaceStatus::Upcoming);
        assert_eq!(calculate_race_time(x, 60, x - 59).status(), RaceStatus::StartingSoon);
        assert_eq!(calculate_race_time(x, 60, x).status(), RaceStatus::Started);
    }

    #[test]
    fn test_extreme_inputs_do_not_overflow() {
        let result = calculate_race_time(i64::MIN, 60, i64::MAX);
        assert!(result.has_started);
        assert!(result.should_remove);
    }
}
