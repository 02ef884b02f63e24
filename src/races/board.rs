use chrono::{Local, TimeZone};
use std::fmt::Write;
use crate::data::types::{Category, RaceSummary};
use crate::races::reconciler::RacesView;
use crate::timing::calculator::{calculate_race_time, RaceStatus};

pub const EMPTY_TEXT: &str = "No upcoming races found";
pub const LOADING_TEXT: &str = "Loading races...";
pub const RETRY_HINT: &str = "press r + Enter to try again";

/// Terminal rendition of the next-to-jump table
#[derive(Debug, Clone)]
pub struct RaceBoard {
    limit: usize,
    threshold_secs: i64,
    category: Option<Category>,
}

/// One rendered row
#[derive(Debug, Clone, PartialEq)]
pub struct BoardRow {
    pub location: String,
    pub race_number: u32,
    pub start_local: String,
    pub time: String,
    pub status: RaceStatus,
}

impl RaceBoard {
    pub fn new(limit: usize, threshold_secs: i64, category: Option<Category>) -> Self {
        Self {
            limit,
            threshold_secs,
            category,
        }
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn set_category(&mut self, category: Option<Category>) {
        self.category = category;
    }

    /// Soonest first, category-filtered, capped at the row limit
    pub fn visible<'a>(&self, races: &'a [RaceSummary]) -> Vec<&'a RaceSummary> {
        let mut sorted: Vec<&RaceSummary> = races
            .iter()
            .filter(|race| self.category.is_none() || race.category() == self.category)
            .collect();
        sorted.sort_by_key(|race| race.start_seconds());
        sorted.truncate(self.limit);
        sorted
    }

    pub fn rows(&self, races: &[&RaceSummary], now_seconds: i64) -> Vec<BoardRow> {
        races
            .iter()
            .map(|race| {
                let result = calculate_race_time(race.start_seconds(), self.threshold_secs, now_seconds);
                BoardRow {
                    location: race.meeting_name.clone(),
                    race_number: race.race_number,
                    start_local: local_hhmm(race.start_seconds()),
                    status: result.status(),
                    time: result.time_string,
                }
            })
            .collect()
    }

    pub fn render(&self, view: &RacesView, now_seconds: i64) -> String {
        let mut out = String::new();

        if view.is_loading() {
            out.push_str(LOADING_TEXT);
            out.push('\n');
            return out;
        }

        if view.is_error() {
            let _ = writeln!(out, "Error");
            let _ = writeln!(out, "{}", view.error().unwrap_or_default());
            let _ = writeln!(out, "[{}]", RETRY_HINT);
            return out;
        }

        let _ = writeln!(out, "Next to Jump");
        let _ = writeln!(out, "Showing the next {} upcoming races", self.limit);
        let filter = self.category.map(|c| c.name()).unwrap_or("all categories");
        let _ = writeln!(out, "Filter by: {}", filter);
        let _ = writeln!(out);

        let visible = self.visible(&view.races);
        if visible.is_empty() {
            let _ = writeln!(out, "{}", EMPTY_TEXT);
            return out;
        }

        let _ = writeln!(out, "{:<24} {:>6} {:>6}  {}", "Location", "Race", "Start", "Time");
        for row in self.rows(&visible, now_seconds) {
            let _ = writeln!(
                out,
                "{:<24} {:>6} {:>6}  {} {}",
                truncate(&row.location, 24),
                format!("R{}", row.race_number),
                row.start_local,
                status_marker(row.status),
                row.time
            );
        }
        out
    }
}

fn status_marker(status: RaceStatus) -> &'static str {
    match status {
        RaceStatus::Upcoming => " ",
        RaceStatus::StartingSoon => "!",
        RaceStatus::Started => "*",
    }
}

fn local_hhmm(seconds: i64) -> String {
    Local
        .timestamp_opt(seconds, 0)
        .single()
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max.saturating_sub(1)).chain(std::iter::once('~')).collect()
    }
}
