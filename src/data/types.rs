use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertisedStart {
    /// Scheduled start, seconds since epoch
    pub seconds: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub icon_uri: Option<String>,
}

/// Racing-form metadata. Passed through to display untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceForm {
    pub distance: Option<u32>,
    pub distance_type: Option<FormDescriptor>,
    pub distance_type_id: Option<String>,
    pub track_condition: Option<FormDescriptor>,
    pub track_condition_id: Option<String>,
    pub weather: Option<FormDescriptor>,
    pub weather_id: Option<String>,
    pub race_comment: Option<String>,
    pub additional_data: Option<String>,
    pub generated: Option<i64>,
    pub silk_base_url: Option<String>,
    pub race_comment_alternative: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSummary {
    pub race_id: String,
    pub race_name: String,
    pub race_number: u32,
    pub meeting_id: String,
    pub meeting_name: String,
    pub category_id: String,
    pub advertised_start: AdvertisedStart,
    #[serde(default)]
    pub race_form: Option<RaceForm>,
    #[serde(default)]
    pub venue_id: Option<String>,
    #[serde(default)]
    pub venue_name: Option<String>,
    #[serde(default)]
    pub venue_state: Option<String>,
    #[serde(default)]
    pub venue_country: Option<String>,
    #[serde(default)]
    pub meeting_brands: Option<Vec<String>>,
}

impl RaceSummary {
    pub fn start_seconds(&self) -> i64 {
        self.advertised_start.seconds
    }

    pub fn category(&self) -> Option<Category> {
        Category::from_id(&self.category_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NextRacesData {
    #[serde(default)]
    pub race_summaries: HashMap<String, RaceSummary>,
    #[serde(default)]
    pub next_to_go_ids: Vec<String>,
}

/// Body of the `nextraces` endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RacesResponse {
    #[serde(default)]
    pub status: String,
    pub data: NextRacesData,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Greyhound,
    Harness,
    Horse,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Greyhound, Category::Harness, Category::Horse];

    pub fn id(&self) -> &'static str {
        match self {
            Category::Greyhound => "9daef0d7-bf3c-4f50-921d-8e818c60fe61",
            Category::Harness => "161d9be2-e909-4326-8c2c-35ed71fb460b",
            Category::Horse => "4a2788f8-e825-4d36-9894-efd4baf1cfae",
        }
    }

    pub fn from_id(id: &str) -> Option<Category> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Category::Greyhound => "greyhound",
            Category::Harness => "harness",
            Category::Horse => "horse",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown race category: {0}")]
pub struct UnknownCategory(String);

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Accepts the lowercase name or the upstream category id
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(trimmed) || c.id() == trimmed)
            .ok_or_else(|| UnknownCategory(trimmed.to_string()))
    }
}

/// Parse a category filter where "all" (or empty) means no filter
pub fn parse_category_filter(s: &str) -> Result<Option<Category>, UnknownCategory> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    trimmed.parse().map(Some)
}
