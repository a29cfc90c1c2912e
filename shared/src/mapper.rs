//! Normalizes raw API records into the display shapes the views render.
//!
//! The API is loosely typed: any field may be missing, `null` or (for ids)
//! either a number or a string. Every schema here is therefore all-optional,
//! and mapping never fails. Each missing field resolves to a documented default.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use uuid::Uuid;

use crate::{
    DATE_UNAVAILABLE, DEFAULT_EVENT_DESCRIPTION, DEFAULT_EVENT_TITLE, DEFAULT_LOCATION,
    PLACEHOLDER_IMAGE_URL, UNCATEGORIZED, UNCATEGORIZED_DISPLAY,
};

const LOCAL_UUID_PREFIX: &str = "local-";

/// Accepts either `{"name": ..}` or a bare string.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCategory {
    pub name: Option<String>,
}

impl ApiCategory {
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(name) => Self {
                name: Some(name.clone()),
            },
            other => Self {
                name: field(other, "name").and_then(lenient_string),
            },
        }
    }
}

impl<'de> Deserialize<'de> for ApiCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|value| Self::from_value(&value))
    }
}

/// Shared by `/events` and `/sports`; the latter uses `location` where the
/// former uses `locationName`.
///
/// Decoding never fails on content: a field of the wrong type counts as
/// missing, so one malformed record cannot reject the whole list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
    pub id: Option<Value>,
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<String>,
    pub location_name: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub category: Option<ApiCategory>,
    pub image_urls: Option<Vec<String>>,
}

impl ApiEvent {
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let text = |name| field(value, name).and_then(lenient_string);
        Self {
            id: field(value, "id").cloned(),
            uuid: text("uuid"),
            name: text("name"),
            description: text("description"),
            created_at: text("createdAt"),
            location_name: text("locationName"),
            location: text("location"),
            latitude: field(value, "latitude").and_then(lenient_f64),
            longitude: field(value, "longitude").and_then(lenient_f64),
            category: field(value, "category").map(ApiCategory::from_value),
            image_urls: field(value, "imageUrls").and_then(lenient_strings),
        }
    }
}

impl<'de> Deserialize<'de> for ApiEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|value| Self::from_value(&value))
    }
}

fn field<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    value.get(name).filter(|v| !v.is_null())
}

fn lenient_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Coordinates arrive as numbers or numeric strings.
fn lenient_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_strings(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        ),
        Value::String(s) => Some(vec![s.clone()]),
        _ => None,
    }
}

/// Stable identity of an event within a session.
///
/// Records that arrive without a server uuid get a generated `local-` key so
/// that favorites and carousels can still tell them apart; such keys are never
/// sent back to the API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventUuid(String);

impl EventUuid {
    #[must_use]
    pub fn new(uuid: impl Into<String>) -> Self {
        Self(uuid.into())
    }

    #[must_use]
    pub fn generate_local() -> Self {
        Self(format!("{LOCAL_UUID_PREFIX}{}", Uuid::new_v4()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_UUID_PREFIX)
    }

    /// The uuid the API knows this event by, if any.
    #[must_use]
    pub fn remote(&self) -> Option<&str> {
        (!self.is_local()).then_some(self.0.as_str())
    }
}

impl std::fmt::Display for EventUuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: Option<String>,
    pub uuid: EventUuid,
    pub title: String,
    pub description: String,
    pub date: Option<String>,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub category: String,
    pub category_display: String,
    pub image: String,
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.trim().is_empty())
}

fn id_to_string(id: &Value) -> Option<String> {
    match id {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[must_use]
pub fn map_event(api: &ApiEvent) -> EventRecord {
    let category_name = api
        .category
        .as_ref()
        .and_then(|c| non_blank(c.name.as_ref()));

    EventRecord {
        id: api.id.as_ref().and_then(id_to_string),
        uuid: non_blank(api.uuid.as_ref()).map_or_else(EventUuid::generate_local, EventUuid::new),
        title: non_blank(api.name.as_ref())
            .unwrap_or(DEFAULT_EVENT_TITLE)
            .to_string(),
        description: non_blank(api.description.as_ref())
            .unwrap_or(DEFAULT_EVENT_DESCRIPTION)
            .to_string(),
        date: non_blank(api.created_at.as_ref()).map(str::to_string),
        location: non_blank(api.location_name.as_ref())
            .or_else(|| non_blank(api.location.as_ref()))
            .unwrap_or(DEFAULT_LOCATION)
            .to_string(),
        latitude: api.latitude.filter(|v| v.is_finite()),
        longitude: api.longitude.filter(|v| v.is_finite()),
        category: category_name.map_or_else(|| UNCATEGORIZED.to_string(), str::to_lowercase),
        category_display: category_name
            .unwrap_or(UNCATEGORIZED_DISPLAY)
            .to_string(),
        image: api
            .image_urls
            .as_ref()
            .and_then(|urls| urls.iter().find(|u| !u.trim().is_empty()))
            .map_or_else(|| PLACEHOLDER_IMAGE_URL.to_string(), Clone::clone),
    }
}

/// Maps a whole response, dropping later duplicates of a server uuid so the
/// uuid stays a unique key across the list.
#[must_use]
pub fn map_events(api: &[ApiEvent]) -> Vec<EventRecord> {
    let mut seen = HashSet::new();
    api.iter()
        .map(map_event)
        .filter(|record| seen.insert(record.uuid.clone()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryOption {
    pub value: String,
    pub label: String,
}

/// Builds the category dropdown: blank names skipped, duplicates removed
/// case-insensitively, first spelling wins.
#[must_use]
pub fn category_options(api: &[ApiCategory]) -> Vec<CategoryOption> {
    let mut seen = HashSet::new();
    api.iter()
        .filter_map(|c| non_blank(c.name.as_ref()))
        .map(str::trim)
        .filter(|name| seen.insert(name.to_lowercase()))
        .map(|name| CategoryOption {
            value: name.to_lowercase(),
            label: name.to_string(),
        })
        .collect()
}

/// Parses the timestamp formats the API has been seen to emit.
#[must_use]
pub fn parse_api_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// "June 5, 2025"
#[must_use]
pub fn format_short_date(raw: Option<&str>) -> String {
    raw.and_then(parse_api_date).map_or_else(
        || DATE_UNAVAILABLE.to_string(),
        |dt| dt.format("%B %-d, %Y").to_string(),
    )
}

/// "Thursday, June 5, 2025"
#[must_use]
pub fn format_long_date(raw: Option<&str>) -> String {
    raw.and_then(parse_api_date).map_or_else(
        || DATE_UNAVAILABLE.to_string(),
        |dt| dt.format("%A, %B %-d, %Y").to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn api(json: &str) -> ApiEvent {
        serde_json::from_str(json).unwrap()
    }

    mod mapping_tests {
        use super::*;

        #[test]
        fn test_full_record() {
            let record = map_event(&api(
                r#"{
                    "id": 7,
                    "uuid": "abc",
                    "name": "Riverside 10K",
                    "description": "Run by the river",
                    "createdAt": "2025-06-05T09:30:00Z",
                    "locationName": "Phnom Penh",
                    "latitude": 11.55,
                    "longitude": 104.92,
                    "category": {"name": "Running"},
                    "imageUrls": ["https://img/1.png", "https://img/2.png"]
                }"#,
            ));
            assert_eq!(record.id.as_deref(), Some("7"));
            assert_eq!(record.uuid.as_str(), "abc");
            assert_eq!(record.title, "Riverside 10K");
            assert_eq!(record.category, "running");
            assert_eq!(record.category_display, "Running");
            assert_eq!(record.image, "https://img/1.png");
            assert_eq!(record.latitude, Some(11.55));
        }

        #[test]
        fn test_empty_object_gets_defaults() {
            let record = map_event(&api("{}"));
            assert_eq!(record.title, DEFAULT_EVENT_TITLE);
            assert_eq!(record.description, DEFAULT_EVENT_DESCRIPTION);
            assert_eq!(record.location, DEFAULT_LOCATION);
            assert_eq!(record.category, UNCATEGORIZED);
            assert_eq!(record.category_display, UNCATEGORIZED_DISPLAY);
            assert_eq!(record.image, PLACEHOLDER_IMAGE_URL);
            assert!(record.uuid.is_local());
            assert!(record.uuid.remote().is_none());
        }

        #[test]
        fn test_nulls_and_empty_lists_get_defaults() {
            let record = map_event(&api(
                r#"{"name": null, "category": null, "imageUrls": [], "uuid": ""}"#,
            ));
            assert_eq!(record.title, DEFAULT_EVENT_TITLE);
            assert_eq!(record.category, UNCATEGORIZED);
            assert_eq!(record.image, PLACEHOLDER_IMAGE_URL);
            assert!(record.uuid.is_local());
        }

        #[test]
        fn test_sports_location_field() {
            let record = map_event(&api(r#"{"location": "Olympic Stadium"}"#));
            assert_eq!(record.location, "Olympic Stadium");
        }

        #[test]
        fn test_string_id_is_kept() {
            let record = map_event(&api(r#"{"id": "e-1"}"#));
            assert_eq!(record.id.as_deref(), Some("e-1"));
        }

        #[test]
        fn test_mistyped_fields_count_as_missing() {
            let record = map_event(&api(
                r#"{
                    "uuid": 42,
                    "name": ["not", "a", "title"],
                    "latitude": "11.55",
                    "longitude": {"deg": 104},
                    "category": "Tennis",
                    "imageUrls": [null, 3, "https://img/ok.png"]
                }"#,
            ));
            assert_eq!(record.uuid.as_str(), "42");
            assert_eq!(record.title, DEFAULT_EVENT_TITLE);
            assert_eq!(record.latitude, Some(11.55));
            assert_eq!(record.longitude, None);
            assert_eq!(record.category, "tennis");
            assert_eq!(record.image, "https://img/ok.png");
        }

        #[test]
        fn test_one_bad_record_keeps_the_rest_of_the_list() {
            let list: Vec<ApiEvent> = serde_json::from_str(
                r#"[{"uuid": "a"}, {"uuid": "b", "latitude": "11.55"}, null]"#,
            )
            .unwrap();
            let records = map_events(&list);
            assert_eq!(records.len(), 3);
            assert_eq!(records[0].uuid.as_str(), "a");
            assert_eq!(records[1].latitude, Some(11.55));
            assert!(records[2].uuid.is_local());
        }

        #[test]
        fn test_map_events_drops_duplicate_uuids() {
            let records = map_events(&[
                api(r#"{"uuid": "a", "name": "first"}"#),
                api(r#"{"uuid": "a", "name": "second"}"#),
                api("{}"),
                api("{}"),
            ]);
            assert_eq!(records.len(), 3);
            assert_eq!(records[0].title, "first");
        }
    }

    mod category_tests {
        use super::*;

        #[test]
        fn test_dedup_is_case_insensitive() {
            let options = category_options(&[
                ApiCategory { name: Some("Football".into()) },
                ApiCategory { name: Some("football".into()) },
                ApiCategory { name: None },
                ApiCategory { name: Some("  ".into()) },
                ApiCategory { name: Some("Tennis".into()) },
            ]);
            assert_eq!(
                options,
                vec![
                    CategoryOption { value: "football".into(), label: "Football".into() },
                    CategoryOption { value: "tennis".into(), label: "Tennis".into() },
                ]
            );
        }
    }

    mod category_shape_tests {
        use super::*;

        #[test]
        fn test_bare_string_categories_are_accepted() {
            let list: Vec<ApiCategory> =
                serde_json::from_str(r#"[{"name": "Football"}, "Tennis", 7, {"name": null}]"#)
                    .unwrap();
            let options = category_options(&list);
            assert_eq!(options.len(), 2);
            assert_eq!(options[1].label, "Tennis");
        }
    }

    mod date_tests {
        use super::*;

        #[test]
        fn test_short_and_long_dates() {
            let raw = Some("2025-06-05T09:30:00Z");
            assert_eq!(format_short_date(raw), "June 5, 2025");
            assert_eq!(format_long_date(raw), "Thursday, June 5, 2025");
        }

        #[test]
        fn test_naive_and_date_only_formats() {
            assert!(parse_api_date("2025-06-05T09:30:00.123").is_some());
            assert!(parse_api_date("2025-06-05").is_some());
        }

        #[test]
        fn test_missing_or_garbage_date() {
            assert_eq!(format_short_date(None), DATE_UNAVAILABLE);
            assert_eq!(format_long_date(Some("yesterday")), DATE_UNAVAILABLE);
        }
    }

    proptest! {
        #[test]
        fn prop_mapper_never_yields_blank_fields(
            name in proptest::option::of("[ a-zA-Z]{0,12}"),
            category in proptest::option::of("[ a-zA-Z]{0,12}"),
        ) {
            let event = ApiEvent {
                name,
                category: Some(ApiCategory { name: category }),
                ..ApiEvent::default()
            };
            let record = map_event(&event);
            prop_assert!(!record.title.trim().is_empty());
            prop_assert!(!record.category.trim().is_empty());
            prop_assert_eq!(record.category.clone(), record.category.to_lowercase());
            prop_assert!(!record.image.is_empty());
        }
    }
}
