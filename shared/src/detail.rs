//! Event detail page: the persisted hand-off record, derived links and the
//! related-events selection.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::mapper::{format_long_date, EventRecord};
use crate::{
    DEFAULT_EVENT_DESCRIPTION, DEFAULT_EVENT_TITLE, DEFAULT_LOCATION, DEFAULT_MAP_LOCATION,
    PLACEHOLDER_IMAGE_URL,
};

const MAPS_BASE: &str = "https://maps.google.com/maps";
const FACEBOOK_SHARE_BASE: &str = "https://www.facebook.com/sharer/sharer.php";
const TELEGRAM_SHARE_BASE: &str = "https://t.me/share/url";
const DEFAULT_SHARE_TEXT: &str = "Check out this event!";
const SITE_NAME: &str = "SportsHub";

/// The `selectedEvent` record written by list pages and read by the detail
/// page. Every field is optional because older writers stored fewer fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectedEvent {
    pub id: Option<serde_json::Value>,
    pub uuid: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub category: Option<String>,
    pub image: Option<String>,
}

impl From<&EventRecord> for SelectedEvent {
    fn from(record: &EventRecord) -> Self {
        Self {
            id: record.id.clone().map(serde_json::Value::String),
            uuid: record.uuid.remote().map(str::to_string),
            title: Some(record.title.clone()),
            description: Some(record.description.clone()),
            date: record.date.clone(),
            location: Some(record.location.clone()),
            latitude: record.latitude,
            longitude: record.longitude,
            category: Some(record.category_display.clone()),
            image: Some(record.image.clone()),
        }
    }
}

impl SelectedEvent {
    /// The server uuid, when the record has a usable one.
    #[must_use]
    pub fn uuid(&self) -> Option<&str> {
        self.uuid.as_deref().filter(|u| !u.trim().is_empty())
    }

    #[must_use]
    pub fn title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_EVENT_TITLE)
    }

    fn location(&self) -> Option<&str> {
        self.location.as_deref().filter(|l| !l.trim().is_empty())
    }

    fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }

    fn map_query(&self) -> Option<String> {
        self.coordinates()
            .map(|(lat, lon)| format!("{lat},{lon}"))
            .or_else(|| self.location().map(str::to_string))
    }
}

fn with_params(base: &str, params: &[(&str, &str)]) -> String {
    Url::parse_with_params(base, params)
        .map(String::from)
        .unwrap_or_else(|_| base.to_string())
}

/// Embedded map: coordinates when known, otherwise the location text,
/// otherwise a city-level default view.
#[must_use]
pub fn map_embed_url(event: &SelectedEvent) -> String {
    match event.map_query() {
        Some(q) => with_params(MAPS_BASE, &[("q", q.as_str()), ("output", "embed"), ("z", "15")]),
        None => with_params(
            MAPS_BASE,
            &[("q", DEFAULT_MAP_LOCATION), ("output", "embed"), ("z", "12")],
        ),
    }
}

/// "Open in maps" link, absent when nothing locates the event.
#[must_use]
pub fn map_link_url(event: &SelectedEvent) -> Option<String> {
    event
        .map_query()
        .map(|q| with_params(MAPS_BASE, &[("q", q.as_str())]))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLinks {
    pub facebook: String,
    pub telegram: String,
}

#[must_use]
pub fn share_links(page_url: &str, title: Option<&str>) -> ShareLinks {
    let text = title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(DEFAULT_SHARE_TEXT);
    ShareLinks {
        facebook: with_params(FACEBOOK_SHARE_BASE, &[("u", page_url), ("quote", text)]),
        telegram: with_params(TELEGRAM_SHARE_BASE, &[("url", page_url), ("text", text)]),
    }
}

/// Everything the detail page shows about the event itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetail {
    pub uuid: Option<String>,
    pub title: String,
    pub document_title: String,
    pub description: String,
    pub date_text: String,
    pub location: String,
    pub category: String,
    pub image: String,
    pub map_embed_url: String,
    pub map_link_url: Option<String>,
    pub share: Option<ShareLinks>,
}

impl EventDetail {
    #[must_use]
    pub fn build(event: &SelectedEvent, page_url: Option<&str>) -> Self {
        let title = event.title().to_string();
        Self {
            uuid: event.uuid().map(str::to_string),
            document_title: format!("{title} - {SITE_NAME}"),
            description: event
                .description
                .clone()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT_DESCRIPTION.to_string()),
            date_text: format_long_date(event.date.as_deref()),
            location: event.location().unwrap_or(DEFAULT_LOCATION).to_string(),
            category: event
                .category
                .clone()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| "Category".to_string()),
            image: event
                .image
                .clone()
                .filter(|i| !i.trim().is_empty())
                .unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_string()),
            map_embed_url: map_embed_url(event),
            map_link_url: map_link_url(event),
            share: page_url.map(|url| share_links(url, Some(title.as_str()))),
            title,
        }
    }
}

/// Other events in random order, without the one being viewed, capped at `limit`.
pub fn pick_related<R: Rng + ?Sized>(
    mut candidates: Vec<EventRecord>,
    current_uuid: Option<&str>,
    limit: usize,
    rng: &mut R,
) -> Vec<EventRecord> {
    if let Some(current) = current_uuid {
        candidates.retain(|record| record.uuid.as_str() != current);
    }
    candidates.shuffle(rng);
    candidates.truncate(limit);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::{map_event, ApiEvent};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn selected(json: &str) -> SelectedEvent {
        serde_json::from_str(json).unwrap()
    }

    mod link_tests {
        use super::*;

        #[test]
        fn test_map_prefers_coordinates() {
            let event = selected(r#"{"latitude": 11.5, "longitude": 104.9, "location": "PP"}"#);
            assert_eq!(
                map_embed_url(&event),
                "https://maps.google.com/maps?q=11.5%2C104.9&output=embed&z=15"
            );
            assert_eq!(
                map_link_url(&event).as_deref(),
                Some("https://maps.google.com/maps?q=11.5%2C104.9")
            );
        }

        #[test]
        fn test_map_falls_back_to_location_text() {
            let event = selected(r#"{"location": "Olympic Stadium"}"#);
            assert_eq!(
                map_embed_url(&event),
                "https://maps.google.com/maps?q=Olympic+Stadium&output=embed&z=15"
            );
        }

        #[test]
        fn test_map_default_city() {
            let event = SelectedEvent::default();
            assert_eq!(
                map_embed_url(&event),
                "https://maps.google.com/maps?q=Phnom+Penh%2C+Cambodia&output=embed&z=12"
            );
            assert!(map_link_url(&event).is_none());
        }

        #[test]
        fn test_share_links_encode_page_and_title() {
            let links = share_links("https://site/detail?id=1", Some("Derby & Co"));
            assert_eq!(
                links.facebook,
                "https://www.facebook.com/sharer/sharer.php?u=https%3A%2F%2Fsite%2Fdetail%3Fid%3D1&quote=Derby+%26+Co"
            );
            assert!(links.telegram.starts_with("https://t.me/share/url?url="));
            assert!(links.telegram.ends_with("&text=Derby+%26+Co"));
        }

        #[test]
        fn test_share_default_text() {
            let links = share_links("https://site", None);
            assert!(links.telegram.ends_with("text=Check+out+this+event%21"));
        }
    }

    mod detail_tests {
        use super::*;

        #[test]
        fn test_build_from_record_round_trip() {
            let record = map_event(&ApiEvent {
                uuid: Some("u-1".into()),
                name: Some("Derby".into()),
                created_at: Some("2025-06-05T09:30:00Z".into()),
                ..ApiEvent::default()
            });
            let stored = serde_json::to_vec(&SelectedEvent::from(&record)).unwrap();
            let event: SelectedEvent = serde_json::from_slice(&stored).unwrap();

            let detail = EventDetail::build(&event, Some("https://site/detail"));
            assert_eq!(detail.uuid.as_deref(), Some("u-1"));
            assert_eq!(detail.title, "Derby");
            assert_eq!(detail.document_title, "Derby - SportsHub");
            assert_eq!(detail.date_text, "Thursday, June 5, 2025");
            assert_eq!(detail.category, "Uncategorized");
            assert!(detail.share.is_some());
        }

        #[test]
        fn test_local_uuid_is_not_handed_off() {
            let record = map_event(&ApiEvent::default());
            assert!(SelectedEvent::from(&record).uuid().is_none());
        }

        #[test]
        fn test_sparse_record_gets_defaults() {
            let detail = EventDetail::build(&selected(r#"{"uuid": " "}"#), None);
            assert!(detail.uuid.is_none());
            assert_eq!(detail.title, DEFAULT_EVENT_TITLE);
            assert_eq!(detail.location, DEFAULT_LOCATION);
            assert_eq!(detail.image, PLACEHOLDER_IMAGE_URL);
            assert!(detail.share.is_none());
        }
    }

    mod related_tests {
        use super::*;

        fn records(n: usize) -> Vec<EventRecord> {
            (0..n)
                .map(|i| {
                    map_event(&ApiEvent {
                        uuid: Some(format!("s{i}")),
                        ..ApiEvent::default()
                    })
                })
                .collect()
        }

        #[test]
        fn test_excludes_current_and_caps() {
            let mut rng = StdRng::seed_from_u64(7);
            let related = pick_related(records(20), Some("s3"), 12, &mut rng);
            assert_eq!(related.len(), 12);
            assert!(related.iter().all(|r| r.uuid.as_str() != "s3"));
        }

        #[test]
        fn test_fewer_candidates_than_limit() {
            let mut rng = StdRng::seed_from_u64(7);
            let related = pick_related(records(3), Some("s0"), 12, &mut rng);
            assert_eq!(related.len(), 2);
        }

        #[test]
        fn test_empty_input() {
            let mut rng = StdRng::seed_from_u64(7);
            assert!(pick_related(Vec::new(), None, 12, &mut rng).is_empty());
        }
    }
}
