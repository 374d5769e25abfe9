//! Data models for BoxCast API resources

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::BoxCastError;

// Sample date string from server: 2013-04-28T23:00:00Z
const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const DATE_FORMAT_OFFSET: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Parse a server timestamp (UTC, second precision).
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, DATE_FORMAT) {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_str(value, DATE_FORMAT_OFFSET)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_optional_url(value: Option<String>) -> Option<Url> {
    value
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| Url::parse(&s).ok())
}

/// A single scheduled or archived video event.
#[derive(Debug, Clone)]
pub struct Broadcast {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Thumbnail image, absent when the server sends no usable `preview`
    pub thumbnail_url: Option<Url>,
    /// The channel this broadcast was fetched through
    pub channel_id: String,
    pub start_date: DateTime<Utc>,
    pub stop_date: DateTime<Utc>,
    /// Only present on detailed broadcasts
    pub account_id: Option<String>,
}

#[derive(Deserialize)]
struct BroadcastPayload {
    id: String,
    name: String,
    description: String,
    starts_at: String,
    stops_at: String,
    #[serde(default)]
    preview: Option<String>,
    #[serde(default)]
    account_id: Option<String>,
}

impl Broadcast {
    pub fn from_json(channel_id: &str, json: &Value) -> Result<Self, BoxCastError> {
        let payload = BroadcastPayload::deserialize(json)?;

        let start_date = parse_date(&payload.starts_at).ok_or_else(|| {
            BoxCastError::Serialization(format!("invalid starts_at: {}", payload.starts_at))
        })?;
        let stop_date = parse_date(&payload.stops_at).ok_or_else(|| {
            BoxCastError::Serialization(format!("invalid stops_at: {}", payload.stops_at))
        })?;

        Ok(Self {
            id: payload.id,
            name: payload.name,
            description: payload.description,
            thumbnail_url: parse_optional_url(payload.preview),
            channel_id: channel_id.to_string(),
            start_date,
            stop_date,
            account_id: payload.account_id,
        })
    }

    /// Decode a JSON array of broadcasts. Any invalid element fails the whole list.
    pub fn list_from_json(channel_id: &str, json: &Value) -> Result<Vec<Self>, BoxCastError> {
        let items = json
            .as_array()
            .ok_or_else(|| BoxCastError::Serialization("expected a list of broadcasts".to_string()))?;
        items
            .iter()
            .map(|item| Self::from_json(channel_id, item))
            .collect()
    }
}

impl PartialEq for Broadcast {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Broadcast {}

/// Playback status reported by a broadcast view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewStatus {
    Live,
    Recorded,
    Stalled,
    Preroll,
    Failed,
    #[serde(other)]
    Unknown,
}

/// The live/playable-stream descriptor for a broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastView {
    pub status: ViewStatus,
    pub playlist_url: Option<Url>,
}

#[derive(Deserialize)]
struct BroadcastViewPayload {
    status: ViewStatus,
    #[serde(default)]
    playlist: Option<String>,
}

impl BroadcastView {
    pub fn from_json(json: &Value) -> Result<Self, BoxCastError> {
        let payload = BroadcastViewPayload::deserialize(json)?;
        Ok(Self {
            status: payload.status,
            playlist_url: parse_optional_url(payload.playlist),
        })
    }

    pub fn is_live(&self) -> bool {
        self.status == ViewStatus::Live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn broadcast_json() -> Value {
        json!({
            "id": "1",
            "account_id": "1",
            "name": "Test",
            "description": "A test broadcast.",
            "preview": "https://api.boxcast.com/thumbnail.jpg",
            "starts_at": "2017-07-28T22:00:00Z",
            "stops_at": "2017-07-28T23:00:00Z"
        })
    }

    #[test]
    fn test_decode_broadcast() {
        let broadcast = Broadcast::from_json("2", &broadcast_json()).unwrap();
        assert_eq!(broadcast.id, "1");
        assert_eq!(broadcast.account_id.as_deref(), Some("1"));
        assert_eq!(broadcast.channel_id, "2");
        assert_eq!(broadcast.name, "Test");
        assert_eq!(broadcast.description, "A test broadcast.");
        assert_eq!(
            broadcast.thumbnail_url,
            Some(Url::parse("https://api.boxcast.com/thumbnail.jpg").unwrap())
        );
        assert_eq!(broadcast.start_date, Utc.with_ymd_and_hms(2017, 7, 28, 22, 0, 0).unwrap());
        assert_eq!(broadcast.stop_date, Utc.with_ymd_and_hms(2017, 7, 28, 23, 0, 0).unwrap());
    }

    #[test]
    fn test_missing_required_fields() {
        for field in ["id", "name", "description", "starts_at", "stops_at"] {
            let mut json = broadcast_json();
            json.as_object_mut().unwrap().remove(field);
            let result = Broadcast::from_json("2", &json);
            assert!(
                matches!(result, Err(BoxCastError::Serialization(_))),
                "missing {} should fail",
                field
            );
        }
    }

    #[test]
    fn test_bad_dates() {
        let mut json = broadcast_json();
        json["starts_at"] = json!("July 28th");
        assert!(matches!(
            Broadcast::from_json("2", &json),
            Err(BoxCastError::Serialization(_))
        ));

        let mut json = broadcast_json();
        json["stops_at"] = json!(1501282800);
        assert!(Broadcast::from_json("2", &json).is_err());
    }

    #[test]
    fn test_optional_fields() {
        let mut json = broadcast_json();
        let object = json.as_object_mut().unwrap();
        object.remove("account_id");
        object.remove("preview");
        let broadcast = Broadcast::from_json("2", &json).unwrap();
        assert_eq!(broadcast.account_id, None);
        assert_eq!(broadcast.thumbnail_url, None);

        let mut json = broadcast_json();
        json["preview"] = json!("");
        assert_eq!(Broadcast::from_json("2", &json).unwrap().thumbnail_url, None);
    }

    #[test]
    fn test_numeric_offset_date() {
        assert_eq!(
            parse_date("2017-07-28T22:00:00+0000"),
            Some(Utc.with_ymd_and_hms(2017, 7, 28, 22, 0, 0).unwrap())
        );
        assert_eq!(format_date(&parse_date("2013-04-28T23:00:00Z").unwrap()), "2013-04-28T23:00:00Z");
    }

    #[test]
    fn test_equality_by_id() {
        let a = Broadcast::from_json("2", &broadcast_json()).unwrap();
        let mut json = broadcast_json();
        json["name"] = json!("Renamed");
        let b = Broadcast::from_json("9", &json).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_decode_list() {
        let json = json!([broadcast_json(), broadcast_json()]);
        assert_eq!(Broadcast::list_from_json("2", &json).unwrap().len(), 2);
        assert!(Broadcast::list_from_json("2", &broadcast_json()).is_err());
        assert!(Broadcast::list_from_json("2", &json!([{"id": "1"}])).is_err());
    }

    #[test]
    fn test_decode_view() {
        let view = BroadcastView::from_json(&json!({
            "status": "live",
            "playlist": "https://play.boxcast.com/p/abc/all.m3u8"
        }))
        .unwrap();
        assert!(view.is_live());
        assert_eq!(
            view.playlist_url.as_ref().map(Url::as_str),
            Some("https://play.boxcast.com/p/abc/all.m3u8")
        );

        let view = BroadcastView::from_json(&json!({"status": "processing"})).unwrap();
        assert_eq!(view.status, ViewStatus::Unknown);
        assert_eq!(view.playlist_url, None);

        assert!(BroadcastView::from_json(&json!({"playlist": "https://x.test/a.m3u8"})).is_err());
    }

    #[test]
    fn test_invalid_playlist_is_absent() {
        let view = BroadcastView::from_json(&json!({"status": "live", "playlist": "not a url"})).unwrap();
        assert!(view.is_live());
        assert_eq!(view.playlist_url, None);
    }
}
