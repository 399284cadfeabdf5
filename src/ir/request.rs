use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Browser tab identifier as reported by the host.
pub type TabId = i64;

/// Milliseconds since the Unix epoch.
pub type Millis = i64;

const UNKNOWN: &str = "unknown";

/// An outbound request observation as emitted by the host's request source.
///
/// Every field is optional. `RequestRecord::from_raw` turns absent strings into
/// `"unknown"` and absent numbers into zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawRequest {
    pub timestamp: Option<Millis>,
    pub tab_id: Option<TabId>,
    pub initiator: Option<String>,
    pub origin_url: Option<String>,
    pub document_url: Option<String>,
    pub url: Option<String>,
    pub method: Option<String>,
    pub request_body_byte_size: Option<u64>,
}

impl RawRequest {
    /// Decode an observation from loosely-typed JSON. Fields with the wrong
    /// type are treated as absent.
    ///
    /// The body size is read from `requestBodyByteSize`, or summed from the
    /// `bytes` of each `requestBody.raw` upload part.
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_owned);

        let request_body_byte_size = value
            .get("requestBodyByteSize")
            .and_then(Value::as_u64)
            .or_else(|| {
                let parts = value.get("requestBody")?.get("raw")?.as_array()?;
                Some(
                    parts
                        .iter()
                        .map(|p| p.get("bytes").and_then(Value::as_u64).unwrap_or(0))
                        .sum(),
                )
            });

        Self {
            timestamp: value.get("timestamp").and_then(Value::as_i64),
            tab_id: value.get("tabId").and_then(Value::as_i64),
            initiator: text("initiator"),
            origin_url: text("originUrl"),
            document_url: text("documentUrl"),
            url: text("url"),
            method: text("method"),
            request_body_byte_size,
        }
    }
}

/// A request held by the request window. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    pub timestamp: Millis,
    pub tab_id: TabId,
    /// Initiator, origin URL or document URL of the request, whichever the
    /// host reported first.
    pub initiator: String,
    pub url: String,
    pub method: String,
    pub body_size: u64,
}

impl RequestRecord {
    /// Normalize a raw observation. A missing timestamp is stamped with `now`;
    /// one ahead of `now` is clamped to it so the window stays append-ordered.
    pub fn from_raw(raw: RawRequest, now: Millis) -> Self {
        let initiator = [raw.initiator, raw.origin_url, raw.document_url]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN.into());

        Self {
            timestamp: raw.timestamp.map_or(now, |t| t.min(now)),
            tab_id: raw.tab_id.unwrap_or(0),
            initiator,
            url: raw.url.unwrap_or_else(|| UNKNOWN.into()),
            method: raw.method.unwrap_or_else(|| UNKNOWN.into()),
            body_size: raw.request_body_byte_size.unwrap_or(0),
        }
    }

    /// The projection handed to the network extractor.
    pub fn view(&self) -> RequestView {
        RequestView {
            url: self.url.clone(),
            method: self.method.clone(),
            body_size: self.body_size,
        }
    }
}

/// The parts of a request the scoring rules look at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestView {
    pub url: String,
    pub method: String,
    pub body_size: u64,
}

impl RequestView {
    /// Decode from loosely-typed JSON; wrong-typed fields read as absent.
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN)
                .to_owned()
        };
        Self {
            url: text("url"),
            method: text("method"),
            body_size: value.get("bodySize").and_then(Value::as_u64).unwrap_or(0),
        }
    }

    pub fn new(url: impl Into<String>, method: impl Into<String>, body_size: u64) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            body_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let record = RequestRecord::from_raw(RawRequest::default(), 1_000);
        assert_eq!(record.timestamp, 1_000);
        assert_eq!(record.tab_id, 0);
        assert_eq!(record.initiator, "unknown");
        assert_eq!(record.url, "unknown");
        assert_eq!(record.method, "unknown");
        assert_eq!(record.body_size, 0);
    }

    #[test]
    fn future_timestamp_is_clamped_to_receive_time() {
        let raw = RawRequest {
            timestamp: Some(3_600_000),
            ..Default::default()
        };
        assert_eq!(RequestRecord::from_raw(raw, 5_000).timestamp, 5_000);

        let raw = RawRequest {
            timestamp: Some(4_000),
            ..Default::default()
        };
        assert_eq!(RequestRecord::from_raw(raw, 5_000).timestamp, 4_000);
    }

    #[test]
    fn request_view_from_value_defaults_wrong_types() {
        let view = RequestView::from_value(&json!({ "url": "https://a.example/x", "method": 1, "bodySize": "big" }));
        assert_eq!(view, RequestView::new("https://a.example/x", "unknown", 0));
    }

    #[test]
    fn initiator_falls_back_to_origin_then_document() {
        let raw = RawRequest {
            document_url: Some("https://doc.example".into()),
            ..Default::default()
        };
        assert_eq!(RequestRecord::from_raw(raw, 0).initiator, "https://doc.example");

        let raw = RawRequest {
            origin_url: Some("https://origin.example".into()),
            document_url: Some("https://doc.example".into()),
            ..Default::default()
        };
        assert_eq!(
            RequestRecord::from_raw(raw, 0).initiator,
            "https://origin.example"
        );
    }

    #[test]
    fn from_value_sums_raw_upload_parts() {
        let raw = RawRequest::from_value(&json!({
            "tabId": 7,
            "url": "https://upload.example/put",
            "method": "POST",
            "requestBody": { "raw": [{ "bytes": 400 }, { "bytes": 600 }, {}] }
        }));
        assert_eq!(raw.tab_id, Some(7));
        assert_eq!(raw.request_body_byte_size, Some(1_000));
    }

    #[test]
    fn from_value_ignores_wrong_types() {
        let raw = RawRequest::from_value(&json!({
            "tabId": "seven",
            "url": 42,
            "method": "GET",
            "requestBodyByteSize": "huge"
        }));
        assert_eq!(raw.tab_id, None);
        assert_eq!(raw.url, None);
        assert_eq!(raw.method.as_deref(), Some("GET"));
        assert_eq!(raw.request_body_byte_size, None);
    }
}
