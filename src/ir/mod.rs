//! Data model shared by the window, the extractors and the pipeline.
//!
//! Request observations flow into the `window`; a `DetectionInput` is
//! assembled fresh for every evaluation and never persisted.

pub mod page_signals;
pub mod request;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

pub use page_signals::{PageSignals, ScriptSummary};
pub use request::{Millis, RawRequest, RequestRecord, RequestView, TabId};

/// Everything the extractors look at for one navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetectionInput {
    pub url: String,
    pub permissions: BTreeSet<String>,
    /// Script text to scan. The pipeline fills this with the inline length
    /// marker; offline callers may supply real source.
    pub script_text: String,
    /// Recent requests made by the tab, oldest first.
    pub requests: Vec<RequestView>,
    pub page_signals: PageSignals,
    /// Serialized origin of `url`. `None` treats every request as foreign.
    pub page_origin: Option<String>,
}

impl DetectionInput {
    /// Build the input for a navigation from collected signals and the tab's
    /// recent requests.
    pub fn assemble(url: &str, page_signals: PageSignals, requests: &[RequestRecord]) -> Self {
        Self {
            url: url.to_owned(),
            permissions: page_signals.granted_permissions.iter().cloned().collect(),
            script_text: page_signals.inline_script_marker(),
            requests: requests.iter().map(RequestRecord::view).collect(),
            page_origin: origin_of(url),
            page_signals,
        }
    }

    /// Decode an input from loosely-typed JSON. Wrong-typed fields read as
    /// absent; page signals go through `PageSignals::from_value`.
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_owned);
        let array = |key: &str| value.get(key).and_then(Value::as_array);

        Self {
            url: text("url").unwrap_or_default(),
            permissions: array("permissions")
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
            script_text: text("scriptText").unwrap_or_default(),
            requests: array("requests")
                .map(|items| items.iter().map(RequestView::from_value).collect())
                .unwrap_or_default(),
            page_signals: value
                .get("pageSignals")
                .map(PageSignals::from_value)
                .unwrap_or_default(),
            page_origin: text("pageOrigin"),
        }
    }

    /// Fill the fields `assemble` derives, where the caller left them empty.
    pub fn fill_derived(&mut self) {
        if self.page_origin.is_none() {
            self.page_origin = origin_of(&self.url);
        }
        if self.script_text.is_empty() {
            self.script_text = self.page_signals.inline_script_marker();
        }
        if self.permissions.is_empty() {
            self.permissions = self.page_signals.granted_permissions.iter().cloned().collect();
        }
    }
}

/// ASCII serialization of a URL's origin (`scheme://host[:port]`).
pub fn origin_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .map(|u| u.origin().ascii_serialization())
}

/// Hostname of a URL, falling back to the raw string when it does not parse.
pub fn hostname_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}
