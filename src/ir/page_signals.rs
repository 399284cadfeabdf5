use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix of the script-text marker built from collected inline script lengths.
pub const INLINE_LEN_MARKER: &str = "INLINE_LEN:";

/// Signals collected from a loaded page by the host's page collector.
///
/// Built once per detection run, consumed once by the extractors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageSignals {
    pub title: String,
    /// Visible body text, at most the first 5000 characters.
    pub body_text_sample: String,
    pub has_password_field: bool,
    pub inline_handler_count: u32,
    pub iframe_count: u32,
    pub scripts: Vec<ScriptSummary>,
    /// Permission names the page currently holds, if the collector can see them.
    pub granted_permissions: Vec<String>,
    pub timed_out: bool,
    pub collection_error: Option<String>,
}

/// Summary of one `<script>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScriptSummary {
    pub is_external: bool,
    /// Length of the inline source; zero for external scripts.
    pub inline_length: u64,
}

impl PageSignals {
    /// Placeholder used when collection did not answer in time.
    pub fn timed_out() -> Self {
        Self {
            timed_out: true,
            ..Default::default()
        }
    }

    /// Placeholder used when the collector reported a failure.
    pub fn collection_failed(description: impl Into<String>) -> Self {
        Self {
            collection_error: Some(description.into()),
            ..Default::default()
        }
    }

    /// True when the signals came back from a successful collection.
    pub fn is_complete(&self) -> bool {
        !self.timed_out && self.collection_error.is_none()
    }

    /// `INLINE_LEN:<total>` over the collected inline scripts, or an empty
    /// string when collection did not complete.
    pub fn inline_script_marker(&self) -> String {
        if !self.is_complete() {
            return String::new();
        }
        let total: u64 = self.scripts.iter().map(|s| s.inline_length).sum();
        format!("{INLINE_LEN_MARKER}{total}")
    }

    /// Decode collector output from loosely-typed JSON.
    ///
    /// Wrong-typed fields read as absent. Accepts the collector's short names
    /// (`bodyText`, `inlineHandlers`, `error`, script `src`) as well as the
    /// field names used by this crate. A non-object value is reported as a
    /// collection error.
    pub fn from_value(value: &Value) -> Self {
        if !value.is_object() {
            return Self::collection_failed("no-result");
        }

        let text = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| value.get(*k).and_then(Value::as_str))
                .unwrap_or_default()
                .to_owned()
        };
        let count = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| value.get(*k).and_then(Value::as_u64))
                .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
                .unwrap_or(0)
        };
        let flag = |key: &str| value.get(key).and_then(Value::as_bool).unwrap_or(false);

        let scripts = value
            .get("scripts")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(ScriptSummary::from_value).collect())
            .unwrap_or_default();

        let granted_permissions = value
            .get("grantedPermissions")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        let collection_error = ["collectionError", "error"]
            .iter()
            .find_map(|k| match value.get(*k) {
                None | Some(Value::Null) | Some(Value::Bool(false)) => None,
                Some(Value::String(s)) if s.is_empty() => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
            });

        Self {
            title: text(&["title"]),
            body_text_sample: text(&["bodyTextSample", "bodyText"]),
            has_password_field: flag("hasPasswordField"),
            inline_handler_count: count(&["inlineHandlerCount", "inlineHandlers"]),
            iframe_count: count(&["iframeCount"]),
            scripts,
            granted_permissions,
            timed_out: flag("timedOut"),
            collection_error,
        }
    }
}

impl ScriptSummary {
    fn from_value(value: &Value) -> Self {
        let is_external = value
            .get("isExternal")
            .and_then(Value::as_bool)
            .unwrap_or_else(|| value.get("src").and_then(Value::as_str).is_some_and(|s| !s.is_empty()));
        let inline_length = if is_external {
            0
        } else {
            value.get("inlineLength").and_then(Value::as_u64).unwrap_or(0)
        };
        Self {
            is_external,
            inline_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn decodes_collector_short_names() {
        let signals = PageSignals::from_value(&json!({
            "title": "Sign in",
            "bodyText": "Please confirm your identity",
            "hasPasswordField": true,
            "inlineHandlers": 12,
            "iframeCount": 3,
            "scripts": [
                { "src": "https://cdn.example/app.js", "inlineLength": 0 },
                { "src": null, "inlineLength": 120 }
            ]
        }));

        assert_eq!(
            signals,
            PageSignals {
                title: "Sign in".into(),
                body_text_sample: "Please confirm your identity".into(),
                has_password_field: true,
                inline_handler_count: 12,
                iframe_count: 3,
                scripts: vec![
                    ScriptSummary {
                        is_external: true,
                        inline_length: 0
                    },
                    ScriptSummary {
                        is_external: false,
                        inline_length: 120
                    },
                ],
                granted_permissions: vec![],
                timed_out: false,
                collection_error: None,
            }
        );
    }

    #[test]
    fn wrong_types_read_as_absent() {
        let signals = PageSignals::from_value(&json!({
            "title": 5,
            "hasPasswordField": "yes",
            "inlineHandlers": "many",
            "iframeCount": -3
        }));
        assert_eq!(signals.title, "");
        assert!(!signals.has_password_field);
        assert_eq!(signals.inline_handler_count, 0);
        assert_eq!(signals.iframe_count, 0);
        assert!(signals.is_complete());
    }

    #[test]
    fn error_field_becomes_collection_error() {
        let signals = PageSignals::from_value(&json!({ "error": "SecurityError" }));
        assert_eq!(signals.collection_error.as_deref(), Some("SecurityError"));

        let signals = PageSignals::from_value(&Value::Null);
        assert_eq!(signals.collection_error.as_deref(), Some("no-result"));
    }

    #[test]
    fn marker_sums_inline_lengths_only_when_complete() {
        let mut signals = PageSignals {
            scripts: vec![
                ScriptSummary {
                    is_external: false,
                    inline_length: 40,
                },
                ScriptSummary {
                    is_external: false,
                    inline_length: 2,
                },
            ],
            ..Default::default()
        };
        assert_eq!(signals.inline_script_marker(), "INLINE_LEN:42");

        signals.timed_out = true;
        assert_eq!(signals.inline_script_marker(), "");
    }
}
