//! Payload models
//!
//! A payload renders to `{"aps": {...}, ...custom}`. The `aps` dictionary
//! holds the alert plus the service-specific keys; custom keys are merged at
//! the top level afterwards, so a custom `"aps"` key replaces the generated
//! one.

use serde_json::{Map, Number, Value};
use tracing::warn;

use crate::alert::{AlertFields, AlertInput, PayloadAlert};
use crate::encoding::encode_within_limit;

/// Maximum encoded payload size accepted by APNs for regular pushes
pub const MAX_PAYLOAD_SIZE: usize = 4096;

/// Reserved top-level key
pub const APS_KEY: &str = "aps";

/// Renders a payload into its APNs wire mapping and JSON body
pub trait PayloadFields {
    /// The alert carried by this payload, if any
    fn alert(&self) -> Option<&PayloadAlert>;

    /// Build the full wire mapping, substituting `override_body` for the
    /// alert body when given.
    fn to_fields(&self, override_body: Option<&str>) -> Map<String, Value>;

    fn to_dict(&self) -> Map<String, Value> {
        self.to_fields(None)
    }

    /// Canonical JSON body, with the alert body truncated to fit in
    /// [`MAX_PAYLOAD_SIZE`] bytes when needed
    fn to_json(&self) -> Vec<u8> {
        self.to_json_with_limit(MAX_PAYLOAD_SIZE)
    }

    /// Same as [`PayloadFields::to_json`] against a caller-chosen ceiling
    /// (VoIP pushes allow 5120 bytes, for instance)
    fn to_json_with_limit(&self, limit: usize) -> Vec<u8> {
        let body = self.alert().and_then(|alert| alert.body());
        encode_within_limit(body, limit, |override_body| self.to_fields(override_body))
    }
}

/// `aps` dictionary holding just the alert
fn alert_aps(alert: Option<&PayloadAlert>, override_body: Option<&str>) -> Map<String, Value> {
    let mut aps = Map::new();
    if let Some(alert) = alert {
        aps.insert(
            "alert".to_string(),
            Value::Object(alert.to_fields(override_body)),
        );
    }
    aps
}

/// Place `aps` at the top level, then merge custom fields over it
fn with_custom_fields(aps: Map<String, Value>, custom: &Map<String, Value>) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert(APS_KEY.to_string(), Value::Object(aps));
    for (key, value) in custom {
        fields.insert(key.clone(), value.clone());
    }
    fields
}

fn insert_custom(custom: &mut Map<String, Value>, key: String, value: Value) {
    if key == APS_KEY {
        warn!("Custom field 'aps' replaces the generated aps dictionary");
    }
    custom.insert(key, value);
}

fn insert_str(aps: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        aps.insert(key.to_string(), Value::String(value.to_string()));
    }
}

/// Payload for iOS, iPadOS, macOS, watchOS and tvOS devices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IosPayload {
    alert: Option<PayloadAlert>,
    custom: Map<String, Value>,
    badge: Option<u32>,
    sound: Option<String>,
    category: Option<String>,
    content_available: bool,
    mutable_content: bool,
    thread_id: Option<String>,
    target_content_id: Option<String>,
    interruption_level: Option<String>,
    relevance_score: Option<f64>,
}

impl IosPayload {
    /// Create a payload from a raw body string, an alert, or nothing
    pub fn new(alert: impl Into<AlertInput>) -> Self {
        let alert: AlertInput = alert.into();
        Self {
            alert: alert.into_alert(),
            ..Self::default()
        }
    }

    /// Badge number; `0` clears the badge
    pub fn with_badge(mut self, badge: u32) -> Self {
        self.badge = Some(badge);
        self
    }

    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Mark as a background update (`content-available: 1`)
    pub fn with_content_available(mut self, content_available: bool) -> Self {
        self.content_available = content_available;
        self
    }

    /// Allow a notification service extension to modify the content
    pub fn with_mutable_content(mut self, mutable_content: bool) -> Self {
        self.mutable_content = mutable_content;
        self
    }

    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn with_target_content_id(mut self, target_content_id: impl Into<String>) -> Self {
        self.target_content_id = Some(target_content_id.into());
        self
    }

    /// `passive`, `active`, `time-sensitive` or `critical`
    pub fn with_interruption_level(mut self, interruption_level: impl Into<String>) -> Self {
        self.interruption_level = Some(interruption_level.into());
        self
    }

    /// Summary ranking between 0 and 1
    ///
    /// Encoded in shortest round-trip form with a signed two-digit exponent
    /// for very small or large values, so `0.00001` is written as `1e-05`.
    pub fn with_relevance_score(mut self, relevance_score: f64) -> Self {
        self.relevance_score = Some(relevance_score);
        self
    }

    pub fn with_custom(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        insert_custom(&mut self.custom, key.into(), value.into());
        self
    }

    pub fn with_custom_map(mut self, custom: Map<String, Value>) -> Self {
        for (key, value) in custom {
            insert_custom(&mut self.custom, key, value);
        }
        self
    }

    pub fn badge(&self) -> Option<u32> {
        self.badge
    }

    pub fn sound(&self) -> Option<&str> {
        self.sound.as_deref()
    }

    pub fn content_available(&self) -> bool {
        self.content_available
    }

    pub fn mutable_content(&self) -> bool {
        self.mutable_content
    }

    pub fn custom(&self) -> &Map<String, Value> {
        &self.custom
    }
}

impl PayloadFields for IosPayload {
    fn alert(&self) -> Option<&PayloadAlert> {
        self.alert.as_ref()
    }

    fn to_fields(&self, override_body: Option<&str>) -> Map<String, Value> {
        let mut aps = alert_aps(self.alert.as_ref(), override_body);

        if let Some(badge) = self.badge {
            aps.insert("badge".to_string(), Value::from(badge));
        }
        insert_str(&mut aps, "sound", self.sound.as_deref());
        insert_str(&mut aps, "category", self.category.as_deref());
        if self.content_available {
            aps.insert("content-available".to_string(), Value::from(1));
        }
        if self.mutable_content {
            aps.insert("mutable-content".to_string(), Value::from(1));
        }
        insert_str(&mut aps, "thread-id", self.thread_id.as_deref());
        insert_str(&mut aps, "target-content-id", self.target_content_id.as_deref());
        insert_str(&mut aps, "interruption-level", self.interruption_level.as_deref());
        if let Some(score) = self.relevance_score {
            match Number::from_f64(score) {
                Some(score) => {
                    aps.insert("relevance-score".to_string(), Value::Number(score));
                }
                None => warn!(score, "Skipping relevance-score that is not a finite number"),
            }
        }

        with_custom_fields(aps, &self.custom)
    }
}

/// Payload for Safari web push
///
/// `url-args` is always emitted, even when empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SafariPayload {
    alert: Option<PayloadAlert>,
    custom: Map<String, Value>,
    url_args: Vec<String>,
}

impl SafariPayload {
    pub fn new(alert: impl Into<AlertInput>) -> Self {
        let alert: AlertInput = alert.into();
        Self {
            alert: alert.into_alert(),
            ..Self::default()
        }
    }

    /// Values substituted into the website's URL format string
    pub fn with_url_args<I, S>(mut self, url_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.url_args = url_args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_custom(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        insert_custom(&mut self.custom, key.into(), value.into());
        self
    }

    pub fn with_custom_map(mut self, custom: Map<String, Value>) -> Self {
        for (key, value) in custom {
            insert_custom(&mut self.custom, key, value);
        }
        self
    }

    pub fn url_args(&self) -> &[String] {
        &self.url_args
    }

    pub fn custom(&self) -> &Map<String, Value> {
        &self.custom
    }
}

impl PayloadFields for SafariPayload {
    fn alert(&self) -> Option<&PayloadAlert> {
        self.alert.as_ref()
    }

    fn to_fields(&self, override_body: Option<&str>) -> Map<String, Value> {
        let mut aps = alert_aps(self.alert.as_ref(), override_body);
        aps.insert(
            "url-args".to_string(),
            Value::Array(self.url_args.iter().cloned().map(Value::String).collect()),
        );
        with_custom_fields(aps, &self.custom)
    }
}

/// Payload for PassKit pass update pushes
///
/// Wallet ignores the body of pass updates, so this always renders as `{}`.
/// An alert and custom fields are accepted and kept, but never emitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PasskitPayload {
    alert: Option<PayloadAlert>,
    custom: Map<String, Value>,
}

impl PasskitPayload {
    pub fn new(alert: impl Into<AlertInput>) -> Self {
        let alert: AlertInput = alert.into();
        Self {
            alert: alert.into_alert(),
            custom: Map::new(),
        }
    }

    pub fn with_custom(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }

    pub fn custom(&self) -> &Map<String, Value> {
        &self.custom
    }
}

impl PayloadFields for PasskitPayload {
    fn alert(&self) -> Option<&PayloadAlert> {
        self.alert.as_ref()
    }

    fn to_fields(&self, _override_body: Option<&str>) -> Map<String, Value> {
        Map::new()
    }
}

/// Closed set of payload kinds a notification can carry
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Ios(IosPayload),
    Safari(SafariPayload),
    Passkit(PasskitPayload),
}

impl PayloadFields for Payload {
    fn alert(&self) -> Option<&PayloadAlert> {
        match self {
            Payload::Ios(payload) => payload.alert(),
            Payload::Safari(payload) => payload.alert(),
            Payload::Passkit(payload) => payload.alert(),
        }
    }

    fn to_fields(&self, override_body: Option<&str>) -> Map<String, Value> {
        match self {
            Payload::Ios(payload) => payload.to_fields(override_body),
            Payload::Safari(payload) => payload.to_fields(override_body),
            Payload::Passkit(payload) => payload.to_fields(override_body),
        }
    }
}

impl From<IosPayload> for Payload {
    fn from(payload: IosPayload) -> Self {
        Payload::Ios(payload)
    }
}

impl From<SafariPayload> for Payload {
    fn from(payload: SafariPayload) -> Self {
        Payload::Safari(payload)
    }
}

impl From<PasskitPayload> for Payload {
    fn from(payload: PasskitPayload) -> Self {
        Payload::Passkit(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{GenericAlert, IosAlert, SafariAlert};
    use serde_json::json;

    fn ios_payload() -> IosPayload {
        IosPayload::new("my_alert")
            .with_badge(2)
            .with_sound("chime")
            .with_content_available(true)
            .with_mutable_content(true)
            .with_category("my_category")
            .with_custom("extra", "something")
            .with_thread_id("42")
    }

    #[test]
    fn test_ios_payload() {
        assert_eq!(
            Value::Object(ios_payload().to_dict()),
            json!({
                "aps": {
                    "alert": { "body": "my_alert" },
                    "badge": 2,
                    "sound": "chime",
                    "content-available": 1,
                    "mutable-content": 1,
                    "thread-id": "42",
                    "category": "my_category",
                },
                "extra": "something",
            })
        );
    }

    #[test]
    fn test_ios_payload_optional_fields() {
        let payload = IosPayload::new(None::<&str>)
            .with_badge(0)
            .with_target_content_id("window-1")
            .with_interruption_level("time-sensitive")
            .with_relevance_score(0.5);

        assert_eq!(
            Value::Object(payload.to_dict()),
            json!({
                "aps": {
                    "badge": 0,
                    "target-content-id": "window-1",
                    "interruption-level": "time-sensitive",
                    "relevance-score": 0.5,
                },
            })
        );
    }

    #[test]
    fn test_ios_payload_false_flags_are_omitted() {
        let payload = IosPayload::new(GenericAlert::new().with_title("t"))
            .with_content_available(false)
            .with_mutable_content(false)
            .with_sound("");
        assert_eq!(
            Value::Object(payload.to_dict()),
            json!({ "aps": { "alert": { "title": "t" } } })
        );
    }

    #[test]
    fn test_ios_payload_skips_non_finite_relevance_score() {
        let payload = IosPayload::new("hi").with_relevance_score(f64::NAN);
        assert!(payload.to_dict()["aps"].get("relevance-score").is_none());
    }

    #[test]
    fn test_relevance_score_encoding() {
        let payload = IosPayload::new(AlertInput::Absent).with_relevance_score(0.00001);
        assert_eq!(payload.to_json(), br#"{"aps":{"relevance-score":1e-05}}"#.to_vec());

        let payload = IosPayload::new(AlertInput::Absent).with_relevance_score(1.0);
        assert_eq!(payload.to_json(), br#"{"aps":{"relevance-score":1.0}}"#.to_vec());
    }

    #[test]
    fn test_ios_payload_with_ios_alert() {
        let alert = IosAlert::new()
            .with_title("title")
            .with_subtitle("subtitle")
            .with_body("body");
        let payload = IosPayload::new(alert).with_badge(2);
        assert_eq!(
            Value::Object(payload.to_dict()),
            json!({
                "aps": {
                    "alert": { "title": "title", "subtitle": "subtitle", "body": "body" },
                    "badge": 2,
                },
            })
        );
    }

    #[test]
    fn test_safari_payload_emits_empty_url_args() {
        let payload = SafariPayload::new("my_alert").with_custom("extra", "something");
        assert_eq!(
            Value::Object(payload.to_dict()),
            json!({
                "aps": { "alert": { "body": "my_alert" }, "url-args": [] },
                "extra": "something",
            })
        );
    }

    #[test]
    fn test_safari_payload_with_safari_alert() {
        let payload = SafariPayload::new(SafariAlert::new("title", "body").with_action("send"))
            .with_url_args(["boarding", "A12"]);
        assert_eq!(
            Value::Object(payload.to_dict()),
            json!({
                "aps": {
                    "alert": { "title": "title", "body": "body", "action": "send" },
                    "url-args": ["boarding", "A12"],
                },
            })
        );
    }

    #[test]
    fn test_passkit_payload_is_always_empty() {
        let payload = PasskitPayload::new("ignored").with_custom("extra", "ignored");
        assert!(payload.to_dict().is_empty());
        assert_eq!(payload.to_json(), b"{}");
        assert!(PasskitPayload::default().to_dict().is_empty());
    }

    #[test]
    fn test_custom_aps_overwrites_generated_aps() {
        let payload = IosPayload::new("hello")
            .with_badge(1)
            .with_custom(APS_KEY, json!({ "replaced": true }));
        assert_eq!(
            Value::Object(payload.to_dict()),
            json!({ "aps": { "replaced": true } })
        );
    }

    #[test]
    fn test_custom_map_is_merged_at_top_level() {
        let mut custom = Map::new();
        custom.insert("a".to_string(), json!(1));
        custom.insert("b".to_string(), json!({ "nested": [1, 2] }));

        let fields = SafariPayload::new(None::<&str>).with_custom_map(custom).to_dict();
        assert_eq!(fields["a"], json!(1));
        assert_eq!(fields["b"], json!({ "nested": [1, 2] }));
        assert_eq!(fields["aps"], json!({ "url-args": [] }));
    }

    #[test]
    fn test_to_json_is_compact_and_sorted() {
        let json = String::from_utf8(ios_payload().to_json()).unwrap();
        assert_eq!(
            json,
            r#"{"aps":{"alert":{"body":"my_alert"},"badge":2,"category":"my_category","content-available":1,"mutable-content":1,"sound":"chime","thread-id":"42"},"extra":"something"}"#
        );
    }

    #[test]
    fn test_to_json_with_limit_truncates_body() {
        let payload = IosPayload::new("a".repeat(300)).with_badge(3);
        let encoded = payload.to_json_with_limit(200);
        assert!(encoded.len() <= 200);

        let decoded: Value = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(decoded["aps"]["badge"], json!(3));
        assert!(decoded["aps"]["alert"]["body"]
            .as_str()
            .unwrap()
            .ends_with("..."));
    }

    #[test]
    fn test_payload_enum_dispatch() {
        let payload = Payload::from(ios_payload());
        assert_eq!(payload.to_dict(), ios_payload().to_dict());
        assert_eq!(payload.alert().and_then(|a| a.body()), Some("my_alert"));

        let passkit = Payload::from(PasskitPayload::default());
        assert!(passkit.alert().is_none());
        assert!(passkit.to_dict().is_empty());
    }
}
