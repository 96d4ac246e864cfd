//! Alert models
//!
//! An alert is the user-visible part of a notification. Each variant renders
//! itself into a mapping keyed by APNs wire names; empty values are never
//! emitted.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::PayloadError;

/// Renders an alert into its APNs wire mapping
pub trait AlertFields {
    /// Build the wire mapping, substituting `override_body` for the stored
    /// body when given. The override exists for payload truncation.
    fn to_fields(&self, override_body: Option<&str>) -> Map<String, Value>;

    /// The stored alert body, if any
    fn body(&self) -> Option<&str>;

    fn to_dict(&self) -> Map<String, Value> {
        self.to_fields(None)
    }
}

fn insert_str(fields: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        fields.insert(key.to_string(), Value::String(value.to_string()));
    }
}

fn insert_list(fields: &mut Map<String, Value>, key: &str, value: Option<&[String]>) {
    if let Some(values) = value.filter(|v| !v.is_empty()) {
        fields.insert(
            key.to_string(),
            Value::Array(values.iter().cloned().map(Value::String).collect()),
        );
    }
}

/// Title and body shared by every alert variant
fn base_fields(
    title: Option<&str>,
    body: Option<&str>,
    override_body: Option<&str>,
) -> Map<String, Value> {
    let mut fields = Map::new();
    insert_str(&mut fields, "title", title);
    insert_str(&mut fields, "body", override_body.or(body));
    fields
}

/// Plain alert with an optional title and body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericAlert {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl GenericAlert {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alert carrying only a body, as produced from a raw string
    pub fn from_body(body: impl Into<String>) -> Self {
        Self {
            title: None,
            body: Some(body.into()),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

impl AlertFields for GenericAlert {
    fn to_fields(&self, override_body: Option<&str>) -> Map<String, Value> {
        base_fields(self.title.as_deref(), self.body.as_deref(), override_body)
    }

    fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

/// iOS alert with subtitle, localization keys and launch image
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct IosAlert {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub body: Option<String>,
    pub title_loc_key: Option<String>,
    pub title_loc_args: Option<Vec<String>>,
    pub subtitle_loc_key: Option<String>,
    pub subtitle_loc_args: Option<Vec<String>>,
    pub loc_key: Option<String>,
    pub loc_args: Option<Vec<String>>,
    pub launch_image: Option<String>,
}

impl IosAlert {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_title_loc(mut self, key: impl Into<String>, args: Vec<String>) -> Self {
        self.title_loc_key = Some(key.into());
        self.title_loc_args = Some(args);
        self
    }

    pub fn with_subtitle_loc(mut self, key: impl Into<String>, args: Vec<String>) -> Self {
        self.subtitle_loc_key = Some(key.into());
        self.subtitle_loc_args = Some(args);
        self
    }

    /// Localization key and arguments for the body
    pub fn with_loc(mut self, key: impl Into<String>, args: Vec<String>) -> Self {
        self.loc_key = Some(key.into());
        self.loc_args = Some(args);
        self
    }

    pub fn with_launch_image(mut self, launch_image: impl Into<String>) -> Self {
        self.launch_image = Some(launch_image.into());
        self
    }
}

impl AlertFields for IosAlert {
    fn to_fields(&self, override_body: Option<&str>) -> Map<String, Value> {
        let mut fields = base_fields(self.title.as_deref(), self.body.as_deref(), override_body);
        insert_str(&mut fields, "subtitle", self.subtitle.as_deref());
        insert_str(&mut fields, "title-loc-key", self.title_loc_key.as_deref());
        insert_list(&mut fields, "title-loc-args", self.title_loc_args.as_deref());
        insert_str(&mut fields, "subtitle-loc-key", self.subtitle_loc_key.as_deref());
        insert_list(&mut fields, "subtitle-loc-args", self.subtitle_loc_args.as_deref());
        insert_str(&mut fields, "loc-key", self.loc_key.as_deref());
        insert_list(&mut fields, "loc-args", self.loc_args.as_deref());
        insert_str(&mut fields, "launch-image", self.launch_image.as_deref());
        fields
    }

    fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

/// Safari web push alert. Title and body are required.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SafariAlert {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub action: Option<String>,
}

impl SafariAlert {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            action: None,
        }
    }

    /// Label of the action button
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }
}

impl AlertFields for SafariAlert {
    fn to_fields(&self, override_body: Option<&str>) -> Map<String, Value> {
        let mut fields = base_fields(
            Some(self.title.as_str()),
            Some(self.body.as_str()),
            override_body,
        );
        insert_str(&mut fields, "action", self.action.as_deref());
        fields
    }

    fn body(&self) -> Option<&str> {
        Some(self.body.as_str())
    }
}

/// Closed set of alert kinds a payload can carry
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadAlert {
    Generic(GenericAlert),
    Ios(IosAlert),
    Safari(SafariAlert),
}

impl AlertFields for PayloadAlert {
    fn to_fields(&self, override_body: Option<&str>) -> Map<String, Value> {
        match self {
            PayloadAlert::Generic(alert) => alert.to_fields(override_body),
            PayloadAlert::Ios(alert) => alert.to_fields(override_body),
            PayloadAlert::Safari(alert) => alert.to_fields(override_body),
        }
    }

    fn body(&self) -> Option<&str> {
        match self {
            PayloadAlert::Generic(alert) => alert.body(),
            PayloadAlert::Ios(alert) => alert.body(),
            PayloadAlert::Safari(alert) => alert.body(),
        }
    }
}

impl From<GenericAlert> for PayloadAlert {
    fn from(alert: GenericAlert) -> Self {
        PayloadAlert::Generic(alert)
    }
}

impl From<IosAlert> for PayloadAlert {
    fn from(alert: IosAlert) -> Self {
        PayloadAlert::Ios(alert)
    }
}

impl From<SafariAlert> for PayloadAlert {
    fn from(alert: SafariAlert) -> Self {
        PayloadAlert::Safari(alert)
    }
}

/// What a caller may hand to a payload constructor as its alert
///
/// A raw string becomes a [`GenericAlert`] with only a body set; it is
/// still rendered as `{"body": "..."}`, never as a bare string.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AlertInput {
    #[default]
    Absent,
    Raw(String),
    Alert(PayloadAlert),
}

impl AlertInput {
    /// Normalize into the alert stored by a payload
    pub fn into_alert(self) -> Option<PayloadAlert> {
        match self {
            AlertInput::Absent => None,
            AlertInput::Raw(body) => Some(PayloadAlert::Generic(GenericAlert::from_body(body))),
            AlertInput::Alert(alert) => Some(alert),
        }
    }
}

impl From<&str> for AlertInput {
    fn from(body: &str) -> Self {
        AlertInput::Raw(body.to_string())
    }
}

impl From<String> for AlertInput {
    fn from(body: String) -> Self {
        AlertInput::Raw(body)
    }
}

impl From<PayloadAlert> for AlertInput {
    fn from(alert: PayloadAlert) -> Self {
        AlertInput::Alert(alert)
    }
}

impl From<GenericAlert> for AlertInput {
    fn from(alert: GenericAlert) -> Self {
        AlertInput::Alert(alert.into())
    }
}

impl From<IosAlert> for AlertInput {
    fn from(alert: IosAlert) -> Self {
        AlertInput::Alert(alert.into())
    }
}

impl From<SafariAlert> for AlertInput {
    fn from(alert: SafariAlert) -> Self {
        AlertInput::Alert(alert.into())
    }
}

impl<T: Into<AlertInput>> From<Option<T>> for AlertInput {
    fn from(alert: Option<T>) -> Self {
        alert.map(Into::into).unwrap_or_default()
    }
}

/// Alerts described as JSON, e.g. from a queued notification request.
///
/// `null` is absent, a string is a raw body, an object uses wire names
/// (Safari when it carries `action`, iOS otherwise). Any other JSON type is
/// rejected.
impl TryFrom<Value> for AlertInput {
    type Error = PayloadError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(AlertInput::Absent),
            Value::String(body) => Ok(AlertInput::Raw(body)),
            Value::Object(fields) => {
                let is_safari = fields.contains_key("action");
                let value = Value::Object(fields);
                let alert = if is_safari {
                    serde_json::from_value::<SafariAlert>(value).map(PayloadAlert::from)
                } else {
                    serde_json::from_value::<IosAlert>(value).map(PayloadAlert::from)
                };
                alert
                    .map(AlertInput::Alert)
                    .map_err(|e| PayloadError::InvalidAlert(e.to_string()))
            }
            Value::Bool(_) => Err(PayloadError::UnsupportedAlert { found: "boolean" }),
            Value::Number(_) => Err(PayloadError::UnsupportedAlert { found: "number" }),
            Value::Array(_) => Err(PayloadError::UnsupportedAlert { found: "array" }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_ios_alert() -> IosAlert {
        IosAlert::new()
            .with_title("title")
            .with_title_loc("title_loc_k", vec!["title_loc_a".to_string()])
            .with_subtitle("subtitle")
            .with_subtitle_loc("subtitle_loc_k", vec!["subtitle_loc_a".to_string()])
            .with_body("body")
            .with_loc("body_loc_k", vec!["body_loc_a".to_string()])
            .with_launch_image("img")
    }

    #[test]
    fn test_ios_alert_fields() {
        let fields = Value::Object(full_ios_alert().to_dict());
        assert_eq!(
            fields,
            json!({
                "title": "title",
                "title-loc-key": "title_loc_k",
                "title-loc-args": ["title_loc_a"],
                "subtitle": "subtitle",
                "subtitle-loc-key": "subtitle_loc_k",
                "subtitle-loc-args": ["subtitle_loc_a"],
                "body": "body",
                "loc-key": "body_loc_k",
                "loc-args": ["body_loc_a"],
                "launch-image": "img",
            })
        );
    }

    #[test]
    fn test_empty_values_are_omitted() {
        let alert = IosAlert {
            title: Some(String::new()),
            subtitle: None,
            body: Some("body".to_string()),
            loc_args: Some(vec![]),
            launch_image: Some(String::new()),
            ..IosAlert::default()
        };
        assert_eq!(Value::Object(alert.to_dict()), json!({ "body": "body" }));
        assert!(IosAlert::new().to_dict().is_empty());
        assert!(GenericAlert::new().to_dict().is_empty());
    }

    #[test]
    fn test_safari_alert_fields() {
        let alert = SafariAlert::new("title", "body").with_action("send");
        assert_eq!(
            Value::Object(alert.to_dict()),
            json!({ "title": "title", "body": "body", "action": "send" })
        );
    }

    #[test]
    fn test_override_body_replaces_stored_body() {
        let alert = GenericAlert::new().with_title("t").with_body("original");
        let fields = alert.to_fields(Some("short..."));
        assert_eq!(Value::Object(fields), json!({ "title": "t", "body": "short..." }));
        assert_eq!(alert.body(), Some("original"));
    }

    #[test]
    fn test_raw_string_normalizes_to_generic_body() {
        let alert = AlertInput::from("my_alert").into_alert().unwrap();
        assert_eq!(alert, PayloadAlert::Generic(GenericAlert::from_body("my_alert")));
        assert_eq!(Value::Object(alert.to_dict()), json!({ "body": "my_alert" }));
    }

    #[test]
    fn test_option_input() {
        assert_eq!(AlertInput::from(None::<&str>), AlertInput::Absent);
        assert_eq!(
            AlertInput::from(Some("hi")),
            AlertInput::Raw("hi".to_string())
        );
    }

    #[test]
    fn test_json_input_variants() {
        assert_eq!(AlertInput::try_from(Value::Null).unwrap(), AlertInput::Absent);
        assert_eq!(
            AlertInput::try_from(json!("body")).unwrap(),
            AlertInput::Raw("body".to_string())
        );

        let ios = AlertInput::try_from(json!({ "title": "t", "loc-key": "k" })).unwrap();
        assert_eq!(
            ios,
            AlertInput::Alert(PayloadAlert::Ios(IosAlert {
                title: Some("t".to_string()),
                loc_key: Some("k".to_string()),
                ..IosAlert::default()
            }))
        );

        let safari =
            AlertInput::try_from(json!({ "title": "t", "body": "b", "action": "go" })).unwrap();
        assert_eq!(
            safari,
            AlertInput::Alert(PayloadAlert::Safari(SafariAlert::new("t", "b").with_action("go")))
        );
    }

    #[test]
    fn test_json_input_rejects_unsupported_types() {
        assert_eq!(
            AlertInput::try_from(json!(42)),
            Err(PayloadError::UnsupportedAlert { found: "number" })
        );
        assert_eq!(
            AlertInput::try_from(json!(true)),
            Err(PayloadError::UnsupportedAlert { found: "boolean" })
        );
        assert!(matches!(
            AlertInput::try_from(json!(["a"])),
            Err(PayloadError::UnsupportedAlert { .. })
        ));
    }

    #[test]
    fn test_json_input_rejects_malformed_objects() {
        let err = AlertInput::try_from(json!({ "bogus": 1 })).unwrap_err();
        assert!(matches!(err, PayloadError::InvalidAlert(_)));

        // Safari alerts need both title and body
        let err = AlertInput::try_from(json!({ "title": "t", "action": "go" })).unwrap_err();
        assert!(matches!(err, PayloadError::InvalidAlert(_)));
    }
}
