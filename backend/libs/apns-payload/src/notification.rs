//! Notification envelope
//!
//! Wraps a payload with the delivery metadata that APNs reads from HTTP/2
//! request headers. The transport sends `headers()` and `body()` as-is.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ApnsConfig;
use crate::errors::NotificationError;
use crate::payload::{Payload, PayloadFields, MAX_PAYLOAD_SIZE};

pub const PRIORITY_HIGH: u8 = 10;
pub const PRIORITY_LOW: u8 = 5;

pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_TOPIC: &str = "apns-topic";
pub const HEADER_ID: &str = "apns-id";
pub const HEADER_COLLAPSE_ID: &str = "apns-collapse-id";
pub const HEADER_PRIORITY: &str = "apns-priority";
pub const HEADER_EXPIRATION: &str = "apns-expiration";
pub const HEADER_PUSH_TYPE: &str = "apns-push-type";

/// APNs Notification Priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Immediate delivery
    High,
    /// Delivery may be grouped and throttled to save power
    Low,
}

impl Priority {
    pub fn as_u8(&self) -> u8 {
        match self {
            Priority::High => PRIORITY_HIGH,
            Priority::Low => PRIORITY_LOW,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "10",
            Priority::Low => "5",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = NotificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "10" | "high" => Ok(Priority::High),
            "5" | "low" => Ok(Priority::Low),
            other => Err(NotificationError::UnknownPriority(other.to_string())),
        }
    }
}

/// Value of the `apns-push-type` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushType {
    Alert,
    Background,
    Voip,
    Complication,
    FileProvider,
    Mdm,
}

impl PushType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushType::Alert => "alert",
            PushType::Background => "background",
            PushType::Voip => "voip",
            PushType::Complication => "complication",
            PushType::FileProvider => "fileprovider",
            PushType::Mdm => "mdm",
        }
    }
}

impl fmt::Display for PushType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PushType {
    type Err = NotificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "alert" => Ok(PushType::Alert),
            "background" => Ok(PushType::Background),
            "voip" => Ok(PushType::Voip),
            "complication" => Ok(PushType::Complication),
            "fileprovider" => Ok(PushType::FileProvider),
            "mdm" => Ok(PushType::Mdm),
            other => Err(NotificationError::UnknownPushType(other.to_string())),
        }
    }
}

/// A payload plus its delivery metadata
///
/// Built once right before handing off to the transport, then read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    payload: Payload,
    topic: Option<String>,
    apns_id: Option<String>,
    collapse_id: Option<String>,
    expiration: Option<i64>,
    priority: Option<Priority>,
    push_type: Option<PushType>,
    max_payload_size: usize,
}

impl Notification {
    /// Create a notification for `topic`, usually the app bundle ID
    pub fn new(payload: impl Into<Payload>, topic: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            topic: Some(topic.into()),
            apns_id: None,
            collapse_id: None,
            expiration: None,
            priority: None,
            push_type: None,
            max_payload_size: MAX_PAYLOAD_SIZE,
        }
    }

    /// Create a notification with topic, priority, push type and size limit
    /// taken from `cfg`
    pub fn from_config(payload: impl Into<Payload>, cfg: &ApnsConfig) -> Self {
        Self {
            priority: cfg.default_priority,
            push_type: cfg.default_push_type,
            max_payload_size: cfg.max_payload_size,
            ..Self::new(payload, cfg.bundle_id.clone())
        }
    }

    /// Canonical UUID identifying the notification; APNs assigns one if unset
    pub fn with_apns_id(mut self, apns_id: impl Into<String>) -> Self {
        self.apns_id = Some(apns_id.into());
        self
    }

    /// Assign a fresh v4 UUID in lowercase hyphenated form
    pub fn with_random_apns_id(self) -> Self {
        self.with_apns_id(Uuid::new_v4().hyphenated().to_string())
    }

    /// Notifications sharing a collapse id replace each other on the device
    pub fn with_collapse_id(mut self, collapse_id: impl Into<String>) -> Self {
        self.collapse_id = Some(collapse_id.into());
        self
    }

    /// Unix timestamp (seconds) after which APNs discards the notification
    pub fn with_expiration(mut self, expiration: i64) -> Self {
        self.expiration = Some(expiration);
        self
    }

    pub fn with_expiration_at(self, expires_at: DateTime<Utc>) -> Self {
        self.with_expiration(expires_at.timestamp())
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_push_type(mut self, push_type: PushType) -> Self {
        self.push_type = Some(push_type);
        self
    }

    /// Override the body size ceiling, e.g. 5120 bytes for VoIP pushes
    pub fn with_max_payload_size(mut self, max_payload_size: usize) -> Self {
        self.max_payload_size = max_payload_size;
        self
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    pub fn apns_id(&self) -> Option<&str> {
        self.apns_id.as_deref()
    }

    pub fn collapse_id(&self) -> Option<&str> {
        self.collapse_id.as_deref()
    }

    pub fn expiration(&self) -> Option<i64> {
        self.expiration
    }

    pub fn priority(&self) -> Option<Priority> {
        self.priority
    }

    pub fn push_type(&self) -> Option<PushType> {
        self.push_type
    }

    /// Request headers for this notification
    ///
    /// `Content-Type` is always present. Every `apns-*` header is present
    /// only when its value is set and non-empty; an expiration of `0` counts
    /// as unset.
    pub fn headers(&self) -> BTreeMap<&'static str, String> {
        let mut headers = BTreeMap::new();
        headers.insert(HEADER_CONTENT_TYPE, CONTENT_TYPE_JSON.to_string());

        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());

        if let Some(topic) = non_empty(&self.topic) {
            headers.insert(HEADER_TOPIC, topic);
        }
        if let Some(apns_id) = non_empty(&self.apns_id) {
            headers.insert(HEADER_ID, apns_id);
        }
        if let Some(collapse_id) = non_empty(&self.collapse_id) {
            headers.insert(HEADER_COLLAPSE_ID, collapse_id);
        }
        if let Some(priority) = self.priority {
            headers.insert(HEADER_PRIORITY, priority.as_str().to_string());
        }
        if let Some(expiration) = self.expiration.filter(|e| *e != 0) {
            headers.insert(HEADER_EXPIRATION, expiration.to_string());
        }
        if let Some(push_type) = self.push_type {
            headers.insert(HEADER_PUSH_TYPE, push_type.as_str().to_string());
        }
        headers
    }

    /// Headers as an `http::HeaderMap`, for transports built on the `http`
    /// crate. Header names are lowercased.
    pub fn header_map(&self) -> Result<HeaderMap, NotificationError> {
        let mut map = HeaderMap::new();
        for (name, value) in self.headers() {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                NotificationError::InvalidHeader {
                    name: name.to_string(),
                    reason: e.to_string(),
                }
            })?;
            let header_value =
                HeaderValue::from_str(&value).map_err(|e| NotificationError::InvalidHeader {
                    name: name.to_string(),
                    reason: e.to_string(),
                })?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }

    /// Canonical JSON request body, truncated to the size ceiling
    pub fn body(&self) -> Vec<u8> {
        self.payload.to_json_with_limit(self.max_payload_size)
    }
}
