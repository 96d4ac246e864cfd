use serde::Deserialize;

use crate::errors::ConfigError;
use crate::notification::{Priority, PushType};
use crate::payload::MAX_PAYLOAD_SIZE;

/// APNs Configuration
///
/// Read from `APNS_*` environment variables by [`ApnsConfig::from_env`]:
/// `APNS_BUNDLE_ID` (required), `APNS_IS_PRODUCTION`,
/// `APNS_DEFAULT_PRIORITY` (`high`/`low`), `APNS_DEFAULT_PUSH_TYPE` and
/// `APNS_MAX_PAYLOAD_SIZE`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApnsConfig {
    /// Default `apns-topic`
    pub bundle_id: String,
    #[serde(default)]
    pub is_production: bool,
    #[serde(default)]
    pub default_priority: Option<Priority>,
    #[serde(default)]
    pub default_push_type: Option<PushType>,
    #[serde(default = "default_max_payload_size")]
    pub max_payload_size: usize,
}

fn default_max_payload_size() -> usize {
    MAX_PAYLOAD_SIZE
}

impl ApnsConfig {
    /// Create new APNs configuration
    pub fn new(bundle_id: String, is_production: bool) -> Self {
        Self {
            bundle_id,
            is_production,
            default_priority: None,
            default_push_type: None,
            max_payload_size: MAX_PAYLOAD_SIZE,
        }
    }

    /// Load configuration from `APNS_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let cfg = envy::prefixed("APNS_").from_env::<Self>()?;
        tracing::debug!(
            bundle_id = %cfg.bundle_id,
            is_production = cfg.is_production,
            "Loaded APNs configuration"
        );
        Ok(cfg)
    }

    pub fn with_default_priority(mut self, priority: Priority) -> Self {
        self.default_priority = Some(priority);
        self
    }

    pub fn with_default_push_type(mut self, push_type: PushType) -> Self {
        self.default_push_type = Some(push_type);
        self
    }

    pub fn with_max_payload_size(mut self, max_payload_size: usize) -> Self {
        self.max_payload_size = max_payload_size;
        self
    }

    /// Get APNs API endpoint based on environment
    pub fn endpoint(&self) -> &str {
        if self.is_production {
            "api.push.apple.com"
        } else {
            "api.sandbox.push.apple.com"
        }
    }
}
