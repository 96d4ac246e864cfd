//! APNs Payload Library
//!
//! Builds request bodies and headers for the Apple Push Notification service
//! (iOS, Safari web push and PassKit). Delivery is left to the transport:
//! this crate only produces the bytes and header set it sends.
//!
//! It handles:
//! - Alert models (generic, iOS, Safari) rendered with APNs wire names
//! - Payload models (iOS, Safari, PassKit) with custom top-level fields
//! - Canonical JSON encoding (compact, keys sorted at every level)
//! - Alert body truncation to keep the body under the 4096-byte ceiling
//! - Notification envelopes mapping delivery metadata to `apns-*` headers
//!
//! ```
//! use apns_payload::{IosPayload, Notification, Priority};
//!
//! let payload = IosPayload::new("Your order has shipped").with_badge(1);
//! let notification = Notification::new(payload, "com.example.app")
//!     .with_priority(Priority::High);
//!
//! assert_eq!(notification.headers()["apns-priority"], "10");
//! assert!(notification.body().len() <= apns_payload::MAX_PAYLOAD_SIZE);
//! ```

pub mod alert;
pub mod config;
pub mod encoding;
pub mod errors;
pub mod notification;
pub mod payload;

pub use alert::{AlertFields, AlertInput, GenericAlert, IosAlert, PayloadAlert, SafariAlert};
pub use config::ApnsConfig;
pub use encoding::encode;
pub use errors::{ConfigError, NotificationError, PayloadError};
pub use notification::{Notification, Priority, PushType, PRIORITY_HIGH, PRIORITY_LOW};
pub use payload::{
    IosPayload, PasskitPayload, Payload, PayloadFields, SafariPayload, MAX_PAYLOAD_SIZE,
};
