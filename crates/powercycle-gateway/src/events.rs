//! Inbound trigger payloads.
//!
//! Two event shapes arrive at the gateway:
//!
//! - storage upload notifications, S3-style, where the uploaded object's key
//!   prefix picks the transition (`complete/` stops, `reboot/` reboots)
//! - schedule ticks, EventBridge-style, which carry an optional transition
//!   name in `detail.transition`
//!
//! Both are reduced to a [`TransitionKind`] here; the handlers supply the
//! resource identifier from configuration.

use chrono::{DateTime, Utc};
use powercycle_core::TransitionKind;
use serde::Deserialize;
use thiserror::Error;

use crate::config::TriggerRules;

/// Errors mapping an event onto a transition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    /// The notification held no records.
    #[error("storage event contains no records")]
    NoRecords,

    /// No record was an accepted upload under a known prefix.
    #[error("none of {records} storage record(s) matched a trigger prefix")]
    NoMatchingRecord {
        /// Number of records inspected.
        records: usize,
    },

    /// The schedule named a transition that does not exist.
    #[error("unknown transition: {0}")]
    UnknownTransition(String),
}

/// S3-style bucket notification.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageEvent {
    /// Notification records.
    #[serde(rename = "Records", default)]
    pub records: Vec<StorageRecord>,
}

/// One record of a bucket notification.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageRecord {
    /// Event name, e.g. `ObjectCreated:Put`.
    pub event_name: String,
    /// When the event happened.
    #[serde(default)]
    pub event_time: Option<DateTime<Utc>>,
    /// Bucket and object.
    pub s3: StorageEntity,
}

/// Bucket and object of a record.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageEntity {
    /// The bucket.
    pub bucket: Bucket,
    /// The object.
    pub object: StorageObject,
}

/// A bucket reference.
#[derive(Debug, Clone, Deserialize)]
pub struct Bucket {
    /// Bucket name.
    pub name: String,
}

/// An object reference. The key arrives URL-encoded.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageObject {
    /// Encoded object key.
    pub key: String,
}

/// The record that selected a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageMatch {
    /// The selected transition.
    pub kind: TransitionKind,
    /// Source bucket.
    pub bucket: String,
    /// Decoded object key.
    pub key: String,
    /// When the upload happened, if reported.
    pub event_time: Option<DateTime<Utc>>,
}

impl StorageRecord {
    /// Whether this record reports a newly created object.
    #[must_use]
    pub fn is_object_created(&self) -> bool {
        self.event_name.starts_with("ObjectCreated:")
    }

    /// The object key with URL encoding removed (`+` is a space).
    #[must_use]
    pub fn decoded_key(&self) -> String {
        decode_object_key(&self.s3.object.key)
    }
}

impl StorageEvent {
    /// Pick the transition for this notification.
    ///
    /// Records that are not uploads, come from another bucket or whose key
    /// matches no prefix are skipped. The first matching record wins.
    ///
    /// # Errors
    ///
    /// Returns `EventError::NoRecords` for an empty notification and
    /// `EventError::NoMatchingRecord` if nothing matched.
    pub fn select(&self, rules: &TriggerRules) -> Result<StorageMatch, EventError> {
        if self.records.is_empty() {
            return Err(EventError::NoRecords);
        }

        self.records
            .iter()
            .filter(|r| r.is_object_created() && rules.accepts_bucket(&r.s3.bucket.name))
            .find_map(|r| {
                let key = r.decoded_key();
                rules.transition_for_key(&key).map(|kind| StorageMatch {
                    kind,
                    bucket: r.s3.bucket.name.clone(),
                    key,
                    event_time: r.event_time,
                })
            })
            .ok_or(EventError::NoMatchingRecord {
                records: self.records.len(),
            })
    }
}

/// EventBridge-style scheduled event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleEvent {
    /// Event source, e.g. `aws.events`.
    #[serde(default)]
    pub source: Option<String>,
    /// Event type, e.g. `Scheduled Event`.
    #[serde(rename = "detail-type", default)]
    pub detail_type: Option<String>,
    /// When the schedule fired.
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    /// Free-form detail.
    #[serde(default)]
    pub detail: ScheduleDetail,
}

/// Detail of a scheduled event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleDetail {
    /// Transition to run; the configured default when absent.
    #[serde(default)]
    pub transition: Option<String>,
}

impl ScheduleEvent {
    /// The transition this tick asks for.
    ///
    /// # Errors
    ///
    /// Returns `EventError::UnknownTransition` if `detail.transition` names
    /// no known transition.
    pub fn transition(&self, default: TransitionKind) -> Result<TransitionKind, EventError> {
        match self.detail.transition.as_deref() {
            None => Ok(default),
            Some(name) => name
                .parse()
                .map_err(|_| EventError::UnknownTransition(name.to_string())),
        }
    }
}

fn decode_object_key(raw: &str) -> String {
    // Keys are form-encoded; a raw '&' or '=' never appears in them.
    url::form_urlencoded::parse(raw.as_bytes())
        .map(|(name, value)| {
            if value.is_empty() {
                name.into_owned()
            } else {
                format!("{name}={value}")
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}
