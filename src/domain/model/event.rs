// src/domain/model/event.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::model::severity::Severity;

/// Metadata key carrying the source revision (e.g. `main/4f0c...`).
pub const METADATA_REVISION: &str = "revision";
/// Metadata key under which an alert rule's summary is merged.
pub const METADATA_SUMMARY: &str = "summary";

/// Object the reconciler was acting on when it emitted the event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvolvedObject {
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

/// Lifecycle event reported by an upstream reconciler.
///
/// Values are immutable once decoded. A notification is just a copy of the
/// event, optionally carrying the alert summary in `metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub involved_object: InvolvedObject,
    pub severity: Severity,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    pub message: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub reporting_controller: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporting_instance: Option<String>,
}

impl Event {
    pub fn new(
        involved_object: InvolvedObject,
        severity: Severity,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            involved_object,
            severity,
            timestamp: Utc::now(),
            message: message.into(),
            reason: reason.into(),
            metadata: None,
            reporting_controller: String::new(),
            reporting_instance: None,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|md| md.get(key))
            .map(String::as_str)
    }

    /// Copies the event for one destination, merging the alert summary.
    ///
    /// Each destination gets its own copy so the summary written here never
    /// shows up in deliveries for other rules.
    pub fn to_notification(&self, summary: Option<&str>) -> Event {
        let mut notification = self.clone();
        if let Some(summary) = summary.filter(|s| !s.is_empty()) {
            notification
                .metadata
                .get_or_insert_with(BTreeMap::new)
                .insert(METADATA_SUMMARY.to_string(), summary.to_string());
        }
        notification
    }
}
