// src/domain/model/alert.rs

use serde::{Deserialize, Serialize};

use crate::domain::model::severity::Severity;

/// Condition type that marks an alert rule as usable.
pub const READY_CONDITION: &str = "Ready";

/// Reference to a named object in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocalObjectReference {
    pub name: String,
}

/// Event source an alert rule listens to.
///
/// `name` may be `*` to match any object of `kind`. An empty `namespace`
/// means "the alert rule's own namespace".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventSource {
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub namespace: String,
}

impl EventSource {
    pub const ANY_NAME: &'static str = "*";
}

/// Status condition maintained by whatever reconciles alert rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Condition {
    pub fn ready(status: bool) -> Self {
        Self {
            type_: READY_CONDITION.to_string(),
            status: if status { "True" } else { "False" }.to_string(),
            reason: None,
            message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSpec {
    pub provider_ref: LocalObjectReference,
    #[serde(default)]
    pub event_severity: Severity,
    #[serde(default)]
    pub event_sources: Vec<EventSource>,
    /// Regular expressions matched against the event message.
    #[serde(default)]
    pub exclusion_list: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub suspend: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AlertStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Alert rule as read from the directory.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AlertRule {
    pub name: String,
    pub namespace: String,
    pub spec: AlertSpec,
    #[serde(default)]
    pub status: AlertStatus,
}

impl AlertRule {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            spec: AlertSpec {
                provider_ref: LocalObjectReference {
                    name: provider.into(),
                },
                ..Default::default()
            },
            status: AlertStatus::default(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status
            .conditions
            .iter()
            .any(|c| c.type_ == READY_CONDITION && c.status == "True")
    }

    /// Suspended or not-ready rules never take part in matching.
    pub fn is_eligible(&self) -> bool {
        !self.spec.suspend && self.is_ready()
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.status.conditions.retain(|c| c.type_ != READY_CONDITION);
        self.status.conditions.push(Condition::ready(ready));
    }

    pub fn summary(&self) -> Option<&str> {
        self.spec.summary.as_deref().filter(|s| !s.is_empty())
    }
}
