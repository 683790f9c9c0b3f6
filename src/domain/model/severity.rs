// src/domain/model/severity.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity classification attached to a reconciler event.
///
/// Upstream reconcilers only emit `info` and `error`. Anything else is kept as
/// `Custom` so ingress can still decode the event; notifiers that need a
/// strict mapping reject it later.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    /// Informational progress, including successful reconciliations.
    #[default]
    Info,
    /// A failed reconciliation or health check.
    Error,
    /// Unrecognized value received on the wire.
    Custom(String),
}

impl Severity {
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Info => "info",
            Severity::Error => "error",
            Severity::Custom(other) => other.as_str(),
        }
    }

    /// An alert rule with minimum severity `Info` accepts every event
    /// severity; any other minimum must match exactly.
    pub fn accepts(&self, event_severity: &Severity) -> bool {
        *self == Severity::Info || self == event_severity
    }
}

impl From<&str> for Severity {
    fn from(s: &str) -> Self {
        match s {
            "info" => Severity::Info,
            "error" => Severity::Error,
            other => Severity::Custom(other.to_string()),
        }
    }
}

impl From<String> for Severity {
    fn from(s: String) -> Self {
        Severity::from(s.as_str())
    }
}

impl From<Severity> for String {
    fn from(s: Severity) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
