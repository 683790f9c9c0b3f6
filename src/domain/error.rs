// src/domain/error.rs

use std::time::Duration;
use thiserror::Error;

/// How far an error propagates through one dispatch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorImpact {
    /// The event is rejected as a whole and ingress answers with a failure.
    FatalForEvent,
    /// Only the affected alert rule is abandoned.
    SkipRule,
    /// One delivery failed; nothing else is affected.
    DeliveryFailed,
}

/// Failures of the configuration directory.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("directory backend unavailable: {0}")]
    Backend(String),

    #[error("directory call exceeded the {0:?} deadline")]
    Timeout(Duration),

    #[error("failed to load directory manifest {path}: {message}")]
    Manifest { path: String, message: String },
}

/// Failures while building a notifier or posting through one.
#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("unsupported provider type '{0}'")]
    UnsupportedProvider(String),

    #[error("{provider} token cannot be empty")]
    MissingToken { provider: &'static str },

    #[error("invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("invalid proxy '{proxy}': {reason}")]
    InvalidProxy { proxy: String, reason: String },

    #[error("failed to build http client: {0}")]
    ClientBuild(String),

    #[error("missing revision metadata")]
    MissingRevision,

    #[error("revision string format incorrect: {0}")]
    InvalidRevision(String),

    #[error("unrecognized severity '{0}' for this destination")]
    UnrecognizedSeverity(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("destination responded with {status}: {body}")]
    Api { status: u16, body: String },
}

impl NotifierError {
    /// Construction problems skip the rule; anything raised while posting
    /// only fails that delivery.
    pub fn impact(&self) -> ErrorImpact {
        match self {
            NotifierError::UnsupportedProvider(_)
            | NotifierError::MissingToken { .. }
            | NotifierError::InvalidAddress { .. }
            | NotifierError::InvalidProxy { .. }
            | NotifierError::ClientBuild(_) => ErrorImpact::SkipRule,
            NotifierError::MissingRevision
            | NotifierError::InvalidRevision(_)
            | NotifierError::UnrecognizedSeverity(_)
            | NotifierError::Http(_)
            | NotifierError::Api { .. } => ErrorImpact::DeliveryFailed,
        }
    }
}

/// Errors that abort a whole dispatch.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("listing alerts failed: {0}")]
    ListAlerts(#[source] DirectoryError),
}

impl DispatchError {
    pub fn impact(&self) -> ErrorImpact {
        ErrorImpact::FatalForEvent
    }
}

/// Reason an individual matched rule was not delivered.
#[derive(Error, Debug)]
pub enum SkipReason {
    #[error("provider {namespace}/{name} not found")]
    ProviderNotFound { namespace: String, name: String },

    #[error("failed to read provider: {0}")]
    ProviderLookup(#[source] DirectoryError),

    #[error("secret {namespace}/{name} not found")]
    SecretNotFound { namespace: String, name: String },

    #[error("failed to read secret: {0}")]
    SecretLookup(#[source] DirectoryError),

    #[error("provider has no address")]
    EmptyAddress,

    #[error("failed to initialise provider: {0}")]
    Notifier(#[source] NotifierError),
}

impl SkipReason {
    pub fn impact(&self) -> ErrorImpact {
        ErrorImpact::SkipRule
    }
}
