// src/service/dispatch_reporter.rs
//! Sink for dispatch outcomes.
//!
//! The dispatcher never logs on its own; it hands every outcome to the
//! reporter it was built with. `TracingReporter` is what the service runs
//! with. Tests plug in recorders.

use tracing::{error, info, warn};

use crate::domain::error::{NotifierError, SkipReason};
use crate::domain::model::alert::AlertRule;
use crate::domain::model::event::Event;
use crate::domain::model::provider::ProviderType;
use crate::service::alert_matcher::InvalidPattern;

/// Destination of one delivery, detached from the directory snapshot so it
/// can move into the delivery task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryTarget {
    pub alert_namespace: String,
    pub alert_name: String,
    pub provider_name: String,
    pub provider_type: ProviderType,
}

pub trait DispatchReporter: Send + Sync {
    /// An exclusion pattern failed to compile and was ignored.
    fn invalid_exclusion(&self, rule: &AlertRule, pattern: &InvalidPattern);

    /// No alert rule matched the event.
    fn discarded(&self, event: &Event);

    /// At least one alert rule matched; `deliveries` counts queued entries.
    fn dispatching(&self, event: &Event, deliveries: usize);

    /// A matched rule was abandoned before delivery.
    fn rule_skipped(&self, rule: &AlertRule, reason: &SkipReason);

    fn delivered(&self, target: &DeliveryTarget, notification: &Event);

    fn delivery_failed(&self, target: &DeliveryTarget, notification: &Event, error: &NotifierError);
}

/// Reports through `tracing`, keyed by the involved object.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl DispatchReporter for TracingReporter {
    fn invalid_exclusion(&self, rule: &AlertRule, pattern: &InvalidPattern) {
        error!(
            alert = %rule.name,
            namespace = %rule.namespace,
            pattern = %pattern.pattern,
            error = %pattern.error,
            "failed to compile regex"
        );
    }

    fn discarded(&self, event: &Event) {
        let object = &event.involved_object;
        info!(
            reconciler_kind = %object.kind,
            name = %object.name,
            namespace = %object.namespace,
            "Discarding event, no alerts found for the involved object"
        );
    }

    fn dispatching(&self, event: &Event, deliveries: usize) {
        let object = &event.involved_object;
        info!(
            reconciler_kind = %object.kind,
            name = %object.name,
            namespace = %object.namespace,
            deliveries,
            "Dispatching event: {}",
            event.message
        );
    }

    fn rule_skipped(&self, rule: &AlertRule, reason: &SkipReason) {
        error!(
            alert = %rule.name,
            provider = %rule.spec.provider_ref.name,
            namespace = %rule.namespace,
            error = %reason,
            "skipping alert"
        );
    }

    fn delivered(&self, target: &DeliveryTarget, notification: &Event) {
        let object = &notification.involved_object;
        info!(
            reconciler_kind = %object.kind,
            name = %object.name,
            namespace = %object.namespace,
            provider = %target.provider_name,
            provider_type = %target.provider_type,
            alert = %target.alert_name,
            alert_namespace = %target.alert_namespace,
            "notification sent"
        );
    }

    fn delivery_failed(&self, target: &DeliveryTarget, notification: &Event, err: &NotifierError) {
        let object = &notification.involved_object;
        warn!(
            reconciler_kind = %object.kind,
            name = %object.name,
            namespace = %object.namespace,
            provider = %target.provider_name,
            provider_type = %target.provider_type,
            alert = %target.alert_name,
            alert_namespace = %target.alert_namespace,
            error = %err,
            "failed to send notification"
        );
    }
}
