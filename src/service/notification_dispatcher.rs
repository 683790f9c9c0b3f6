// src/service/notification_dispatcher.rs
//! Notification dispatcher service
//!
//! Responsibilities:
//! - Snapshot the alert rules and select the ones matching an event.
//! - Resolve provider and secret for every match, all under one deadline.
//! - Build a notifier per match and hand delivery to a detached task.
//!
//! The caller gets its answer once deliveries are queued. Delivery outcomes
//! only reach the injected reporter.

use std::{future::Future, sync::Arc, time::Duration};
use tokio::time::{timeout_at, Instant};

use crate::adapter::notifier::notifier_factory::{Notifier, NotifierFactory, DEFAULT_NOTIFIER_TIMEOUT};
use crate::domain::error::{DirectoryError, DispatchError, SkipReason};
use crate::domain::model::alert::AlertRule;
use crate::domain::model::event::Event;
use crate::domain::model::provider::ResolvedDestination;
use crate::repository::directory::Directory;
use crate::service::alert_matcher::AlertMatcher;
use crate::service::dispatch_reporter::{DeliveryTarget, DispatchReporter};

/// Shared bound for the listing call and every per-rule lookup.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// What happened to one inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No rule matched; nothing was queued.
    NoMatch,
    /// `matched` entries were queued and `spawned` of them reached a
    /// delivery task. The difference was skipped and reported.
    Dispatched { matched: usize, spawned: usize },
}

/// Dispatch coordinator.
#[derive(Clone)]
pub struct NotificationDispatcher {
    directory: Arc<dyn Directory>,
    reporter: Arc<dyn DispatchReporter>,
    matcher: AlertMatcher,
    fetch_timeout: Duration,
    notifier_timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(directory: Arc<dyn Directory>, reporter: Arc<dyn DispatchReporter>) -> Self {
        Self {
            directory,
            reporter,
            matcher: AlertMatcher::new(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            notifier_timeout: DEFAULT_NOTIFIER_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_notifier_timeout(mut self, timeout: Duration) -> Self {
        self.notifier_timeout = timeout;
        self
    }

    /// Routes one event.
    ///
    /// Only a failed listing is returned as an error. Problems with a single
    /// rule are reported and skipped, and delivery results never come back
    /// here.
    pub async fn dispatch(&self, event: &Event) -> Result<DispatchOutcome, DispatchError> {
        let deadline = Instant::now() + self.fetch_timeout;

        let rules = self
            .within(deadline, self.directory.list_alert_rules())
            .await
            .map_err(DispatchError::ListAlerts)?;

        let queued = self.select(event, &rules);
        if queued.is_empty() {
            self.reporter.discarded(event);
            return Ok(DispatchOutcome::NoMatch);
        }

        self.reporter.dispatching(event, queued.len());

        let mut spawned = 0;
        for rule in &queued {
            match self.prepare(rule, deadline).await {
                Ok((target, notifier)) => {
                    let notification = event.to_notification(rule.summary());
                    self.deliver(target, notifier, notification);
                    spawned += 1;
                }
                Err(reason) => self.reporter.rule_skipped(rule, &reason),
            }
        }

        Ok(DispatchOutcome::Dispatched {
            matched: queued.len(),
            spawned,
        })
    }

    /// Rules in snapshot order, each repeated once per accepting source.
    fn select<'a>(&self, event: &Event, rules: &'a [AlertRule]) -> Vec<&'a AlertRule> {
        let mut queued = Vec::new();
        for rule in rules {
            let evaluation = self.matcher.evaluate(event, rule);
            for invalid in &evaluation.invalid_patterns {
                self.reporter.invalid_exclusion(rule, invalid);
            }
            queued.extend(std::iter::repeat(rule).take(evaluation.acceptances));
        }
        queued
    }

    async fn prepare(
        &self,
        rule: &AlertRule,
        deadline: Instant,
    ) -> Result<(DeliveryTarget, Box<dyn Notifier>), SkipReason> {
        let namespace = &rule.namespace;
        let provider_name = &rule.spec.provider_ref.name;

        let provider = self
            .within(deadline, self.directory.get_provider(namespace, provider_name))
            .await
            .map_err(SkipReason::ProviderLookup)?
            .ok_or_else(|| SkipReason::ProviderNotFound {
                namespace: namespace.clone(),
                name: provider_name.clone(),
            })?;

        let mut destination = ResolvedDestination::from_provider(&provider);
        if let Some(secret_ref) = &provider.spec.secret_ref {
            // Secrets always come from the alert's namespace.
            let secret = self
                .within(deadline, self.directory.get_secret(namespace, &secret_ref.name))
                .await
                .map_err(SkipReason::SecretLookup)?
                .ok_or_else(|| SkipReason::SecretNotFound {
                    namespace: namespace.clone(),
                    name: secret_ref.name.clone(),
                })?;
            destination.apply_secret(&secret);
        }

        if destination.address.is_empty() {
            return Err(SkipReason::EmptyAddress);
        }

        let notifier = NotifierFactory::new(destination)
            .with_timeout(self.notifier_timeout)
            .build(&provider.spec.type_)
            .map_err(SkipReason::Notifier)?;

        let target = DeliveryTarget {
            alert_namespace: rule.namespace.clone(),
            alert_name: rule.name.clone(),
            provider_name: provider.name.clone(),
            provider_type: notifier.provider_type(),
        };
        Ok((target, notifier))
    }

    fn deliver(&self, target: DeliveryTarget, notifier: Box<dyn Notifier>, notification: Event) {
        let reporter = Arc::clone(&self.reporter);
        tokio::spawn(async move {
            match notifier.post(&notification).await {
                Ok(()) => reporter.delivered(&target, &notification),
                Err(err) => reporter.delivery_failed(&target, &notification, &err),
            }
        });
    }

    async fn within<T, F>(&self, deadline: Instant, call: F) -> Result<T, DirectoryError>
    where
        F: Future<Output = Result<T, DirectoryError>>,
    {
        timeout_at(deadline, call)
            .await
            .map_err(|_| DirectoryError::Timeout(self.fetch_timeout))?
    }
}
