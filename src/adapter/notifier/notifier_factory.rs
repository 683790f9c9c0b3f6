// adapter/notifier/notifier_factory.rs

use async_trait::async_trait;
use reqwest::{Client, Proxy};
use std::time::Duration;

use crate::adapter::notifier::generic_notifier::GenericNotifier;
use crate::adapter::notifier::gitlab_notifier::GitLabNotifier;
use crate::domain::error::NotifierError;
use crate::domain::model::event::Event;
use crate::domain::model::provider::{ProviderType, ResolvedDestination};

/// Default I/O bound for a single delivery.
pub const DEFAULT_NOTIFIER_TIMEOUT: Duration = Duration::from_secs(15);

/// Sender bound to one destination instance.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn provider_type(&self) -> ProviderType;

    /// Delivers one notification. Errors are returned as-is; the caller
    /// decides how to report them.
    async fn post(&self, notification: &Event) -> Result<(), NotifierError>;
}

/// Builds notifiers for a resolved destination.
#[derive(Debug, Clone)]
pub struct NotifierFactory {
    destination: ResolvedDestination,
    timeout: Duration,
}

impl NotifierFactory {
    pub fn new(destination: ResolvedDestination) -> Self {
        Self {
            destination,
            timeout: DEFAULT_NOTIFIER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Constructs the notifier for `provider_type`.
    ///
    /// Fails for unknown type tags, a missing token where the variant needs
    /// one, an address the variant cannot use, or an invalid proxy.
    pub fn build(&self, provider_type: &str) -> Result<Box<dyn Notifier>, NotifierError> {
        let kind: ProviderType = provider_type.parse()?;
        let client = self.http_client()?;
        let dest = &self.destination;

        let notifier: Box<dyn Notifier> = match kind {
            ProviderType::Generic => {
                Box::new(GenericNotifier::new(&dest.address, &dest.token, client)?)
            }
            ProviderType::GitLab => {
                Box::new(GitLabNotifier::new(&dest.address, &dest.token, client)?)
            }
        };
        Ok(notifier)
    }

    fn http_client(&self) -> Result<Client, NotifierError> {
        let mut builder = Client::builder().timeout(self.timeout);
        if let Some(proxy) = self.destination.proxy.as_deref() {
            let proxy = Proxy::all(proxy).map_err(|e| NotifierError::InvalidProxy {
                proxy: proxy.to_string(),
                reason: e.to_string(),
            })?;
            builder = builder.proxy(proxy);
        }
        builder
            .build()
            .map_err(|e| NotifierError::ClientBuild(e.to_string()))
    }
}
