// adapter/notifier/generic_notifier.rs

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::adapter::notifier::notifier_factory::Notifier;
use crate::domain::error::NotifierError;
use crate::domain::model::event::Event;
use crate::domain::model::provider::ProviderType;

/// Posts the notification as JSON to an arbitrary webhook.
#[derive(Debug, Clone)]
pub struct GenericNotifier {
    client: Client,
    url: Url,
    token: Option<String>,
}

impl GenericNotifier {
    pub fn new(address: &str, token: &str, client: Client) -> Result<Self, NotifierError> {
        let url = Url::parse(address).map_err(|e| NotifierError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            url,
            token: Some(token.to_string()).filter(|t| !t.is_empty()),
        })
    }
}

#[async_trait]
impl Notifier for GenericNotifier {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Generic
    }

    async fn post(&self, notification: &Event) -> Result<(), NotifierError> {
        let mut request = self.client.post(self.url.clone()).json(notification);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        debug!(url = %self.url, "posting event to webhook");
        let resp = request.send().await?;
        if resp.status().is_success() {
            return Ok(());
        }

        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Err(NotifierError::Api { status, body })
    }
}
