// src/usecase/receive_event.rs
//! Turns a raw ingress body into a dispatch.

use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::domain::error::{DispatchError, ErrorImpact};
use crate::domain::model::event::Event;
use crate::service::notification_dispatcher::{DispatchOutcome, NotificationDispatcher};

#[derive(Error, Debug)]
pub enum IngressError {
    #[error("failed to decode event: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl IngressError {
    pub fn impact(&self) -> ErrorImpact {
        match self {
            IngressError::Decode(_) => ErrorImpact::FatalForEvent,
            IngressError::Dispatch(e) => e.impact(),
        }
    }
}

pub struct ReceiveEventUseCase {
    dispatcher: Arc<NotificationDispatcher>,
}

impl ReceiveEventUseCase {
    pub fn new(dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Decodes the body and routes the event. Returns once deliveries are
    /// queued.
    pub async fn execute(&self, body: &[u8]) -> Result<DispatchOutcome, IngressError> {
        let event: Event = serde_json::from_slice(body)?;
        debug!(
            kind = %event.involved_object.kind,
            name = %event.involved_object.name,
            severity = %event.severity,
            "event received"
        );
        Ok(self.dispatcher.dispatch(&event).await?)
    }
}
