// src/adapter/http/controller.rs

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

use crate::service::notification_dispatcher::DispatchOutcome;
use crate::usecase::receive_event::ReceiveEventUseCase;

#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T> ApiResponse<T> {
    fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    fn error(msg: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            message: Some(msg.into()),
            data: None,
        }
    }
}

#[derive(Serialize)]
struct DispatchSummary {
    matched: usize,
    spawned: usize,
}

impl From<DispatchOutcome> for DispatchSummary {
    fn from(outcome: DispatchOutcome) -> Self {
        match outcome {
            DispatchOutcome::NoMatch => DispatchSummary { matched: 0, spawned: 0 },
            DispatchOutcome::Dispatched { matched, spawned } => DispatchSummary { matched, spawned },
        }
    }
}

pub struct HttpController {
    receive_usecase: Arc<ReceiveEventUseCase>,
}

impl HttpController {
    pub fn new(receive_usecase: Arc<ReceiveEventUseCase>) -> Self {
        Self { receive_usecase }
    }

    /// Accepts one event. Answers once deliveries are queued, not when they
    /// complete.
    pub async fn receive_event(&self, body: Bytes) -> Response {
        debug!(bytes = body.len(), "event payload received");

        match self.receive_usecase.execute(&body).await {
            Ok(outcome) => (
                StatusCode::ACCEPTED,
                Json(ApiResponse::success(DispatchSummary::from(outcome))),
            )
                .into_response(),
            Err(e) => {
                error!(error = %e, impact = ?e.impact(), "rejecting event");
                (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::<DispatchSummary>::error(e.to_string())),
                )
                    .into_response()
            }
        }
    }
}

pub async fn receive_event(State(controller): State<Arc<HttpController>>, body: Bytes) -> Response {
    controller.receive_event(body).await
}

pub async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}
