use crate::models::{AnalyticsEvent, SessionContext};
use reqwest::Client;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

/// Errors that can occur when submitting analytics events
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Analytics sink rejected event: {0}")]
    Rejected(String),
}

/// Best-effort client for the analytics sink
///
/// `track` never reports failure to the caller: submissions run on a
/// spawned task and failures are only logged.
#[derive(Clone)]
pub struct AnalyticsClient {
    endpoint: Option<String>,
    client: Client,
}

impl AnalyticsClient {
    /// Create a client posting events to `endpoint`
    pub fn new(endpoint: String, timeout_secs: u64) -> Result<Self, AnalyticsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            endpoint: Some(endpoint),
            client,
        })
    }

    /// A client that drops every event
    pub fn disabled() -> Self {
        Self {
            endpoint: None,
            client: Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Submit an event and wait for the sink to answer
    pub async fn send(&self, event: &AnalyticsEvent) -> Result<(), AnalyticsError> {
        let Some(endpoint) = &self.endpoint else {
            return Ok(());
        };

        let response = self.client.post(endpoint).json(event).send().await?;

        if !response.status().is_success() {
            return Err(AnalyticsError::Rejected(response.status().to_string()));
        }

        tracing::trace!("Sent analytics event: {}", event.event_type);
        Ok(())
    }

    /// Fire-and-forget submission.
    ///
    /// Returns the handle of the spawned task, or `None` when analytics is
    /// disabled or no tokio runtime is available to run it.
    pub fn track(
        &self,
        context: &SessionContext,
        event_type: &str,
        attributes: Map<String, Value>,
    ) -> Option<JoinHandle<()>> {
        if !self.is_enabled() {
            return None;
        }

        let event = AnalyticsEvent::new(context, event_type, attributes);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                "Analytics event {} for session {} dropped: no async runtime",
                event.event_type,
                event.session_id
            );
            return None;
        };

        let client = self.clone();
        Some(runtime.spawn(async move {
            if let Err(e) = client.send(&event).await {
                tracing::warn!(
                    "Analytics event {} for session {} dropped: {}",
                    event.event_type,
                    event.session_id,
                    e
                );
            }
        }))
    }
}
