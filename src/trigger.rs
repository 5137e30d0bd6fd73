//! Alert-trigger boundary.
//!
//! The core produces decision events; whether and how anyone is notified
//! belongs to the collaborator behind this trait. Delivery failures are the
//! caller's to log — a lost notification must never fail the decision
//! request that produced it.

use thiserror::Error;

use crate::models::DecisionEvent;

#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("alert delivery failed: {0}")]
    Delivery(String),
}

pub trait AlertTrigger: Send + Sync {
    fn notify(&self, event: &DecisionEvent) -> Result<(), TriggerError>;
}

/// Default trigger: structured log line per event. Enough for local runs
/// and tests; production wires a real notifier here.
pub struct LogAlertTrigger;

impl AlertTrigger for LogAlertTrigger {
    fn notify(&self, event: &DecisionEvent) -> Result<(), TriggerError> {
        tracing::info!(
            patient_id = %event.patient_id,
            action = event.classification.recommended_action.as_str(),
            confidence = event.classification.confidence,
            degraded = event.retrieval_degraded,
            "decision event emitted"
        );
        Ok(())
    }
}

/// Trigger that POSTs the event JSON to a webhook. Blocking call — run it
/// off the async workers.
pub struct WebhookAlertTrigger {
    url: String,
    client: reqwest::blocking::Client,
}

impl WebhookAlertTrigger {
    pub fn new(url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            url: url.to_string(),
            client,
        }
    }
}

impl AlertTrigger for WebhookAlertTrigger {
    fn notify(&self, event: &DecisionEvent) -> Result<(), TriggerError> {
        self.client
            .post(&self.url)
            .json(event)
            .send()
            .map_err(|e| TriggerError::Delivery(e.to_string()))?
            .error_for_status()
            .map_err(|e| TriggerError::Delivery(e.to_string()))?;
        Ok(())
    }
}
