//! Decision endpoint: the ingestion boundary of the pipeline.

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::{DecisionEvent, PatientRecord};

/// `POST /api/decision` — run the full pipeline for one patient record and
/// hand the event to the alert trigger.
///
/// The trigger handoff is fire-and-forget: a notification failure is the
/// collaborator's problem and never fails the request that produced the
/// decision.
pub async fn decide(
    State(ctx): State<ApiContext>,
    Json(record): Json<PatientRecord>,
) -> Result<Json<DecisionEvent>, ApiError> {
    let event = ctx.engine.decide(&record).await?;

    let trigger = ctx.trigger.clone();
    let outgoing = event.clone();
    tokio::task::spawn_blocking(move || {
        if let Err(e) = trigger.notify(&outgoing) {
            tracing::warn!(patient_id = %outgoing.patient_id, error = %e, "alert trigger failed");
        }
    });

    Ok(Json(event))
}
