use std::collections::HashMap;
use std::sync::Arc;

use axum::{extract::Extension, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::config::EmbedConfig;
use crate::embed_token::EmbedTokenClient;
use crate::error::EmbedResult;
use crate::handler::{handle_record_load, EventRecord, FormSink, LoadOutcome};
use crate::service_token::ServiceTokenClient;

pub struct AppState {
    pub config: EmbedConfig,
    pub service: ServiceTokenClient,
    pub embed: EmbedTokenClient,
}

impl AppState {
    pub fn new(config: EmbedConfig) -> EmbedResult<Self> {
        let service = ServiceTokenClient::new(&config)?;
        let embed = EmbedTokenClient::new(&config)?;
        Ok(Self {
            config,
            service,
            embed,
        })
    }
}

pub fn api_routes() -> Router {
    Router::new().route("/embed/load", post(record_load))
}

/// Record-load event from the hosting system: the record snapshot plus
/// the form fields available as write targets.
#[derive(Debug, Deserialize)]
pub struct RecordLoadRequest {
    pub record_type: String,
    #[serde(default)]
    pub fields: HashMap<String, String>,
    #[serde(default)]
    pub form_fields: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RecordLoadResponse {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<WrittenField>,
}

#[derive(Debug, Serialize)]
pub struct WrittenField {
    pub id: String,
    pub html: String,
    pub visible: bool,
}

/// The hosting system must never see this flow fail: every outcome,
/// including an aborted one, answers 200 with the outcome envelope.
pub async fn record_load(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<RecordLoadRequest>,
) -> Json<RecordLoadResponse> {
    let record = EventRecord::new(&payload.record_type, &payload.fields);
    let mut sink = FormSink::with_fields(payload.form_fields.iter().map(String::as_str));

    let outcome = handle_record_load(
        &state.config,
        &state.service,
        &state.embed,
        &record,
        &mut sink,
    )
    .await;

    let field = match outcome {
        LoadOutcome::Completed => sink.take(&state.config.output_field).map(|slot| WrittenField {
            id: state.config.output_field.clone(),
            html: slot.content,
            visible: slot.visible,
        }),
        _ => None,
    };
    Json(RecordLoadResponse {
        outcome: outcome.as_str(),
        field,
    })
}
