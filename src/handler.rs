use std::collections::HashMap;

use crate::config::EmbedConfig;
use crate::embed_token::EmbedTokenClient;
use crate::error::{EmbedError, EmbedResult};
use crate::markup::render_embed_markup;
use crate::service_token::ServiceTokenClient;

/// Read-only view of the triggering record.
pub trait RecordContext {
    /// Record-type discriminator gating applicability.
    fn kind(&self) -> &str;
    /// Typed field lookup; `None` when the field is absent or blank.
    fn value(&self, field_id: &str) -> EmbedResult<Option<String>>;
}

/// One writable form-field slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkField {
    pub content: String,
    pub visible: bool,
}

/// Field lookup over the host form the markup is written into.
pub trait OutputSink {
    fn field_mut(&mut self, field_id: &str) -> Option<&mut SinkField>;
}

/// Terminal state of one record-load invocation. The caller never sees
/// an error; failures are logged and reported as `Aborted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Markup written to the sink and marked visible.
    Completed,
    /// Record type not applicable; nothing done.
    Skipped,
    /// A step failed; sink left untouched.
    Aborted,
}

impl LoadOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadOutcome::Completed => "completed",
            LoadOutcome::Skipped => "skipped",
            LoadOutcome::Aborted => "aborted",
        }
    }
}

/// Runs the full flow for one record-load event: type gate, service
/// token, embed token, markup, sink write. Strictly sequential; the
/// first failing step ends the invocation.
pub async fn handle_record_load(
    config: &EmbedConfig,
    service: &ServiceTokenClient,
    embed: &EmbedTokenClient,
    record: &(dyn RecordContext + Sync),
    sink: &mut (dyn OutputSink + Send),
) -> LoadOutcome {
    if record.kind() != config.record_kind {
        return LoadOutcome::Skipped;
    }

    let customer_id = match record.value(&config.customer_id_field) {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(%err, field = %config.customer_id_field, "customer id lookup failed");
            return LoadOutcome::Aborted;
        }
    };

    let service_token = match service.fetch().await {
        Ok(token) => token,
        Err(err) => {
            tracing::error!(%err, "service token exchange failed; leaving record untouched");
            return LoadOutcome::Aborted;
        }
    };

    let embed_token = match embed.fetch(&service_token, customer_id.as_deref()).await {
        Ok(token) => token,
        Err(err) => {
            tracing::error!(%err, "embed token exchange failed; leaving record untouched");
            return LoadOutcome::Aborted;
        }
    };

    // Rendering never aborts; a degenerate fragment still reaches the sink.
    let markup = render_embed_markup(&embed_token, config);

    match sink.field_mut(&config.output_field) {
        Some(slot) => {
            slot.content = markup;
            slot.visible = true;
            LoadOutcome::Completed
        }
        None => {
            let err = EmbedError::SinkNotFound(config.output_field.clone());
            tracing::error!(%err, "embed markup dropped");
            LoadOutcome::Aborted
        }
    }
}

/// Record view over an event payload's field map.
pub struct EventRecord<'a> {
    kind: &'a str,
    fields: &'a HashMap<String, String>,
}

impl<'a> EventRecord<'a> {
    pub fn new(kind: &'a str, fields: &'a HashMap<String, String>) -> Self {
        Self { kind, fields }
    }
}

impl RecordContext for EventRecord<'_> {
    fn kind(&self) -> &str {
        self.kind
    }

    fn value(&self, field_id: &str) -> EmbedResult<Option<String>> {
        Ok(self
            .fields
            .get(field_id)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty()))
    }
}

/// In-memory sink over the form fields named by the event payload.
#[derive(Debug, Default)]
pub struct FormSink {
    fields: HashMap<String, SinkField>,
}

impl FormSink {
    pub fn with_fields<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            fields: ids
                .into_iter()
                .map(|id| (id.to_string(), SinkField::default()))
                .collect(),
        }
    }

    pub fn get(&self, field_id: &str) -> Option<&SinkField> {
        self.fields.get(field_id)
    }

    pub fn take(&mut self, field_id: &str) -> Option<SinkField> {
        self.fields.remove(field_id)
    }
}

impl OutputSink for FormSink {
    fn field_mut(&mut self, field_id: &str) -> Option<&mut SinkField> {
        self.fields.get_mut(field_id)
    }
}
