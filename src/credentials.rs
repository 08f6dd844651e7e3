use base64::engine::general_purpose::STANDARD as Base64Engine;
use base64::Engine;

use crate::error::{EmbedError, EmbedResult};

/// Builds the `Basic` authorization header value for the client
/// credentials exchange. Pure; the caller owns when it is sent.
pub fn basic_authorization(client_id: &str, client_secret: &str) -> EmbedResult<String> {
    if client_id.is_empty() || client_secret.is_empty() {
        return Err(EmbedError::Config(
            "client id and client secret must be non-empty".into(),
        ));
    }
    let encoded = Base64Engine.encode(format!("{client_id}:{client_secret}"));
    Ok(format!("Basic {encoded}"))
}
