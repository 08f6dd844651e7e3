use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::config::{EmbedConfig, EmbedType};
use crate::error::{EmbedError, EmbedResult};

/// Scoping payload sent to the embed authorization endpoint.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmbedScopeRequest {
    pub session_length: u32,
    pub authorizations: Vec<EmbedAuthorization>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct EmbedAuthorization {
    pub token: String,
    pub permissions: Vec<String>,
    pub filters: Vec<ScopeFilter>,
}

/// One row-level restriction. An empty filter list grants the full
/// dashboard scope, so callers must only omit it deliberately.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ScopeFilter {
    pub column: String,
    pub operator: String,
    pub values: Vec<String>,
}

/// Exchanges a service token plus a scoping payload for a single-use
/// embed token bound to one customer.
pub struct EmbedTokenClient {
    http: Client,
    auth_url: String,
    embed_id: String,
    session_length: u32,
    permissions: Vec<String>,
    filter_column: String,
    filter_operator: String,
}

impl EmbedTokenClient {
    pub fn new(config: &EmbedConfig) -> EmbedResult<Self> {
        let path = match config.embed_type {
            EmbedType::Dashboard => "/v1/stories/embed/auth",
            EmbedType::Card => "/v1/cards/embed/auth",
        };
        Ok(Self {
            http: Client::builder()
                .timeout(config.http_timeout)
                .build()
                .map_err(EmbedError::Transport)?,
            auth_url: format!("{}{}", config.api_base, path),
            embed_id: config.embed_id.clone(),
            session_length: config.session_length_minutes,
            permissions: config.permissions.clone(),
            filter_column: config.filter_column.clone(),
            filter_operator: config.filter_operator.clone(),
        })
    }

    /// Builds the scope request for one invocation. The filter list is
    /// non-empty iff a non-blank customer id was supplied.
    pub fn scope_request(&self, customer_id: Option<&str>) -> EmbedScopeRequest {
        let filters = match customer_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => vec![ScopeFilter {
                column: self.filter_column.clone(),
                operator: self.filter_operator.clone(),
                values: vec![id.to_string()],
            }],
            None => Vec::new(),
        };
        EmbedScopeRequest {
            session_length: self.session_length,
            authorizations: vec![EmbedAuthorization {
                token: self.embed_id.clone(),
                permissions: self.permissions.clone(),
                filters,
            }],
        }
    }

    pub async fn fetch(
        &self,
        service_token: &str,
        customer_id: Option<&str>,
    ) -> EmbedResult<String> {
        let request = self.scope_request(customer_id);
        let response = self
            .http
            .post(&self.auth_url)
            .header(AUTHORIZATION, format!("bearer {service_token}"))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            tracing::error!(
                status = status.as_u16(),
                %body,
                url = %self.auth_url,
                "embed token request rejected"
            );
            return Err(EmbedError::Auth {
                status: status.as_u16(),
                body,
            });
        }

        // A 200 without the business field is a provider contract
        // violation, not a credential problem.
        let authentication = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|parsed| {
                parsed
                    .get("authentication")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .filter(|token| !token.is_empty());
        match authentication {
            Some(token) => Ok(token),
            None => {
                tracing::error!(%body, url = %self.auth_url, "embed auth response missing authentication");
                Err(EmbedError::Protocol(format!(
                    "embed auth response missing authentication: {body}"
                )))
            }
        }
    }
}
