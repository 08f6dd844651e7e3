use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::config::EmbedConfig;
use crate::credentials::basic_authorization;
use crate::error::{EmbedError, EmbedResult};

/// OAuth scope requested for the service token.
const TOKEN_SCOPE: &str = "data";

/// Exchanges the client credentials for a short-lived service access
/// token. One attempt per call; the token is never cached.
pub struct ServiceTokenClient {
    http: Client,
    token_url: String,
    authorization: String,
}

impl ServiceTokenClient {
    pub fn new(config: &EmbedConfig) -> EmbedResult<Self> {
        Ok(Self {
            http: Client::builder()
                .timeout(config.http_timeout)
                .build()
                .map_err(EmbedError::Transport)?,
            token_url: format!("{}/oauth/token", config.api_base),
            authorization: basic_authorization(&config.client_id, &config.client_secret)?,
        })
    }

    pub async fn fetch(&self) -> EmbedResult<String> {
        let response = self
            .http
            .post(&self.token_url)
            .query(&[("grant_type", "client_credentials"), ("scope", TOKEN_SCOPE)])
            .header(AUTHORIZATION, &self.authorization)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            tracing::error!(
                status = status.as_u16(),
                %body,
                url = %self.token_url,
                "service token request rejected"
            );
            return Err(EmbedError::Auth {
                status: status.as_u16(),
                body,
            });
        }

        let access_token = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|parsed| {
                parsed
                    .get("access_token")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .filter(|token| !token.is_empty());
        match access_token {
            Some(token) => Ok(token),
            None => {
                tracing::error!(
                    status = status.as_u16(),
                    %body,
                    url = %self.token_url,
                    "service token response missing access_token"
                );
                Err(EmbedError::Auth {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}
