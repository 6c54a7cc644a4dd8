use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::auth::ApiKey;
use crate::error::{MailLensError, Result};

pub struct MailchimpClient {
    pub client: Client,
    pub api_url: Url,
    pub api_key: ApiKey,
}

/// Mailchimp problem-detail body returned with error statuses.
#[derive(Debug, Deserialize)]
struct ProblemDetail {
    title: Option<String>,
    detail: Option<String>,
}

impl MailchimpClient {
    pub fn new(api_base: &str, api_key: ApiKey) -> Result<Self> {
        let client = Client::builder()
            .user_agent("MailLens/0.1.0")
            .build()
            .map_err(|e| MailLensError::Config(format!("Failed to create HTTP client: {e}")))?;

        // Url::join drops the last path segment unless it ends with a slash
        let base = if api_base.ends_with('/') {
            api_base.to_string()
        } else {
            format!("{api_base}/")
        };
        let api_url = Url::parse(&base)
            .map_err(|e| MailLensError::Config(format!("Invalid API base URL: {e}")))?;

        Ok(Self {
            client,
            api_url,
            api_key,
        })
    }

    /// Mailchimp accepts any user name with the API key as password.
    pub fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.basic_auth("anystring", Some(self.api_key.as_str()))
    }

    pub fn endpoint_url(&self, path: &str) -> Result<Url> {
        self.api_url
            .join(path)
            .map_err(|e| MailLensError::Config(format!("Invalid endpoint URL '{path}': {e}")))
    }

    /// Decode a response body, mapping error statuses and undecodable payloads
    /// to `Upstream` errors.
    pub async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ProblemDetail>(&body)
                .ok()
                .and_then(|p| p.detail.or(p.title))
                .filter(|m| !m.trim().is_empty())
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "request failed".to_string());

            return Err(MailLensError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| MailLensError::Upstream {
            status: status.as_u16(),
            message: format!("malformed payload: {e}"),
        })
    }
}
