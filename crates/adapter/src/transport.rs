//! HTTP transport.
//!
//! [`Transport`] is the seam between the score logic and the network; tests
//! script it, the app uses [`HttpTransport`].

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ServiceConfig;
use crate::error::TransportError;
use crate::protocol::{ApiResponse, AuthHeader};

#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a JSON body. 200 and 201 count as success.
    async fn post(&self, endpoint: &str, body: &Value, auth: Option<&AuthHeader>) -> ApiResponse;

    /// GET. Only 200 counts as success.
    async fn get(&self, endpoint: &str, auth: Option<&AuthHeader>) -> ApiResponse;
}

/// reqwest-backed transport with a per-request timeout
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl HttpTransport {
    pub fn new(config: &ServiceConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .user_agent(concat!("memory-match/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| TransportError::Client(err.to_string()))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn request(
        &self,
        builder: RequestBuilder,
        auth: Option<&AuthHeader>,
    ) -> RequestBuilder {
        let builder = builder.header(ACCEPT, "application/json");
        match auth {
            Some(auth) => builder.header(AUTHORIZATION, auth.header_value()),
            None => builder,
        }
    }

    async fn execute(
        &self,
        method: &'static str,
        endpoint: &str,
        builder: RequestBuilder,
        accepted: &[StatusCode],
    ) -> ApiResponse {
        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => {
                let err = TransportError::from(err);
                warn!(method, endpoint, error = %err, "request failed");
                return ApiResponse::Exception(err);
            }
        };

        let status = response.status();
        debug!(method, endpoint, status = status.as_u16(), "response");

        let text = match response.text().await {
            Ok(text) => text,
            Err(err) => return ApiResponse::Exception(TransportError::from(err)),
        };

        if !accepted.contains(&status) {
            let message = if text.trim().is_empty() {
                format!("HTTP Error {}", status.as_u16())
            } else {
                text
            };
            return ApiResponse::Error {
                code: status.as_u16(),
                message,
            };
        }

        if text.trim().is_empty() {
            return ApiResponse::Success(Value::Null);
        }
        match serde_json::from_str(&text) {
            Ok(body) => ApiResponse::Success(body),
            Err(err) => ApiResponse::Exception(TransportError::Body(err.to_string())),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, endpoint: &str, body: &Value, auth: Option<&AuthHeader>) -> ApiResponse {
        let url = self.config.url_for(endpoint);
        debug!(endpoint, auth = auth.map(AuthHeader::mode), "POST");
        let builder = self.request(self.client.post(url).json(body), auth);
        self.execute("POST", endpoint, builder, &[StatusCode::OK, StatusCode::CREATED])
            .await
    }

    async fn get(&self, endpoint: &str, auth: Option<&AuthHeader>) -> ApiResponse {
        let url = self.config.url_for(endpoint);
        debug!(endpoint, auth = auth.map(AuthHeader::mode), "GET");
        let builder = self.request(self.client.get(url), auth);
        self.execute("GET", endpoint, builder, &[StatusCode::OK])
            .await
    }
}
