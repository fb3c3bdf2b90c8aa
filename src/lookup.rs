//! Word lookup
//!
//! Sends a selected word to the configured endpoint. Fire-and-forget: the
//! outcome is logged and returned, but never raised.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::config::Defaults;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    #[error("Failed to reach lookup endpoint: {0}")]
    Transport(String),

    #[error("Lookup endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse lookup response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// Nothing was sent (empty word or no endpoint)
    Skipped,
    Sent(Value),
    Failed(LookupError),
}

/// Request body sent to the endpoint
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LookupRequest<'a> {
    pub word: &'a str,
}

/// Performs the actual POST
#[async_trait(?Send)]
pub trait LookupTransport {
    async fn post_json(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
        body: &LookupRequest<'_>,
    ) -> Result<Value, LookupError>;
}

/// `reqwest` transport; on wasm32 this is the browser's `fetch` in cors mode
#[derive(Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait(?Send)]
impl LookupTransport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
        body: &LookupRequest<'_>,
    ) -> Result<Value, LookupError> {
        let mut request = self.client.post(url).json(body);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::Status { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| LookupError::Decode(e.to_string()))
    }
}

pub struct LookupClient<T: LookupTransport = HttpTransport> {
    endpoint: Option<String>,
    headers: BTreeMap<String, String>,
    transport: T,
}

impl LookupClient<HttpTransport> {
    pub fn from_defaults(defaults: &Defaults) -> Self {
        Self::with_transport(defaults, HttpTransport::new())
    }
}

impl<T: LookupTransport> LookupClient<T> {
    pub fn with_transport(defaults: &Defaults, transport: T) -> Self {
        Self {
            endpoint: defaults
                .lookup_url
                .clone()
                .filter(|url| !url.trim().is_empty()),
            headers: defaults.lookup_headers.clone(),
            transport,
        }
    }

    /// Send `word` to the endpoint and log what came back
    pub async fn lookup(&self, word: &str) -> LookupOutcome {
        if word.is_empty() {
            return LookupOutcome::Skipped;
        }
        let Some(endpoint) = self.endpoint.as_deref() else {
            tracing::debug!("No lookup endpoint configured, ignoring {:?}", word);
            return LookupOutcome::Skipped;
        };

        match self
            .transport
            .post_json(endpoint, &self.headers, &LookupRequest { word })
            .await
        {
            Ok(result) => {
                tracing::info!(word = %word, %result, "Word sent to server");
                LookupOutcome::Sent(result)
            }
            Err(e) => {
                tracing::error!(word = %word, "Error sending word to server: {}", e);
                LookupOutcome::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::{Cell, RefCell};

    /// Mock endpoint answering with a fixed status and body
    struct MockEndpoint {
        status: u16,
        body: String,
        calls: Cell<usize>,
        last_request: RefCell<Option<(String, Value)>>,
    }

    impl MockEndpoint {
        fn new(status: u16, body: &str) -> Self {
            Self {
                status,
                body: body.to_string(),
                calls: Cell::new(0),
                last_request: RefCell::new(None),
            }
        }
    }

    #[async_trait(?Send)]
    impl LookupTransport for MockEndpoint {
        async fn post_json(
            &self,
            url: &str,
            _headers: &BTreeMap<String, String>,
            body: &LookupRequest<'_>,
        ) -> Result<Value, LookupError> {
            self.calls.set(self.calls.get() + 1);
            *self.last_request.borrow_mut() =
                Some((url.to_string(), serde_json::to_value(body).unwrap()));

            if !(200..300).contains(&self.status) {
                return Err(LookupError::Status {
                    status: self.status,
                    body: self.body.clone(),
                });
            }
            serde_json::from_str(&self.body).map_err(|e| LookupError::Decode(e.to_string()))
        }
    }

    fn defaults() -> Defaults {
        Defaults {
            lookup_url: Some("https://lookup.example/word".to_string()),
            ..Defaults::default()
        }
    }

    #[tokio::test]
    async fn test_lookup_logs_payload() {
        let endpoint = MockEndpoint::new(200, r#"{"definition":"short-lived"}"#);
        let client = LookupClient::with_transport(&defaults(), endpoint);

        let outcome = client.lookup("ephemeral").await;

        assert_eq!(outcome, LookupOutcome::Sent(json!({"definition": "short-lived"})));
        assert_eq!(
            *client.transport.last_request.borrow(),
            Some((
                "https://lookup.example/word".to_string(),
                json!({"word": "ephemeral"})
            ))
        );
    }

    #[tokio::test]
    async fn test_server_error_is_contained() {
        let endpoint = MockEndpoint::new(500, "Internal Server Error");
        let client = LookupClient::with_transport(&defaults(), endpoint);

        let outcome = client.lookup("ephemeral").await;

        assert_eq!(
            outcome,
            LookupOutcome::Failed(LookupError::Status {
                status: 500,
                body: "Internal Server Error".to_string(),
            })
        );
        assert_eq!(client.transport.calls.get(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_response_is_contained() {
        let endpoint = MockEndpoint::new(200, "<html>ok</html>");
        let client = LookupClient::with_transport(&defaults(), endpoint);

        let outcome = client.lookup("ephemeral").await;

        assert!(matches!(outcome, LookupOutcome::Failed(LookupError::Decode(_))));
    }

    #[tokio::test]
    async fn test_empty_word_makes_no_call() {
        let endpoint = MockEndpoint::new(200, "{}");
        let client = LookupClient::with_transport(&defaults(), endpoint);

        assert_eq!(client.lookup("").await, LookupOutcome::Skipped);
        assert_eq!(client.transport.calls.get(), 0);
    }

    #[tokio::test]
    async fn test_missing_endpoint_makes_no_call() {
        let endpoint = MockEndpoint::new(200, "{}");
        let client = LookupClient::with_transport(&Defaults::default(), endpoint);

        assert_eq!(client.lookup("ephemeral").await, LookupOutcome::Skipped);
        assert_eq!(client.transport.calls.get(), 0);
    }
}
