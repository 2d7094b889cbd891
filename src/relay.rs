//! Relay between a client and the model's generate endpoint.
//!
//! The relay validates the client request, fills in defaults from
//! [`RelayConfig`], forwards it upstream and runs the upstream envelope
//! through [`normalize_envelope`] so the reply always carries readability
//! metrics when there is text to measure.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::normalize::normalize_envelope;

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// What a client sends to the relay.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayRequest {
    pub prompt: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub stream: Option<bool>,
    #[serde(default)]
    pub format: Option<Value>,
    #[serde(default)]
    pub options: Option<Value>,
}

/// Body posted to the upstream generate endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpstreamRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

/// What the relay hands back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReply {
    pub status: u16,
    pub body: String,
}

impl RelayReply {
    pub fn error(err: &RelayError) -> Self {
        Self {
            status: 400,
            body: json!({ "error": err.to_string() }).to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ---------------------------------------------------------------------------
// Request handling
// ---------------------------------------------------------------------------

/// Decodes a client request. Anything but a non-empty JSON object is
/// rejected as invalid input; an object without a `prompt` is rejected as
/// such.
pub fn parse_request(raw: &str) -> Result<RelayRequest, RelayError> {
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) if !map.is_empty() => Value::Object(map),
        _ => return Err(RelayError::InvalidInput),
    };
    if value.get("prompt").map_or(true, Value::is_null) {
        return Err(RelayError::MissingPrompt);
    }
    serde_json::from_value(value).map_err(|_| RelayError::InvalidInput)
}

impl UpstreamRequest {
    pub fn prepare(request: &RelayRequest, config: &RelayConfig) -> Self {
        Self {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| config.default_model.clone()),
            prompt: request.prompt.clone(),
            stream: request.stream.unwrap_or(false),
            format: request
                .format
                .clone()
                .unwrap_or_else(|| Value::String("json".to_string())),
            options: request.options.clone().filter(has_entries),
        }
    }
}

/// Only non-empty objects or arrays are forwarded as model options.
fn has_entries(options: &Value) -> bool {
    match options {
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Upstream
// ---------------------------------------------------------------------------

/// Something that can run a prepared request against a model.
pub trait Upstream {
    fn send(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, RelayError>;
}

/// Blocking HTTP transport to an Ollama-style `/api/generate` endpoint.
pub struct HttpUpstream {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpUpstream {
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self {
            url: config.upstream_url.clone(),
            client,
        })
    }
}

impl Upstream for HttpUpstream {
    fn send(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, RelayError> {
        let res = self.client.post(&self.url).json(request).send()?;
        let status = res.status().as_u16();
        let body = res.text()?;
        Ok(UpstreamResponse { status, body })
    }
}

// ---------------------------------------------------------------------------
// Relay
// ---------------------------------------------------------------------------

pub struct Relay<U = HttpUpstream> {
    config: RelayConfig,
    upstream: U,
}

impl Relay<HttpUpstream> {
    pub fn from_config(config: RelayConfig) -> Result<Self, RelayError> {
        let upstream = HttpUpstream::new(&config)?;
        Ok(Self::new(config, upstream))
    }
}

impl<U: Upstream> Relay<U> {
    pub fn new(config: RelayConfig, upstream: U) -> Self {
        Self { config, upstream }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Runs one client request end to end. Upstream error statuses are not
    /// errors here; they come back as a reply with the upstream body.
    pub fn forward(&self, raw_input: &str) -> Result<RelayReply, RelayError> {
        let request = parse_request(raw_input)?;
        let prepared = UpstreamRequest::prepare(&request, &self.config);
        let response = self.upstream.send(&prepared)?;

        if self.config.log_requests {
            info!(
                model = %prepared.model,
                status = response.status,
                "relayed request"
            );
        }

        let body = normalize_envelope(response.status, &response.body, &prepared.prompt);
        Ok(RelayReply {
            status: response.status,
            body,
        })
    }

    /// Like [`Relay::forward`], with failures turned into a 400 reply whose
    /// body is `{"error": "<message>"}`.
    pub fn handle(&self, raw_input: &str) -> RelayReply {
        self.forward(raw_input).unwrap_or_else(|err| {
            warn!(error = %err, "relay request failed");
            RelayReply::error(&err)
        })
    }
}
