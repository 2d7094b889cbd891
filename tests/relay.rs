use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde_json::{json, Value};
use textlens::{
    parse_request, readability_score, Relay, RelayConfig, RelayError, Upstream, UpstreamRequest,
    UpstreamResponse,
};

struct StubUpstream {
    status: u16,
    body: String,
    seen: Rc<RefCell<Vec<UpstreamRequest>>>,
}

impl Upstream for StubUpstream {
    fn send(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, RelayError> {
        self.seen.borrow_mut().push(request.clone());
        Ok(UpstreamResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

fn stub_relay(status: u16, body: &str) -> (Relay<StubUpstream>, Rc<RefCell<Vec<UpstreamRequest>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let upstream = StubUpstream {
        status,
        body: body.to_string(),
        seen: Rc::clone(&seen),
    };
    let config = RelayConfig {
        log_requests: false,
        ..RelayConfig::default()
    };
    (Relay::new(config, upstream), seen)
}

fn parse(json: &str) -> Value {
    serde_json::from_str(json).unwrap()
}

// ---------------------------------------------------------------------------
// Request parsing and preparation
// ---------------------------------------------------------------------------

#[test]
fn rejects_invalid_input() {
    for raw in ["", "not json", "{}", "[]", "null", "\"prompt\""] {
        assert!(
            matches!(parse_request(raw), Err(RelayError::InvalidInput)),
            "{raw:?} should be invalid input"
        );
    }
    assert!(matches!(
        parse_request(r#"{"prompt": 5}"#),
        Err(RelayError::InvalidInput)
    ));
}

#[test]
fn requires_prompt() {
    for raw in [r#"{"model": "llama3"}"#, r#"{"prompt": null}"#] {
        assert!(matches!(parse_request(raw), Err(RelayError::MissingPrompt)));
    }
}

#[test]
fn prepare_fills_defaults() {
    let config = RelayConfig::default();
    let request = parse_request(r#"{"prompt": "Why is the sky blue?", "options": {}}"#).unwrap();
    let prepared = UpstreamRequest::prepare(&request, &config);

    assert_eq!(prepared.model, "gemma3:1b");
    assert_eq!(prepared.prompt, "Why is the sky blue?");
    assert!(!prepared.stream);
    assert_eq!(prepared.format, json!("json"));
    assert_eq!(prepared.options, None);

    let body = serde_json::to_value(&prepared).unwrap();
    assert!(body.get("options").is_none());
}

#[test]
fn prepare_keeps_client_choices() {
    let config = RelayConfig::default();
    let request = parse_request(
        r#"{"prompt": "hi", "model": "llama3", "stream": true, "format": {"type": "object"}, "options": {"temperature": 0.2}}"#,
    )
    .unwrap();
    let prepared = UpstreamRequest::prepare(&request, &config);

    assert_eq!(prepared.model, "llama3");
    assert!(prepared.stream);
    assert_eq!(prepared.format, json!({"type": "object"}));
    assert_eq!(prepared.options, Some(json!({"temperature": 0.2})));
}

#[test]
fn prepare_drops_scalar_and_empty_options() {
    let config = RelayConfig::default();
    for options in ["[]", "\"fast\"", "3"] {
        let raw = format!(r#"{{"prompt": "hi", "options": {options}}}"#);
        let prepared = UpstreamRequest::prepare(&parse_request(&raw).unwrap(), &config);
        assert_eq!(prepared.options, None, "options {options}");
    }
}

// ---------------------------------------------------------------------------
// End to end through a stub upstream
// ---------------------------------------------------------------------------

#[test]
fn relays_and_adds_metrics() {
    let envelope = json!({
        "model": "gemma3:1b",
        "response": r#"{"tone_suggestions": []}"#,
        "done": true,
    })
    .to_string();
    let (relay, seen) = stub_relay(200, &envelope);

    let input = json!({
        "prompt": "Fix the grammar.\nText: The sky is blue. It is beautiful.",
        "model": "llama3",
    })
    .to_string();
    let reply = relay.handle(&input);

    assert_eq!(reply.status, 200);
    assert!(reply.is_success());
    let out = parse(&reply.body);
    assert_eq!(out["done"], true);
    let inner = parse(out["response"].as_str().unwrap());
    assert_eq!(
        inner["readability_score"].as_f64().unwrap(),
        readability_score("The sky is blue. It is beautiful.")
    );
    assert!(inner["grade_level"].is_f64());

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].model, "llama3");
    assert_eq!(seen[0].format, json!("json"));
}

#[test]
fn upstream_errors_pass_through() {
    let body = r#"{"error":"model 'nope' not found"}"#;
    let (relay, _) = stub_relay(404, body);
    let reply = relay.handle(r#"{"prompt": "Text: hello."}"#);
    assert_eq!(reply.status, 404);
    assert_eq!(reply.body, body);
    assert!(!reply.is_success());
}

#[test]
fn invalid_requests_become_error_replies() {
    let (relay, seen) = stub_relay(200, "{}");

    let reply = relay.handle(r#"{"model": "llama3"}"#);
    assert_eq!(reply.status, 400);
    assert_eq!(parse(&reply.body), json!({"error": "Prompt is required"}));

    let reply = relay.handle("garbage");
    assert_eq!(reply.status, 400);
    assert_eq!(parse(&reply.body), json!({"error": "Invalid JSON input"}));

    assert!(seen.borrow().is_empty());
}

#[test]
fn unreachable_upstream_is_a_transport_error() {
    let config = RelayConfig {
        upstream_url: "http://127.0.0.1:9/api/generate".to_string(),
        request_timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(1),
        log_requests: false,
        ..RelayConfig::default()
    };
    let relay = Relay::from_config(config).unwrap();

    let err = relay.forward(r#"{"prompt": "hi"}"#).unwrap_err();
    assert!(matches!(err, RelayError::Transport(_)));

    let reply = relay.handle(r#"{"prompt": "hi"}"#);
    assert_eq!(reply.status, 400);
    let error = parse(&reply.body)["error"].as_str().unwrap().to_string();
    assert!(error.starts_with("upstream request failed"), "{error}");
}
