use thiserror::Error;

/// Failures of the relay. The metrics and normalizer core never produce
/// these; they pass unusable payloads through instead.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid JSON input")]
    InvalidInput,
    #[error("Prompt is required")]
    MissingPrompt,
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    InvalidVar {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}
