//! Readability metrics and model-reply normalization for a text-analysis
//! relay.
//!
//! [`metrics`] computes word, sentence and syllable counts and the Flesch
//! scores derived from them. [`normalize`] decides whether a model's JSON
//! reply already carries those scores and fills them in when it does not.
//! [`relay`] forwards client requests to a locally hosted model and applies
//! the normalizer to what comes back.

pub mod config;
pub mod error;
pub mod metrics;
pub mod normalize;
pub mod relay;

pub use config::RelayConfig;
pub use error::{ConfigError, RelayError};
pub use metrics::{
    analyze, count_sentences, count_syllables, count_syllables_in_word, count_words, grade_level,
    readability_score, report, text_statistics, AnalysisResult, TextReport, TextStats,
};
pub use normalize::{extract_text_from_prompt, normalize_envelope, process_model_response};
pub use relay::{
    parse_request, HttpUpstream, Relay, RelayReply, RelayRequest, Upstream, UpstreamRequest,
    UpstreamResponse,
};
