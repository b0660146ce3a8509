//! Error types for the fetch layer.
//!
//! Fetchers never hand these to their callers; a failed session ends with a
//! message event instead. They flow between the helpers a fetcher is built
//! from and out of configuration loading.

use thiserror::Error;

/// Errors that can occur while searching a source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed or returned an error status.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The remote procedure returned a fault.
    #[error("remote fault {code}: {message}")]
    Fault { code: i64, message: String },

    /// A response did not have the expected shape.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// JSON decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Malformed XML or an unreadable import.
    #[error("model error: {0}")]
    Model(#[from] curio_model::ModelError),

    /// Image payload was not valid base64.
    #[error("decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Bad URL in configuration or a response.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration file could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// A fetcher is missing a required setting.
    #[error("fetcher {name} is missing {setting}")]
    MissingSetting { name: String, setting: &'static str },

    /// No builder is registered for a fetcher type.
    #[error("no fetcher registered for type {0}")]
    UnknownFetcherType(String),

    /// Filesystem or process error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
