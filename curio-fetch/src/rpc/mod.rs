//! Remote procedure calls and the sources spoken to through them.
//!
//! Calls take and return [`serde_json::Value`]s so callers read responses
//! the same way whatever the wire encoding is.

pub mod moviemeter;
pub mod xmlrpc;

pub use moviemeter::MovieMeterFetcher;
pub use xmlrpc::XmlRpcClient;

use crate::error::FetchError;
use async_trait::async_trait;
use serde_json::Value;

/// Something that can invoke a named remote method.
#[async_trait]
pub trait RpcClient: Send + Sync {
    /// Calls `method` with positional `params` and returns its result.
    /// A fault reported by the remote side is [`FetchError::Fault`].
    async fn call(&self, method: &str, params: &[Value]) -> Result<Value, FetchError>;
}
