//! Search sources for curio.
//!
//! A [`Fetcher`] looks up entries in one external source. Searches run as
//! tokio tasks and report through [`FetchEvent`]s on an unbounded channel:
//! any number of results and messages, then exactly one `Done`.
//!
//! # Sources
//!
//! - [`ExecFetcher`]: runs a local program and imports what it prints
//! - [`MovieMeterFetcher`]: a film database spoken to over XML-RPC
//! - [`OpenLibraryFetcher`]: book search over HTTP and JSON
//!
//! Fetchers are described in a TOML file ([`FetchersConfig`]) and built by a
//! [`FetcherRegistry`]. A [`FetchManager`] holds the built fetchers and the
//! event channel; a [`FetchJob`] runs one search to completion.
//!
//! # Example
//!
//! ```no_run
//! use curio_fetch::{FetchKey, FetchManager, FetchRequest, FetcherRegistry, FetchersConfig};
//! use curio_model::{CollectionType, MemoryImageStore};
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), curio_fetch::FetchError> {
//! let config = FetchersConfig::load("fetchers.toml")?;
//! let mut manager = FetchManager::from_config(
//!     &config,
//!     &FetcherRegistry::default(),
//!     Arc::new(MemoryImageStore::new()),
//! );
//! let sources = manager.sources_for(FetchKey::Isbn, CollectionType::Book);
//! if let Some(source) = sources.into_iter().next() {
//!     let request = FetchRequest::new(CollectionType::Book, FetchKey::Isbn, "0-596-00048-0");
//!     let outcome = manager.job(source).run(request).await;
//!     for (_, entry) in &outcome.entries {
//!         println!("{}", entry.title());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod args;
mod config;
mod error;
mod exec;
mod fetcher;
mod http;
mod job;
mod manager;
pub mod openlibrary;
mod registry;
mod request;
pub mod rpc;
mod session;

pub use config::{FetcherConfig, FetchersConfig};
pub use error::FetchError;
pub use exec::ExecFetcher;
pub use fetcher::{Fetcher, FetcherType};
pub use job::{FetchJob, FetchOutcome};
pub use manager::FetchManager;
pub use openlibrary::OpenLibraryFetcher;
pub use registry::{FetchContext, FetcherRegistry};
pub use request::{
    FetchEvent, FetchKey, FetchRequest, FetchResult, FetcherId, MessageLevel,
};
pub use rpc::{MovieMeterFetcher, RpcClient, XmlRpcClient};
pub use session::{FetcherCore, Session};
