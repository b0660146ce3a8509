//! The fetcher abstraction.
//!
//! A fetcher searches one external source. Searching is asynchronous and
//! event driven: [`Fetcher::search`] returns immediately and the results,
//! messages and a final `Done` arrive on the event channel the fetcher was
//! built with. Full entries are resolved afterwards, one result at a time.

use crate::request::{FetchKey, FetchRequest, FetcherId};
use async_trait::async_trait;
use curio_model::{CollectionType, Entry};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The strategies a fetcher can be built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetcherType {
    /// Runs a local program and imports what it prints.
    Exec,
    /// Film database spoken to over XML-RPC.
    MovieMeter,
    /// Book search over a JSON HTTP API.
    OpenLibrary,
}

impl FetcherType {
    pub const ALL: [FetcherType; 3] = [Self::Exec, Self::MovieMeter, Self::OpenLibrary];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Exec => "exec",
            Self::MovieMeter => "moviemeter",
            Self::OpenLibrary => "openlibrary",
        }
    }
}

impl fmt::Display for FetcherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FetcherType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown fetcher type: {s}"))
    }
}

/// A search source.
///
/// Each instance runs at most one search session at a time; starting a new
/// search stops the previous one. Every started session ends with exactly
/// one [`FetchEvent::Done`](crate::FetchEvent::Done), whether it ran to
/// completion or was stopped.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Identifies this instance in results and events.
    fn id(&self) -> FetcherId;

    /// Display name of the source.
    fn source(&self) -> &str;

    fn fetcher_type(&self) -> FetcherType;

    /// Whether results from this source suit a collection of `kind`.
    fn can_fetch(&self, kind: CollectionType) -> bool;

    /// Whether this source understands searches by `key`.
    fn can_search(&self, key: FetchKey) -> bool;

    /// Returns `true` while a session is running.
    fn is_searching(&self) -> bool;

    /// Starts a search session. Must be called within a tokio runtime.
    fn search(&self, request: FetchRequest);

    /// Stops the running session, if any. Idempotent.
    fn stop(&self);

    /// Resolves a result from the latest session into a full entry.
    /// Returns `None` when the uid is unknown or the source fails.
    async fn fetch_entry(&self, uid: u32) -> Option<Entry>;

    /// Builds the request that would refresh `entry` from this source, or
    /// `None` when the entry holds nothing to search by.
    fn update_request(&self, entry: &Entry) -> Option<FetchRequest>;
}
