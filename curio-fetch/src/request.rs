//! What is asked of a fetcher and what it answers with.

use curio_model::CollectionType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifies one fetcher instance. Results and events carry it so callers
/// can tell sources apart without holding the fetcher itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetcherId(Uuid);

impl FetcherId {
    /// Generates a new random fetcher id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for FetcherId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FetcherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of value being searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchKey {
    Title,
    Person,
    Isbn,
    Upc,
    Keyword,
    Lccn,
    /// A source-specific query string, used as is.
    Raw,
}

impl FetchKey {
    pub const ALL: [FetchKey; 7] = [
        Self::Title,
        Self::Person,
        Self::Isbn,
        Self::Upc,
        Self::Keyword,
        Self::Lccn,
        Self::Raw,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Person => "person",
            Self::Isbn => "isbn",
            Self::Upc => "upc",
            Self::Keyword => "keyword",
            Self::Lccn => "lccn",
            Self::Raw => "raw",
        }
    }
}

impl fmt::Display for FetchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FetchKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown search key: {s}"))
    }
}

/// One search: which kind of collection the results are for, what the
/// value means, and the value itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchRequest {
    pub collection_type: CollectionType,
    pub key: FetchKey,
    pub value: String,
}

impl FetchRequest {
    pub fn new(collection_type: CollectionType, key: FetchKey, value: impl Into<String>) -> Self {
        Self {
            collection_type,
            key,
            value: value.into(),
        }
    }
}

/// A summary of one match, enough to choose from. The full entry is
/// retrieved with [`Fetcher::fetch_entry`](crate::Fetcher::fetch_entry)
/// using `uid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult {
    /// Unique among the results of the fetcher that produced it.
    pub uid: u32,
    pub title: String,
    pub description: String,
    pub isbn: String,
    pub fetcher: FetcherId,
}

/// Severity of a message from a fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Status,
    Warning,
    Error,
}

/// Events a fetcher emits while a search session runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    ResultFound(FetchResult),
    Message {
        fetcher: FetcherId,
        level: MessageLevel,
        text: String,
    },
    /// The session is over. Sent exactly once per started session.
    Done { fetcher: FetcherId },
}

impl FetchEvent {
    /// The fetcher that sent this event.
    pub fn fetcher(&self) -> FetcherId {
        match self {
            Self::ResultFound(result) => result.fetcher,
            Self::Message { fetcher, .. } | Self::Done { fetcher } => *fetcher,
        }
    }
}
