//! Turning text documents into collections.

mod bibtexml;
mod tellico;

pub use bibtexml::BibtexmlImporter;
pub use tellico::TellicoImporter;

use crate::collection::Collection;
use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reads one document into a [`Collection`].
///
/// Parsing happens in [`collection`](Importer::collection); when it yields
/// nothing, [`status_message`](Importer::status_message) says why.
pub trait Importer: Send {
    /// Replaces the document text.
    fn set_text(&mut self, text: &str);

    /// Parses the current text.
    fn collection(&mut self) -> Option<Collection>;

    fn status_message(&self) -> Option<&str>;
}

/// Document formats an importer exists for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportFormat {
    /// The native collection XML format.
    #[default]
    Tellico,
    Bibtexml,
}

impl ImportFormat {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tellico => "tellico",
            Self::Bibtexml => "bibtexml",
        }
    }

    pub fn importer(self) -> Box<dyn Importer> {
        match self {
            Self::Tellico => Box::new(TellicoImporter::new()),
            Self::Bibtexml => Box::new(BibtexmlImporter::new()),
        }
    }
}

impl fmt::Display for ImportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ImportFormat {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tellico" | "xml" => Ok(Self::Tellico),
            "bibtexml" => Ok(Self::Bibtexml),
            other => Err(ModelError::UnknownFormat(other.to_string())),
        }
    }
}

/// Collapses whitespace runs to single spaces and trims.
pub(crate) fn simplify_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
