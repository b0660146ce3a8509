//! Pieces of the `curio` binary that do not need a terminal: loading
//! collections and fetchers, and rendering what they produce as text.

use anyhow::{Context, Result, bail};
use curio_fetch::{FetchKey, FetchManager, FetchOutcome, Fetcher, FetcherRegistry, FetchersConfig, MessageLevel};
use curio_model::{
    Collection, CollectionType, DirectoryImageStore, Entry, ImageStore, ImportFormat,
    MemoryImageStore,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Reads and imports a collection file.
pub fn load_collection(path: &Path, format: ImportFormat) -> Result<Collection> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut importer = format.importer();
    importer.set_text(&text);
    match importer.collection() {
        Some(collection) => {
            debug!(path = %path.display(), entries = collection.entry_count(), "collection loaded");
            Ok(collection)
        }
        None => bail!(
            "Failed to import {} as {format}: {}",
            path.display(),
            importer.status_message().unwrap_or("no collection found")
        ),
    }
}

/// Loads the fetcher configuration and builds every fetcher in it.
///
/// Images go to `images` when given, otherwise they are kept in memory.
pub fn build_manager(config: &Path, images: Option<&Path>) -> Result<FetchManager> {
    let fetchers = FetchersConfig::load(config).with_context(|| {
        format!("Failed to load fetcher configuration from {}", config.display())
    })?;
    let store: Arc<dyn ImageStore> = match images {
        Some(dir) => Arc::new(
            DirectoryImageStore::open(dir)
                .with_context(|| format!("Failed to open image directory {}", dir.display()))?,
        ),
        None => Arc::new(MemoryImageStore::new()),
    };
    Ok(FetchManager::from_config(
        &fetchers,
        &FetcherRegistry::default(),
        store,
    ))
}

/// One line per source: name, type, searchable keys and collection types.
pub fn sources_report(fetchers: &[Arc<dyn Fetcher>]) -> String {
    let mut out = String::new();
    for fetcher in fetchers {
        let keys: Vec<&str> = FetchKey::ALL
            .into_iter()
            .filter(|key| fetcher.can_search(*key))
            .map(FetchKey::name)
            .collect();
        let kinds: Vec<&str> = CollectionType::ALL
            .into_iter()
            .filter(|kind| fetcher.can_fetch(*kind))
            .map(CollectionType::name)
            .collect();
        out.push_str(&format!(
            "{}\t{}\tkeys: {}\ttypes: {}\n",
            fetcher.source(),
            fetcher.fetcher_type(),
            keys.join(", "),
            kinds.join(", ")
        ));
    }
    out
}

/// Results as `uid  title  description`, then any messages.
pub fn outcome_report(outcome: &FetchOutcome) -> String {
    let mut out = String::new();
    for result in &outcome.results {
        out.push_str(&format!("{:>4}  {}", result.uid, result.title));
        if !result.description.is_empty() {
            out.push_str(&format!("  ({})", result.description));
        }
        if !result.isbn.is_empty() {
            out.push_str(&format!("  ISBN {}", result.isbn));
        }
        out.push('\n');
    }
    for (level, text) in &outcome.messages {
        let label = match level {
            MessageLevel::Status => "note",
            MessageLevel::Warning => "warning",
            MessageLevel::Error => "error",
        };
        out.push_str(&format!("{label}: {text}\n"));
    }
    out
}

/// The groups of `field`, each followed by its entries' titles.
pub fn group_report(collection: &Collection, field: &str) -> Result<String> {
    let Some(definition) = collection.schema().field_by_name(field) else {
        bail!("{} has no field named {field}", collection.title());
    };
    if !definition.is_groupable() {
        bail!("Field {field} cannot be grouped");
    }
    let mut out = String::new();
    for group in collection.groups_for_field(field) {
        out.push_str(&format!("{} ({})\n", group.group_name(), group.len()));
        for id in group.entries() {
            if let Some(entry) = collection.entry(*id) {
                out.push_str(&format!("  {}\n", entry.title()));
            }
        }
    }
    Ok(out)
}

/// A fetched entry as it is printed with `--json`.
#[derive(Debug, Serialize)]
pub struct EntryRecord {
    pub uid: u32,
    pub collection: CollectionType,
    pub fields: BTreeMap<String, String>,
}

impl EntryRecord {
    pub fn new(uid: u32, entry: &Entry) -> Self {
        Self {
            uid,
            collection: entry.collection().kind(),
            fields: entry
                .values()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }
}

pub fn entries_json(entries: &[(u32, Entry)]) -> Result<String> {
    let records: Vec<EntryRecord> = entries
        .iter()
        .map(|(uid, entry)| EntryRecord::new(*uid, entry))
        .collect();
    serde_json::to_string_pretty(&records).context("Failed to encode entries")
}
