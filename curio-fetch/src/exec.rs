//! Searching by running a local program.
//!
//! The program gets the search term on its command line, built from a
//! per-key argument template, and prints matching entries on stdout in one
//! of the import formats. Anything on stderr is passed on as a message.

use crate::args::{build_arguments, quote_term, split_arguments};
use crate::config::FetcherConfig;
use crate::error::FetchError;
use crate::fetcher::{Fetcher, FetcherType};
use crate::registry::FetchContext;
use crate::request::{FetchKey, FetchRequest, FetcherId, MessageLevel};
use crate::session::{FetcherCore, Session};
use async_trait::async_trait;
use curio_model::identifiers::formalize_lccn;
use curio_model::{CollectionType, Entry, ImportFormat, dependent_value};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::process::Command;
use tracing::{debug, info, warn};

#[derive(Debug)]
struct ExecSettings {
    path: PathBuf,
    args: BTreeMap<FetchKey, String>,
    update_args: Option<String>,
    collection_type: CollectionType,
    format: ImportFormat,
}

type EntryCache = Arc<Mutex<HashMap<u32, Entry>>>;

/// Fetcher backed by an external program.
#[derive(Debug)]
pub struct ExecFetcher {
    core: FetcherCore,
    settings: Arc<ExecSettings>,
    delete_on_remove: bool,
    entries: EntryCache,
}

impl ExecFetcher {
    pub fn from_config(config: &FetcherConfig, ctx: &FetchContext) -> Result<Self, FetchError> {
        let collection_type = config
            .collection_type
            .ok_or_else(|| config.missing("collection_type"))?;
        let path = config.path.clone().unwrap_or_default();
        if path.as_os_str().is_empty() {
            // searches end immediately; the source still shows up
            warn!(source = %config.name, "no program configured");
        }
        Ok(Self {
            core: FetcherCore::new(&config.name, ctx.events.clone()),
            settings: Arc::new(ExecSettings {
                path,
                args: config.args.clone(),
                update_args: config.update_args.clone(),
                collection_type,
                format: config.format,
            }),
            delete_on_remove: config.delete_on_remove,
            entries: Arc::default(),
        })
    }

    /// Whether the program should be deleted when this source is removed.
    pub fn delete_on_remove(&self) -> bool {
        self.delete_on_remove
    }

    pub fn collection_type(&self) -> CollectionType {
        self.settings.collection_type
    }

    /// The arguments a search for `request` runs the program with, or
    /// `None` when this source has no template for the key.
    pub fn arguments_for(&self, request: &FetchRequest) -> Option<Vec<String>> {
        if request.key == FetchKey::Raw {
            return Some(split_arguments(&request.value));
        }
        let template = self.settings.args.get(&request.key)?;
        let term = match request.key {
            FetchKey::Isbn => request.value.replace('-', ""),
            FetchKey::Lccn => formalize_lccn(&request.value),
            _ => request.value.clone(),
        };
        Some(build_arguments(template, &term))
    }
}

#[async_trait]
impl Fetcher for ExecFetcher {
    fn id(&self) -> FetcherId {
        self.core.id()
    }

    fn source(&self) -> &str {
        self.core.source()
    }

    fn fetcher_type(&self) -> FetcherType {
        FetcherType::Exec
    }

    fn can_fetch(&self, kind: CollectionType) -> bool {
        self.settings.collection_type == kind
    }

    fn can_search(&self, key: FetchKey) -> bool {
        self.settings.args.contains_key(&key)
            || (key == FetchKey::Raw && self.settings.update_args.is_some())
    }

    fn is_searching(&self) -> bool {
        self.core.is_searching()
    }

    fn search(&self, request: FetchRequest) {
        let args = self.arguments_for(&request);
        let settings = Arc::clone(&self.settings);
        let entries = Arc::clone(&self.entries);
        self.core.start(move |session| async move {
            entries.lock().unwrap_or_else(PoisonError::into_inner).clear();
            let Some(args) = args else {
                debug!(source = %session.source(), key = %request.key, "no arguments for key");
                return;
            };
            if settings.path.as_os_str().is_empty() {
                return;
            }
            run(&session, &settings, &entries, args).await;
        });
    }

    fn stop(&self) {
        self.core.stop();
    }

    async fn fetch_entry(&self, uid: u32) -> Option<Entry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&uid)
            .cloned()
    }

    fn update_request(&self, entry: &Entry) -> Option<FetchRequest> {
        let template = self.settings.update_args.as_deref()?;
        let value = split_arguments(template)
            .iter()
            .map(|token| quote_term(&dependent_value(entry, token, false)))
            .collect::<Vec<_>>()
            .join(" ");
        Some(FetchRequest::new(
            self.settings.collection_type,
            FetchKey::Raw,
            value,
        ))
    }
}

async fn run(session: &Session, settings: &ExecSettings, entries: &EntryCache, args: Vec<String>) {
    debug!(source = %session.source(), program = %settings.path.display(), ?args, "running search program");
    let output = Command::new(&settings.path)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await;
    let output = match output {
        Ok(output) => output,
        Err(e) => {
            warn!(source = %session.source(), error = %e, "search program failed to start");
            session.message(
                MessageLevel::Error,
                format!("{}: {e}", session.source()),
            );
            return;
        }
    };

    let errors = String::from_utf8_lossy(&output.stderr);
    let errors = errors.strip_suffix('\n').unwrap_or(&errors);
    if !output.status.success() {
        warn!(source = %session.source(), status = %output.status, "search program did not exit successfully");
        if !errors.is_empty() {
            session.message(MessageLevel::Error, format!("{}: {errors}", session.source()));
        }
        return;
    }
    if !errors.is_empty() {
        session.message(MessageLevel::Warning, format!("{}: {errors}", session.source()));
    }
    if output.stdout.is_empty() {
        debug!(source = %session.source(), "search program printed nothing");
        return;
    }

    let mut importer = settings.format.importer();
    importer.set_text(&String::from_utf8_lossy(&output.stdout));
    let Some(collection) = importer.collection() else {
        if let Some(status) = importer.status_message() {
            session.message(MessageLevel::Status, status);
        }
        debug!(source = %session.source(), "search output held no collection");
        return;
    };

    let kind = collection.kind();
    let found = collection.entry_count();
    for entry in collection.into_entries() {
        let result = session.make_result(&entry.title(), &describe(kind, &entry), &entry.field("isbn"));
        entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(result.uid, entry);
        session.result(result);
    }
    info!(source = %session.source(), results = found, "search program finished");
}

/// A one-line summary of an entry, by collection kind.
fn describe(kind: CollectionType, entry: &Entry) -> String {
    let join = |names: &[&str]| {
        names
            .iter()
            .map(|name| entry.field(name))
            .collect::<Vec<_>>()
            .join("/")
    };
    match kind {
        CollectionType::Book | CollectionType::Bibtex => {
            let mut desc = join(&["author", "publisher"]);
            let year = [entry.field("cr_year"), entry.field("pub_year")]
                .into_iter()
                .find(|year| !year.is_empty());
            if let Some(year) = year {
                desc.push('/');
                desc.push_str(&year);
            }
            desc
        }
        CollectionType::Video => join(&["studio", "director", "year", "medium"]),
        CollectionType::Album => join(&["artist", "label", "year"]),
        CollectionType::Game => join(&["platform"]),
        CollectionType::ComicBook => join(&["publisher", "pub_year"]),
        CollectionType::BoardGame => join(&["designer", "publisher", "year"]),
        _ => String::new(),
    }
}
