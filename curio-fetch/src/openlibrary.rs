//! Book search through the OpenLibrary JSON API.

use crate::config::FetcherConfig;
use crate::error::FetchError;
use crate::fetcher::{Fetcher, FetcherType};
use crate::registry::FetchContext;
use crate::request::{FetchKey, FetchRequest, FetcherId, MessageLevel};
use crate::session::{FetcherCore, Session};
use async_trait::async_trait;
use curio_model::identifiers::{formalize_lccn, normalize_isbn};
use curio_model::{CollectionSchema, CollectionType, DELIMITER, Entry, ImageStore};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://openlibrary.org";
pub const DEFAULT_COVER_URL: &str = "https://covers.openlibrary.org";

const SEARCH_LIMIT: &str = "25";

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<Doc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Doc {
    title: String,
    subtitle: Option<String>,
    author_name: Vec<String>,
    publisher: Vec<String>,
    first_publish_year: Option<i64>,
    isbn: Vec<String>,
    lccn: Vec<String>,
    number_of_pages_median: Option<u32>,
    cover_i: Option<i64>,
    language: Vec<String>,
    subject: Vec<String>,
}

struct Found {
    entry: Entry,
    cover: Option<i64>,
}

/// Fetcher for openlibrary.org and servers speaking its search API.
pub struct OpenLibraryFetcher {
    core: FetcherCore,
    state: Arc<State>,
}

struct State {
    client: reqwest::Client,
    base_url: Url,
    cover_url: Url,
    schema: Arc<CollectionSchema>,
    images: Arc<dyn ImageStore>,
    found: Mutex<HashMap<u32, Found>>,
}

impl OpenLibraryFetcher {
    pub fn from_config(config: &FetcherConfig, ctx: &FetchContext) -> Result<Self, FetchError> {
        let base_url = Url::parse(config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        let cover_url =
            Url::parse(config.cover_base_url.as_deref().unwrap_or(DEFAULT_COVER_URL))?;
        Ok(Self {
            core: FetcherCore::new(&config.name, ctx.events.clone()),
            state: Arc::new(State {
                client: crate::http::client(),
                base_url,
                cover_url,
                schema: CollectionSchema::for_kind(CollectionType::Book).into_shared(),
                images: Arc::clone(&ctx.images),
                found: Mutex::default(),
            }),
        })
    }
}

#[async_trait]
impl Fetcher for OpenLibraryFetcher {
    fn id(&self) -> FetcherId {
        self.core.id()
    }

    fn source(&self) -> &str {
        self.core.source()
    }

    fn fetcher_type(&self) -> FetcherType {
        FetcherType::OpenLibrary
    }

    fn can_fetch(&self, kind: CollectionType) -> bool {
        matches!(kind, CollectionType::Book | CollectionType::Bibtex)
    }

    fn can_search(&self, key: FetchKey) -> bool {
        matches!(
            key,
            FetchKey::Title | FetchKey::Person | FetchKey::Isbn | FetchKey::Lccn | FetchKey::Keyword
        )
    }

    fn is_searching(&self) -> bool {
        self.core.is_searching()
    }

    fn search(&self, request: FetchRequest) {
        let state = Arc::clone(&self.state);
        self.core.start(move |session| async move {
            if let Err(e) = state.search(&session, &request).await {
                warn!(source = %session.source(), error = %e, "search failed");
                session.message(MessageLevel::Error, format!("{}: {e}", session.source()));
            }
        });
    }

    fn stop(&self) {
        self.core.stop();
    }

    async fn fetch_entry(&self, uid: u32) -> Option<Entry> {
        let (mut entry, cover) = self.state.found(uid)?;
        if let Some(cover) = cover {
            match self.state.download_cover(cover).await {
                Ok(Some(id)) => {
                    entry.set_field("cover", &id);
                    self.state.update(uid, &entry);
                }
                Ok(None) => {}
                Err(e) => debug!(cover, error = %e, "cover download failed"),
            }
        }
        Some(entry)
    }

    fn update_request(&self, entry: &Entry) -> Option<FetchRequest> {
        [
            (FetchKey::Isbn, "isbn"),
            (FetchKey::Lccn, "lccn"),
            (FetchKey::Title, "title"),
        ]
        .into_iter()
        .map(|(key, field)| (key, entry.field(field)))
        .find(|(_, value)| !value.is_empty())
        .map(|(key, value)| FetchRequest::new(CollectionType::Book, key, value))
    }
}

impl State {
    async fn search(&self, session: &Session, request: &FetchRequest) -> Result<(), FetchError> {
        let (param, value) = match request.key {
            FetchKey::Title => ("title", request.value.clone()),
            FetchKey::Person => ("author", request.value.clone()),
            FetchKey::Isbn => ("isbn", normalize_isbn(&request.value)),
            FetchKey::Lccn => ("lccn", formalize_lccn(&request.value)),
            FetchKey::Keyword => ("q", request.value.clone()),
            key => {
                debug!(source = %session.source(), %key, "unsupported search key");
                return Ok(());
            }
        };
        let url = self.base_url.join("search.json")?;
        let response: SearchResponse = self
            .client
            .get(url)
            .query(&[(param, value.as_str()), ("limit", SEARCH_LIMIT)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let count = response.docs.len();
        for doc in response.docs {
            let cover = doc.cover_i;
            let entry = self.book_entry(doc);
            let description = [entry.field("author"), entry.field("publisher"), entry.field("pub_year")]
                .join("/");
            let result = session.make_result(&entry.title(), &description, &entry.field("isbn"));
            self.store(result.uid, Found { entry, cover });
            session.result(result);
        }
        info!(source = %session.source(), results = count, "search finished");
        Ok(())
    }

    fn book_entry(&self, doc: Doc) -> Entry {
        let mut entry = Entry::new(Arc::clone(&self.schema));
        entry.set_field("title", doc.title.trim());
        if let Some(subtitle) = &doc.subtitle {
            entry.set_field("subtitle", subtitle.trim());
        }
        entry.set_field("author", &doc.author_name.join(DELIMITER));
        if let Some(publisher) = doc.publisher.first() {
            entry.set_field("publisher", publisher);
        }
        if let Some(year) = doc.first_publish_year {
            entry.set_field("pub_year", &year.to_string());
        }
        if let Some(isbn) = doc.isbn.first() {
            entry.set_field("isbn", isbn);
        }
        if let Some(lccn) = doc.lccn.first() {
            entry.set_field("lccn", lccn);
        }
        if let Some(pages) = doc.number_of_pages_median {
            entry.set_field("pages", &pages.to_string());
        }
        entry.set_field("language", &doc.language.join(DELIMITER));
        entry.set_field("keyword", &doc.subject.join(DELIMITER));
        entry
    }

    /// Downloads a cover into the image store and returns its image id.
    async fn download_cover(&self, cover: i64) -> Result<Option<String>, FetchError> {
        let url = self.cover_url.join(&format!("b/id/{cover}-M.jpg"))?;
        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(self.images.add_image(&bytes, "JPG"))
    }

    fn store(&self, uid: u32, found: Found) {
        self.lock().insert(uid, found);
    }

    fn found(&self, uid: u32) -> Option<(Entry, Option<i64>)> {
        self.lock().get(&uid).map(|f| (f.entry.clone(), f.cover))
    }

    /// Records a completed entry; its cover is not downloaded again.
    fn update(&self, uid: u32, entry: &Entry) {
        if let Some(found) = self.lock().get_mut(&uid) {
            found.entry = entry.clone();
            found.cover = None;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u32, Found>> {
        self.found.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
