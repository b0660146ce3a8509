//! The MovieMeter film database.
//!
//! Every search opens an API session with `api.startSession` and searches
//! films by title or directors by name. Results carry the film id; entries
//! are filled in on demand from `film.retrieveDetails` and
//! `film.retrieveImage`.

use super::{RpcClient, XmlRpcClient};
use crate::config::FetcherConfig;
use crate::error::FetchError;
use crate::fetcher::{Fetcher, FetcherType};
use crate::registry::FetchContext;
use crate::request::{FetchKey, FetchRequest, FetcherId, MessageLevel};
use crate::session::{FetcherCore, Session};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use curio_model::{
    CollectionSchema, CollectionType, DELIMITER, Entry, Field, FormatFlag, ImageStore,
    ROW_DELIMITER,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "http://www.moviemeter.nl/ws";

/// Optional field holding the film's page on the site.
pub const LINK_FIELD: &str = "moviemeter";
/// Optional table of alternative titles.
pub const ALT_TITLE_FIELD: &str = "alttitle";

/// Fetcher for the MovieMeter XML-RPC service.
pub struct MovieMeterFetcher {
    core: FetcherCore,
    state: Arc<State>,
}

struct State {
    client: Arc<dyn RpcClient>,
    api_key: String,
    schema: Arc<CollectionSchema>,
    images: Arc<dyn ImageStore>,
    session_key: Mutex<Option<String>>,
    films: Mutex<HashMap<u32, i64>>,
    entries: Mutex<HashMap<u32, Entry>>,
}

impl MovieMeterFetcher {
    pub fn from_config(config: &FetcherConfig, ctx: &FetchContext) -> Result<Self, FetchError> {
        let endpoint = Url::parse(config.base_url.as_deref().unwrap_or(DEFAULT_ENDPOINT))?;
        Self::with_client(config, ctx, Arc::new(XmlRpcClient::new(endpoint)))
    }

    /// Builds the fetcher around an existing RPC client.
    pub fn with_client(
        config: &FetcherConfig,
        ctx: &FetchContext,
        client: Arc<dyn RpcClient>,
    ) -> Result<Self, FetchError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| config.missing("api_key"))?;
        Ok(Self {
            core: FetcherCore::new(&config.name, ctx.events.clone()),
            state: Arc::new(State {
                client,
                api_key,
                schema: film_schema(config),
                images: Arc::clone(&ctx.images),
                session_key: Mutex::new(None),
                films: Mutex::default(),
                entries: Mutex::default(),
            }),
        })
    }

    /// The schema fetched entries belong to.
    pub fn schema(&self) -> &Arc<CollectionSchema> {
        &self.state.schema
    }
}

fn film_schema(config: &FetcherConfig) -> Arc<CollectionSchema> {
    let mut schema = CollectionSchema::for_kind(CollectionType::Video);
    if config.wants_optional(LINK_FIELD) {
        schema = schema.with_field(Field::url(LINK_FIELD, "MovieMeter Link").with_category("General"));
    }
    if config.wants_optional(ALT_TITLE_FIELD) {
        schema = schema.with_field(
            Field::table(ALT_TITLE_FIELD, "Alternative Titles").with_format(FormatFlag::Title),
        );
    }
    schema.into_shared()
}

#[async_trait]
impl Fetcher for MovieMeterFetcher {
    fn id(&self) -> FetcherId {
        self.core.id()
    }

    fn source(&self) -> &str {
        self.core.source()
    }

    fn fetcher_type(&self) -> FetcherType {
        FetcherType::MovieMeter
    }

    fn can_fetch(&self, kind: CollectionType) -> bool {
        kind == CollectionType::Video
    }

    fn can_search(&self, key: FetchKey) -> bool {
        matches!(key, FetchKey::Person | FetchKey::Keyword | FetchKey::Title)
    }

    fn is_searching(&self) -> bool {
        self.core.is_searching()
    }

    fn search(&self, request: FetchRequest) {
        let state = Arc::clone(&self.state);
        self.core
            .start(move |session| async move { state.search(&session, request).await });
    }

    fn stop(&self) {
        self.core.stop();
    }

    async fn fetch_entry(&self, uid: u32) -> Option<Entry> {
        if let Some(entry) = self.state.cached_entry(uid) {
            return Some(entry);
        }
        let Some(film_id) = self.state.film_id(uid) else {
            warn!(source = %self.core.source(), uid, "no film for result");
            return None;
        };
        let entry = self.state.retrieve(film_id).await?;
        self.state.cache_entry(uid, entry.clone());
        Some(entry)
    }

    fn update_request(&self, entry: &Entry) -> Option<FetchRequest> {
        let title = entry.field("title");
        if title.is_empty() {
            return None;
        }
        Some(FetchRequest::new(CollectionType::Video, FetchKey::Keyword, title))
    }
}

impl State {
    async fn search(&self, session: &Session, request: FetchRequest) {
        let outcome = match request.key {
            FetchKey::Title | FetchKey::Keyword => self.film_search(session, &request.value).await,
            FetchKey::Person => self.director_search(session, &request.value).await,
            key => {
                debug!(source = %session.source(), %key, "unsupported search key");
                Ok(())
            }
        };
        if let Err(e) = outcome {
            warn!(source = %session.source(), error = %e, "search failed");
            session.message(MessageLevel::Error, format!("{}: {e}", session.source()));
        }
    }

    async fn start_session(&self) -> Result<String, FetchError> {
        let response = self
            .client
            .call("api.startSession", &[Value::from(self.api_key.as_str())])
            .await?;
        let key = response
            .get("session_key")
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| FetchError::Protocol("no session key in response".into()))?
            .to_string();
        *self.session_key.lock().unwrap_or_else(PoisonError::into_inner) = Some(key.clone());
        Ok(key)
    }

    /// The open session key, starting a session if there is none.
    async fn session(&self) -> Result<String, FetchError> {
        let current = self
            .session_key
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match current {
            Some(key) => Ok(key),
            None => self.start_session().await,
        }
    }

    async fn film_search(&self, session: &Session, term: &str) -> Result<(), FetchError> {
        let key = self.start_session().await?;
        let films = self
            .client
            .call("film.search", &[Value::from(key), Value::from(term)])
            .await?;
        self.emit_films(session, &films);
        Ok(())
    }

    async fn director_search(&self, session: &Session, term: &str) -> Result<(), FetchError> {
        let key = self.start_session().await?;
        let directors = self
            .client
            .call("director.search", &[Value::from(key.as_str()), Value::from(term)])
            .await?;
        for director in directors.as_array().into_iter().flatten() {
            let Some(id) = director.get("directorId").and_then(as_id) else {
                continue;
            };
            let films = self
                .client
                .call(
                    "director.retrieveFilms",
                    &[Value::from(key.as_str()), Value::from(id)],
                )
                .await;
            match films {
                Ok(films) => self.emit_films(session, &films),
                Err(e) => warn!(source = %session.source(), director = id, error = %e, "director films failed"),
            }
        }
        Ok(())
    }

    fn emit_films(&self, session: &Session, films: &Value) {
        let mut count = 0;
        for film in films.as_array().into_iter().flatten() {
            if film.as_object().is_none_or(|map| map.is_empty()) {
                debug!(source = %session.source(), "empty film record");
                break;
            }
            let Some(film_id) = film.get("filmId").and_then(as_id) else {
                continue;
            };
            let result = session.make_result(&text(film, "title"), &text(film, "year"), "");
            self.films
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(result.uid, film_id);
            session.result(result);
            count += 1;
        }
        info!(source = %session.source(), results = count, "films found");
    }

    fn film_id(&self, uid: u32) -> Option<i64> {
        self.films
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&uid)
            .copied()
    }

    fn cached_entry(&self, uid: u32) -> Option<Entry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&uid)
            .cloned()
    }

    fn cache_entry(&self, uid: u32, entry: Entry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(uid, entry);
    }

    /// Fills an entry from the film's details, then adds its poster.
    async fn retrieve(&self, film_id: i64) -> Option<Entry> {
        let key = match self.session().await {
            Ok(key) => key,
            Err(e) => {
                warn!(film = film_id, error = %e, "could not open a session");
                return None;
            }
        };
        let params = [Value::from(key), Value::from(film_id)];
        let details = match self.client.call("film.retrieveDetails", &params).await {
            Ok(details) => details,
            Err(e) => {
                warn!(film = film_id, error = %e, "film details failed");
                return None;
            }
        };
        let mut entry = Entry::new(Arc::clone(&self.schema));
        fill_entry(&mut entry, &details);

        match self.client.call("film.retrieveImage", &params).await {
            Ok(image) => self.add_cover(&mut entry, &image),
            Err(e) => debug!(film = film_id, error = %e, "no film image"),
        }
        Some(entry)
    }

    fn add_cover(&self, entry: &mut Entry, response: &Value) {
        let Some(encoded) = response
            .get("image")
            .and_then(|image| image.get("base64_encoded_contents"))
            .and_then(Value::as_str)
        else {
            return;
        };
        let compact: String = encoded.split_whitespace().collect();
        let bytes = match STANDARD.decode(compact) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "film image is not valid base64");
                return;
            }
        };
        if let Some(id) = self.images.add_image(&bytes, "JPG") {
            entry.set_field("cover", &id);
        }
    }
}

fn fill_entry(entry: &mut Entry, details: &Value) {
    entry.set_field("title", &text(details, "title"));
    entry.set_field("year", &text(details, "year"));
    entry.set_field("genre", &list(details, "genres", None, DELIMITER));
    entry.set_field("cast", &list(details, "actors", Some("name"), ROW_DELIMITER));
    entry.set_field("director", &list(details, "directors", Some("name"), DELIMITER));
    entry.set_field("running-time", &text(details, "duration"));
    entry.set_field("plot", &text(details, "plot"));
    entry.set_field(
        "nationality",
        &list(details, "countries", Some("name"), ROW_DELIMITER),
    );
    if entry.collection().has_field(LINK_FIELD) {
        entry.set_field(LINK_FIELD, &text(details, "url"));
    }
    if entry.collection().has_field(ALT_TITLE_FIELD) {
        entry.set_field(
            ALT_TITLE_FIELD,
            &list(details, "alternative_titles", Some("title"), ROW_DELIMITER),
        );
    }
}

/// A member as text, whether it was sent as a string or a number.
fn text(value: &Value, name: &str) -> String {
    match value.get(name) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Joins an array member; `member` picks a field out of struct items.
fn list(value: &Value, name: &str, member: Option<&str>, delimiter: &str) -> String {
    value
        .get(name)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .map(|item| match member {
            Some(member) => text(item, member),
            None => item.as_str().map(str::trim).unwrap_or_default().to_string(),
        })
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(delimiter)
}

fn as_id(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}
