//! Search sessions.
//!
//! [`FetcherCore`] holds what every fetcher shares: its id and source name,
//! the event channel, the uid counter and the running session. A session's
//! body runs as a spawned task; the [`Session`] handle it is given is the
//! only way it reports back, and it goes quiet once the session is done.

use crate::request::{FetchEvent, FetchResult, FetcherId, MessageLevel};
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Reporting handle for one search session.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    fetcher: FetcherId,
    source: String,
    events: UnboundedSender<FetchEvent>,
    uids: Arc<AtomicU32>,
    done: Mutex<bool>,
}

impl Session {
    fn new(core: &FetcherCore) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                fetcher: core.id,
                source: core.source.clone(),
                events: core.events.clone(),
                uids: Arc::clone(&core.next_uid),
                done: Mutex::new(false),
            }),
        }
    }

    pub fn fetcher(&self) -> FetcherId {
        self.inner.fetcher
    }

    pub fn source(&self) -> &str {
        &self.inner.source
    }

    pub fn is_done(&self) -> bool {
        *self.lock()
    }

    /// Builds a result from this session's fetcher with a fresh uid.
    pub fn make_result(&self, title: &str, description: &str, isbn: &str) -> FetchResult {
        FetchResult {
            uid: self.inner.uids.fetch_add(1, Ordering::Relaxed),
            title: title.to_string(),
            description: description.to_string(),
            isbn: isbn.to_string(),
            fetcher: self.inner.fetcher,
        }
    }

    /// Emits a result. Ignored once the session is done.
    pub fn result(&self, result: FetchResult) {
        self.send(FetchEvent::ResultFound(result));
    }

    /// Emits a message. Ignored once the session is done.
    pub fn message(&self, level: MessageLevel, text: impl Into<String>) {
        self.send(FetchEvent::Message {
            fetcher: self.inner.fetcher,
            level,
            text: text.into(),
        });
    }

    /// Ends the session, emitting `Done` the first time only.
    pub fn finish(&self) {
        let mut done = self.lock();
        if *done {
            return;
        }
        *done = true;
        debug!(source = %self.inner.source, "search session done");
        // the receiver may be gone; nobody is left to tell
        let _ = self.inner.events.send(FetchEvent::Done {
            fetcher: self.inner.fetcher,
        });
    }

    fn send(&self, event: FetchEvent) {
        let done = self.lock();
        if *done {
            return;
        }
        let _ = self.inner.events.send(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, bool> {
        self.inner.done.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
struct ActiveSession {
    session: Session,
    task: Option<JoinHandle<()>>,
}

/// State shared by every fetcher implementation.
///
/// Result uids come from one counter per fetcher and keep increasing across
/// sessions, so a uid never names two different results.
#[derive(Debug)]
pub struct FetcherCore {
    id: FetcherId,
    source: String,
    events: UnboundedSender<FetchEvent>,
    next_uid: Arc<AtomicU32>,
    active: Mutex<Option<ActiveSession>>,
}

impl FetcherCore {
    pub fn new(source: impl Into<String>, events: UnboundedSender<FetchEvent>) -> Self {
        Self {
            id: FetcherId::new(),
            source: source.into(),
            events,
            next_uid: Arc::new(AtomicU32::new(1)),
            active: Mutex::new(None),
        }
    }

    pub fn id(&self) -> FetcherId {
        self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_searching(&self) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|active| !active.session.is_done())
    }

    /// Starts a new session, stopping any running one first.
    ///
    /// `body` receives the session handle and returns the work to run; the
    /// session is finished when that work completes. Outside a tokio runtime
    /// nothing can run, so the session finishes straight away.
    pub fn start<F, Fut>(&self, body: F)
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.stop();

        let session = Session::new(self);
        let task = match Handle::try_current() {
            Ok(handle) => {
                let work = body(session.clone());
                let runner = session.clone();
                Some(handle.spawn(async move {
                    work.await;
                    runner.finish();
                }))
            }
            Err(_) => {
                warn!(source = %self.source, "search started outside a tokio runtime");
                session.finish();
                None
            }
        };
        debug!(source = %self.source, "search session started");
        *self.lock() = Some(ActiveSession { session, task });
    }

    /// Stops the running session. A no-op when nothing was started or the
    /// session already finished.
    pub fn stop(&self) {
        let Some(active) = self.lock().take() else {
            return;
        };
        if let Some(task) = active.task {
            task.abort();
        }
        active.session.finish();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<ActiveSession>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for FetcherCore {
    fn drop(&mut self) {
        let active = self
            .active
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = active.and_then(|a| a.task) {
            task.abort();
        }
    }
}
