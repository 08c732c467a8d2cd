//! In-process [`DocumentHost`] fed by page captures.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::{broadcast, watch};
use url::Url;

use crate::error::AppError;
use crate::snapshot::Snapshot;
use crate::traits::{DocumentHost, MutationFeed};

const MUTATION_CAPACITY: usize = 16;

#[derive(Debug)]
struct Page {
    url: String,
    snapshot: Arc<Snapshot>,
}

#[derive(Debug)]
struct Inner {
    page: RwLock<Option<Page>>,
    mutations: broadcast::Sender<u64>,
    revision: AtomicU64,
    loaded: watch::Sender<bool>,
    meeting_host: String,
}

/// The current page, swapped wholesale whenever a new capture arrives.
///
/// Every [`replace`](LiveDocument::replace) bumps the revision and publishes
/// it to all mutation feeds. Readers hold on to the `Arc<Snapshot>` they got,
/// so a swap never changes a tree mid-read.
#[derive(Debug, Clone)]
pub struct LiveDocument {
    inner: Arc<Inner>,
}

impl LiveDocument {
    pub fn new(meeting_host: impl Into<String>) -> Self {
        let (mutations, _) = broadcast::channel(MUTATION_CAPACITY);
        let (loaded, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                page: RwLock::new(None),
                mutations,
                revision: AtomicU64::new(0),
                loaded,
                meeting_host: meeting_host.into(),
            }),
        }
    }

    /// Attach `snapshot` as the page at `url` and notify subscribers.
    ///
    /// Returns the new revision.
    pub fn replace(&self, url: impl Into<String>, snapshot: Snapshot) -> u64 {
        let url = url.into();
        *self.write() = Some(Page {
            url: url.clone(),
            snapshot: Arc::new(snapshot),
        });
        let revision = self.inner.revision.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.loaded.send_replace(true);

        let receivers = self.inner.mutations.send(revision).unwrap_or(0);
        tracing::debug!(%url, revision, receivers, "Document replaced");
        revision
    }

    pub fn url(&self) -> Option<String> {
        self.read().as_ref().map(|p| p.url.clone())
    }

    pub fn revision(&self) -> u64 {
        self.inner.revision.load(Ordering::SeqCst)
    }

    pub fn is_attached(&self) -> bool {
        self.read().is_some()
    }

    /// Number of live mutation feeds.
    pub fn receiver_count(&self) -> usize {
        self.inner.mutations.receiver_count()
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Page>> {
        self.inner.page.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Page>> {
        self.inner.page.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl DocumentHost for LiveDocument {
    type Tree = Arc<Snapshot>;

    fn document(&self) -> Option<Arc<Snapshot>> {
        self.read().as_ref().map(|p| Arc::clone(&p.snapshot))
    }

    fn subscribe(&self) -> Result<MutationFeed, AppError> {
        Ok(MutationFeed::new(self.inner.mutations.subscribe()))
    }

    fn is_meeting_page(&self) -> bool {
        let Some(url) = self.url() else {
            return false;
        };
        match Url::parse(&url) {
            Ok(parsed) => parsed
                .host_str()
                .is_some_and(|h| h.eq_ignore_ascii_case(&self.inner.meeting_host)),
            Err(e) => {
                tracing::debug!(%url, error = %e, "Unparseable page URL");
                false
            }
        }
    }

    fn loaded(&self) -> impl Future<Output = ()> + Send {
        let mut rx = self.inner.loaded.subscribe();
        async move {
            let _ = rx.wait_for(|loaded| *loaded).await;
        }
    }
}
