// src/images/mod.rs
//! Image resolution for item decorations: local files, theme icons and remote
//! images downloaded once into an md5-keyed cache by a small worker pool.

pub mod cache;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex};

use tracing::{debug, info, warn};

pub use cache::HttpFetcher;

/// Upper bound of worker results handled per `poll`.
const MAX_DONE_PER_POLL: usize = 64;

/// Reference returned by item classes for posters, covers and fanart.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ImageRef {
    #[default]
    None,
    Local(PathBuf),
    Remote(String),
    Pinned { url: String, dest: PathBuf },
    Icon(String),
}

impl ImageRef {
    /// Classify a bare string the way modules usually hand them out.
    pub fn from_str(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            Self::None
        } else if s.starts_with("http://") || s.starts_with("https://") {
            Self::Remote(s.to_string())
        } else if s.starts_with("icon/") {
            Self::Icon(s.to_string())
        } else {
            Self::Local(PathBuf::from(s))
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageState {
    Unset,
    Icon(String),
    Ready(PathBuf),
    Pending(PathBuf),
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequesterId(u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Finished {
    pub dest: PathBuf,
    pub state: ImageState,
}

/// Blocking download of `url` into `dest`; runs on a worker thread.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str, dest: &Path) -> Result<PathBuf, String>;
}

type WorkItem = (String, PathBuf);

struct FetchDone {
    dest: PathBuf,
    result: Result<PathBuf, String>,
}

pub struct ImageCache {
    cache_dir: PathBuf,
    work_tx: Option<mpsc::Sender<WorkItem>>,
    done_rx: mpsc::Receiver<FetchDone>,
    /// dest -> requesters waiting for it; the first one started the transfer.
    waiters: RefCell<HashMap<PathBuf, Vec<RequesterId>>>,
    finished: RefCell<HashMap<RequesterId, Vec<Finished>>>,
    next_requester: Cell<u64>,
}

impl ImageCache {
    pub fn new(cache_dir: &Path, workers: usize) -> Self {
        match HttpFetcher::new() {
            Ok(fetcher) => Self::with_fetcher(cache_dir, workers, Arc::new(fetcher)),
            Err(e) => {
                warn!("{e}; remote images disabled");
                Self::with_fetcher(cache_dir, 0, Arc::new(Offline))
            }
        }
    }

    pub fn with_fetcher(cache_dir: &Path, workers: usize, fetcher: Arc<dyn Fetcher>) -> Self {
        let (work_tx, work_rx) = mpsc::channel::<WorkItem>();
        let (done_tx, done_rx) = mpsc::channel::<FetchDone>();
        let work_rx = Arc::new(Mutex::new(work_rx));

        for _ in 0..workers {
            let work_rx = Arc::clone(&work_rx);
            let done_tx = done_tx.clone();
            let fetcher = Arc::clone(&fetcher);
            std::thread::spawn(move || loop {
                let job = {
                    let Ok(rx) = work_rx.lock() else {
                        break;
                    };
                    rx.recv()
                };
                let Ok((url, dest)) = job else {
                    break;
                };
                let result = fetcher.fetch(&url, &dest);
                if done_tx.send(FetchDone { dest, result }).is_err() {
                    break;
                }
            });
        }
        info!(workers, dir = %cache_dir.display(), "image cache ready");

        Self {
            cache_dir: cache_dir.to_path_buf(),
            work_tx: (workers > 0).then_some(work_tx),
            done_rx,
            waiters: RefCell::new(HashMap::new()),
            finished: RefCell::new(HashMap::new()),
            next_requester: Cell::new(1),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn requester_new(&self) -> RequesterId {
        let id = self.next_requester.get();
        self.next_requester.set(id + 1);
        RequesterId(id)
    }

    /// Resolve `image` for `requester`. Remote images missing from the cache
    /// come back `Pending`; the outcome is later handed out by `take_finished`.
    pub fn request(&self, requester: RequesterId, image: &ImageRef) -> ImageState {
        let (url, dest) = match image {
            ImageRef::None => return ImageState::Unset,
            ImageRef::Icon(key) => return ImageState::Icon(key.clone()),
            ImageRef::Local(path) => {
                return if path.exists() {
                    ImageState::Ready(path.clone())
                } else {
                    debug!(path = %path.display(), "local image missing");
                    ImageState::Error
                };
            }
            ImageRef::Remote(url) => (url.clone(), cache::remote_dest(&self.cache_dir, url)),
            ImageRef::Pinned { url, dest } => (url.clone(), dest.clone()),
        };

        if dest.exists() {
            return ImageState::Ready(dest);
        }

        let mut waiters = self.waiters.borrow_mut();
        if let Some(queue) = waiters.get_mut(&dest) {
            if !queue.contains(&requester) {
                queue.push(requester);
            }
            return ImageState::Pending(dest);
        }

        let Some(tx) = &self.work_tx else {
            return ImageState::Error;
        };
        if tx.send((url.clone(), dest.clone())).is_err() {
            warn!(url = %url, "image workers gone");
            return ImageState::Error;
        }
        debug!(url = %url, dest = %dest.display(), "image download queued");
        waiters.insert(dest.clone(), vec![requester]);
        ImageState::Pending(dest)
    }

    /// Drain worker results; returns how many transfers completed.
    pub fn poll(&self) -> usize {
        let mut drained = 0usize;
        while drained < MAX_DONE_PER_POLL {
            let done = match self.done_rx.try_recv() {
                Ok(done) => done,
                Err(mpsc::TryRecvError::Empty | mpsc::TryRecvError::Disconnected) => break,
            };
            drained += 1;

            let state = match done.result {
                Ok(path) => ImageState::Ready(path),
                Err(e) => {
                    warn!(dest = %done.dest.display(), "image fetch failed: {e}");
                    ImageState::Error
                }
            };
            let requesters = self
                .waiters
                .borrow_mut()
                .remove(&done.dest)
                .unwrap_or_default();
            let mut finished = self.finished.borrow_mut();
            for requester in requesters {
                finished.entry(requester).or_default().push(Finished {
                    dest: done.dest.clone(),
                    state: state.clone(),
                });
            }
        }
        drained
    }

    pub fn take_finished(&self, requester: RequesterId) -> Vec<Finished> {
        self.finished
            .borrow_mut()
            .remove(&requester)
            .unwrap_or_default()
    }

    /// Forget every wait and undelivered result of `requester`. The transfer
    /// itself keeps running if someone else still waits for it.
    pub fn cancel(&self, requester: RequesterId) {
        for queue in self.waiters.borrow_mut().values_mut() {
            queue.retain(|r| *r != requester);
        }
        self.finished.borrow_mut().remove(&requester);
    }

    /// True while any transfer has not reported back yet.
    pub fn in_flight(&self) -> bool {
        !self.waiters.borrow().is_empty()
    }

    pub fn is_waiting(&self, requester: RequesterId) -> bool {
        self.waiters
            .borrow()
            .values()
            .any(|queue| queue.contains(&requester))
    }
}

struct Offline;

impl Fetcher for Offline {
    fn fetch(&self, url: &str, _dest: &Path) -> Result<PathBuf, String> {
        Err(format!("offline: {url}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    struct FakeFetcher {
        calls: AtomicUsize,
        fail: bool,
        gate: Mutex<()>,
    }

    impl FakeFetcher {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
                gate: Mutex::new(()),
            })
        }
    }

    impl Fetcher for FakeFetcher {
        fn fetch(&self, url: &str, dest: &Path) -> Result<PathBuf, String> {
            let _gate = self.gate.lock().unwrap();
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(format!("404 {url}"));
            }
            std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
            std::fs::write(dest, url.as_bytes()).unwrap();
            Ok(dest.to_path_buf())
        }
    }

    fn poll_until_done(cache: &ImageCache) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while cache.poll() == 0 {
            assert!(Instant::now() < deadline, "fetch never completed");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn classifies_plain_strings() {
        assert_eq!(ImageRef::from_str(""), ImageRef::None);
        assert_eq!(
            ImageRef::from_str("https://img/p.jpg"),
            ImageRef::Remote("https://img/p.jpg".into())
        );
        assert_eq!(
            ImageRef::from_str("icon/folder"),
            ImageRef::Icon("icon/folder".into())
        );
        assert_eq!(
            ImageRef::from_str("/tmp/a.png"),
            ImageRef::Local(PathBuf::from("/tmp/a.png"))
        );
    }

    #[test]
    fn concurrent_requests_share_one_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::new(false);
        let gate = fetcher.gate.lock().unwrap();
        let cache = ImageCache::with_fetcher(dir.path(), 2, fetcher.clone());
        let a = cache.requester_new();
        let b = cache.requester_new();
        let image = ImageRef::Remote("http://img/poster.jpg".into());

        let first = cache.request(a, &image);
        let second = cache.request(b, &image);
        assert!(matches!(first, ImageState::Pending(_)));
        assert_eq!(first, second);
        assert!(cache.in_flight());
        drop(gate);

        poll_until_done(&cache);
        assert!(!cache.in_flight());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        for requester in [a, b] {
            let done = cache.take_finished(requester);
            assert_eq!(done.len(), 1);
            assert!(matches!(done[0].state, ImageState::Ready(_)));
        }

        // now cached on disk
        let c = cache.requester_new();
        assert!(matches!(cache.request(c, &image), ImageState::Ready(_)));
    }

    #[test]
    fn failures_reach_every_waiter_as_error() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::new(true);
        let gate = fetcher.gate.lock().unwrap();
        let cache = ImageCache::with_fetcher(dir.path(), 1, fetcher.clone());
        let a = cache.requester_new();
        let b = cache.requester_new();
        let dest = dir.path().join("pinned.jpg");
        let image = ImageRef::Pinned {
            url: "http://img/missing.jpg".into(),
            dest: dest.clone(),
        };
        cache.request(a, &image);
        cache.request(b, &image);
        drop(gate);

        poll_until_done(&cache);
        for requester in [a, b] {
            assert_eq!(
                cache.take_finished(requester),
                vec![Finished {
                    dest: dest.clone(),
                    state: ImageState::Error
                }]
            );
        }
    }

    #[test]
    fn cancelled_requester_is_not_notified() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::new(false);
        let gate = fetcher.gate.lock().unwrap();
        let cache = ImageCache::with_fetcher(dir.path(), 1, fetcher.clone());
        let a = cache.requester_new();
        let b = cache.requester_new();
        let image = ImageRef::Remote("http://img/fanart.jpg".into());
        cache.request(a, &image);
        cache.request(b, &image);
        cache.cancel(a);
        assert!(!cache.is_waiting(a));
        drop(gate);

        poll_until_done(&cache);
        assert!(cache.take_finished(a).is_empty());
        assert_eq!(cache.take_finished(b).len(), 1);
    }

    #[test]
    fn local_and_icon_refs_resolve_synchronously() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ImageCache::with_fetcher(dir.path(), 0, FakeFetcher::new(false));
        let r = cache.requester_new();
        let file = dir.path().join("cover.png");
        std::fs::write(&file, b"png").unwrap();

        assert_eq!(cache.request(r, &ImageRef::None), ImageState::Unset);
        assert_eq!(
            cache.request(r, &ImageRef::Icon("icon/back".into())),
            ImageState::Icon("icon/back".into())
        );
        assert_eq!(
            cache.request(r, &ImageRef::Local(file.clone())),
            ImageState::Ready(file)
        );
        assert_eq!(
            cache.request(r, &ImageRef::Local(dir.path().join("nope.png"))),
            ImageState::Error
        );
        // no workers means remote images cannot be fetched
        assert_eq!(
            cache.request(r, &ImageRef::Remote("http://x/y.jpg".into())),
            ImageState::Error
        );
    }
}
