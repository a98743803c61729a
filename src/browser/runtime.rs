// src/browser/runtime.rs
//! Services shared by every browser of the application.

use std::cell::{RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::store::{KeyStore, MemoryStore, SqliteStore};
use super::style::{StyleId, StyleMemory};
use super::view::{CoverGridFlavor, GridView, ListView, PosterGridFlavor, View, ViewContext};
use crate::config::{AppConfig, BrowserConfig};
use crate::images::ImageCache;
use crate::mainloop::InputBus;

/// Non-modal user notifications.
pub trait Dialogs {
    fn info(&self, title: &str, text: &str);
    fn warning(&self, title: &str, text: &str);
}

pub type ViewRef = Rc<RefCell<dyn View>>;

/// Poll interval while image transfers are running.
pub const DOWNLOAD_POLL: Duration = Duration::from_millis(50);

pub struct BrowserRuntime {
    config: BrowserConfig,
    memory: RefCell<StyleMemory>,
    views: RefCell<HashMap<StyleId, ViewRef>>,
    bus: InputBus,
    images: Rc<ImageCache>,
    dialogs: Rc<dyn Dialogs>,
    layout_width: RefCell<Option<f32>>,
    next_browser: RefCell<u64>,
}

impl BrowserRuntime {
    pub fn new(
        config: BrowserConfig,
        store: Box<dyn KeyStore>,
        images: Rc<ImageCache>,
        dialogs: Rc<dyn Dialogs>,
    ) -> Rc<Self> {
        let mut memory = StyleMemory::new(store);
        if let Some(text) = memory.take_warning() {
            dialogs.warning("View styles reset", &text);
        }
        Rc::new(Self {
            config,
            memory: RefCell::new(memory),
            views: RefCell::new(HashMap::new()),
            bus: InputBus::new(),
            images,
            dialogs,
            layout_width: RefCell::new(None),
            next_browser: RefCell::new(1),
        })
    }

    /// Runtime wired to the on-disk style store and the HTTP image cache.
    pub fn from_app_config(config: &AppConfig, dialogs: Rc<dyn Dialogs>) -> Rc<Self> {
        let cache_dir = config.cache_dir();
        let store: Box<dyn KeyStore> = match SqliteStore::open(&config.style_db_path()) {
            Ok(store) => Box::new(store),
            Err(e) => {
                warn!("style store unavailable ({e}); styles will not persist");
                Box::new(MemoryStore::new())
            }
        };
        let poster_dir = crate::images::cache::poster_cache_dir(&cache_dir);
        match crate::images::cache::prune_image_cache(&poster_dir) {
            Ok(0) => {}
            Ok(n) => info!("pruned {n} stale cached images"),
            Err(e) => warn!("image cache prune failed: {e}"),
        }
        let images = Rc::new(ImageCache::new(&cache_dir, config.image_workers));
        Self::new(config.browser.clone(), store, images, dialogs)
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    pub fn bus(&self) -> &InputBus {
        &self.bus
    }

    pub fn images(&self) -> &Rc<ImageCache> {
        &self.images
    }

    pub fn dialogs(&self) -> &dyn Dialogs {
        self.dialogs.as_ref()
    }

    pub fn memory(&self) -> RefMut<'_, StyleMemory> {
        self.memory.borrow_mut()
    }

    pub(crate) fn browser_name_new(&self) -> String {
        let mut next = self.next_browser.borrow_mut();
        let name = format!("browser-{}", *next);
        *next += 1;
        name
    }

    fn view_context(&self) -> ViewContext {
        ViewContext {
            images: Rc::clone(&self.images),
            info_delay: self.config.info_delay,
            fanart_delay: self.config.fanart_delay,
        }
    }

    /// Cached view for `style`, built on first use.
    pub fn view_get(&self, style: StyleId) -> ViewRef {
        if let Some(view) = self.views.borrow().get(&style) {
            return Rc::clone(view);
        }
        let ctx = self.view_context();
        let view: ViewRef = match style {
            StyleId::List => Rc::new(RefCell::new(ListView::new(&ctx))),
            StyleId::PosterGrid => Rc::new(RefCell::new(GridView::new(
                &ctx,
                PosterGridFlavor {
                    width: self.config.poster_grid_w,
                },
            ))),
            StyleId::CoverGrid => Rc::new(RefCell::new(GridView::new(
                &ctx,
                CoverGridFlavor {
                    width: self.config.cover_grid_w,
                },
            ))),
        };
        if let Some(width) = *self.layout_width.borrow() {
            view.borrow_mut().layout_set(width);
        }
        info!(style = style.as_str(), "view created");
        self.views.borrow_mut().insert(style, Rc::clone(&view));
        view
    }

    pub fn views_created(&self) -> Vec<StyleId> {
        StyleId::ALL
            .into_iter()
            .filter(|s| self.views.borrow().contains_key(s))
            .collect()
    }

    /// Width available to views; grids derive their column count from it.
    pub fn layout_set(&self, width: f32) {
        *self.layout_width.borrow_mut() = Some(width);
        for view in self.views.borrow().values() {
            if let Ok(mut view) = view.try_borrow_mut() {
                view.layout_set(width);
            }
        }
    }

    /// When the main loop has to run again without input, if ever.
    pub fn next_wakeup(&self, now: Instant) -> Option<Instant> {
        let downloads = self.images.in_flight().then(|| now + DOWNLOAD_POLL);
        let views = self
            .views
            .borrow()
            .values()
            .filter_map(|v| v.try_borrow().ok().and_then(|v| v.model().next_deadline(now)))
            .min();
        downloads.into_iter().chain(views).min()
    }

    /// One main-loop iteration: deliver finished downloads and fire due timers.
    pub fn tick(&self, now: Instant) {
        self.images.poll();
        let views: Vec<ViewRef> = self.views.borrow().values().cloned().collect();
        for view in views {
            if let Ok(mut view) = view.try_borrow_mut() {
                view.tick(now);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::browser::view::tests::test_context;

    #[derive(Default)]
    pub(crate) struct RecordingDialogs {
        pub shown: RefCell<Vec<(String, String, String)>>,
    }

    impl Dialogs for RecordingDialogs {
        fn info(&self, title: &str, text: &str) {
            self.shown
                .borrow_mut()
                .push(("info".into(), title.into(), text.into()));
        }

        fn warning(&self, title: &str, text: &str) {
            self.shown
                .borrow_mut()
                .push(("warning".into(), title.into(), text.into()));
        }
    }

    pub(crate) fn test_runtime(config: BrowserConfig) -> (Rc<BrowserRuntime>, Rc<RecordingDialogs>) {
        let dialogs = Rc::new(RecordingDialogs::default());
        let runtime = BrowserRuntime::new(
            config,
            Box::new(MemoryStore::new()),
            Rc::clone(&test_context().images),
            dialogs.clone(),
        );
        (runtime, dialogs)
    }

    #[test]
    fn views_are_cached_per_style() {
        let (runtime, _) = test_runtime(BrowserConfig::default());
        assert!(runtime.views_created().is_empty());
        let a = runtime.view_get(StyleId::CoverGrid);
        let b = runtime.view_get(StyleId::CoverGrid);
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(a.borrow().style(), StyleId::CoverGrid);
        runtime.view_get(StyleId::List);
        assert_eq!(
            runtime.views_created(),
            vec![StyleId::List, StyleId::CoverGrid]
        );
    }

    #[test]
    fn idle_runtime_needs_no_wakeup() {
        let (runtime, _) = test_runtime(BrowserConfig::default());
        let t0 = Instant::now();
        assert_eq!(runtime.next_wakeup(t0), None);

        let list = runtime.view_get(StyleId::List);
        list.borrow_mut().page_show("Root", crate::browser::Anim::Forward, t0);
        assert_eq!(runtime.next_wakeup(t0), Some(t0));
        runtime.tick(t0 + Duration::from_secs(1));
        assert_eq!(runtime.next_wakeup(t0 + Duration::from_secs(1)), None);
    }

    #[test]
    fn store_warning_becomes_a_dialog() {
        struct Warned(MemoryStore, Option<String>);
        impl KeyStore for Warned {
            fn id_exists(&self, key: &str) -> bool {
                self.0.id_exists(key)
            }
            fn get_data(&self, key: &str) -> Option<String> {
                self.0.get_data(key)
            }
            fn set_data(&mut self, key: &str, value: &str) {
                self.0.set_data(key, value)
            }
            fn take_warning(&mut self) -> Option<String> {
                self.1.take()
            }
        }

        let dialogs = Rc::new(RecordingDialogs::default());
        let _runtime = BrowserRuntime::new(
            BrowserConfig::default(),
            Box::new(Warned(MemoryStore::new(), Some("moved aside".into()))),
            Rc::clone(&test_context().images),
            dialogs.clone(),
        );
        let shown = dialogs.shown.borrow();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].0, "warning");
        assert_eq!(shown[0].2, "moved aside");
    }
}
