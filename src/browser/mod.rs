// src/browser/mod.rs
//! Hierarchical page browser.
//!
//! A browser is a stack of pages. Each page binds a url and a title to a
//! populate callback and the view style it is shown with; views themselves
//! are cached per style by the [`BrowserRuntime`] and shared between pages and
//! browsers. The style picked for a page is remembered per url.

pub mod item;
pub mod runtime;
pub mod store;
pub mod style;
pub mod view;

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Instant;

use itertools::Itertools;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::mainloop::{EventResult, InputEvent, InputListener};
pub use item::{BackItem, Folder, FolderClass, Item, ItemClass, ItemKind};
pub use runtime::{BrowserRuntime, Dialogs, ViewRef};
pub use style::StyleId;
pub use view::{Anim, BringIn, View, ViewEvent};

/// Fills the current view of the browser with the items of page `url`.
pub type PopulateFn = Rc<dyn Fn(&mut Browser, &str, &[Value])>;
pub type BrowserHook = Rc<dyn Fn()>;

pub struct Page {
    pub url: String,
    pub title: String,
    pub styles: Vec<StyleId>,
    pub style: StyleId,
    populate: PopulateFn,
    args: Vec<Value>,
    view: ViewRef,
}

impl Page {
    fn allows(&self, style: StyleId) -> bool {
        self.styles.is_empty() || self.styles.contains(&style)
    }
}

pub struct Browser {
    runtime: Rc<BrowserRuntime>,
    name: String,
    default_style: StyleId,
    pages: Vec<Page>,
    current_view: Option<ViewRef>,
    autoselect_url: Option<String>,
    breadcrumb: String,
    freezed: bool,
    shown: bool,
    clock: Instant,
    close_cb: Option<BrowserHook>,
    freeze_cb: Option<BrowserHook>,
    self_ref: Weak<RefCell<Browser>>,
}

impl Browser {
    pub fn new(runtime: &Rc<BrowserRuntime>, default_style: Option<StyleId>) -> Rc<RefCell<Self>> {
        let name = runtime.browser_name_new();
        let default_style = default_style.unwrap_or(runtime.config().default_style);
        debug!(name = %name, style = default_style.as_str(), "browser created");
        Rc::new_cyclic(|self_ref| {
            RefCell::new(Self {
                runtime: Rc::clone(runtime),
                name,
                default_style,
                pages: Vec::new(),
                current_view: None,
                autoselect_url: None,
                breadcrumb: String::new(),
                freezed: false,
                shown: false,
                clock: Instant::now(),
                close_cb: None,
                freeze_cb: None,
                self_ref: self_ref.clone(),
            })
        })
    }

    /// Called when the last page is popped.
    pub fn close_cb_set(&mut self, cb: BrowserHook) {
        self.close_cb = Some(cb);
    }

    /// Called when EXIT freezes the browser.
    pub fn freeze_cb_set(&mut self, cb: BrowserHook) {
        self.freeze_cb = Some(cb);
    }

    // ---- accessors ----

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn runtime(&self) -> &Rc<BrowserRuntime> {
        &self.runtime
    }

    pub fn pages_count(&self) -> usize {
        self.pages.len()
    }

    pub fn current_url(&self) -> Option<&str> {
        self.pages.last().map(|p| p.url.as_str())
    }

    pub fn current_style(&self) -> Option<StyleId> {
        self.pages.last().map(|p| p.style)
    }

    pub fn current_styles(&self) -> &[StyleId] {
        self.pages.last().map_or(&[], |p| p.styles.as_slice())
    }

    pub fn breadcrumb(&self) -> &str {
        &self.breadcrumb
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn is_frozen(&self) -> bool {
        self.freezed
    }

    pub fn autoselect_url(&self) -> Option<&str> {
        self.autoselect_url.as_deref()
    }

    pub fn current_view(&self) -> Option<ViewRef> {
        self.current_view.clone()
    }

    pub fn clock(&self) -> Instant {
        self.clock
    }

    pub fn tick(&mut self, now: Instant) {
        self.clock = now;
    }

    // ---- pages ----

    fn style_resolve(&self, url: &str, styles: &[StyleId]) -> StyleId {
        let memory = self.runtime.memory();
        let resolved = memory
            .get(url)
            .or_else(|| self.pages.iter().rev().find_map(|p| memory.get(&p.url)))
            .or_else(|| styles.first().copied())
            .unwrap_or(self.default_style);
        match styles.first() {
            Some(&first)
                if !self.runtime.config().ignore_view_restrictions
                    && !styles.contains(&resolved) =>
            {
                first
            }
            _ => resolved,
        }
    }

    pub fn page_add(
        &mut self,
        url: &str,
        title: &str,
        styles: &[StyleId],
        populate: PopulateFn,
        args: Vec<Value>,
    ) {
        let style = self.style_resolve(url, styles);
        let view = self.runtime.view_get(style);
        info!(browser = %self.name, url, style = style.as_str(), "page add");
        self.pages.push(Page {
            url: url.to_string(),
            title: title.to_string(),
            styles: styles.to_vec(),
            style,
            populate,
            args,
            view: Rc::clone(&view),
        });
        if self.current_view.is_none() {
            self.current_view = Some(view);
        }
        if !self.shown && !self.freezed {
            self.show();
        }
        self.populate_page(false, false, false);
    }

    pub fn item_add(&mut self, class: Rc<dyn ItemClass>, url: &str, data: Value) {
        let Some(view) = &self.current_view else {
            error!(browser = %self.name, url, "item_add without a page; ignored");
            return;
        };
        let selected = self.autoselect_url.as_deref() == Some(url);
        view.borrow_mut()
            .item_add(class, url, data, selected, self.clock);
    }

    pub fn group_add(&mut self, label: &str, icon: Option<&str>) {
        let Some(view) = &self.current_view else {
            error!(browser = %self.name, label, "group_add without a page; ignored");
            return;
        };
        view.borrow_mut().group_add(label, icon);
    }

    pub fn back(&mut self) {
        let Some(page) = self.pages.pop() else {
            return;
        };
        debug!(browser = %self.name, url = %page.url, "page back");
        self.autoselect_url = Some(page.url);
        if self.pages.is_empty() {
            self.hide();
            if let Some(cb) = self.close_cb.clone() {
                cb();
            }
        } else {
            self.populate_page(true, false, false);
        }
    }

    fn selected_url(&self) -> Option<String> {
        self.current_view
            .as_ref()
            .and_then(|v| v.borrow().selected_url_get())
    }

    fn remember_selection(&mut self) {
        if let Some(url) = self.selected_url() {
            self.autoselect_url = Some(url);
        }
    }

    pub fn refresh(&mut self, hard: bool) {
        if hard {
            self.remember_selection();
            self.populate_page(false, true, false);
        } else if let Some(view) = &self.current_view {
            view.borrow_mut().refresh(self.clock);
        }
    }

    pub fn change_style(&mut self, style: StyleId) {
        let Some(page) = self.pages.last() else {
            return;
        };
        if !self.runtime.config().ignore_view_restrictions && !page.allows(style) {
            let allowed = page.styles.iter().map(|s| s.as_str()).join(", ");
            self.runtime.dialogs().info(
                "View style",
                &format!(
                    "The {} style is not available here. Available: {allowed}.",
                    style.as_str()
                ),
            );
            return;
        }
        if page.style == style {
            return;
        }
        info!(browser = %self.name, url = %page.url, style = style.as_str(), "change style");

        self.remember_selection();
        if let Some(old) = self.current_view.take() {
            let mut old = old.borrow_mut();
            old.clear();
            old.hide();
        }
        let view = self.runtime.view_get(style);
        if let Some(page) = self.pages.last_mut() {
            self.runtime.memory().set(&page.url, style);
            page.style = style;
            page.view = view;
        }
        self.refresh(true);
    }

    pub fn show(&mut self) {
        if self.current_view.is_none() {
            self.current_view = self.pages.last().map(|p| Rc::clone(&p.view));
        }
        let listener: Weak<RefCell<dyn InputListener>> = self.self_ref.clone();
        self.runtime.bus().listener_add(&self.name, listener);
        self.shown = true;
        if let Some(view) = &self.current_view {
            view.borrow_mut().show();
        }
    }

    pub fn hide(&mut self) {
        self.runtime.bus().listener_del(&self.name);
        self.shown = false;
        if let Some(view) = self.current_view.take() {
            view.borrow_mut().hide();
        }
    }

    pub fn freeze(&mut self) {
        debug!(browser = %self.name, "freeze");
        self.remember_selection();
        self.freezed = true;
        self.hide();
    }

    pub fn unfreeze(&mut self) {
        debug!(browser = %self.name, "unfreeze");
        self.freezed = false;
        self.show();
        self.populate_page(false, false, true);
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }

    fn populate_page(&mut self, is_back: bool, is_refresh: bool, is_unfreeze: bool) {
        let Some(page) = self.pages.last() else {
            return;
        };
        self.breadcrumb = self.pages.iter().map(|p| p.title.as_str()).join(" > ");

        let anim = if is_refresh || is_unfreeze {
            Anim::None
        } else if is_back {
            Anim::Back
        } else if self.pages.len() == 1 {
            Anim::None
        } else {
            Anim::Forward
        };

        let view = Rc::clone(&page.view);
        let same_view = self
            .current_view
            .as_ref()
            .is_some_and(|cur| cur.borrow().style() == page.style);
        if same_view {
            view.borrow_mut().page_show(&self.breadcrumb, anim, self.clock);
        } else {
            if let Some(old) = self.current_view.take() {
                let mut old = old.borrow_mut();
                old.clear();
                old.hide();
            }
            let mut new = view.borrow_mut();
            new.show();
            new.page_show(&self.breadcrumb, Anim::None, self.clock);
            drop(new);
            self.current_view = Some(Rc::clone(&view));
        }
        debug!(
            browser = %self.name,
            title = %self.breadcrumb,
            anim = anim.as_str(),
            "populate page"
        );

        if self.runtime.config().back_in_lists && self.pages.len() > 1 {
            view.borrow_mut().back_item_add();
        }

        let populate = Rc::clone(&page.populate);
        let args = page.args.clone();
        let url = page.url.clone();
        populate(self, &url, &args);

        self.autoselect_url = None;
        if let Some(view) = &self.current_view {
            view.borrow_mut().item_bring_in(BringIn::Mid, false);
        }
    }
}

impl InputListener for Browser {
    fn input_event_cb(&mut self, event: InputEvent, now: Instant) -> EventResult {
        self.clock = now;
        if let Some(view) = self.current_view.clone() {
            let result = view.borrow_mut().input_event_cb(event, now);
            match result {
                ViewEvent::Block => return EventResult::Block,
                ViewEvent::Activate(item) => {
                    debug!(browser = %self.name, url = %item.url, "item selected");
                    item.class.item_selected(self, &item.url, &item.data);
                    return EventResult::Block;
                }
                ViewEvent::Continue => {}
            }
        }

        if let Some(style) = StyleId::from_event(event) {
            self.change_style(style);
            return EventResult::Block;
        }
        match event {
            InputEvent::Back => {
                self.back();
                EventResult::Block
            }
            InputEvent::Exit => {
                self.freeze();
                if let Some(cb) = self.freeze_cb.clone() {
                    cb();
                }
                EventResult::Block
            }
            _ => EventResult::Continue,
        }
    }
}

impl Drop for Browser {
    fn drop(&mut self) {
        self.runtime.bus().listener_del(&self.name);
    }
}
