// src/browser/view/mod.rs
//! View styles for browser pages.
//!
//! A view is a model the frontend paints: rows (items and group headers), the
//! selection cursor, the page transition, and the detail panel of the
//! highlighted item. Details are fetched lazily: each highlight change re-arms
//! two debouncers and only the item still highlighted when one fires is
//! queried.

pub mod grid;
pub mod list;

use std::rc::Rc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, trace};

use super::item::{Item, ItemClass, ItemKind, BACK_URL, BackItem};
use super::style::StyleId;
use crate::focus::adjacency::Cell;
use crate::focus::Direction;
use crate::images::{ImageCache, ImageRef, ImageState, RequesterId};
use crate::mainloop::{Debouncer, InputEvent};

pub use grid::{CoverGridFlavor, GridFlavor, GridView, PosterGridFlavor};
pub use list::{ListModel, ListView};

/// How long the outgoing page stays readable after a flip.
pub const ANIM_DURATION: Duration = Duration::from_millis(300);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anim {
    None,
    Back,
    Forward,
}

impl Anim {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Back => "back",
            Self::Forward => "forward",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BringIn {
    Top,
    Mid,
    In,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BringInRequest {
    pub row: usize,
    pub pos: BringIn,
    pub animated: bool,
}

#[derive(Debug)]
pub enum ViewEvent {
    Continue,
    Block,
    Activate(Item),
}

/// Which artwork fills the preview and the grid tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Artwork {
    Poster,
    Cover,
}

impl Artwork {
    fn of(self, item: &Item) -> ImageRef {
        match self {
            Self::Poster => item.class.poster_get(&item.url, &item.data),
            Self::Cover => item.class.cover_get(&item.url, &item.data),
        }
    }
}

#[derive(Clone, Debug)]
pub enum RowKind {
    Item(Item),
    Header { label: String, icon: Option<String> },
}

#[derive(Clone, Debug)]
pub struct Row {
    pub kind: RowKind,
    /// Index of the header row this row sits under.
    pub group: Option<usize>,
    pub thumb: ImageState,
}

impl Row {
    pub fn item(&self) -> Option<&Item> {
        match &self.kind {
            RowKind::Item(item) => Some(item),
            RowKind::Header { .. } => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.item().map(|i| i.url.as_str())
    }

    pub fn cell(&self) -> Cell {
        match self.kind {
            RowKind::Item(_) => Cell::Item { enabled: true },
            RowKind::Header { .. } => Cell::Header,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Details {
    pub url: Option<String>,
    pub info: Option<String>,
    pub preview: ImageState,
    pub fanart: ImageState,
}

impl Default for Details {
    fn default() -> Self {
        Self {
            url: None,
            info: None,
            preview: ImageState::Unset,
            fanart: ImageState::Unset,
        }
    }
}

/// Shared services handed to every view by the runtime.
#[derive(Clone)]
pub struct ViewContext {
    pub images: Rc<ImageCache>,
    pub info_delay: Duration,
    pub fanart_delay: Duration,
}

/// State common to all view styles.
pub struct ViewModel {
    title: String,
    anim: Anim,
    anim_start: Option<Instant>,
    rows: Vec<Row>,
    current_group: Option<usize>,
    counter: usize,
    selected: Option<usize>,
    bring_in: Option<BringInRequest>,
    generation: u64,
    shown: bool,
    details: Details,
    info_timer: Debouncer<String>,
    fanart_timer: Debouncer<String>,
    images: Rc<ImageCache>,
    detail_requester: RequesterId,
    thumb_requester: RequesterId,
    artwork: Artwork,
    thumbs: bool,
}

impl ViewModel {
    pub fn new(ctx: &ViewContext, artwork: Artwork, thumbs: bool) -> Self {
        Self {
            title: String::new(),
            anim: Anim::None,
            anim_start: None,
            rows: Vec::new(),
            current_group: None,
            counter: 0,
            selected: None,
            bring_in: None,
            generation: 0,
            shown: false,
            details: Details::default(),
            info_timer: Debouncer::new(ctx.info_delay),
            fanart_timer: Debouncer::new(ctx.fanart_delay),
            images: Rc::clone(&ctx.images),
            detail_requester: ctx.images.requester_new(),
            thumb_requester: ctx.images.requester_new(),
            artwork,
            thumbs,
        }
    }

    // ---- read side, used by frontends ----

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn anim(&self) -> Anim {
        self.anim
    }

    /// Earliest instant the view needs another tick: right away while a page
    /// slides, else when the next debounced detail fetch falls due.
    pub fn next_deadline(&self, now: Instant) -> Option<Instant> {
        if self.anim_progress(now) < 1.0 {
            return Some(now);
        }
        [self.info_timer.deadline(), self.fanart_timer.deadline()]
            .into_iter()
            .flatten()
            .min()
    }

    /// 0.0 at the start of the transition, 1.0 once it is over.
    pub fn anim_progress(&self, now: Instant) -> f32 {
        match (self.anim, self.anim_start) {
            (Anim::None, _) | (_, None) => 1.0,
            (_, Some(start)) => {
                let t = now.saturating_duration_since(start).as_secs_f32();
                (t / ANIM_DURATION.as_secs_f32()).clamp(0.0, 1.0)
            }
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn items_count(&self) -> usize {
        self.counter
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_item(&self) -> Option<&Item> {
        self.selected.and_then(|i| self.rows.get(i)).and_then(Row::item)
    }

    pub fn selected_url(&self) -> Option<String> {
        self.selected_item().map(|i| i.url.clone())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn artwork(&self) -> Artwork {
        self.artwork
    }

    pub fn cells(&self) -> Vec<Cell> {
        self.rows.iter().map(Row::cell).collect()
    }

    pub fn position_of(&self, url: &str) -> Option<usize> {
        self.rows.iter().position(|r| r.url() == Some(url))
    }

    // ---- write side ----

    fn page_show(&mut self, title: &str, anim: Anim, now: Instant) -> Vec<Row> {
        self.cancel_pending();
        let previous = std::mem::take(&mut self.rows);
        self.title = title.to_string();
        self.anim = anim;
        self.anim_start = Some(now);
        self.current_group = None;
        self.counter = 0;
        self.selected = None;
        self.bring_in = None;
        self.details = Details::default();
        previous
    }

    fn thumb_for(&self, item: &Item) -> ImageState {
        if !self.thumbs {
            return ImageState::Unset;
        }
        if item.kind().has_artwork() {
            match self.images.request(self.thumb_requester, &self.artwork.of(item)) {
                ImageState::Unset => item.icon().map_or(ImageState::Unset, ImageState::Icon),
                state => state,
            }
        } else {
            item.icon().map_or(ImageState::Unset, ImageState::Icon)
        }
    }

    fn item_add(
        &mut self,
        class: Rc<dyn ItemClass>,
        url: &str,
        data: Value,
        selected: bool,
        now: Instant,
    ) {
        let item = Item::new(class, url, data);
        let thumb = self.thumb_for(&item);
        self.rows.push(Row {
            kind: RowKind::Item(item),
            group: self.current_group,
            thumb,
        });
        self.counter += 1;
        if selected || self.selected.is_none() {
            let row = self.rows.len() - 1;
            self.select(row, now);
            self.bring_in = Some(BringInRequest {
                row,
                pos: BringIn::In,
                animated: false,
            });
        }
    }

    fn back_item_add(&mut self) {
        let item = Item::new(Rc::new(BackItem), BACK_URL, Value::Null);
        let thumb = self.thumb_for(&item);
        self.rows.push(Row {
            kind: RowKind::Item(item),
            group: None,
            thumb,
        });
        // not counted, and left unselected so the first real item wins
    }

    fn group_add(&mut self, label: &str, icon: Option<&str>) {
        self.rows.push(Row {
            kind: RowKind::Header {
                label: label.to_string(),
                icon: icon.map(str::to_string),
            },
            group: None,
            thumb: icon.map_or(ImageState::Unset, |i| ImageState::Icon(i.to_string())),
        });
        self.current_group = Some(self.rows.len() - 1);
    }

    /// Move the highlight; re-arms the detail debouncers.
    fn select(&mut self, row: usize, now: Instant) {
        if self.selected == Some(row) {
            return;
        }
        let Some(url) = self.rows.get(row).and_then(Row::url).map(str::to_string) else {
            return;
        };
        trace!(url = %url, "highlight");
        self.selected = Some(row);
        self.images.cancel(self.detail_requester);
        self.details = Details {
            url: Some(url.clone()),
            ..Details::default()
        };
        self.info_timer.schedule(now, url.clone());
        self.fanart_timer.schedule(now, url);
    }

    fn highlight(&mut self, url: &str, now: Instant) {
        if let Some(row) = self.position_of(url) {
            self.select(row, now);
        }
    }

    fn fetch_info(&mut self) {
        let Some(item) = self.selected_item().cloned() else {
            return;
        };
        debug!(url = %item.url, "fetch item details");
        self.details.info = item.class.info_get(&item.url, &item.data);
        self.details.preview = if item.kind().has_artwork() {
            self.images
                .request(self.detail_requester, &self.artwork.of(&item))
        } else {
            item.icon().map_or(ImageState::Unset, ImageState::Icon)
        };
    }

    fn fetch_fanart(&mut self) {
        let Some(item) = self.selected_item().cloned() else {
            return;
        };
        let fanart = item.class.fanart_get(&item.url, &item.data);
        self.details.fanart = self.images.request(self.detail_requester, &fanart);
    }

    fn tick(&mut self, now: Instant) {
        let current = self.selected_url();
        if let Some(url) = self.info_timer.poll(now) {
            if current.as_deref() == Some(url.as_str()) {
                self.fetch_info();
            }
        }
        if let Some(url) = self.fanart_timer.poll(now) {
            if current.as_deref() == Some(url.as_str()) {
                self.fetch_fanart();
            }
        }

        for done in self.images.take_finished(self.detail_requester) {
            let pending = ImageState::Pending(done.dest.clone());
            if self.details.preview == pending {
                self.details.preview = done.state.clone();
            }
            if self.details.fanart == pending {
                self.details.fanart = done.state.clone();
            }
        }
        for done in self.images.take_finished(self.thumb_requester) {
            let pending = ImageState::Pending(done.dest.clone());
            for row in self.rows.iter_mut().filter(|r| r.thumb == pending) {
                row.thumb = done.state.clone();
            }
        }
    }

    fn refresh(&mut self) {
        self.generation += 1;
        if self.selected_item().is_some() {
            self.info_timer.cancel();
            self.fanart_timer.cancel();
            self.fetch_info();
            self.fetch_fanart();
        }
    }

    fn cancel_pending(&mut self) {
        self.info_timer.cancel();
        self.fanart_timer.cancel();
        self.images.cancel(self.detail_requester);
        self.images.cancel(self.thumb_requester);
    }

    fn clear(&mut self) {
        self.cancel_pending();
        self.rows.clear();
        self.current_group = None;
        self.counter = 0;
        self.selected = None;
        self.bring_in = None;
        self.details = Details::default();
    }

    fn item_bring_in(&mut self, pos: BringIn, animated: bool) {
        if let Some(row) = self.selected {
            self.bring_in = Some(BringInRequest { row, pos, animated });
        }
    }

    fn take_bring_in(&mut self) -> Option<BringInRequest> {
        self.bring_in.take()
    }

    /// Shared key handling; `step` is the style's adjacency rule.
    fn input(
        &mut self,
        event: InputEvent,
        now: Instant,
        step: impl Fn(&[Cell], Option<usize>, Direction) -> Option<usize>,
    ) -> ViewEvent {
        if event == InputEvent::Ok {
            return match self.selected_item() {
                Some(item) => ViewEvent::Activate(item.clone()),
                None => ViewEvent::Continue,
            };
        }
        let Some(dir) = event.direction() else {
            return ViewEvent::Continue;
        };
        let cells = self.cells();
        match step(&cells, self.selected, dir) {
            Some(row) if Some(row) != self.selected => {
                self.select(row, now);
                self.bring_in = Some(BringInRequest {
                    row,
                    pos: BringIn::In,
                    animated: true,
                });
                ViewEvent::Block
            }
            _ => ViewEvent::Continue,
        }
    }
}

/// One page-rendering strategy. Views are cached per style by the runtime and
/// shared by every browser that shows that style.
pub trait View {
    fn style(&self) -> StyleId;
    fn model(&self) -> &ViewModel;
    fn page_show(&mut self, title: &str, anim: Anim, now: Instant);
    fn item_add(
        &mut self,
        class: Rc<dyn ItemClass>,
        url: &str,
        data: Value,
        selected: bool,
        now: Instant,
    );
    fn back_item_add(&mut self);
    fn group_add(&mut self, label: &str, icon: Option<&str>);
    fn show(&mut self);
    fn hide(&mut self);
    fn clear(&mut self);
    fn refresh(&mut self, now: Instant);
    fn item_bring_in(&mut self, pos: BringIn, animated: bool);
    fn take_bring_in(&mut self) -> Option<BringInRequest>;
    fn input_event_cb(&mut self, event: InputEvent, now: Instant) -> ViewEvent;
    fn highlight(&mut self, url: &str, now: Instant);
    fn tick(&mut self, now: Instant);

    /// Frontend reports the width available to the view.
    fn layout_set(&mut self, _width: f32) {}

    /// Page still sliding out after a flip, for views that keep one.
    fn outgoing(&self) -> Option<&ListModel> {
        None
    }

    /// Slot holding the current page; flips alternate between two.
    fn current_slot(&self) -> usize {
        0
    }

    fn selected_url_get(&self) -> Option<String> {
        self.model().selected_url()
    }

    fn items_count(&self) -> usize {
        self.model().items_count()
    }
}

/// Kinds of item a view may hold, for frontends picking a row painter.
pub fn row_kind_name(row: &Row) -> &'static str {
    match &row.kind {
        RowKind::Header { .. } => "header",
        RowKind::Item(item) => match item.kind() {
            ItemKind::Back => "back",
            ItemKind::Folder => "folder",
            ItemKind::Regular => "item",
        },
    }
}
