// src/browser/view/grid.rs
use std::rc::Rc;
use std::time::Instant;

use serde_json::Value;

use super::{Anim, Artwork, BringIn, BringInRequest, View, ViewContext, ViewEvent, ViewModel};
use crate::browser::item::ItemClass;
use crate::browser::style::StyleId;
use crate::focus::adjacency;
use crate::mainloop::InputEvent;

pub const DEFAULT_POSTER_W: f32 = 160.0;
pub const DEFAULT_COVER_W: f32 = 180.0;
/// Gap between tiles, in points.
pub const H_SPACING: f32 = 4.0;

/// Tiles of width `cell_w` fitting in `width`.
pub fn grid_columns(width: f32, cell_w: f32) -> usize {
    ((width + H_SPACING) / (cell_w + H_SPACING).max(1.0))
        .floor()
        .max(1.0) as usize
}

/// What distinguishes one grid style from another.
pub trait GridFlavor {
    fn style(&self) -> StyleId;

    fn preferred_image(&self) -> Artwork {
        Artwork::Poster
    }

    /// Tile size in points.
    fn cell_size(&self) -> (f32, f32);
}

#[derive(Clone, Copy, Debug)]
pub struct PosterGridFlavor {
    pub width: f32,
}

impl Default for PosterGridFlavor {
    fn default() -> Self {
        Self {
            width: DEFAULT_POSTER_W,
        }
    }
}

impl GridFlavor for PosterGridFlavor {
    fn style(&self) -> StyleId {
        StyleId::PosterGrid
    }

    fn cell_size(&self) -> (f32, f32) {
        (self.width, self.width * 1.5)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CoverGridFlavor {
    pub width: f32,
}

impl Default for CoverGridFlavor {
    fn default() -> Self {
        Self {
            width: DEFAULT_COVER_W,
        }
    }
}

impl GridFlavor for CoverGridFlavor {
    fn style(&self) -> StyleId {
        StyleId::CoverGrid
    }

    fn preferred_image(&self) -> Artwork {
        Artwork::Cover
    }

    fn cell_size(&self) -> (f32, f32) {
        (self.width, self.width)
    }
}

pub struct GridView<F> {
    model: ViewModel,
    flavor: F,
    columns: usize,
}

impl<F: GridFlavor> GridView<F> {
    pub fn new(ctx: &ViewContext, flavor: F) -> Self {
        Self {
            model: ViewModel::new(ctx, flavor.preferred_image(), true),
            flavor,
            columns: 1,
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn cell_size(&self) -> (f32, f32) {
        self.flavor.cell_size()
    }
}

impl<F: GridFlavor> View for GridView<F> {
    fn style(&self) -> StyleId {
        self.flavor.style()
    }

    fn model(&self) -> &ViewModel {
        &self.model
    }

    fn page_show(&mut self, title: &str, anim: Anim, now: Instant) {
        self.model.page_show(title, anim, now);
    }

    fn item_add(
        &mut self,
        class: Rc<dyn ItemClass>,
        url: &str,
        data: Value,
        selected: bool,
        now: Instant,
    ) {
        self.model.item_add(class, url, data, selected, now);
    }

    fn back_item_add(&mut self) {
        self.model.back_item_add();
    }

    fn group_add(&mut self, label: &str, icon: Option<&str>) {
        self.model.group_add(label, icon);
    }

    fn show(&mut self) {
        self.model.shown = true;
    }

    fn hide(&mut self) {
        self.model.shown = false;
    }

    fn clear(&mut self) {
        self.model.clear();
    }

    fn refresh(&mut self, _now: Instant) {
        self.model.refresh();
    }

    fn item_bring_in(&mut self, pos: BringIn, animated: bool) {
        self.model.item_bring_in(pos, animated);
    }

    fn take_bring_in(&mut self) -> Option<BringInRequest> {
        self.model.take_bring_in()
    }

    fn input_event_cb(&mut self, event: InputEvent, now: Instant) -> ViewEvent {
        let columns = self.columns;
        self.model.input(event, now, |cells, current, dir| {
            adjacency::grid_step(cells, columns, current, dir)
        })
    }

    fn highlight(&mut self, url: &str, now: Instant) {
        self.model.highlight(url, now);
    }

    fn tick(&mut self, now: Instant) {
        self.model.tick(now);
    }

    fn layout_set(&mut self, width: f32) {
        let (cell_w, _) = self.flavor.cell_size();
        self.columns = grid_columns(width, cell_w);
    }
}
