// src/app/mod.rs
//! eframe shell: one browser over the module main menu, painted with egui.

pub mod detail;
pub mod dialogs;
pub mod gfx;
pub mod keys;
pub mod ui;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

use eframe::egui as eg;
use tracing::{debug, info};

use crate::browser::{Browser, BrowserRuntime, StyleId};
use crate::config::AppConfig;
use crate::error::Result;
use crate::focus::{FocusEvent, FocusId, FocusTree, NodeSpec, Rect};
use crate::mainloop::{EventResult, InputEvent};
use crate::modules;
use dialogs::ShellDialogs;
use gfx::TextureCache;

/// Footer buttons, in paint order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FooterAction {
    Style(StyleId),
    Refresh,
    Back,
}

impl FooterAction {
    pub const ALL: [Self; 5] = [
        Self::Style(StyleId::List),
        Self::Style(StyleId::PosterGrid),
        Self::Style(StyleId::CoverGrid),
        Self::Refresh,
        Self::Back,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Style(StyleId::List) => "☰ List",
            Self::Style(StyleId::PosterGrid) => "▦ Posters",
            Self::Style(StyleId::CoverGrid) => "▣ Covers",
            Self::Refresh => "⟳ Refresh",
            Self::Back => "⬅ Back",
        }
    }
}

/// Pointer interactions collected while painting, applied once the frame's
/// borrows are released.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum UiAction {
    Highlight(String),
    Activate(String),
    Footer(FooterAction),
    Unfreeze,
}

pub(crate) fn to_focus_rect(r: eg::Rect) -> Rect {
    Rect::new(r.min.x, r.min.y, r.width(), r.height())
}

pub struct ShellApp {
    runtime: Rc<BrowserRuntime>,
    browser: Rc<RefCell<Browser>>,
    dialogs: Rc<ShellDialogs>,
    textures: TextureCache,
    focus: FocusTree,
    browser_node: FocusId,
    footer: Vec<(FocusId, FooterAction)>,
    closed: Rc<Cell<bool>>,
    actions: Vec<UiAction>,
    last_selected: Option<usize>,
}

impl ShellApp {
    pub fn new(config: AppConfig) -> Result<Self> {
        let dialogs = Rc::new(ShellDialogs::default());
        let runtime = BrowserRuntime::from_app_config(&config, dialogs.clone());
        let modules = modules::modules_from_config(&config);
        info!("{} module(s) enabled", modules.len());

        let browser = Browser::new(&runtime, None);
        let closed = Rc::new(Cell::new(false));
        {
            let mut b = browser.borrow_mut();
            let flag = Rc::clone(&closed);
            b.close_cb_set(Rc::new(move || flag.set(true)));
            b.freeze_cb_set(Rc::new(|| info!("browser suspended")));
            modules::main_menu_open(&mut b, &modules);
        }

        let mut focus = FocusTree::new();
        let root = focus.root();
        let browser_node = focus.node_add(root, NodeSpec::widget("browser", Rect::default()))?;
        let bar = focus.node_add(root, NodeSpec::container("footer", Rect::default(), None))?;
        let mut footer = Vec::with_capacity(FooterAction::ALL.len());
        for action in FooterAction::ALL {
            let id = focus.node_add(bar, NodeSpec::widget(action.label(), Rect::default()))?;
            footer.push((id, action));
        }
        focus.focus_set(browser_node)?;

        Ok(Self {
            runtime,
            browser,
            dialogs,
            textures: TextureCache::default(),
            focus,
            browser_node,
            footer,
            closed,
            actions: Vec::new(),
            last_selected: None,
        })
    }

    fn footer_action(&self, id: FocusId) -> Option<FooterAction> {
        self.footer.iter().find(|(fid, _)| *fid == id).map(|(_, a)| *a)
    }

    /// Disabled buttons are greyed out and skipped by focus moves.
    fn footer_enabled(&self, action: FooterAction) -> bool {
        let browser = self.browser.borrow();
        match action {
            FooterAction::Style(style) => {
                let styles = browser.current_styles();
                self.runtime.config().ignore_view_restrictions
                    || styles.is_empty()
                    || styles.contains(&style)
            }
            FooterAction::Refresh | FooterAction::Back => browser.pages_count() > 0,
        }
    }

    // ---- input ----

    fn handle_input(&mut self, event: InputEvent, now: Instant) {
        if self.dialogs.is_open() {
            if matches!(event, InputEvent::Ok | InputEvent::Back) {
                self.dialogs.dismiss();
            }
            return;
        }
        if self.browser.borrow().is_frozen() {
            if event == InputEvent::Ok {
                self.actions.push(UiAction::Unfreeze);
            }
            return;
        }

        if let Some(action) = self.focus.focused().and_then(|id| self.footer_action(id)) {
            if event == InputEvent::Ok {
                self.footer_run(action);
                return;
            }
            if let Some(dir) = event.direction() {
                self.focus.focus_move(dir);
                return;
            }
        }

        let result = self.runtime.bus().dispatch(event, now);
        debug!(event = event.as_str(), ?result, "input");
        if result == EventResult::Continue {
            if let Some(dir) = event.direction() {
                self.focus.focus_move(dir);
            }
        }
    }

    fn footer_run(&mut self, action: FooterAction) {
        let mut browser = self.browser.borrow_mut();
        match action {
            FooterAction::Style(style) => browser.change_style(style),
            FooterAction::Refresh => browser.refresh(true),
            FooterAction::Back => browser.back(),
        }
    }

    fn apply_actions(&mut self, now: Instant) {
        for action in std::mem::take(&mut self.actions) {
            match action {
                UiAction::Highlight(url) => {
                    if let Some(view) = self.browser.borrow().current_view() {
                        view.borrow_mut().highlight(&url, now);
                    }
                    let _ = self.focus.focus_set(self.browser_node);
                }
                UiAction::Activate(url) => {
                    if let Some(view) = self.browser.borrow().current_view() {
                        view.borrow_mut().highlight(&url, now);
                    }
                    self.runtime.bus().dispatch(InputEvent::Ok, now);
                }
                UiAction::Footer(action) => self.footer_run(action),
                UiAction::Unfreeze => self.browser.borrow_mut().unfreeze(),
            }
        }
    }

    fn focus_sync(&mut self) {
        for (id, action) in self.footer.clone() {
            let allow = self.footer_enabled(action);
            self.focus.focus_allow_set(id, allow);
        }
        self.focus.tick();
        for event in self.focus.take_events() {
            match event {
                FocusEvent::Enter(id) => debug!("focus in: {:?}", self.focus.name(id)),
                FocusEvent::Exit(id) => debug!("focus out: {:?}", self.focus.name(id)),
            }
        }
    }

    pub(crate) fn is_focused(&self, id: FocusId) -> bool {
        self.focus.focused() == Some(id)
    }
}

impl eframe::App for ShellApp {
    fn update(&mut self, ctx: &eg::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.textures.begin_frame();
        self.browser.borrow_mut().tick(now);

        for event in keys::pressed_events(ctx) {
            self.handle_input(event, now);
        }
        // BACK on the main menu pops the last page.
        if self.closed.get() {
            info!("last page closed, leaving");
            ctx.send_viewport_cmd(eg::ViewportCommand::Close);
            return;
        }

        self.runtime.tick(now);
        self.focus_sync();

        self.ui_render_topbar(ctx);
        self.ui_render_footer(ctx);
        if self.browser.borrow().is_frozen() {
            self.ui_render_frozen(ctx);
        } else {
            self.ui_render_detail_panel(ctx);
            self.ui_render_browser(ctx, now);
        }
        self.dialogs.ui(ctx);

        self.apply_actions(now);

        // timers and downloads are polled; input wakes egui by itself
        if let Some(at) = self.runtime.next_wakeup(now) {
            ctx.request_repaint_after(at.saturating_duration_since(now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footer_labels_are_distinct() {
        let labels: Vec<&str> = FooterAction::ALL.iter().map(|a| a.label()).collect();
        let mut dedup = labels.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(labels.len(), dedup.len());
    }

    #[test]
    fn egui_rects_convert_to_focus_rects() {
        let r = to_focus_rect(eg::Rect::from_min_size(eg::pos2(10.0, 20.0), eg::vec2(30.0, 40.0)));
        assert_eq!(r, Rect::new(10.0, 20.0, 30.0, 40.0));
    }
}
