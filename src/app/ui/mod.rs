// src/app/ui/mod.rs
pub mod grid;
pub mod topbar;

use std::time::Instant;

use eframe::egui as eg;

use crate::app::gfx::icon_glyph;
use crate::app::{to_focus_rect, UiAction};
use crate::browser::view::{Anim, BringIn, ListModel, RowKind, ViewModel};
use crate::browser::{Item, StyleId};

pub const ROW_H: f32 = 34.0;
/// Share of the panel width a page slides over during a transition.
pub const SLIDE_FRACTION: f32 = 0.25;

type ScrollTarget = Option<(usize, Option<eg::Align>)>;

/// Horizontal offset of the incoming page: forward pages enter from the
/// right, pages revealed by BACK from the left.
pub fn slide_offset(anim: Anim, progress: f32, width: f32) -> f32 {
    let remaining = (1.0 - progress.clamp(0.0, 1.0)) * width * SLIDE_FRACTION;
    match anim {
        Anim::None => 0.0,
        Anim::Forward => remaining,
        Anim::Back => -remaining,
    }
}

/// Horizontal offset of the page leaving: it exits on the side opposite to
/// the one the incoming page enters from.
pub fn outgoing_offset(anim: Anim, progress: f32, width: f32) -> f32 {
    let travelled = progress.clamp(0.0, 1.0) * width * SLIDE_FRACTION;
    match anim {
        Anim::None => 0.0,
        Anim::Forward => -travelled,
        Anim::Back => travelled,
    }
}

/// First row painted for a list of `len` rows when `visible` fit, keeping
/// `selected` near the middle.
pub fn list_window_start(selected: Option<usize>, len: usize, visible: usize) -> usize {
    let centered = selected.unwrap_or(0).saturating_sub(visible / 2);
    centered.min(len.saturating_sub(visible))
}

pub fn bring_in_align(pos: BringIn) -> Option<eg::Align> {
    match pos {
        BringIn::Top => Some(eg::Align::TOP),
        BringIn::Mid => Some(eg::Align::Center),
        BringIn::In => None,
    }
}

pub(crate) fn selection_stroke(focused: bool) -> eg::Stroke {
    if focused {
        eg::Stroke::new(2.0, eg::Color32::YELLOW)
    } else {
        eg::Stroke::new(1.0, eg::Color32::from_gray(140))
    }
}

impl crate::app::ShellApp {
    pub(crate) fn ui_render_browser(&mut self, ctx: &eg::Context, now: Instant) {
        let Some(view) = self.browser.borrow().current_view() else {
            eg::CentralPanel::default().show(ctx, |ui| {
                ui.centered_and_justified(|ui| {
                    ui.label("Nothing to show.");
                });
            });
            return;
        };
        let bring = view.borrow_mut().take_bring_in();

        eg::CentralPanel::default().show(ctx, |ui| {
            let rect = ui.available_rect_before_wrap();
            let layout_w = rect.width();
            self.focus.rect_set(self.browser_node, to_focus_rect(rect));
            // before borrowing the view: the runtime re-borrows every cached view
            self.runtime.layout_set(layout_w);

            let v = view.borrow();
            let model = v.model();
            let selected = model.selected();
            let scroll_to: ScrollTarget = match bring {
                Some(req) => Some((req.row, bring_in_align(req.pos))),
                None if selected != self.last_selected => selected.map(|row| (row, None)),
                None => None,
            };
            self.last_selected = selected;

            let progress = model.anim_progress(now);
            if progress < 1.0 {
                if let Some(out) = v.outgoing() {
                    let dx = outgoing_offset(model.anim(), progress, layout_w);
                    paint_outgoing_list(ui, out, rect.translate(eg::vec2(dx, 0.0)), 1.0 - progress);
                }
            }

            let offset = slide_offset(model.anim(), progress, layout_w);
            let focused = self.is_focused(self.browser_node);
            let style = v.style();
            let slot = v.current_slot();
            ui.allocate_ui_at_rect(rect.translate(eg::vec2(offset, 0.0)), |ui| match style {
                StyleId::List => self.ui_render_list(ui, model, slot, scroll_to, focused),
                StyleId::PosterGrid | StyleId::CoverGrid => {
                    self.ui_render_grid(ui, model, style, layout_w, scroll_to, focused)
                }
            });
        });
    }

    fn ui_render_list(
        &mut self,
        ui: &mut eg::Ui,
        model: &ViewModel,
        slot: usize,
        scroll_to: ScrollTarget,
        focused: bool,
    ) {
        // each slot keeps its own scroll state
        eg::ScrollArea::vertical()
            .id_source(("list_slot", slot))
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                for (idx, row) in model.rows().iter().enumerate() {
                    let rect = match &row.kind {
                        RowKind::Header { label, icon } => {
                            ui.add_space(6.0);
                            let text = match icon {
                                Some(key) => format!("{} {label}", icon_glyph(key)),
                                None => label.clone(),
                            };
                            let rect = ui.heading(text).rect;
                            ui.separator();
                            rect
                        }
                        RowKind::Item(item) => {
                            let is_sel = model.selected() == Some(idx);
                            self.ui_list_row(ui, item, is_sel, focused)
                        }
                    };
                    if let Some((target, align)) = scroll_to {
                        if target == idx {
                            ui.scroll_to_rect(rect, align);
                        }
                    }
                }
            });
    }

    fn ui_list_row(&mut self, ui: &mut eg::Ui, item: &Item, selected: bool, focused: bool) -> eg::Rect {
        let size = eg::vec2(ui.available_width(), ROW_H);
        let (rect, resp) = ui.allocate_exact_size(size, eg::Sense::click());

        let visuals = ui.visuals();
        let painter = ui.painter();
        if selected {
            painter.rect_filled(rect, 4.0, visuals.selection.bg_fill.gamma_multiply(0.6));
            painter.rect_stroke(rect.shrink(1.0), 4.0, selection_stroke(focused));
        } else if resp.hovered() {
            painter.rect_filled(rect, 4.0, visuals.widgets.hovered.weak_bg_fill);
        }

        let text_color = visuals.strong_text_color();
        let glyph = item.icon().map_or("", |k| icon_glyph(&k));
        painter.text(
            rect.left_center() + eg::vec2(10.0, 0.0),
            eg::Align2::LEFT_CENTER,
            format!("{glyph}  {}", item.label()),
            eg::FontId::proportional(18.0),
            text_color,
        );

        let end = [
            item.label_end(),
            item.icon_end().map(|k| icon_glyph(&k).to_string()),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("  ");
        if !end.is_empty() {
            painter.text(
                rect.right_center() - eg::vec2(10.0, 0.0),
                eg::Align2::RIGHT_CENTER,
                end,
                eg::FontId::proportional(15.0),
                visuals.weak_text_color(),
            );
        }

        if resp.double_clicked() {
            self.actions.push(UiAction::Activate(item.url.clone()));
        } else if resp.clicked() {
            self.actions.push(UiAction::Highlight(item.url.clone()));
        }
        rect
    }

    pub(crate) fn ui_render_frozen(&mut self, ctx: &eg::Context) {
        eg::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(80.0);
                ui.heading("Suspended");
                ui.label("Press OK to resume.");
                ui.add_space(8.0);
                if ui.button("Resume").clicked() {
                    self.actions.push(UiAction::Unfreeze);
                }
            });
        });
    }
}

/// Static snapshot of the page sliding out, faded by `alpha`.
fn paint_outgoing_list(ui: &eg::Ui, out: &ListModel, rect: eg::Rect, alpha: f32) {
    let painter = ui.painter();
    let visuals = ui.visuals();
    let visible = (rect.height() / ROW_H).ceil() as usize;
    let start = list_window_start(out.selected, out.rows.len(), visible);
    for (n, (idx, row)) in out.rows.iter().enumerate().skip(start).take(visible).enumerate() {
        let row_rect = eg::Rect::from_min_size(
            rect.min + eg::vec2(0.0, n as f32 * ROW_H),
            eg::vec2(rect.width(), ROW_H),
        );
        if out.selected == Some(idx) {
            let fill = visuals.selection.bg_fill.gamma_multiply(0.6 * alpha);
            painter.rect_filled(row_rect, 4.0, fill);
        }
        let (text, size) = match &row.kind {
            RowKind::Header { label, .. } => (label.clone(), 20.0),
            RowKind::Item(item) => {
                let glyph = item.icon().map_or("", |k| icon_glyph(&k));
                (format!("{glyph}  {}", item.label()), 18.0)
            }
        };
        painter.text(
            row_rect.left_center() + eg::vec2(10.0, 0.0),
            eg::Align2::LEFT_CENTER,
            text,
            eg::FontId::proportional(size),
            visuals.strong_text_color().gamma_multiply(alpha),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_slide_in_from_the_navigation_side() {
        assert_eq!(slide_offset(Anim::None, 0.0, 800.0), 0.0);
        assert_eq!(slide_offset(Anim::Forward, 0.0, 800.0), 200.0);
        assert_eq!(slide_offset(Anim::Back, 0.5, 800.0), -100.0);
        assert_eq!(slide_offset(Anim::Forward, 1.0, 800.0), 0.0);
    }

    #[test]
    fn outgoing_page_leaves_opposite_to_incoming() {
        assert_eq!(outgoing_offset(Anim::Forward, 0.0, 800.0), 0.0);
        assert_eq!(outgoing_offset(Anim::Forward, 0.5, 800.0), -100.0);
        assert_eq!(outgoing_offset(Anim::Back, 1.0, 800.0), 200.0);
        for p in [0.0, 0.3, 0.9] {
            let incoming = slide_offset(Anim::Forward, p, 800.0);
            let outgoing = outgoing_offset(Anim::Forward, p, 800.0);
            assert!(incoming >= 0.0 && outgoing <= 0.0);
        }
    }

    #[test]
    fn outgoing_window_keeps_selection_visible() {
        assert_eq!(list_window_start(None, 30, 10), 0);
        assert_eq!(list_window_start(Some(12), 30, 10), 7);
        assert_eq!(list_window_start(Some(29), 30, 10), 20);
        assert_eq!(list_window_start(Some(3), 4, 10), 0);
    }

    #[test]
    fn bring_in_positions_map_to_scroll_alignment() {
        assert_eq!(bring_in_align(BringIn::Mid), Some(eg::Align::Center));
        assert_eq!(bring_in_align(BringIn::In), None);
    }
}
