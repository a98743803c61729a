// src/app/ui/grid.rs
use eframe::egui as eg;

use super::{selection_stroke, ScrollTarget};
use crate::app::gfx::icon_glyph;
use crate::app::UiAction;
use crate::browser::view::grid::{grid_columns, H_SPACING};
use crate::browser::view::{RowKind, ViewModel};
use crate::browser::{Item, StyleId};
use crate::focus::adjacency;
use crate::images::ImageState;

pub const V_SPACING: f32 = 10.0;
pub const TEXT_H: f32 = 44.0;

/// Artwork and card height for a tile of width `card_w`.
pub fn card_dims(style: StyleId, card_w: f32) -> (f32, f32) {
    let art_h = match style {
        StyleId::CoverGrid => card_w,
        StyleId::List | StyleId::PosterGrid => card_w * 1.5,
    };
    (art_h, art_h + TEXT_H)
}

fn draw_corner_badge(p: &eg::Painter, rect: eg::Rect, label: &str) {
    let pad = 6.0;
    let r = eg::Rect::from_min_size(
        eg::pos2(rect.right() - pad - 28.0, rect.top() + pad),
        eg::vec2(28.0, 20.0),
    );
    let visuals = p.ctx().style().visuals.clone();
    let bg = visuals.extreme_bg_color.gamma_multiply(0.92);
    p.rect_filled(r, eg::Rounding::same(6.0), bg);
    p.text(
        r.center(),
        eg::Align2::CENTER_CENTER,
        label,
        eg::FontId::proportional(14.0),
        eg::Color32::GOLD,
    );
}

impl crate::app::ShellApp {
    pub(crate) fn ui_render_grid(
        &mut self,
        ui: &mut eg::Ui,
        model: &ViewModel,
        style: StyleId,
        layout_w: f32,
        scroll_to: ScrollTarget,
        focused: bool,
    ) {
        let card_w = match style {
            StyleId::CoverGrid => self.runtime.config().cover_grid_w,
            StyleId::List | StyleId::PosterGrid => self.runtime.config().poster_grid_w,
        };
        // same split the view navigates with
        let cols = grid_columns(layout_w, card_w);
        let lines = adjacency::grid_rows(&model.cells(), cols);

        eg::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                ui.spacing_mut().item_spacing = eg::vec2(H_SPACING, V_SPACING);
                for line in lines {
                    if let [idx] = line.as_slice() {
                        if let RowKind::Header { label, icon } = &model.rows()[*idx].kind {
                            ui.add_space(8.0);
                            ui.separator();
                            let text = match icon {
                                Some(key) => format!("{} {label}", icon_glyph(key)),
                                None => label.clone(),
                            };
                            let rect = ui.heading(text).rect;
                            if let Some((target, align)) = scroll_to {
                                if target == *idx {
                                    ui.scroll_to_rect(rect, align);
                                }
                            }
                            continue;
                        }
                    }
                    ui.horizontal(|ui| {
                        for idx in line {
                            let row = &model.rows()[idx];
                            let Some(item) = row.item() else {
                                continue;
                            };
                            let is_sel = model.selected() == Some(idx);
                            let rect =
                                self.ui_grid_card(ui, item, &row.thumb, style, card_w, is_sel, focused);
                            if let Some((target, align)) = scroll_to {
                                if target == idx {
                                    ui.scroll_to_rect(rect, align);
                                }
                            }
                        }
                    });
                }
            });
    }

    #[allow(clippy::too_many_arguments)]
    fn ui_grid_card(
        &mut self,
        ui: &mut eg::Ui,
        item: &Item,
        thumb: &ImageState,
        style: StyleId,
        card_w: f32,
        selected: bool,
        focused: bool,
    ) -> eg::Rect {
        let (art_h, card_h) = card_dims(style, card_w);
        let (rect, resp) = ui.allocate_exact_size(eg::vec2(card_w, card_h), eg::Sense::click());
        let art_rect = eg::Rect::from_min_size(rect.min, eg::vec2(card_w, art_h));
        let text_rect = eg::Rect::from_min_max(eg::pos2(rect.min.x, art_rect.max.y), rect.max);

        let tex = match thumb {
            ImageState::Ready(path) => self.textures.get(ui.ctx(), path),
            _ => None,
        };
        let painter = ui.painter();
        match tex {
            Some(tex) => {
                painter.image(
                    tex.id(),
                    art_rect,
                    eg::Rect::from_min_max(eg::pos2(0.0, 0.0), eg::pos2(1.0, 1.0)),
                    eg::Color32::WHITE,
                );
            }
            None => {
                painter.rect_filled(art_rect, 6.0, eg::Color32::from_gray(40));
                let glyph = match thumb {
                    ImageState::Icon(key) => icon_glyph(key),
                    ImageState::Pending(_) => "…",
                    ImageState::Error => "✖",
                    ImageState::Ready(_) | ImageState::Unset => {
                        item.icon().map_or("", |k| icon_glyph(&k))
                    }
                };
                painter.text(
                    art_rect.center(),
                    eg::Align2::CENTER_CENTER,
                    glyph,
                    eg::FontId::proportional(card_w * 0.3),
                    eg::Color32::WHITE,
                );
            }
        }
        if let Some(key) = item.icon_end() {
            draw_corner_badge(painter, art_rect, icon_glyph(&key));
        }

        let visuals = ui.visuals();
        let clipped = painter.with_clip_rect(text_rect);
        clipped.text(
            text_rect.center_top() + eg::vec2(0.0, 4.0),
            eg::Align2::CENTER_TOP,
            item.label(),
            eg::FontId::proportional(14.0),
            visuals.strong_text_color(),
        );
        if let Some(end) = item.label_end() {
            clipped.text(
                text_rect.center_top() + eg::vec2(0.0, 22.0),
                eg::Align2::CENTER_TOP,
                end,
                eg::FontId::proportional(12.0),
                visuals.weak_text_color(),
            );
        }

        if selected {
            painter.rect_stroke(rect.shrink(1.0), 6.0, selection_stroke(focused));
        }

        if resp.double_clicked() {
            self.actions.push(UiAction::Activate(item.url.clone()));
        } else if resp.clicked() {
            self.actions.push(UiAction::Highlight(item.url.clone()));
        }
        rect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cards_follow_the_style_aspect() {
        assert_eq!(card_dims(StyleId::PosterGrid, 100.0), (150.0, 150.0 + TEXT_H));
        assert_eq!(card_dims(StyleId::CoverGrid, 100.0), (100.0, 100.0 + TEXT_H));
    }
}
