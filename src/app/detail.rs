// src/app/detail.rs
use eframe::egui as eg;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::images::ImageState;

static BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("static regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("static regex"));

/// Plain text of the small markup subset item classes emit in `info_get`.
pub fn markup_to_text(markup: &str) -> String {
    let text = BREAK_RE.replace_all(markup, "\n");
    let text = TAG_RE.replace_all(&text, "");
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

/// Heading line: the first `<b>` run, if any.
pub fn markup_title(markup: &str) -> Option<String> {
    let start = markup.find("<b>")? + 3;
    let end = markup[start..].find("</b>")? + start;
    Some(markup_to_text(&markup[start..end]))
}

impl crate::app::ShellApp {
    pub(crate) fn ui_render_detail_panel(&mut self, ctx: &eg::Context) {
        let Some(view) = self.browser.borrow().current_view() else {
            return;
        };
        let details = view.borrow().model().details().clone();

        let screen_w: f32 = ctx.input(|i| i.screen_rect().width());
        let max_w: f32 = (screen_w * 0.40).clamp(300.0, 480.0);

        eg::SidePanel::right("detail_panel")
            .resizable(true)
            .default_width(320.0)
            .min_width(260.0)
            .max_width(max_w)
            .show(ctx, |ui| {
                ui.add_space(6.0);
                ui.heading("Details");
                ui.separator();

                if details.url.is_none() {
                    ui.label("Highlight an item to see its details.");
                    return;
                }

                let avail_w = ui.available_width().clamp(120.0, 480.0);
                let preview_size = eg::vec2(avail_w, avail_w * 1.5);
                self.paint_image_slot(ui, &details.preview, preview_size, "Loading…");

                ui.add_space(8.0);
                match details.info.as_deref() {
                    Some(info) => {
                        let body = match markup_title(info) {
                            Some(title) => {
                                ui.heading(title);
                                info.split_once("</b>").map_or(info, |(_, rest)| rest)
                            }
                            None => info,
                        };
                        ui.label(markup_to_text(body).trim());
                    }
                    None => {
                        ui.weak("…");
                    }
                }

                if let ImageState::Ready(path) = &details.fanart {
                    ui.add_space(8.0);
                    ui.separator();
                    ui.small("Fanart");
                    let fan_size = eg::vec2(avail_w, avail_w * 9.0 / 16.0);
                    match self.textures.get(ctx, path) {
                        Some(tex) => {
                            ui.image((tex.id(), fan_size));
                        }
                        None => {
                            ui.allocate_exact_size(fan_size, eg::Sense::hover());
                        }
                    }
                }
            });
    }

    /// Artwork, icon glyph or a placeholder box, depending on `state`.
    pub(crate) fn paint_image_slot(
        &mut self,
        ui: &mut eg::Ui,
        state: &ImageState,
        size: eg::Vec2,
        pending_text: &str,
    ) -> eg::Rect {
        if let ImageState::Ready(path) = state {
            if let Some(tex) = self.textures.get(ui.ctx(), path) {
                return ui.image((tex.id(), size)).rect;
            }
        }
        let (rect, _resp) = ui.allocate_exact_size(size, eg::Sense::hover());
        let painter = ui.painter();
        painter.rect_filled(rect, 8.0, eg::Color32::from_gray(40));
        let (text, font) = match state {
            ImageState::Icon(key) => (crate::app::gfx::icon_glyph(key), size.y.min(size.x) * 0.4),
            ImageState::Pending(_) => (pending_text, 14.0),
            ImageState::Error => ("✖", 24.0),
            _ => ("", 14.0),
        };
        painter.text(
            rect.center(),
            eg::Align2::CENTER_CENTER,
            text,
            eg::FontId::proportional(font),
            eg::Color32::WHITE,
        );
        rect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_becomes_plain_lines() {
        let info = "<b>Alien</b><br>Size: 5 B<BR/>R&amp;D <i>notes</i>";
        assert_eq!(markup_to_text(info), "Alien\nSize: 5 B\nR&D notes");
        assert_eq!(markup_title(info).as_deref(), Some("Alien"));
        assert_eq!(markup_title("no title"), None);
    }
}
