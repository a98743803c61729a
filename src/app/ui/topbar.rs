// src/app/ui/topbar.rs
use eframe::egui as eg;

use super::selection_stroke;
use crate::app::{to_focus_rect, FooterAction, UiAction};

impl crate::app::ShellApp {
    // ---------- TOP BAR ----------
    pub(crate) fn ui_render_topbar(&mut self, ctx: &eg::Context) {
        let (crumb, count, style) = {
            let browser = self.browser.borrow();
            let count = browser
                .current_view()
                .as_ref()
                .map_or(0, |v| v.borrow().items_count());
            (
                browser.breadcrumb().to_string(),
                count,
                browser.current_style(),
            )
        };

        eg::TopBottomPanel::top("topbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(if crumb.is_empty() { "tenfoot" } else { crumb.as_str() });
                ui.with_layout(eg::Layout::right_to_left(eg::Align::Center), |ui| {
                    if let Some(style) = style {
                        ui.weak(style.as_str());
                        ui.separator();
                    }
                    ui.label(format!("{count} item(s)"));
                });
            });
        });
    }

    // ---------- FOOTER ----------
    pub(crate) fn ui_render_footer(&mut self, ctx: &eg::Context) {
        let current = self.browser.borrow().current_style();
        eg::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                for (id, action) in self.footer.clone() {
                    let enabled = self.footer_enabled(action);
                    let active = matches!(action, FooterAction::Style(s) if Some(s) == current);
                    let resp = ui.add_enabled(
                        enabled,
                        eg::Button::new(action.label()).selected(active),
                    );
                    self.focus.rect_set(id, to_focus_rect(resp.rect));
                    if self.is_focused(id) {
                        ui.painter()
                            .rect_stroke(resp.rect.expand(2.0), 4.0, selection_stroke(true));
                    }
                    if resp.clicked() {
                        self.actions.push(UiAction::Footer(action));
                    }
                }
                ui.with_layout(eg::Layout::right_to_left(eg::Align::Center), |ui| {
                    ui.weak("Arrows move • Enter opens • Esc goes back • F1-F3 switch style • Q suspends");
                });
            });
            ui.add_space(4.0);
        });
    }
}
