// src/app/dialogs.rs
use std::cell::RefCell;
use std::collections::VecDeque;

use eframe::egui as eg;
use tracing::{info, warn};

use crate::browser::Dialogs;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogKind {
    Info,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dialog {
    pub kind: DialogKind,
    pub title: String,
    pub text: String,
}

/// Modal messages queued by the core, shown one at a time.
#[derive(Default)]
pub struct ShellDialogs {
    queue: RefCell<VecDeque<Dialog>>,
}

impl ShellDialogs {
    pub fn is_open(&self) -> bool {
        !self.queue.borrow().is_empty()
    }

    pub fn current(&self) -> Option<Dialog> {
        self.queue.borrow().front().cloned()
    }

    pub fn dismiss(&self) {
        self.queue.borrow_mut().pop_front();
    }

    fn push(&self, kind: DialogKind, title: &str, text: &str) {
        self.queue.borrow_mut().push_back(Dialog {
            kind,
            title: title.to_string(),
            text: text.to_string(),
        });
    }

    /// Paint the front dialog. Returns true when it was dismissed.
    pub fn ui(&self, ctx: &eg::Context) -> bool {
        let Some(dialog) = self.current() else {
            return false;
        };
        let mut dismissed = false;
        eg::Window::new(dialog.title.as_str())
            .collapsible(false)
            .resizable(false)
            .anchor(eg::Align2::CENTER_CENTER, eg::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                if dialog.kind == DialogKind::Warning {
                    ui.colored_label(eg::Color32::from_rgb(230, 170, 60), "⚠ Warning");
                }
                ui.label(dialog.text.as_str());
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    if ui.button("  OK  ").clicked() {
                        dismissed = true;
                    }
                });
            });
        if dismissed {
            self.dismiss();
        }
        dismissed
    }
}

impl Dialogs for ShellDialogs {
    fn info(&self, title: &str, text: &str) {
        info!("dialog: {title}: {text}");
        self.push(DialogKind::Info, title, text);
    }

    fn warning(&self, title: &str, text: &str) {
        warn!("dialog: {title}: {text}");
        self.push(DialogKind::Warning, title, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialogs_queue_in_order() {
        let dialogs = ShellDialogs::default();
        assert!(!dialogs.is_open());
        dialogs.warning("Style memory", "reset");
        dialogs.info("Files", "Cannot open /x");
        assert_eq!(dialogs.current().unwrap().kind, DialogKind::Warning);
        dialogs.dismiss();
        assert_eq!(dialogs.current().unwrap().title, "Files");
        dialogs.dismiss();
        assert!(!dialogs.is_open());
    }
}
