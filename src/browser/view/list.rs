// src/browser/view/list.rs
use std::rc::Rc;
use std::time::Instant;

use serde_json::Value;

use super::{Anim, Artwork, BringIn, BringInRequest, Row, View, ViewContext, ViewEvent, ViewModel};
use crate::browser::item::ItemClass;
use crate::browser::style::StyleId;
use crate::focus::adjacency;
use crate::mainloop::InputEvent;

/// Content of the list that is animating out.
#[derive(Clone, Debug, Default)]
pub struct ListModel {
    pub title: String,
    pub rows: Vec<Row>,
    pub selected: Option<usize>,
}

/// Vertical list with a preview panel. Two list slots alternate on every
/// flip: the new page fills the current slot while the previous one slides
/// out of the other.
pub struct ListView {
    model: ViewModel,
    outgoing: Option<ListModel>,
    outgoing_until: Option<Instant>,
    current: usize,
}

impl ListView {
    pub fn new(ctx: &ViewContext) -> Self {
        Self {
            model: ViewModel::new(ctx, Artwork::Poster, false),
            outgoing: None,
            outgoing_until: None,
            current: 0,
        }
    }
}

impl View for ListView {
    fn style(&self) -> StyleId {
        StyleId::List
    }

    fn model(&self) -> &ViewModel {
        &self.model
    }

    fn page_show(&mut self, title: &str, anim: Anim, now: Instant) {
        let previous = ListModel {
            title: self.model.title().to_string(),
            selected: self.model.selected(),
            rows: Vec::new(),
        };
        let rows = self.model.page_show(title, anim, now);
        if anim == Anim::None {
            self.outgoing = None;
            self.outgoing_until = None;
        } else {
            self.current ^= 1;
            self.outgoing = Some(ListModel { rows, ..previous });
            self.outgoing_until = Some(now + super::ANIM_DURATION);
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
        self.outgoing = None;
        self.outgoing_until = None;
    }

    fn clear(&mut self) {
        self.model.clear();
        self.outgoing = None;
        self.outgoing_until = None;
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
        self.model.input(event, now, adjacency::list_step)
    }

    fn highlight(&mut self, url: &str, now: Instant) {
        self.model.highlight(url, now);
    }

    fn outgoing(&self) -> Option<&ListModel> {
        self.outgoing.as_ref()
    }

    fn current_slot(&self) -> usize {
        self.current
    }

    fn tick(&mut self, now: Instant) {
        if self.outgoing_until.is_some_and(|until| now >= until) {
            self.outgoing = None;
            self.outgoing_until = None;
        }
        self.model.tick(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::view::tests::{test_context, Counting};
    use std::time::Duration;

    #[test]
    fn flips_alternate_slots_and_keep_outgoing_rows() {
        let t0 = Instant::now();
        let class: Rc<dyn ItemClass> = Rc::new(Counting::default());
        let mut view = ListView::new(&test_context());
        view.page_show("Root", Anim::None, t0);
        view.item_add(class.clone(), "a", Value::Null, false, t0);
        assert_eq!(view.current_slot(), 0);
        assert!(view.outgoing().is_none());

        view.page_show("Root > A", Anim::Forward, t0);
        assert_eq!(view.current_slot(), 1);
        let out = view.outgoing().expect("outgoing page");
        assert_eq!(out.title, "Root");
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.selected, Some(0));

        view.tick(t0 + Duration::from_millis(100));
        assert!(view.outgoing().is_some());
        view.tick(t0 + Duration::from_secs(1));
        assert!(view.outgoing().is_none());

        view.page_show("Root", Anim::None, t0);
        assert_eq!(view.current_slot(), 1);
    }

    #[test]
    fn vertical_moves_skip_headers() {
        let t0 = Instant::now();
        let class: Rc<dyn ItemClass> = Rc::new(Counting::default());
        let mut view = ListView::new(&test_context());
        view.page_show("Root", Anim::None, t0);
        view.item_add(class.clone(), "a", Value::Null, false, t0);
        view.group_add("More", None);
        view.item_add(class, "b", Value::Null, false, t0);

        assert!(matches!(view.input_event_cb(InputEvent::Down, t0), ViewEvent::Block));
        assert_eq!(view.selected_url_get().as_deref(), Some("b"));
        // bottom reached, let the focus engine take it
        assert!(matches!(view.input_event_cb(InputEvent::Down, t0), ViewEvent::Continue));
        assert!(matches!(view.input_event_cb(InputEvent::Right, t0), ViewEvent::Continue));
        assert!(matches!(view.input_event_cb(InputEvent::Up, t0), ViewEvent::Block));
        assert_eq!(view.selected_url_get().as_deref(), Some("a"));
    }
}
