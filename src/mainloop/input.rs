// src/mainloop/input.rs
//! Input-event bus: named listeners tried in registration order.

use std::cell::RefCell;
use std::rc::Weak;
use std::time::Instant;

use tracing::{debug, warn};

use crate::focus::Direction;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventResult {
    Block,
    Continue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputEvent {
    Ok,
    Back,
    Exit,
    Up,
    Down,
    Left,
    Right,
    ViewList,
    ViewPosterGrid,
    ViewCoverGrid,
}

impl InputEvent {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Back => "BACK",
            Self::Exit => "EXIT",
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::ViewList => "VIEW_LIST",
            Self::ViewPosterGrid => "VIEW_POSTERGRID",
            Self::ViewCoverGrid => "VIEW_COVERGRID",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "OK" => Some(Self::Ok),
            "BACK" => Some(Self::Back),
            "EXIT" => Some(Self::Exit),
            "UP" => Some(Self::Up),
            "DOWN" => Some(Self::Down),
            "LEFT" => Some(Self::Left),
            "RIGHT" => Some(Self::Right),
            "VIEW_LIST" => Some(Self::ViewList),
            "VIEW_POSTERGRID" => Some(Self::ViewPosterGrid),
            "VIEW_COVERGRID" => Some(Self::ViewCoverGrid),
            _ => None,
        }
    }

    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::Up => Some(Direction::Up),
            Self::Down => Some(Direction::Down),
            Self::Left => Some(Direction::Left),
            Self::Right => Some(Direction::Right),
            _ => None,
        }
    }
}

pub trait InputListener {
    fn input_event_cb(&mut self, event: InputEvent, now: Instant) -> EventResult;
}

type ListenerRef = Weak<RefCell<dyn InputListener>>;

#[derive(Default)]
pub struct InputBus {
    listeners: RefCell<Vec<(String, ListenerRef)>>,
}

impl InputBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or re-register, keeping the original slot) a listener.
    pub fn listener_add(&self, name: &str, listener: ListenerRef) {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(slot) = listeners.iter_mut().find(|(n, _)| n == name) {
            slot.1 = listener;
        } else {
            listeners.push((name.to_string(), listener));
        }
        debug!(name, "input listener added");
    }

    pub fn listener_del(&self, name: &str) {
        self.listeners.borrow_mut().retain(|(n, _)| n != name);
        debug!(name, "input listener removed");
    }

    pub fn listener_names(&self) -> Vec<String> {
        self.listeners
            .borrow()
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Offer `event` to every listener until one blocks it.
    pub fn dispatch(&self, event: InputEvent, now: Instant) -> EventResult {
        // listeners may (un)register themselves while handling the event
        let snapshot: Vec<(String, ListenerRef)> = {
            let mut listeners = self.listeners.borrow_mut();
            listeners.retain(|(_, l)| l.strong_count() > 0);
            listeners.clone()
        };
        for (name, listener) in snapshot {
            let Some(listener) = listener.upgrade() else {
                continue;
            };
            let Ok(mut listener) = listener.try_borrow_mut() else {
                warn!(name = %name, "input listener busy; skipping re-entrant dispatch");
                continue;
            };
            if listener.input_event_cb(event, now) == EventResult::Block {
                debug!(name = %name, event = event.as_str(), "input blocked");
                return EventResult::Block;
            }
        }
        EventResult::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    struct Recorder {
        seen: Vec<InputEvent>,
        block: Option<InputEvent>,
    }

    impl InputListener for Recorder {
        fn input_event_cb(&mut self, event: InputEvent, _now: Instant) -> EventResult {
            self.seen.push(event);
            if self.block == Some(event) {
                EventResult::Block
            } else {
                EventResult::Continue
            }
        }
    }

    fn recorder(block: Option<InputEvent>) -> Rc<RefCell<Recorder>> {
        Rc::new(RefCell::new(Recorder {
            seen: Vec::new(),
            block,
        }))
    }

    #[test]
    fn tokens_round_trip() {
        for ev in [InputEvent::Ok, InputEvent::ViewCoverGrid, InputEvent::Left] {
            assert_eq!(InputEvent::from_str(ev.as_str()), Some(ev));
        }
        assert_eq!(InputEvent::from_str("PLAY"), None);
    }

    #[test]
    fn first_blocking_listener_stops_dispatch() {
        let bus = InputBus::new();
        let first = recorder(Some(InputEvent::Ok));
        let second = recorder(None);
        let first_dyn: Rc<RefCell<dyn InputListener>> = first.clone();
        let second_dyn: Rc<RefCell<dyn InputListener>> = second.clone();
        bus.listener_add("first", Rc::downgrade(&first_dyn));
        bus.listener_add("second", Rc::downgrade(&second_dyn));

        let now = Instant::now();
        assert_eq!(bus.dispatch(InputEvent::Ok, now), EventResult::Block);
        assert_eq!(bus.dispatch(InputEvent::Back, now), EventResult::Continue);
        assert_eq!(first.borrow().seen, vec![InputEvent::Ok, InputEvent::Back]);
        assert_eq!(second.borrow().seen, vec![InputEvent::Back]);
    }

    #[test]
    fn removed_and_dropped_listeners_are_skipped() {
        let bus = InputBus::new();
        let a = recorder(None);
        let a_dyn: Rc<RefCell<dyn InputListener>> = a.clone();
        bus.listener_add("a", Rc::downgrade(&a_dyn));
        {
            let gone: Rc<RefCell<dyn InputListener>> = recorder(None);
            bus.listener_add("gone", Rc::downgrade(&gone));
        }
        bus.listener_del("a");
        assert_eq!(bus.dispatch(InputEvent::Up, Instant::now()), EventResult::Continue);
        assert!(a.borrow().seen.is_empty());
        assert!(bus.listener_names().is_empty());
    }
}
