// src/app/keys.rs
use eframe::egui as eg;

use crate::mainloop::InputEvent;

/// Keyboard binding of the remote-control tokens.
pub fn key_to_event(key: eg::Key) -> Option<InputEvent> {
    use eg::Key;
    Some(match key {
        Key::Enter | Key::Space => InputEvent::Ok,
        Key::Escape | Key::Backspace => InputEvent::Back,
        Key::Q | Key::F10 => InputEvent::Exit,
        Key::ArrowUp => InputEvent::Up,
        Key::ArrowDown => InputEvent::Down,
        Key::ArrowLeft => InputEvent::Left,
        Key::ArrowRight => InputEvent::Right,
        Key::F1 | Key::Num1 => InputEvent::ViewList,
        Key::F2 | Key::Num2 => InputEvent::ViewPosterGrid,
        Key::F3 | Key::Num3 => InputEvent::ViewCoverGrid,
        _ => return None,
    })
}

/// Tokens pressed this frame, in order.
pub fn pressed_events(ctx: &eg::Context) -> Vec<InputEvent> {
    ctx.input(|i| {
        i.events
            .iter()
            .filter_map(|ev| match ev {
                eg::Event::Key {
                    key, pressed: true, ..
                } => key_to_event(*key),
                _ => None,
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_keys() {
        assert_eq!(key_to_event(eg::Key::Enter), Some(InputEvent::Ok));
        assert_eq!(key_to_event(eg::Key::Escape), Some(InputEvent::Back));
        assert_eq!(key_to_event(eg::Key::ArrowLeft), Some(InputEvent::Left));
        assert_eq!(key_to_event(eg::Key::F3), Some(InputEvent::ViewCoverGrid));
        assert_eq!(key_to_event(eg::Key::Z), None);
    }
}
