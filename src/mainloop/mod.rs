// src/mainloop/mod.rs
//! Single-threaded main-loop helpers: debounced timers and input routing.

pub mod debounce;
pub mod input;

pub use debounce::Debouncer;
pub use input::{EventResult, InputBus, InputEvent, InputListener};
