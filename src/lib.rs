// src/lib.rs
//! tenfoot: a 10-foot media-center browser core with directional focus
//! navigation, and the egui shell that hosts it.

pub mod app;
pub mod browser;
pub mod config;
pub mod error;
pub mod focus;
pub mod images;
pub mod mainloop;
pub mod modules;
