// src/browser/style.rs
use tracing::debug;

use super::store::KeyStore;
use crate::mainloop::InputEvent;

/// Key prefix for remembered styles; bumping it forgets every stored choice.
pub const MEMORY_VERSION: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StyleId {
    List,
    PosterGrid,
    CoverGrid,
}

impl StyleId {
    pub const ALL: [Self; 3] = [Self::List, Self::PosterGrid, Self::CoverGrid];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::List => "List",
            Self::PosterGrid => "PosterGrid",
            Self::CoverGrid => "CoverGrid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "List" => Some(Self::List),
            "PosterGrid" => Some(Self::PosterGrid),
            "CoverGrid" => Some(Self::CoverGrid),
            _ => None,
        }
    }

    /// Style-switch shortcut carried by an input event.
    pub const fn from_event(event: InputEvent) -> Option<Self> {
        match event {
            InputEvent::ViewList => Some(Self::List),
            InputEvent::ViewPosterGrid => Some(Self::PosterGrid),
            InputEvent::ViewCoverGrid => Some(Self::CoverGrid),
            _ => None,
        }
    }
}

/// Remembers the view style the user picked for each page url.
pub struct StyleMemory {
    store: Box<dyn KeyStore>,
}

impl StyleMemory {
    pub fn new(store: Box<dyn KeyStore>) -> Self {
        Self { store }
    }

    fn key(url: &str) -> String {
        format!("{MEMORY_VERSION}_{url}")
    }

    pub fn has(&self, url: &str) -> bool {
        self.store.id_exists(&Self::key(url))
    }

    pub fn get(&self, url: &str) -> Option<StyleId> {
        self.store
            .get_data(&Self::key(url))
            .and_then(|raw| StyleId::from_str(&raw))
    }

    pub fn set(&mut self, url: &str, style: StyleId) {
        debug!(url, style = style.as_str(), "remember view style");
        self.store.set_data(&Self::key(url), style.as_str());
    }

    pub fn take_warning(&mut self) -> Option<String> {
        self.store.take_warning()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::store::MemoryStore;

    #[test]
    fn style_names_round_trip() {
        for style in StyleId::ALL {
            assert_eq!(StyleId::from_str(style.as_str()), Some(style));
        }
        assert_eq!(StyleId::from_str("Wall"), None);
        assert_eq!(
            StyleId::from_event(InputEvent::ViewCoverGrid),
            Some(StyleId::CoverGrid)
        );
        assert_eq!(StyleId::from_event(InputEvent::Ok), None);
    }

    #[test]
    fn entries_are_version_keyed() {
        let mut raw = MemoryStore::new();
        raw.set_data("1_movies://", "CoverGrid");
        let mut memory = StyleMemory::new(Box::new(raw));
        assert!(!memory.has("movies://"));
        assert_eq!(memory.get("movies://"), None);

        memory.set("movies://", StyleId::PosterGrid);
        assert!(memory.has("movies://"));
        assert_eq!(memory.get("movies://"), Some(StyleId::PosterGrid));
    }
}
