// src/browser/item.rs
use std::rc::Rc;

use serde_json::Value;

use super::Browser;
pub use crate::images::ImageRef;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemKind {
    Regular,
    Back,
    Folder,
}

impl ItemKind {
    /// Back and folder rows never get poster/cover lookups.
    pub const fn has_artwork(self) -> bool {
        matches!(self, Self::Regular)
    }
}

/// How one kind of item is presented and what activating it does.
///
/// Implementations carry no per-item state: the same instance backs every
/// row of its kind, and each call receives the row's `url` and user data.
pub trait ItemClass {
    fn item_selected(&self, browser: &mut Browser, url: &str, data: &Value);

    fn label_get(&self, url: &str, _data: &Value) -> Option<String> {
        Some(url.to_string())
    }

    fn label_end_get(&self, _url: &str, _data: &Value) -> Option<String> {
        None
    }

    fn icon_get(&self, _url: &str, _data: &Value) -> Option<String> {
        None
    }

    fn icon_end_get(&self, _url: &str, _data: &Value) -> Option<String> {
        None
    }

    fn info_get(&self, _url: &str, _data: &Value) -> Option<String> {
        None
    }

    fn poster_get(&self, _url: &str, _data: &Value) -> ImageRef {
        ImageRef::None
    }

    fn cover_get(&self, _url: &str, _data: &Value) -> ImageRef {
        ImageRef::None
    }

    fn fanart_get(&self, _url: &str, _data: &Value) -> ImageRef {
        ImageRef::None
    }

    fn kind(&self) -> ItemKind {
        ItemKind::Regular
    }
}

/// One row on screen.
#[derive(Clone)]
pub struct Item {
    pub class: Rc<dyn ItemClass>,
    pub url: String,
    pub data: Value,
}

impl Item {
    pub fn new(class: Rc<dyn ItemClass>, url: impl Into<String>, data: Value) -> Self {
        Self {
            class,
            url: url.into(),
            data,
        }
    }

    pub fn kind(&self) -> ItemKind {
        self.class.kind()
    }

    pub fn label(&self) -> String {
        self.class.label_get(&self.url, &self.data).unwrap_or_default()
    }

    pub fn label_end(&self) -> Option<String> {
        self.class.label_end_get(&self.url, &self.data)
    }

    pub fn icon(&self) -> Option<String> {
        self.class.icon_get(&self.url, &self.data)
    }

    pub fn icon_end(&self) -> Option<String> {
        self.class.icon_end_get(&self.url, &self.data)
    }
}

impl std::fmt::Debug for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Item")
            .field("url", &self.url)
            .field("kind", &self.kind())
            .finish()
    }
}

pub const BACK_URL: &str = "back://";

/// The synthesized ".." row.
pub struct BackItem;

impl ItemClass for BackItem {
    fn item_selected(&self, browser: &mut Browser, _url: &str, _data: &Value) {
        browser.back();
    }

    fn label_get(&self, _url: &str, _data: &Value) -> Option<String> {
        Some("..".to_string())
    }

    fn icon_get(&self, _url: &str, _data: &Value) -> Option<String> {
        Some("icon/back".to_string())
    }

    fn kind(&self) -> ItemKind {
        ItemKind::Back
    }
}

/// Folder-like rows. Only activation has to be provided; label and icon
/// default to the url's last segment and the folder glyph.
pub trait FolderClass {
    fn item_selected(&self, browser: &mut Browser, url: &str, data: &Value);

    fn label_get(&self, url: &str, _data: &Value) -> Option<String> {
        Some(folder_label(url))
    }

    fn icon_get(&self, _url: &str, _data: &Value) -> Option<String> {
        Some("icon/folder".to_string())
    }

    /// Secondary label, e.g. how many entries the folder holds.
    fn label_end_get(&self, _url: &str, _data: &Value) -> Option<String> {
        None
    }

    fn icon_end_get(&self, _url: &str, _data: &Value) -> Option<String> {
        None
    }

    fn info_get(&self, _url: &str, _data: &Value) -> Option<String> {
        None
    }

    fn fanart_get(&self, _url: &str, _data: &Value) -> ImageRef {
        ImageRef::None
    }
}

pub struct Folder<T>(pub T);

impl<T: FolderClass> ItemClass for Folder<T> {
    fn item_selected(&self, browser: &mut Browser, url: &str, data: &Value) {
        self.0.item_selected(browser, url, data);
    }

    fn label_get(&self, url: &str, data: &Value) -> Option<String> {
        self.0.label_get(url, data)
    }

    fn icon_get(&self, url: &str, data: &Value) -> Option<String> {
        self.0.icon_get(url, data)
    }

    fn label_end_get(&self, url: &str, data: &Value) -> Option<String> {
        self.0.label_end_get(url, data)
    }

    fn icon_end_get(&self, url: &str, data: &Value) -> Option<String> {
        self.0.icon_end_get(url, data)
    }

    fn info_get(&self, url: &str, data: &Value) -> Option<String> {
        self.0.info_get(url, data)
    }

    fn fanart_get(&self, url: &str, data: &Value) -> ImageRef {
        self.0.fanart_get(url, data)
    }

    fn kind(&self) -> ItemKind {
        ItemKind::Folder
    }
}

/// Last non-empty `/` segment of `url`, percent-decoded.
pub fn folder_label(url: &str) -> String {
    let segment = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(url);
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Plain;
    impl ItemClass for Plain {
        fn item_selected(&self, _browser: &mut Browser, _url: &str, _data: &Value) {}
    }

    struct Dir;
    impl FolderClass for Dir {
        fn item_selected(&self, _browser: &mut Browser, _url: &str, _data: &Value) {}
    }

    struct CountedDir;
    impl FolderClass for CountedDir {
        fn item_selected(&self, _browser: &mut Browser, _url: &str, _data: &Value) {}

        fn label_end_get(&self, _url: &str, data: &Value) -> Option<String> {
            data["count"].as_u64().map(|n| n.to_string())
        }

        fn icon_end_get(&self, _url: &str, _data: &Value) -> Option<String> {
            Some("icon/star".to_string())
        }
    }

    #[test]
    fn folder_label_takes_last_decoded_segment() {
        assert_eq!(folder_label("file:///home/me/My%20Movies"), "My Movies");
        assert_eq!(folder_label("file:///home/me/music/"), "music");
        assert_eq!(folder_label("plain"), "plain");
        assert_eq!(folder_label("/"), "/");
    }

    #[test]
    fn defaults_follow_item_kind() {
        let data = json!(null);
        let plain = Item::new(Rc::new(Plain), "movie://1", data.clone());
        assert_eq!(plain.label(), "movie://1");
        assert_eq!(plain.icon(), None);
        assert!(plain.kind().has_artwork());

        let folder = Item::new(Rc::new(Folder(Dir)), "file:///srv/a%26b", data.clone());
        assert_eq!(folder.label(), "a&b");
        assert_eq!(folder.icon().as_deref(), Some("icon/folder"));
        assert_eq!(folder.kind(), ItemKind::Folder);
        assert!(!folder.kind().has_artwork());

        assert_eq!(folder.label_end(), None);
        assert_eq!(folder.icon_end(), None);

        let counted = Item::new(Rc::new(Folder(CountedDir)), "file:///srv", json!({"count": 7}));
        assert_eq!(counted.label_end().as_deref(), Some("7"));
        assert_eq!(counted.icon_end().as_deref(), Some("icon/star"));

        let back = Item::new(Rc::new(BackItem), BACK_URL, data);
        assert_eq!(back.label(), "..");
        assert_eq!(back.icon().as_deref(), Some("icon/back"));
        assert_eq!(back.kind(), ItemKind::Back);
    }
}
