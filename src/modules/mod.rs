// src/modules/mod.rs
//! Content modules. Each one fills a browser with its own pages.

pub mod catalog;
pub mod filemanager;

use std::rc::Rc;

use serde_json::Value;
use tracing::warn;

use crate::browser::{Browser, ItemClass, PopulateFn};
use crate::config::AppConfig;

pub const MAIN_MENU_URL: &str = "main://";

pub trait Module {
    fn name(&self) -> &str;
    fn label(&self) -> &str;
    fn icon(&self) -> &str;
    fn info(&self) -> Option<String> {
        None
    }

    /// Push the module's first page.
    fn open(&self, browser: &mut Browser);
}

/// Main-menu row that opens one module.
struct ModuleEntry(Rc<dyn Module>);

impl ItemClass for ModuleEntry {
    fn item_selected(&self, browser: &mut Browser, _url: &str, _data: &Value) {
        self.0.open(browser);
    }

    fn label_get(&self, _url: &str, _data: &Value) -> Option<String> {
        Some(self.0.label().to_string())
    }

    fn icon_get(&self, _url: &str, _data: &Value) -> Option<String> {
        Some(self.0.icon().to_string())
    }

    fn info_get(&self, _url: &str, _data: &Value) -> Option<String> {
        self.0.info()
    }
}

/// Modules enabled by the configuration, in menu order.
pub fn modules_from_config(config: &AppConfig) -> Vec<Rc<dyn Module>> {
    let mut modules: Vec<Rc<dyn Module>> = Vec::new();

    if let Some(path) = &config.catalog_path {
        modules.push(Rc::new(catalog::CatalogModule::new(path)));
    }

    let roots = if config.filemanager_roots.is_empty() {
        dirs_home().into_iter().collect()
    } else {
        config.filemanager_roots.clone()
    };
    match filemanager::FileManager::new(&roots, config.filemanager_hide_pattern.as_deref()) {
        Ok(fm) => modules.push(Rc::new(fm)),
        Err(e) => warn!("file manager disabled: {e}"),
    }
    modules
}

fn dirs_home() -> Option<String> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
}

/// Root page of the application: one row per module.
pub fn main_menu_open(browser: &mut Browser, modules: &[Rc<dyn Module>]) {
    let entries: Vec<Rc<dyn Module>> = modules.to_vec();
    let populate: PopulateFn = Rc::new(move |browser: &mut Browser, _url: &str, _args: &[Value]| {
        for module in &entries {
            let url = format!("{MAIN_MENU_URL}{}", module.name());
            browser.item_add(Rc::new(ModuleEntry(Rc::clone(module))), &url, Value::Null);
        }
    });
    browser.page_add(MAIN_MENU_URL, "Main menu", &[], populate, vec![]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::runtime::tests::test_runtime;
    use crate::browser::StyleId;
    use crate::config::BrowserConfig;
    use std::cell::Cell;

    struct Fake {
        opened: Cell<usize>,
    }

    impl Module for Fake {
        fn name(&self) -> &str {
            "fake"
        }
        fn label(&self) -> &str {
            "Fake"
        }
        fn icon(&self) -> &str {
            "icon/star"
        }
        fn open(&self, browser: &mut Browser) {
            self.opened.set(self.opened.get() + 1);
            let populate: PopulateFn = Rc::new(|_: &mut Browser, _: &str, _: &[Value]| {});
            browser.page_add("fake://", "Fake", &[StyleId::List], populate, vec![]);
        }
    }

    #[test]
    fn main_menu_lists_and_opens_modules() {
        let (rt, _) = test_runtime(BrowserConfig::default());
        let fake = Rc::new(Fake {
            opened: Cell::new(0),
        });
        let browser = Browser::new(&rt, None);
        main_menu_open(&mut browser.borrow_mut(), &[fake.clone() as Rc<dyn Module>]);
        let view = browser.borrow().current_view().unwrap();
        let item = view.borrow().model().selected_item().cloned().unwrap();
        assert_eq!(item.url, "main://fake");
        assert_eq!(item.label(), "Fake");
        assert_eq!(item.icon().as_deref(), Some("icon/star"));

        item.class
            .item_selected(&mut browser.borrow_mut(), &item.url, &item.data);
        assert_eq!(fake.opened.get(), 1);
        assert_eq!(browser.borrow().breadcrumb(), "Main menu > Fake");
    }
}
