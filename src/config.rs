use std::{fs, path::Path, path::PathBuf, time::Duration};

use serde_json::Value;
use tracing::{info, warn};

use crate::browser::style::StyleId;

pub const CONFIG_FILE: &str = "config.json";
pub const DEFAULT_CACHE_DIR: &str = ".tenfoot_cache";
pub const STYLE_DB_FILE: &str = "browser_styles.db";

/// Generic `section, key -> value` accessor over the parsed `config.json`.
///
/// Every getter falls back to the supplied default when the section or key is
/// missing or holds a value of the wrong type.
#[derive(Clone, Debug, Default)]
pub struct ConfigValues {
    root: Value,
}

impl ConfigValues {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Value>(raw).map(Self::new)
    }

    fn lookup(&self, section: &str, key: &str) -> Option<&Value> {
        let node = if section.is_empty() {
            &self.root
        } else {
            self.root.get(section)?
        };
        node.get(key)
    }

    pub fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        match self.lookup(section, key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => default,
            },
            Some(Value::Number(n)) => n.as_i64().map_or(default, |n| n != 0),
            _ => default,
        }
    }

    pub fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        match self.lookup(section, key) {
            Some(Value::Number(n)) => n.as_i64().unwrap_or(default),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    pub fn get_str(&self, section: &str, key: &str, default: &str) -> String {
        match self.lookup(section, key) {
            Some(Value::String(s)) => s.clone(),
            _ => default.to_string(),
        }
    }

    pub fn get_str_opt(&self, section: &str, key: &str) -> Option<String> {
        match self.lookup(section, key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    pub fn get_str_list(&self, section: &str, key: &str) -> Vec<String> {
        match self.lookup(section, key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Options that drive the browser core.
#[derive(Clone, Debug, PartialEq)]
pub struct BrowserConfig {
    pub back_in_lists: bool,
    pub ignore_view_restrictions: bool,
    pub default_style: StyleId,
    pub poster_grid_w: f32,
    pub cover_grid_w: f32,
    pub info_delay: Duration,
    pub fanart_delay: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            back_in_lists: true,
            ignore_view_restrictions: false,
            default_style: StyleId::List,
            poster_grid_w: 160.0,
            cover_grid_w: 180.0,
            info_delay: Duration::from_millis(500),
            fanart_delay: Duration::from_millis(1000),
        }
    }
}

impl BrowserConfig {
    pub fn from_values(values: &ConfigValues) -> Self {
        let d = Self::default();
        let default_style = match values.get_str_opt("browser", "default_style") {
            Some(name) => StyleId::from_str(&name).unwrap_or_else(|| {
                warn!("Unknown default_style `{name}` in {CONFIG_FILE}; falling back to List.");
                d.default_style
            }),
            None => d.default_style,
        };
        Self {
            back_in_lists: values.get_bool("browser", "back_in_lists", d.back_in_lists),
            ignore_view_restrictions: values.get_bool(
                "browser",
                "ignore_view_restrictions",
                d.ignore_view_restrictions,
            ),
            default_style,
            poster_grid_w: values
                .get_int("browser", "poster_grid_w", d.poster_grid_w as i64)
                .clamp(80, 480) as f32,
            cover_grid_w: values
                .get_int("browser", "cover_grid_w", d.cover_grid_w as i64)
                .clamp(80, 480) as f32,
            info_delay: Duration::from_millis(
                values.get_int("browser", "info_delay_ms", 500).max(0) as u64,
            ),
            fanart_delay: Duration::from_millis(
                values.get_int("browser", "fanart_delay_ms", 1000).max(0) as u64,
            ),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub cache_dir: Option<String>,
    pub browser: BrowserConfig,
    pub filemanager_roots: Vec<String>,
    pub filemanager_hide_pattern: Option<String>,
    pub catalog_path: Option<String>,
    pub image_workers: usize,
    pub values: ConfigValues,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_values(ConfigValues::default())
    }
}

impl AppConfig {
    pub fn from_values(values: ConfigValues) -> Self {
        Self {
            cache_dir: values.get_str_opt("", "cache_dir"),
            browser: BrowserConfig::from_values(&values),
            filemanager_roots: values.get_str_list("filemanager", "roots"),
            filemanager_hide_pattern: values.get_str_opt("filemanager", "hide_pattern"),
            catalog_path: values.get_str_opt("catalog", "path"),
            image_workers: values.get_int("images", "workers", 4).clamp(1, 32) as usize,
            values,
        }
    }

    pub fn cache_dir(&self) -> PathBuf {
        PathBuf::from(
            self.cache_dir
                .clone()
                .unwrap_or_else(|| resolve_relative_path(DEFAULT_CACHE_DIR)),
        )
    }

    pub fn style_db_path(&self) -> PathBuf {
        self.cache_dir().join(STYLE_DB_FILE)
    }
}

pub fn load_config() -> AppConfig {
    load_config_from(Path::new(CONFIG_FILE))
}

pub fn load_config_from(cfg_path: &Path) -> AppConfig {
    match fs::read_to_string(cfg_path) {
        Ok(raw) => match ConfigValues::from_json_str(&raw) {
            Ok(values) => {
                info!("Loaded config from {}", cfg_path.display());
                AppConfig::from_values(values)
            }
            Err(err) => {
                warn!(
                    "Failed to parse {} ({}). Using defaults.",
                    cfg_path.display(),
                    err
                );
                AppConfig::default()
            }
        },
        Err(_) => {
            info!("No {} found; using defaults", cfg_path.display());
            AppConfig::default()
        }
    }
}

/// Resolve a path relative to the executable's directory, falling back to the
/// working directory when the executable location is unknown.
pub fn resolve_relative_path(rel: &str) -> String {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(rel)))
        .unwrap_or_else(|| PathBuf::from(rel))
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_sections_missing() {
        let cfg = AppConfig::from_values(ConfigValues::from_json_str("{}").unwrap());
        assert_eq!(cfg.browser, BrowserConfig::default());
        assert!(cfg.filemanager_roots.is_empty());
        assert_eq!(cfg.image_workers, 4);
        assert!(cfg.catalog_path.is_none());
    }

    #[test]
    fn reads_browser_section() {
        let raw = r#"{
            "cache_dir": "/tmp/tf",
            "browser": {
                "back_in_lists": "no",
                "ignore_view_restrictions": true,
                "default_style": "PosterGrid",
                "poster_grid_w": 9999,
                "info_delay_ms": 250
            },
            "filemanager": { "roots": ["/a", "/b", 3] },
            "images": { "workers": 0 }
        }"#;
        let cfg = AppConfig::from_values(ConfigValues::from_json_str(raw).unwrap());
        assert!(!cfg.browser.back_in_lists);
        assert!(cfg.browser.ignore_view_restrictions);
        assert_eq!(cfg.browser.default_style, StyleId::PosterGrid);
        assert_eq!(cfg.browser.poster_grid_w, 480.0);
        assert_eq!(cfg.browser.info_delay, Duration::from_millis(250));
        assert_eq!(cfg.browser.fanart_delay, Duration::from_millis(1000));
        assert_eq!(cfg.filemanager_roots, vec!["/a".to_string(), "/b".to_string()]);
        assert_eq!(cfg.image_workers, 1);
        assert_eq!(cfg.style_db_path(), PathBuf::from("/tmp/tf").join(STYLE_DB_FILE));
    }

    #[test]
    fn unknown_style_falls_back() {
        let raw = r#"{ "browser": { "default_style": "Carousel" } }"#;
        let cfg = BrowserConfig::from_values(&ConfigValues::from_json_str(raw).unwrap());
        assert_eq!(cfg.default_style, StyleId::List);
    }

    #[test]
    fn wrong_types_use_defaults() {
        let values = ConfigValues::from_json_str(r#"{ "s": { "b": [1], "i": "x", "t": 4 } }"#)
            .unwrap();
        assert!(values.get_bool("s", "b", true));
        assert_eq!(values.get_int("s", "i", 7), 7);
        assert_eq!(values.get_str("s", "t", "dflt"), "dflt");
        assert_eq!(values.get_str("missing", "t", "dflt"), "dflt");
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("nope.json"));
        assert_eq!(cfg.browser, BrowserConfig::default());
    }

    #[test]
    fn broken_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let cfg = load_config_from(&path);
        assert_eq!(cfg.image_workers, 4);
    }
}
