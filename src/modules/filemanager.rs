// src/modules/filemanager.rs
//! Browse local directories.

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use regex::Regex;
use serde_json::{json, Value};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::Module;
use crate::browser::item::{folder_label, ImageRef};
use crate::browser::{Browser, Folder, FolderClass, ItemClass, PopulateFn, StyleId};
use crate::error::{Result, TenfootError};

const ROOT_URL: &str = "filemanager://";
const STYLES: [StyleId; 2] = [StyleId::List, StyleId::CoverGrid];
const IMAGE_EXTS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];

pub fn path_to_url(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    let encoded = raw
        .split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    if encoded.starts_with('/') {
        format!("file://{encoded}")
    } else {
        format!("file:///{encoded}")
    }
}

pub fn url_to_path(url: &str) -> PathBuf {
    let raw = url.strip_prefix("file://").unwrap_or(url);
    let decoded = urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    // "file:///C:/x" on windows
    match decoded.get(1..3) {
        Some(drive) if drive.ends_with(':') && decoded.starts_with('/') => PathBuf::from(&decoded[1..]),
        _ => PathBuf::from(decoded),
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| IMAGE_EXTS.contains(&e.as_str()))
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} {}", UNITS[0])
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[derive(Clone)]
pub struct FileManager {
    roots: Rc<[PathBuf]>,
    hide: Option<Regex>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: PathBuf,
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl FileManager {
    pub fn new(roots: &[String], hide_pattern: Option<&str>) -> Result<Self> {
        let hide = hide_pattern
            .filter(|p| !p.is_empty())
            .map(Regex::new)
            .transpose()
            .map_err(|e| TenfootError::Config(format!("filemanager.hide_pattern: {e}")))?;
        Ok(Self {
            roots: roots.iter().map(PathBuf::from).collect::<Vec<_>>().into(),
            hide,
        })
    }

    fn hidden(&self, name: &str) -> bool {
        self.hide.as_ref().is_some_and(|re| re.is_match(name))
    }

    /// Directory content, folders first, each group sorted by name.
    pub fn list_dir(&self, dir: &Path) -> Vec<Entry> {
        let mut entries: Vec<Entry> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("skip unreadable entry in {}: {e}", dir.display());
                    None
                }
            })
            .filter(|entry| !self.hidden(&entry.file_name().to_string_lossy()))
            .map(|entry| {
                let meta = entry.metadata().ok();
                Entry {
                    is_dir: entry.file_type().is_dir(),
                    size: meta.as_ref().map_or(0, |m| m.len()),
                    modified: meta.and_then(|m| m.modified().ok()),
                    path: entry.into_path(),
                }
            })
            .collect();
        entries.sort_by_key(|e| {
            (
                !e.is_dir,
                e.path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_lowercase())
                    .unwrap_or_default(),
            )
        });
        entries
    }

    fn populate_dir(&self) -> PopulateFn {
        let fm = self.clone();
        Rc::new(move |browser: &mut Browser, url: &str, _args: &[Value]| {
            let dir = url_to_path(url);
            if !dir.is_dir() {
                warn!("not a directory: {}", dir.display());
                browser
                    .runtime()
                    .dialogs()
                    .info("File manager", &format!("Cannot open {}", dir.display()));
                return;
            }
            let folder: Rc<dyn ItemClass> = Rc::new(Folder(DirFolder(fm.clone())));
            let file: Rc<dyn ItemClass> = Rc::new(FileItem);
            for entry in fm.list_dir(&dir) {
                let url = path_to_url(&entry.path);
                if entry.is_dir {
                    browser.item_add(Rc::clone(&folder), &url, Value::Null);
                } else {
                    let modified = entry
                        .modified
                        .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M").to_string());
                    browser.item_add(
                        Rc::clone(&file),
                        &url,
                        json!({ "size": entry.size, "modified": modified }),
                    );
                }
            }
        })
    }

    fn populate_roots(&self) -> PopulateFn {
        let fm = self.clone();
        Rc::new(move |browser: &mut Browser, _url: &str, _args: &[Value]| {
            let folder: Rc<dyn ItemClass> = Rc::new(Folder(DirFolder(fm.clone())));
            for root in fm.roots.iter() {
                browser.item_add(Rc::clone(&folder), &path_to_url(root), Value::Null);
            }
        })
    }
}

impl Module for FileManager {
    fn name(&self) -> &str {
        "filemanager"
    }

    fn label(&self) -> &str {
        "Files"
    }

    fn icon(&self) -> &str {
        "icon/folder"
    }

    fn info(&self) -> Option<String> {
        Some(format!("{} root folder(s)", self.roots.len()))
    }

    fn open(&self, browser: &mut Browser) {
        browser.page_add(ROOT_URL, "Files", &STYLES, self.populate_roots(), vec![]);
    }
}

struct DirFolder(FileManager);

impl FolderClass for DirFolder {
    fn item_selected(&self, browser: &mut Browser, url: &str, _data: &Value) {
        browser.page_add(url, &folder_label(url), &STYLES, self.0.populate_dir(), vec![]);
    }
}

struct FileItem;

impl ItemClass for FileItem {
    fn item_selected(&self, browser: &mut Browser, url: &str, _data: &Value) {
        let path = url_to_path(url);
        browser
            .runtime()
            .dialogs()
            .info(&folder_label(url), &path.display().to_string());
    }

    fn label_get(&self, url: &str, _data: &Value) -> Option<String> {
        Some(folder_label(url))
    }

    fn label_end_get(&self, _url: &str, data: &Value) -> Option<String> {
        data["size"].as_u64().map(human_size)
    }

    fn icon_get(&self, url: &str, _data: &Value) -> Option<String> {
        if is_image(&url_to_path(url)) {
            Some("icon/image".to_string())
        } else {
            Some("icon/file".to_string())
        }
    }

    fn info_get(&self, url: &str, data: &Value) -> Option<String> {
        let mut info = format!("<b>{}</b>", folder_label(url));
        if let Some(size) = data["size"].as_u64() {
            info.push_str(&format!("<br>Size: {}", human_size(size)));
        }
        if let Some(modified) = data["modified"].as_str() {
            info.push_str(&format!("<br>Modified: {modified}"));
        }
        Some(info)
    }

    fn poster_get(&self, url: &str, _data: &Value) -> ImageRef {
        let path = url_to_path(url);
        if is_image(&path) {
            ImageRef::Local(path)
        } else {
            ImageRef::None
        }
    }

    fn cover_get(&self, url: &str, data: &Value) -> ImageRef {
        self.poster_get(url, data)
    }
}
