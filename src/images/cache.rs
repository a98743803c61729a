// src/images/cache.rs
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use image::{imageops::FilterType, DynamicImage, GenericImageView};
use reqwest::blocking::Client;
use tracing::warn;

use super::Fetcher;

const IMAGE_RETENTION_DAYS: u64 = 30;
const IMAGE_RETENTION_SECS: u64 = IMAGE_RETENTION_DAYS * 24 * 60 * 60;
const RESIZE_MAX_W: u32 = 780;
const RESIZE_QUALITY: u8 = 82;

pub fn url_to_cache_key(url: &str) -> String {
    format!("{:x}", md5::compute(url.as_bytes()))
}

pub fn poster_cache_dir(base: &Path) -> PathBuf {
    let path = base.join("posters");
    if let Err(e) = fs::create_dir_all(&path) {
        warn!("failed to create poster cache dir {}: {e}", path.display());
        return base.to_path_buf();
    }
    path
}

/// Where a remote image lands in the cache when the caller did not pin a path.
pub fn remote_dest(base: &Path, url: &str) -> PathBuf {
    base.join("posters").join(format!("{}.jpg", url_to_cache_key(url)))
}

/// Remove cached images untouched for longer than the retention window, plus
/// leftovers of interrupted downloads.
pub fn prune_image_cache(dir: &Path) -> std::io::Result<usize> {
    let cutoff = SystemTime::now()
        .checked_sub(Duration::from_secs(IMAGE_RETENTION_SECS))
        .unwrap_or(SystemTime::UNIX_EPOCH);
    let mut removed = 0usize;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase());
        let stale = match ext.as_deref() {
            Some("part") => true,
            Some("png" | "jpg" | "jpeg" | "webp") => {
                let metadata = entry.metadata()?;
                metadata.len() == 0
                    || metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH) < cutoff
            }
            _ => false,
        };
        if stale {
            let _ = fs::remove_file(&path);
            removed += 1;
        }
    }
    Ok(removed)
}

/// Return (width, height, RGBA8 bytes) for an image file.
pub fn load_rgba(path: &Path) -> Result<(u32, u32, Vec<u8>), String> {
    if !path.exists() {
        return Err("not found".into());
    }
    let mut raw = Vec::new();
    fs::File::open(path)
        .and_then(|mut f| f.read_to_end(&mut raw))
        .map_err(|e| format!("read {}: {e}", path.display()))?;
    let img = image::load_from_memory(&raw).map_err(|e| format!("decode {}: {e}", path.display()))?;
    let (w, h) = img.dimensions();
    Ok((w, h, img.to_rgba8().to_vec()))
}

/// Downloads with one pooled reqwest client, resizes to a sane width and
/// stores JPEG at the requested destination.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, String> {
        let client = Client::builder()
            .user_agent("tenfoot/images")
            .timeout(Duration::from_secs(20))
            .pool_max_idle_per_host(8)
            .default_headers({
                use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
                let mut h = HeaderMap::new();
                h.insert(
                    ACCEPT,
                    HeaderValue::from_static("image/avif,image/webp,image/*;q=0.8,*/*;q=0.5"),
                );
                h
            })
            .build()
            .map_err(|e| format!("http client: {e}"))?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<PathBuf, String> {
        if dest.exists() {
            return Ok(dest.to_path_buf());
        }

        let bytes = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.bytes())
            .map_err(|e| format!("download {url}: {e}"))?;

        let img = image::load_from_memory(&bytes).map_err(|e| format!("decode {url}: {e}"))?;

        // Resize if needed, keep aspect
        let (w, h) = img.dimensions();
        let out: DynamicImage = if w > RESIZE_MAX_W {
            let new_h = ((h as f32) * (RESIZE_MAX_W as f32 / w as f32))
                .round()
                .max(1.0) as u32;
            img.resize_exact(RESIZE_MAX_W, new_h, FilterType::CatmullRom)
        } else {
            img
        };

        let mut jpeg_bytes: Vec<u8> = Vec::new();
        {
            let mut encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg_bytes, RESIZE_QUALITY);
            encoder
                .encode_image(&out.to_rgb8())
                .map_err(|e| format!("jpeg encode: {e}"))?;
        }

        if let Some(parent) = dest.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let tmp = dest.with_extension("jpg.part");
        {
            let mut f = fs::File::create(&tmp).map_err(|e| format!("create tmp: {e}"))?;
            f.write_all(&jpeg_bytes)
                .map_err(|e| format!("write: {e}"))?;
        }
        fs::rename(&tmp, dest).map_err(|e| format!("rename: {e}"))?;
        Ok(dest.to_path_buf())
    }
}
