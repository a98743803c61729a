// src/app/gfx.rs
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use eframe::egui::{self as eg, ColorImage, TextureHandle};
use tracing::{debug, warn};

use crate::images::cache::load_rgba;

/// Decodes per frame; the rest waits for the next repaint.
pub const MAX_UPLOADS_PER_FRAME: usize = 4;

/// Upload an RGBA image to a GPU texture. (UI thread only)
pub fn upload_rgba(
    ctx: &eg::Context,
    w: u32,
    h: u32,
    bytes: &[u8],
    name: &str,
) -> TextureHandle {
    let img = ColorImage::from_rgba_unmultiplied([w as usize, h as usize], bytes);
    ctx.load_texture(name.to_string(), img, eg::TextureOptions::LINEAR)
}

/// Textures keyed by the file they were decoded from. `None` marks a file
/// that failed to decode so it is not retried every frame.
#[derive(Default)]
pub struct TextureCache {
    map: HashMap<PathBuf, Option<TextureHandle>>,
    uploads_this_frame: usize,
}

impl TextureCache {
    pub fn begin_frame(&mut self) {
        self.uploads_this_frame = 0;
    }

    /// Texture for `path`, decoding it if the frame budget allows.
    pub fn get(&mut self, ctx: &eg::Context, path: &Path) -> Option<TextureHandle> {
        if let Some(slot) = self.map.get(path) {
            return slot.clone();
        }
        if self.uploads_this_frame >= MAX_UPLOADS_PER_FRAME {
            ctx.request_repaint();
            return None;
        }
        self.uploads_this_frame += 1;
        let slot = match load_rgba(path) {
            Ok((w, h, bytes)) => {
                debug!("texture upload {} ({w}x{h})", path.display());
                Some(upload_rgba(ctx, w, h, &bytes, &path.to_string_lossy()))
            }
            Err(e) => {
                warn!("texture decode failed for {}: {e}", path.display());
                None
            }
        };
        self.map.insert(path.to_path_buf(), slot.clone());
        slot
    }
}

/// Glyph painted for an icon key when no artwork is available.
pub fn icon_glyph(key: &str) -> &'static str {
    match key.rsplit('/').next().unwrap_or(key) {
        "back" => "⬅",
        "folder" => "📁",
        "file" => "📄",
        "image" => "🖼",
        "movie" => "🎬",
        "star" => "★",
        _ => "•",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_keys_map_to_glyphs() {
        assert_eq!(icon_glyph("icon/folder"), "📁");
        assert_eq!(icon_glyph("back"), "⬅");
        assert_eq!(icon_glyph("icon/unknown"), "•");
    }
}
