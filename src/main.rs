// src/main.rs
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tenfoot::config::{self, AppConfig};

/// `TENFOOT_RENDERER=glow|wgpu` overrides the platform pick.
fn pick_renderer() -> eframe::Renderer {
    match env::var("TENFOOT_RENDERER").as_deref() {
        Ok("glow") => eframe::Renderer::Glow,
        Ok("wgpu") => eframe::Renderer::Wgpu,
        Ok(other) => {
            warn!("unknown TENFOOT_RENDERER `{other}`; using the platform default");
            platform_renderer()
        }
        Err(_) => platform_renderer(),
    }
}

fn platform_renderer() -> eframe::Renderer {
    #[cfg(target_os = "windows")]
    {
        eframe::Renderer::Wgpu
    }
    #[cfg(not(target_os = "windows"))]
    {
        eframe::Renderer::Glow
    }
}

fn log_startup(config: &AppConfig) {
    info!(
        cache = %config.cache_dir().display(),
        styles = %config.style_db_path().display(),
        workers = config.image_workers,
        "starting tenfoot"
    );
    match &config.catalog_path {
        Some(path) => info!("movie catalog: {path}"),
        None => info!("no catalog.path in {}; Movies module disabled", config::CONFIG_FILE),
    }
    if config.filemanager_roots.is_empty() {
        info!("no filemanager.roots configured; browsing the home directory");
    }
}

fn main() -> eframe::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tenfoot=info,reqwest=warn".into()),
        )
        .try_init();

    let config = config::load_config();
    log_startup(&config);
    let cache_dir = config.cache_dir();

    let options = eframe::NativeOptions {
        renderer: pick_renderer(),
        multisampling: 0,
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("tenfoot")
            .with_inner_size([1280.0, 720.0]),
        ..Default::default()
    };

    match eframe::run_native(
        "tenfoot",
        options,
        Box::new(|_cc| match tenfoot::app::ShellApp::new(config) {
            Ok(app) => Ok(Box::new(app)),
            Err(e) => Err(Box::new(e)),
        }),
    ) {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("tenfoot could not start: {e:?}");
            error!(
                "Hint: switch renderer with TENFOOT_RENDERER=glow or wgpu; \
                 artwork and the style database live in {}, which must be writable.",
                cache_dir.display()
            );
            Err(e)
        }
    }
}
