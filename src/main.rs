use anyhow::{anyhow, Result};
use eframe::egui::ViewportBuilder;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod cache;
mod config;
mod feed;
mod grouping;
mod interstitial;
mod models;
mod settings;
mod tabnews_client;
mod theme;
mod view_state;

use crate::app::TabTokApp;
use crate::config::AppConfig;
use crate::settings::{Settings, SettingsStore};
use crate::tabnews_client::TabNewsClient;

fn init_logging() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tabtok=info")))
        .init();
}

fn open_settings(config: &AppConfig) -> Result<(SettingsStore, Settings)> {
    let store = match SettingsStore::open(&config.settings_path()) {
        Ok(store) => store,
        Err(e) => {
            warn!(error = %e, "settings database unavailable, preferences will not be saved");
            SettingsStore::in_memory()?
        }
    };

    let settings = store.load().unwrap_or_else(|e| {
        warn!(error = %e, "failed to read settings, using defaults");
        Settings::default()
    });
    Ok((store, settings))
}

fn main() -> Result<()> {
    init_logging();

    let config = AppConfig::from_env()?;
    info!(api = %config.api_base_url, "starting TabTok");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("tabtok-net")
        .enable_all()
        .build()?;
    let client = TabNewsClient::new(&config)?;
    let (store, settings) = open_settings(&config)?;

    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([1000.0, 800.0])
            .with_min_inner_size([480.0, 600.0])
            .with_title("TabTok"),
        ..Default::default()
    };

    let runtime = Arc::new(runtime);
    eframe::run_native(
        "TabTok",
        options,
        Box::new(move |_cc| Ok(Box::new(TabTokApp::new(config, client, runtime, store, settings)))),
    )
    .map_err(|e| anyhow!("UI error: {}", e))
}
