use std::path::PathBuf;

mod backend_bridge;
mod controller;
mod ui;

use anyhow::Context;
use clap::Parser;
use client_core::{load_settings, ClientSettings};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use backend_bridge::commands::BackendCommand;
use controller::events::UiEvent;
use ui::{DesktopGuiApp, StartupConfig};

#[derive(Parser, Debug)]
#[command(
    name = "documind_desktop",
    about = "Desktop workbench for browsing and querying documents"
)]
struct Args {
    /// Backend base URL; overrides the config file and environment.
    #[arg(long)]
    backend_url: Option<String>,
    /// Path to a TOML settings file (defaults to ./documind.toml when present).
    #[arg(long, env = "DOCUMIND_CONFIG")]
    config: Option<PathBuf>,
}

fn resolve_settings(args: &Args) -> anyhow::Result<ClientSettings> {
    let settings = load_settings(args.config.as_deref()).context("failed to load settings")?;
    match &args.backend_url {
        Some(url) => settings
            .with_backend_url(url.as_str())
            .context("invalid --backend-url"),
        None => Ok(settings),
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let settings = resolve_settings(&args);
    let startup = match &settings {
        Ok(settings) => StartupConfig {
            backend_url: settings.backend_url.clone(),
        },
        Err(err) => {
            tracing::error!("{err:#}");
            StartupConfig {
                backend_url: args.backend_url.clone().unwrap_or_default(),
            }
        }
    };

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(cmd_rx, ui_tx, settings);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("DocuMind")
            .with_inner_size([1180.0, 760.0])
            .with_min_inner_size([820.0, 520.0]),
        ..Default::default()
    };
    eframe::run_native(
        "DocuMind",
        options,
        Box::new(|_cc| Ok(Box::new(DesktopGuiApp::bootstrap(cmd_tx, ui_rx, startup)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_url_flag_overrides_loaded_settings() {
        let args = Args::parse_from([
            "documind_desktop",
            "--backend-url",
            "http://docs.internal:8080/",
        ]);
        let settings = resolve_settings(&args).expect("settings");
        assert_eq!(settings.backend_url, "http://docs.internal:8080");
    }

    #[test]
    fn invalid_backend_url_flag_is_rejected() {
        let args = Args::parse_from(["documind_desktop", "--backend-url", "ftp://docs"]);
        let err = resolve_settings(&args).expect_err("must fail");
        assert!(format!("{err:#}").contains("--backend-url"));
    }
}
