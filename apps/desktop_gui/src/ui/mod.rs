//! UI layer for desktop GUI: app shell and panels.

pub mod app;

pub use app::{DesktopGuiApp, StartupConfig};
