//! Client-side orchestration for the document workbench.
//!
//! The [`Workbench`] owns all UI-visible state and coordinates four
//! workflows (registry refresh, selection/content load, upload, query)
//! against a [`DocumentService`] reached through a command bridge.

pub mod config;
pub mod content;
pub mod error;
pub mod executor;
pub mod http;
pub mod markup;
pub mod query;
pub mod registry;
pub mod selection;
pub mod service;
pub mod token;
pub mod upload;
pub mod workbench;

pub use config::{load_settings, ClientSettings};
pub use content::{ContentRequest, ContentView};
pub use error::{ServiceError, UploadError};
pub use executor::{drive, execute};
pub use http::HttpDocumentService;
pub use markup::{render_markup, RenderedContent};
pub use query::{AnswerState, QueryExchange};
pub use service::{DocumentService, MissingDocumentService};
pub use token::ApplyOutcome;
pub use upload::{PickedFile, UploadPhase};
pub use workbench::{Action, Completion, Effect, UploadDialog, Workbench};

/// Placeholder shown while content or an answer is outstanding.
pub const LOADING_MARKER: &str = "Loading...";

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
