use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    drive, load_settings, render_markup, Action, ContentView, DocumentService,
    HttpDocumentService, PickedFile, Workbench,
};
use shared::{
    domain::Document,
    error::{Workflow, WorkflowError},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "documind_cli", about = "Command-line client for the document service")]
struct Args {
    /// Backend base URL; overrides the config file and environment.
    #[arg(long)]
    backend_url: Option<String>,
    /// Path to a TOML settings file (defaults to ./documind.toml when present).
    #[arg(long, env = "DOCUMIND_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print document names in service order.
    List,
    /// Print a document's content as plain text.
    Show { name: String },
    /// Ask a question about a document.
    Ask {
        name: String,
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Upload a file and print the refreshed document list.
    Upload { path: PathBuf },
}

fn settled(workbench: &Workbench, workflow: Workflow) -> Result<(), WorkflowError> {
    match workbench.notice(workflow) {
        Some(err) => Err(err.clone()),
        None => Ok(()),
    }
}

fn document_names(workbench: &Workbench) -> Vec<String> {
    workbench
        .documents()
        .iter()
        .map(|doc| doc.name().to_string())
        .collect()
}

async fn run(
    command: Command,
    service: &dyn DocumentService,
) -> Result<Vec<String>, WorkflowError> {
    let mut workbench = Workbench::new();
    match command {
        Command::List => {
            let effects = workbench.dispatch(Action::Mount);
            drive(&mut workbench, service, effects).await;
            settled(&workbench, Workflow::Registry)?;
            Ok(document_names(&workbench))
        }
        Command::Show { name } => {
            let effects = workbench.dispatch(Action::Select(Some(Document::new(name))));
            drive(&mut workbench, service, effects).await;
            settled(&workbench, Workflow::Content)?;
            let text = match workbench.content().view() {
                ContentView::Ready { markup, .. } => render_markup(markup).plain_text(),
                _ => String::new(),
            };
            Ok(vec![text])
        }
        Command::Ask { name, query } => {
            let effects = workbench.dispatch(Action::Select(Some(Document::new(name))));
            drive(&mut workbench, service, effects).await;
            settled(&workbench, Workflow::Content)?;
            let effects = workbench.dispatch(Action::SubmitQuery(query.join(" ")));
            drive(&mut workbench, service, effects).await;
            settled(&workbench, Workflow::Query)?;
            Ok(vec![workbench.query().answer_text().to_string()])
        }
        Command::Upload { path } => {
            let file = PickedFile::from_path(path).map_err(WorkflowError::from)?;
            let mut effects = workbench.dispatch(Action::PickUploadFile(file));
            effects.extend(workbench.dispatch(Action::ConfirmUpload));
            drive(&mut workbench, service, effects).await;
            settled(&workbench, Workflow::Upload)?;
            settled(&workbench, Workflow::Registry)?;

            let mut lines: Vec<String> = workbench
                .upload()
                .last_receipt()
                .map(str::to_string)
                .into_iter()
                .collect();
            lines.extend(document_names(&workbench));
            Ok(lines)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref()).context("failed to load settings")?;
    if let Some(url) = args.backend_url {
        settings = settings
            .with_backend_url(url)
            .context("invalid --backend-url")?;
    }
    tracing::debug!(backend_url = %settings.backend_url, "using backend");

    let service = HttpDocumentService::new(&settings);
    for line in run(args.command, &service).await? {
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use client_core::ServiceError;
    use shared::error::FailureKind;

    use super::*;

    struct FixedService;

    #[async_trait]
    impl DocumentService for FixedService {
        async fn list_documents(&self) -> Result<Vec<Document>, ServiceError> {
            Ok(vec![Document::new("beta"), Document::new("alpha")])
        }

        async fn upload_document(
            &self,
            _name: &str,
            _payload_b64: &str,
        ) -> Result<String, ServiceError> {
            Err(ServiceError::Status {
                status: 500,
                body: "disk full".to_string(),
            })
        }

        async fn fetch_content(&self, document: &Document) -> Result<String, ServiceError> {
            if document.name() == "missing" {
                return Err(ServiceError::Status {
                    status: 404,
                    body: "File not found or cannot be read.".to_string(),
                });
            }
            Ok(format!(
                "<p>{} has an <span class='highlight'>important</span> note</p>",
                document.name()
            ))
        }

        async fn process_query(
            &self,
            document: &Document,
            query: &str,
        ) -> Result<String, ServiceError> {
            Ok(format!("{} -> {query}", document.name()))
        }
    }

    #[tokio::test]
    async fn list_prints_names_in_service_order() {
        let lines = run(Command::List, &FixedService).await.expect("list");
        assert_eq!(lines, vec!["beta".to_string(), "alpha".to_string()]);
    }

    #[tokio::test]
    async fn show_prints_plain_text() {
        let lines = run(
            Command::Show {
                name: "report".to_string(),
            },
            &FixedService,
        )
        .await
        .expect("show");
        assert_eq!(lines, vec!["report has an important note".to_string()]);
    }

    #[tokio::test]
    async fn ask_joins_query_words() {
        let lines = run(
            Command::Ask {
                name: "report".to_string(),
                query: vec!["what".to_string(), "changed?".to_string()],
            },
            &FixedService,
        )
        .await
        .expect("ask");
        assert_eq!(lines, vec!["report -> what changed?".to_string()]);
    }

    #[tokio::test]
    async fn ask_about_unknown_document_reports_content_failure() {
        let err = run(
            Command::Ask {
                name: "missing".to_string(),
                query: vec!["anything?".to_string()],
            },
            &FixedService,
        )
        .await
        .expect_err("must fail");
        assert_eq!(err.workflow, Workflow::Content);
        assert_eq!(err.kind, FailureKind::Transport);
    }

    #[tokio::test]
    async fn missing_upload_file_is_malformed_input() {
        let err = run(
            Command::Upload {
                path: std::env::temp_dir().join("documind_cli_absent_upload.txt"),
            },
            &FixedService,
        )
        .await
        .expect_err("must fail");
        assert_eq!(err.workflow, Workflow::Upload);
        assert_eq!(err.kind, FailureKind::MalformedInput);
    }

    #[test]
    fn ask_requires_a_query() {
        assert!(Args::try_parse_from(["documind_cli", "ask", "report"]).is_err());
    }
}
