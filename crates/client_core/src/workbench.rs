//! Root orchestrator: the single owner and mutator of UI-visible state.
//!
//! User intents arrive as [`Action`]s and bridge results as [`Completion`]s.
//! Both return the [`Effect`]s the caller must perform; the workbench itself
//! never does I/O, so every transition is synchronous and testable.

use std::path::PathBuf;

use shared::{
    domain::{Document, RequestToken},
    error::{Workflow, WorkflowError},
};
use tracing::debug;

use crate::{
    content::ContentLoader,
    error::{ServiceError, UploadError},
    query::QueryController,
    registry::DocumentRegistry,
    selection::SelectionController,
    upload::{PickedFile, UploadPipeline, UploadSettled},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Mount,
    RefreshDocuments,
    Select(Option<Document>),
    OpenUploadDialog,
    CloseUploadDialog,
    PickUploadFile(PickedFile),
    ConfirmUpload,
    SubmitQuery(String),
    RetryContent,
    ClearQuery,
    DismissNotice(Workflow),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ListDocuments {
        token: RequestToken,
    },
    FetchContent {
        token: RequestToken,
        document: Document,
    },
    ProcessQuery {
        token: RequestToken,
        document: Document,
        query: String,
    },
    ReadFile {
        token: RequestToken,
        path: PathBuf,
    },
    UploadDocument {
        token: RequestToken,
        name: String,
        payload_b64: String,
    },
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ListDocuments { .. } => "list_documents",
            Self::FetchContent { .. } => "fetch_content",
            Self::ProcessQuery { .. } => "process_query",
            Self::ReadFile { .. } => "read_file",
            Self::UploadDocument { .. } => "upload_document",
        }
    }

    pub fn token(&self) -> RequestToken {
        match self {
            Self::ListDocuments { token }
            | Self::FetchContent { token, .. }
            | Self::ProcessQuery { token, .. }
            | Self::ReadFile { token, .. }
            | Self::UploadDocument { token, .. } => *token,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    DocumentsListed {
        token: RequestToken,
        result: Result<Vec<Document>, ServiceError>,
    },
    ContentFetched {
        token: RequestToken,
        result: Result<String, ServiceError>,
    },
    QueryAnswered {
        token: RequestToken,
        result: Result<String, ServiceError>,
    },
    FileRead {
        token: RequestToken,
        result: Result<Vec<u8>, UploadError>,
    },
    UploadFinished {
        token: RequestToken,
        result: Result<String, ServiceError>,
    },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UploadDialog {
    open: bool,
    picked: Option<PickedFile>,
}

impl UploadDialog {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn picked(&self) -> Option<&PickedFile> {
        self.picked.as_ref()
    }
}

#[derive(Debug, Default)]
pub struct Workbench {
    registry: DocumentRegistry,
    selection: SelectionController,
    content: ContentLoader,
    upload: UploadPipeline,
    query: QueryController,
    dialog: UploadDialog,
    mounted: bool,
}

impl Workbench {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    pub fn documents(&self) -> &[Document] {
        self.registry.documents()
    }

    pub fn selected(&self) -> Option<&Document> {
        self.selection.selected()
    }

    pub fn content(&self) -> &ContentLoader {
        &self.content
    }

    pub fn upload(&self) -> &UploadPipeline {
        &self.upload
    }

    pub fn query(&self) -> &QueryController {
        &self.query
    }

    pub fn upload_dialog(&self) -> &UploadDialog {
        &self.dialog
    }

    pub fn is_uploading(&self) -> bool {
        self.upload.is_uploading()
    }

    /// The dismissible notice shown on `workflow`'s panel, if any.
    pub fn notice(&self, workflow: Workflow) -> Option<&WorkflowError> {
        match workflow {
            Workflow::Registry => self.registry.last_error(),
            Workflow::Content => self.content.last_error(),
            Workflow::Query => self.query.last_error(),
            Workflow::Upload => self.upload.last_error(),
        }
    }

    pub fn dispatch(&mut self, action: Action) -> Vec<Effect> {
        debug!(?action, "workbench: action");
        match action {
            Action::Mount => {
                if self.mounted {
                    return Vec::new();
                }
                self.mounted = true;
                self.refresh()
            }
            Action::RefreshDocuments => self.refresh(),
            Action::Select(document) => {
                if let Some(document) = &document {
                    if !self.registry.contains(document) {
                        debug!(
                            document = %document,
                            "workbench: selecting document outside current snapshot"
                        );
                    }
                }
                let change = self.selection.select(document);
                self.content
                    .on_selection_change(&change)
                    .map(|request| Effect::FetchContent {
                        token: request.token,
                        document: request.document,
                    })
                    .into_iter()
                    .collect()
            }
            Action::RetryContent => self
                .content
                .retry()
                .map(|request| Effect::FetchContent {
                    token: request.token,
                    document: request.document,
                })
                .into_iter()
                .collect(),
            Action::OpenUploadDialog => {
                self.dialog.open = true;
                Vec::new()
            }
            Action::CloseUploadDialog => {
                self.dialog = UploadDialog::default();
                Vec::new()
            }
            Action::PickUploadFile(file) => {
                self.dialog.picked = Some(file);
                Vec::new()
            }
            Action::ConfirmUpload => {
                let picked = self.dialog.picked.take();
                self.dialog.open = false;
                match self.upload.submit(picked) {
                    Ok(Some(read)) => vec![Effect::ReadFile {
                        token: read.token,
                        path: read.path,
                    }],
                    Ok(None) | Err(_) => Vec::new(),
                }
            }
            Action::SubmitQuery(query) => {
                let Some(document) = self.selection.selected().cloned() else {
                    debug!("workbench: query submitted without a selected document");
                    return Vec::new();
                };
                self.query
                    .ask(document, &query)
                    .map(|request| Effect::ProcessQuery {
                        token: request.token,
                        document: request.document,
                        query: request.query,
                    })
                    .into_iter()
                    .collect()
            }
            Action::ClearQuery => {
                self.query.clear();
                Vec::new()
            }
            Action::DismissNotice(workflow) => {
                match workflow {
                    Workflow::Registry => self.registry.dismiss_error(),
                    Workflow::Content => self.content.dismiss_error(),
                    Workflow::Query => self.query.dismiss_error(),
                    Workflow::Upload => self.upload.dismiss_error(),
                }
                Vec::new()
            }
        }
    }

    pub fn complete(&mut self, completion: Completion) -> Vec<Effect> {
        match completion {
            Completion::DocumentsListed { token, result } => {
                self.registry.apply_refresh(token, result);
                Vec::new()
            }
            Completion::ContentFetched { token, result } => {
                self.content.apply(token, result);
                Vec::new()
            }
            Completion::QueryAnswered { token, result } => {
                self.query.apply(token, result);
                Vec::new()
            }
            Completion::FileRead { token, result } => self
                .upload
                .on_file_read(token, result)
                .map(|request| Effect::UploadDocument {
                    token: request.token,
                    name: request.name,
                    payload_b64: request.payload_b64,
                })
                .into_iter()
                .collect(),
            Completion::UploadFinished { token, result } => {
                match self.upload.on_upload_finished(token, result) {
                    UploadSettled::Succeeded => self.refresh(),
                    UploadSettled::Failed | UploadSettled::Stale => Vec::new(),
                }
            }
        }
    }

    fn refresh(&mut self) -> Vec<Effect> {
        vec![Effect::ListDocuments {
            token: self.registry.begin_refresh(),
        }]
    }
}
