use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The four coordinated workflows; each owns one panel's notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workflow {
    Registry,
    Content,
    Query,
    Upload,
}

impl Workflow {
    pub fn label(self) -> &'static str {
        match self {
            Self::Registry => "document list",
            Self::Content => "content",
            Self::Query => "query",
            Self::Upload => "upload",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The command bridge or the service failed.
    Transport,
    /// Local input could not be turned into a request (unreadable file, bad payload).
    MalformedInput,
    /// The workflow was already running and rejected a re-entrant request.
    Busy,
}

/// A failure reported back to the orchestrator for one workflow.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{} failed: {message}", .workflow.label())]
pub struct WorkflowError {
    pub workflow: Workflow,
    pub kind: FailureKind,
    pub message: String,
}

impl WorkflowError {
    pub fn new(workflow: Workflow, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            workflow,
            kind,
            message: message.into(),
        }
    }

    pub fn transport(workflow: Workflow, message: impl Into<String>) -> Self {
        Self::new(workflow, FailureKind::Transport, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.kind != FailureKind::MalformedInput
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_workflow() {
        let err = WorkflowError::transport(Workflow::Query, "connection refused");
        assert_eq!(err.to_string(), "query failed: connection refused");
        assert!(err.is_retryable());
    }

    #[test]
    fn malformed_input_is_not_retryable_as_is() {
        let err = WorkflowError::new(
            Workflow::Upload,
            FailureKind::MalformedInput,
            "not a data URI",
        );
        assert!(!err.is_retryable());
    }
}
