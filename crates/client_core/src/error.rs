use std::path::PathBuf;

use shared::error::{FailureKind, Workflow, WorkflowError};
use thiserror::Error;

/// Failure of a single command-bridge call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("service responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid upload payload: {0}")]
    InvalidPayload(String),
    #[error("document service is not configured")]
    Unavailable,
}

impl ServiceError {
    pub fn into_workflow_error(self, workflow: Workflow) -> WorkflowError {
        let kind = match &self {
            Self::InvalidPayload(_) => FailureKind::MalformedInput,
            _ => FailureKind::Transport,
        };
        WorkflowError::new(workflow, kind, self.to_string())
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Transport(value.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("an upload is already in progress")]
    Busy,
    #[error("failed to read '{}': {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },
    #[error("payload is not a base64 data URI")]
    NotDataUri,
    #[error("'{}' has no usable file name", .0.display())]
    MissingFileName(PathBuf),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl From<UploadError> for WorkflowError {
    fn from(value: UploadError) -> Self {
        match value {
            UploadError::Service(err) => err.into_workflow_error(Workflow::Upload),
            UploadError::Busy => {
                WorkflowError::new(Workflow::Upload, FailureKind::Busy, value.to_string())
            }
            other => WorkflowError::new(
                Workflow::Upload,
                FailureKind::MalformedInput,
                other.to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_payload_maps_to_malformed_input() {
        let err = ServiceError::InvalidPayload("bad base64".to_string())
            .into_workflow_error(Workflow::Upload);
        assert_eq!(err.kind, FailureKind::MalformedInput);
    }

    #[test]
    fn status_errors_map_to_transport() {
        let err = ServiceError::Status {
            status: 500,
            body: "boom".to_string(),
        }
        .into_workflow_error(Workflow::Content);
        assert_eq!(err.kind, FailureKind::Transport);
        assert_eq!(err.workflow, Workflow::Content);
        assert!(err.message.contains("500"));
    }

    #[test]
    fn busy_upload_maps_to_busy_kind() {
        let err: WorkflowError = UploadError::Busy.into();
        assert_eq!(err.kind, FailureKind::Busy);
        assert_eq!(err.workflow, Workflow::Upload);
    }

    #[test]
    fn unreadable_file_maps_to_malformed_input() {
        let err: WorkflowError = UploadError::Unreadable {
            path: PathBuf::from("/tmp/missing.txt"),
            reason: "not found".to_string(),
        }
        .into();
        assert_eq!(err.kind, FailureKind::MalformedInput);
        assert!(err.message.contains("missing.txt"));
    }
}
