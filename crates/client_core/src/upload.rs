//! Upload pipeline: `Idle -> Reading -> Encoding -> Uploading -> Idle`.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use shared::{
    domain::RequestToken,
    error::{FailureKind, WorkflowError},
};
use tracing::{debug, info, warn};

use crate::{
    error::{ServiceError, UploadError},
    token::{ApplyOutcome, TokenSequence},
};

const DATA_URI_SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";

/// A file chosen in the upload dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedFile {
    pub path: PathBuf,
    pub name: String,
}

impl PickedFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, UploadError> {
        let path = path.into();
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| UploadError::MissingFileName(path.clone()))?;
        Ok(Self { path, name })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    Reading { file: PickedFile },
    Encoding { file: PickedFile },
    Uploading { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    pub token: RequestToken,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub token: RequestToken,
    pub name: String,
    pub payload_b64: String,
}

/// How an upload settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadSettled {
    /// The service acknowledged; the registry should be refreshed once.
    Succeeded,
    Failed,
    Stale,
}

#[derive(Debug)]
pub struct UploadPipeline {
    phase: UploadPhase,
    tokens: TokenSequence,
    last_error: Option<WorkflowError>,
    last_receipt: Option<String>,
}

impl Default for UploadPipeline {
    fn default() -> Self {
        Self {
            phase: UploadPhase::Idle,
            tokens: TokenSequence::default(),
            last_error: None,
            last_receipt: None,
        }
    }
}

impl UploadPipeline {
    pub fn phase(&self) -> &UploadPhase {
        &self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == UploadPhase::Idle
    }

    /// The visible "in progress" flag: set only while the service call is out.
    pub fn is_uploading(&self) -> bool {
        matches!(self.phase, UploadPhase::Uploading { .. })
    }

    pub fn last_error(&self) -> Option<&WorkflowError> {
        self.last_error.as_ref()
    }

    pub fn last_receipt(&self) -> Option<&str> {
        self.last_receipt.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    /// Accepts a picked file. `None` is a no-op; a submission while another
    /// upload is running is rejected with [`UploadError::Busy`] and leaves the
    /// running upload untouched.
    pub fn submit(&mut self, file: Option<PickedFile>) -> Result<Option<ReadRequest>, UploadError> {
        let Some(file) = file else {
            return Ok(None);
        };
        if !self.is_idle() {
            warn!(name = %file.name, "upload: rejecting submission while busy");
            let err = UploadError::Busy;
            self.last_error = Some(err.clone().into());
            return Err(err);
        }

        let token = self.tokens.issue();
        info!(%token, name = %file.name, "upload: reading file");
        self.last_error = None;
        let request = ReadRequest {
            token,
            path: file.path.clone(),
        };
        self.phase = UploadPhase::Reading { file };
        Ok(Some(request))
    }

    /// Encodes the bytes read for the current upload and moves to `Uploading`.
    /// Read or format failures abort back to `Idle` with no service call.
    pub fn on_file_read(
        &mut self,
        token: RequestToken,
        result: Result<Vec<u8>, UploadError>,
    ) -> Option<UploadRequest> {
        if !self.tokens.is_current(token) {
            debug!(%token, "upload: discarding stale file read");
            return None;
        }
        let UploadPhase::Reading { file } = &self.phase else {
            return None;
        };
        let file = file.clone();

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(err) => {
                self.abort(token, err);
                return None;
            }
        };

        self.phase = UploadPhase::Encoding { file: file.clone() };
        let data_uri = encode_data_uri(&file.path, &bytes);
        let payload_b64 = match strip_data_uri_prefix(&data_uri) {
            Ok(payload) => payload.to_string(),
            Err(err) => {
                self.abort(token, err);
                return None;
            }
        };

        info!(%token, name = %file.name, bytes = bytes.len(), "upload: sending to service");
        self.phase = UploadPhase::Uploading {
            name: file.name.clone(),
        };
        Some(UploadRequest {
            token,
            name: file.name,
            payload_b64,
        })
    }

    /// Returns to `Idle` unconditionally for the current upload.
    pub fn on_upload_finished(
        &mut self,
        token: RequestToken,
        result: Result<String, ServiceError>,
    ) -> UploadSettled {
        if !self.tokens.settle(token) {
            debug!(%token, "upload: discarding stale acknowledgment");
            return UploadSettled::Stale;
        }
        self.phase = UploadPhase::Idle;
        match result {
            Ok(receipt) => {
                info!(%token, "upload: acknowledged: {receipt}");
                self.last_receipt = Some(receipt);
                // A rejected concurrent submit does not outlive the upload it bounced off.
                if self
                    .last_error
                    .as_ref()
                    .is_some_and(|err| err.kind == FailureKind::Busy)
                {
                    self.last_error = None;
                }
                UploadSettled::Succeeded
            }
            Err(err) => {
                warn!(%token, "upload: failed: {err}");
                self.last_error = Some(UploadError::from(err).into());
                UploadSettled::Failed
            }
        }
    }

    fn abort(&mut self, token: RequestToken, err: UploadError) {
        warn!(%token, "upload: aborted: {err}");
        self.tokens.settle(token);
        self.phase = UploadPhase::Idle;
        self.last_error = Some(err.into());
    }
}

/// Frames `bytes` as a `data:<mime>;base64,<payload>` URI.
pub fn encode_data_uri(path: &Path, bytes: &[u8]) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    format!(
        "{DATA_URI_SCHEME}{}{BASE64_MARKER},{}",
        mime.essence_str(),
        STANDARD.encode(bytes)
    )
}

/// Returns the base64 payload of a data URI. Anything not framed as a base64
/// data URI is a format error.
pub fn strip_data_uri_prefix(data_uri: &str) -> Result<&str, UploadError> {
    let rest = data_uri
        .strip_prefix(DATA_URI_SCHEME)
        .ok_or(UploadError::NotDataUri)?;
    let (header, payload) = rest.split_once(',').ok_or(UploadError::NotDataUri)?;
    if !header.ends_with(BASE64_MARKER) {
        return Err(UploadError::NotDataUri);
    }
    Ok(payload)
}

impl From<UploadSettled> for ApplyOutcome {
    fn from(value: UploadSettled) -> Self {
        match value {
            UploadSettled::Stale => ApplyOutcome::Discarded,
            UploadSettled::Succeeded | UploadSettled::Failed => ApplyOutcome::Applied,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note() -> PickedFile {
        PickedFile::from_path("/tmp/note.txt").expect("file name")
    }

    #[test]
    fn none_file_is_a_no_op() {
        let mut pipeline = UploadPipeline::default();
        assert_eq!(pipeline.submit(None), Ok(None));
        assert!(pipeline.is_idle());
        assert!(pipeline.last_error().is_none());
    }

    #[test]
    fn valid_file_walks_every_phase_and_returns_to_idle() {
        let mut pipeline = UploadPipeline::default();
        let read = pipeline.submit(Some(note())).expect("accepted").expect("read");
        assert!(matches!(pipeline.phase(), UploadPhase::Reading { .. }));
        assert!(!pipeline.is_uploading());

        let upload = pipeline
            .on_file_read(read.token, Ok(b"0123456789".to_vec()))
            .expect("upload request");
        assert_eq!(upload.name, "note.txt");
        assert_eq!(upload.payload_b64, STANDARD.encode(b"0123456789"));
        assert!(pipeline.is_uploading());

        let settled = pipeline.on_upload_finished(upload.token, Ok("ok".to_string()));
        assert_eq!(settled, UploadSettled::Succeeded);
        assert!(pipeline.is_idle());
        assert_eq!(pipeline.last_receipt(), Some("ok"));
    }

    #[test]
    fn second_submission_while_uploading_is_rejected() {
        let mut pipeline = UploadPipeline::default();
        let read = pipeline.submit(Some(note())).expect("accepted").expect("read");
        let upload = pipeline
            .on_file_read(read.token, Ok(b"hello".to_vec()))
            .expect("upload request");

        let second = PickedFile::from_path("/tmp/other.txt").expect("name");
        assert_eq!(pipeline.submit(Some(second)), Err(UploadError::Busy));
        assert!(pipeline.is_uploading());
        assert_eq!(
            pipeline.last_error().map(|err| err.kind),
            Some(FailureKind::Busy)
        );

        pipeline.on_upload_finished(upload.token, Ok("ok".to_string()));
        assert!(pipeline.is_idle());
    }

    #[test]
    fn busy_rejection_clears_once_running_upload_succeeds() {
        let mut pipeline = UploadPipeline::default();
        let read = pipeline.submit(Some(note())).expect("accepted").expect("read");
        let upload = pipeline
            .on_file_read(read.token, Ok(b"first".to_vec()))
            .expect("upload request");
        let second = PickedFile::from_path("/tmp/other.txt").expect("name");
        assert_eq!(pipeline.submit(Some(second)), Err(UploadError::Busy));

        let settled = pipeline.on_upload_finished(upload.token, Ok("ok".to_string()));
        assert_eq!(settled, UploadSettled::Succeeded);
        assert!(pipeline.is_idle());
        assert!(pipeline.last_error().is_none());
        assert_eq!(pipeline.last_receipt(), Some("ok"));
    }

    #[test]
    fn unreadable_file_aborts_without_upload() {
        let mut pipeline = UploadPipeline::default();
        let read = pipeline.submit(Some(note())).expect("accepted").expect("read");
        let upload = pipeline.on_file_read(
            read.token,
            Err(UploadError::Unreadable {
                path: read.path.clone(),
                reason: "permission denied".to_string(),
            }),
        );
        assert!(upload.is_none());
        assert!(pipeline.is_idle());
        assert_eq!(
            pipeline.last_error().map(|err| err.kind),
            Some(FailureKind::MalformedInput)
        );
    }

    #[test]
    fn failed_upload_still_returns_to_idle() {
        let mut pipeline = UploadPipeline::default();
        let read = pipeline.submit(Some(note())).expect("accepted").expect("read");
        let upload = pipeline
            .on_file_read(read.token, Ok(Vec::new()))
            .expect("empty files still upload");
        let settled = pipeline.on_upload_finished(
            upload.token,
            Err(ServiceError::Status {
                status: 400,
                body: "no pdf files were uploaded".to_string(),
            }),
        );
        assert_eq!(settled, UploadSettled::Failed);
        assert!(pipeline.is_idle());
        assert!(pipeline.last_error().is_some());
    }

    #[test]
    fn data_uri_prefix_is_stripped() {
        let uri = encode_data_uri(Path::new("note.txt"), b"hi");
        assert_eq!(uri, "data:text/plain;base64,aGk=");
        assert_eq!(strip_data_uri_prefix(&uri), Ok("aGk="));
    }

    #[test]
    fn unknown_extension_falls_back_to_octet_stream() {
        let uri = encode_data_uri(Path::new("blob.zzzunknown"), b"x");
        assert!(uri.starts_with("data:application/octet-stream;base64,"));
    }

    #[test]
    fn non_data_uri_payloads_are_rejected() {
        assert_eq!(strip_data_uri_prefix("aGk="), Err(UploadError::NotDataUri));
        assert_eq!(
            strip_data_uri_prefix("data:text/plain,hi"),
            Err(UploadError::NotDataUri)
        );
        assert_eq!(
            strip_data_uri_prefix("data:text/plain;base64"),
            Err(UploadError::NotDataUri)
        );
    }

    #[test]
    fn path_without_file_name_is_rejected() {
        assert!(matches!(
            PickedFile::from_path("/"),
            Err(UploadError::MissingFileName(_))
        ));
    }
}
