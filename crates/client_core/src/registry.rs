use shared::{
    domain::{Document, RequestToken},
    error::{Workflow, WorkflowError},
};
use tracing::{debug, info, warn};

use crate::{
    error::ServiceError,
    token::{ApplyOutcome, TokenSequence},
};

/// Client-held snapshot of the documents known to the service.
#[derive(Debug, Default)]
pub struct DocumentRegistry {
    documents: Vec<Document>,
    tokens: TokenSequence,
    last_error: Option<WorkflowError>,
}

impl DocumentRegistry {
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn contains(&self, document: &Document) -> bool {
        self.documents.contains(document)
    }

    pub fn is_refreshing(&self) -> bool {
        self.tokens.is_pending()
    }

    pub fn last_error(&self) -> Option<&WorkflowError> {
        self.last_error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    pub fn begin_refresh(&mut self) -> RequestToken {
        let token = self.tokens.issue();
        info!(%token, "registry: refresh issued");
        token
    }

    /// Replaces the snapshot wholesale on success. On failure the previous
    /// snapshot is kept and the error is retained for display.
    pub fn apply_refresh(
        &mut self,
        token: RequestToken,
        result: Result<Vec<Document>, ServiceError>,
    ) -> ApplyOutcome {
        if !self.tokens.settle(token) {
            debug!(%token, "registry: discarding stale refresh");
            return ApplyOutcome::Discarded;
        }
        match result {
            Ok(documents) => {
                info!(%token, count = documents.len(), "registry: refreshed");
                self.documents = documents;
                self.last_error = None;
            }
            Err(err) => {
                warn!(%token, "registry: refresh failed: {err}");
                self.last_error = Some(err.into_workflow_error(Workflow::Registry));
            }
        }
        ApplyOutcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(names: &[&str]) -> Vec<Document> {
        names.iter().copied().map(Document::new).collect()
    }

    #[test]
    fn refresh_replaces_snapshot_in_service_order() {
        let mut registry = DocumentRegistry::default();
        let token = registry.begin_refresh();
        registry.apply_refresh(token, Ok(docs(&["c.pdf", "a.pdf", "b.pdf"])));
        assert_eq!(registry.documents(), docs(&["c.pdf", "a.pdf", "b.pdf"]).as_slice());

        let token = registry.begin_refresh();
        registry.apply_refresh(token, Ok(Vec::new()));
        assert!(registry.documents().is_empty());
    }

    #[test]
    fn failed_refresh_keeps_previous_snapshot_and_surfaces_error() {
        let mut registry = DocumentRegistry::default();
        let token = registry.begin_refresh();
        registry.apply_refresh(token, Ok(docs(&["a.txt"])));

        let token = registry.begin_refresh();
        let outcome = registry.apply_refresh(
            token,
            Err(ServiceError::Transport("connection refused".to_string())),
        );
        assert_eq!(outcome, ApplyOutcome::Applied);
        assert_eq!(registry.documents(), docs(&["a.txt"]).as_slice());
        let err = registry.last_error().expect("error retained");
        assert_eq!(err.workflow, Workflow::Registry);

        registry.dismiss_error();
        assert!(registry.last_error().is_none());
    }

    #[test]
    fn older_refresh_completing_late_is_discarded() {
        let mut registry = DocumentRegistry::default();
        let older = registry.begin_refresh();
        let newer = registry.begin_refresh();
        registry.apply_refresh(newer, Ok(docs(&["new.pdf"])));
        let outcome = registry.apply_refresh(older, Ok(docs(&["old.pdf"])));
        assert_eq!(outcome, ApplyOutcome::Discarded);
        assert_eq!(registry.documents(), docs(&["new.pdf"]).as_slice());
        assert!(!registry.is_refreshing());
    }
}
