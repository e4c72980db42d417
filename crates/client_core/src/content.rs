use shared::{
    domain::{Document, RequestToken},
    error::{Workflow, WorkflowError},
};
use tracing::{debug, info, warn};

use crate::{
    error::ServiceError,
    selection::SelectionChange,
    token::{ApplyOutcome, TokenSequence},
    LOADING_MARKER,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequest {
    pub token: RequestToken,
    pub document: Document,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentView {
    Empty,
    Loading { document: Document },
    Ready { document: Document, markup: String },
    Unavailable { document: Document },
}

impl ContentView {
    pub fn document(&self) -> Option<&Document> {
        match self {
            Self::Empty => None,
            Self::Loading { document }
            | Self::Ready { document, .. }
            | Self::Unavailable { document } => Some(document),
        }
    }

    /// Text shown in the content pane: the loading marker while a fetch is
    /// outstanding, the markup once it arrives.
    pub fn text(&self) -> &str {
        match self {
            Self::Loading { .. } => LOADING_MARKER,
            Self::Ready { markup, .. } => markup,
            Self::Empty | Self::Unavailable { .. } => "",
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}

#[derive(Debug)]
pub struct ContentLoader {
    view: ContentView,
    tokens: TokenSequence,
    last_error: Option<WorkflowError>,
}

impl Default for ContentLoader {
    fn default() -> Self {
        Self {
            view: ContentView::Empty,
            tokens: TokenSequence::default(),
            last_error: None,
        }
    }
}

impl ContentLoader {
    pub fn view(&self) -> &ContentView {
        &self.view
    }

    pub fn last_error(&self) -> Option<&WorkflowError> {
        self.last_error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    /// Shows the loading marker synchronously and returns the single fetch to
    /// issue. Clearing the selection retires any outstanding fetch.
    pub fn on_selection_change(&mut self, change: &SelectionChange) -> Option<ContentRequest> {
        self.last_error = None;
        match change {
            SelectionChange::Selected(document) => Some(self.load(document.clone())),
            SelectionChange::Cleared => {
                self.tokens.invalidate();
                self.view = ContentView::Empty;
                None
            }
        }
    }

    /// Re-issues the fetch for the document currently in view.
    pub fn retry(&mut self) -> Option<ContentRequest> {
        let document = self.view.document()?.clone();
        self.last_error = None;
        Some(self.load(document))
    }

    fn load(&mut self, document: Document) -> ContentRequest {
        let token = self.tokens.issue();
        info!(%token, document = %document, "content: fetch issued");
        self.view = ContentView::Loading {
            document: document.clone(),
        };
        ContentRequest { token, document }
    }

    pub fn apply(
        &mut self,
        token: RequestToken,
        result: Result<String, ServiceError>,
    ) -> ApplyOutcome {
        if !self.tokens.settle(token) {
            debug!(%token, "content: discarding stale response");
            return ApplyOutcome::Discarded;
        }
        let ContentView::Loading { document } = &self.view else {
            debug!(%token, "content: no fetch outstanding");
            return ApplyOutcome::Discarded;
        };
        let document = document.clone();
        match result {
            Ok(markup) => {
                info!(%token, document = %document, bytes = markup.len(), "content: loaded");
                self.view = ContentView::Ready { document, markup };
            }
            Err(err) => {
                warn!(%token, document = %document, "content: fetch failed: {err}");
                self.last_error = Some(err.into_workflow_error(Workflow::Content));
                self.view = ContentView::Unavailable { document };
            }
        }
        ApplyOutcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(loader: &mut ContentLoader, name: &str) -> ContentRequest {
        loader
            .on_selection_change(&SelectionChange::Selected(Document::new(name)))
            .expect("fetch issued")
    }

    #[test]
    fn selection_shows_loading_marker_before_fetch_resolves() {
        let mut loader = ContentLoader::default();
        let request = select(&mut loader, "a.txt");
        assert_eq!(request.document, Document::new("a.txt"));
        assert!(loader.view().is_loading());
        assert_eq!(loader.view().text(), LOADING_MARKER);
    }

    #[test]
    fn late_response_for_earlier_selection_is_discarded() {
        let mut loader = ContentLoader::default();
        let a = select(&mut loader, "a.txt");
        let b = select(&mut loader, "b.txt");

        assert_eq!(
            loader.apply(b.token, Ok("<p>b</p>".to_string())),
            ApplyOutcome::Applied
        );
        assert_eq!(
            loader.apply(a.token, Ok("<p>a</p>".to_string())),
            ApplyOutcome::Discarded
        );
        assert_eq!(
            loader.view(),
            &ContentView::Ready {
                document: Document::new("b.txt"),
                markup: "<p>b</p>".to_string()
            }
        );
    }

    #[test]
    fn clearing_selection_discards_outstanding_fetch() {
        let mut loader = ContentLoader::default();
        let a = select(&mut loader, "a.txt");
        assert!(loader.on_selection_change(&SelectionChange::Cleared).is_none());
        assert_eq!(
            loader.apply(a.token, Ok("late".to_string())),
            ApplyOutcome::Discarded
        );
        assert_eq!(loader.view(), &ContentView::Empty);
    }

    #[test]
    fn failure_is_surfaced_and_retry_refetches_same_document() {
        let mut loader = ContentLoader::default();
        let a = select(&mut loader, "a.txt");
        loader.apply(
            a.token,
            Err(ServiceError::Status {
                status: 404,
                body: "missing".to_string(),
            }),
        );
        assert_eq!(
            loader.view(),
            &ContentView::Unavailable {
                document: Document::new("a.txt")
            }
        );
        assert_eq!(
            loader.last_error().map(|err| err.workflow),
            Some(Workflow::Content)
        );

        let retry = loader.retry().expect("retry issued");
        assert_eq!(retry.document, Document::new("a.txt"));
        assert!(retry.token > a.token);
        assert!(loader.last_error().is_none());
        assert!(loader.view().is_loading());
    }

    #[test]
    fn retry_without_document_issues_nothing() {
        let mut loader = ContentLoader::default();
        assert!(loader.retry().is_none());
    }
}
