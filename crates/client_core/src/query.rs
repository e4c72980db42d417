use shared::{
    domain::{Document, RequestToken},
    error::{Workflow, WorkflowError},
};
use tracing::{debug, info, warn};

use crate::{
    error::ServiceError,
    token::{ApplyOutcome, TokenSequence},
    LOADING_MARKER,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub token: RequestToken,
    pub document: Document,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerState {
    Pending,
    Answered(String),
    Failed,
}

/// A query and its answer, owned by the document that was in view when the
/// query was submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryExchange {
    pub document: Document,
    pub query: String,
    pub answer: AnswerState,
}

impl QueryExchange {
    pub fn answer_text(&self) -> &str {
        match &self.answer {
            AnswerState::Pending => LOADING_MARKER,
            AnswerState::Answered(text) => text,
            AnswerState::Failed => "",
        }
    }
}

#[derive(Debug, Default)]
pub struct QueryController {
    exchange: Option<QueryExchange>,
    tokens: TokenSequence,
    last_error: Option<WorkflowError>,
}

impl QueryController {
    pub fn exchange(&self) -> Option<&QueryExchange> {
        self.exchange.as_ref()
    }

    pub fn answer_text(&self) -> &str {
        self.exchange
            .as_ref()
            .map(QueryExchange::answer_text)
            .unwrap_or_default()
    }

    pub fn last_error(&self) -> Option<&WorkflowError> {
        self.last_error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    /// Starts a new exchange and supersedes any query still in flight. Blank
    /// queries are ignored.
    pub fn ask(&mut self, document: Document, query: &str) -> Option<QueryRequest> {
        let query = query.trim();
        if query.is_empty() {
            debug!(document = %document, "query: ignoring blank query");
            return None;
        }
        let token = self.tokens.issue();
        info!(%token, document = %document, query_len = query.len(), "query: issued");
        self.last_error = None;
        self.exchange = Some(QueryExchange {
            document: document.clone(),
            query: query.to_string(),
            answer: AnswerState::Pending,
        });
        Some(QueryRequest {
            token,
            document,
            query: query.to_string(),
        })
    }

    /// Drops the visible exchange and retires any query in flight.
    pub fn clear(&mut self) {
        self.tokens.invalidate();
        self.exchange = None;
        self.last_error = None;
    }

    pub fn apply(
        &mut self,
        token: RequestToken,
        result: Result<String, ServiceError>,
    ) -> ApplyOutcome {
        if !self.tokens.settle(token) {
            debug!(%token, "query: discarding superseded answer");
            return ApplyOutcome::Discarded;
        }
        let Some(exchange) = self.exchange.as_mut() else {
            return ApplyOutcome::Discarded;
        };
        match result {
            Ok(answer) => {
                info!(
                    %token,
                    document = %exchange.document,
                    bytes = answer.len(),
                    "query: answered"
                );
                exchange.answer = AnswerState::Answered(answer);
            }
            Err(err) => {
                warn!(%token, document = %exchange.document, "query: failed: {err}");
                exchange.answer = AnswerState::Failed;
                self.last_error = Some(err.into_workflow_error(Workflow::Query));
            }
        }
        ApplyOutcome::Applied
    }
}
