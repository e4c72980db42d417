//! The command bridge to the document and query service.

use async_trait::async_trait;
use shared::domain::Document;

use crate::error::ServiceError;

/// Request/response contract with the remote document and query service.
///
/// Every call is remote and fallible. Implementations must not apply any
/// client-side timeout; whatever the transport provides is the policy.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Full, ordered listing of ingested documents.
    async fn list_documents(&self) -> Result<Vec<Document>, ServiceError>;

    /// Submits a base64 payload (no data-URI prefix) under `name` and returns
    /// the service acknowledgment.
    async fn upload_document(&self, name: &str, payload_b64: &str) -> Result<String, ServiceError>;

    /// Raw content markup for `document`.
    async fn fetch_content(&self, document: &Document) -> Result<String, ServiceError>;

    /// Answer to a natural-language `query` scoped to `document`.
    async fn process_query(&self, document: &Document, query: &str)
        -> Result<String, ServiceError>;
}

/// Bridge used until a backend is configured.
pub struct MissingDocumentService;

#[async_trait]
impl DocumentService for MissingDocumentService {
    async fn list_documents(&self) -> Result<Vec<Document>, ServiceError> {
        Err(ServiceError::Unavailable)
    }

    async fn upload_document(
        &self,
        _name: &str,
        _payload_b64: &str,
    ) -> Result<String, ServiceError> {
        Err(ServiceError::Unavailable)
    }

    async fn fetch_content(&self, _document: &Document) -> Result<String, ServiceError> {
        Err(ServiceError::Unavailable)
    }

    async fn process_query(
        &self,
        _document: &Document,
        _query: &str,
    ) -> Result<String, ServiceError> {
        Err(ServiceError::Unavailable)
    }
}
