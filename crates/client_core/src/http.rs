//! `reqwest` implementation of the command bridge.

use std::sync::LazyLock;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use regex::Regex;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use shared::{
    domain::Document,
    protocol::{PromptRequest, UPLOAD_ACK, UPLOAD_FIELD},
};
use tracing::debug;
use url::Url;

use crate::{config::ClientSettings, error::ServiceError, service::DocumentService};

/// Paragraphs at or below this many bytes are dropped from displayed content.
const MIN_PARAGRAPH_LEN: usize = 100;

static HIGHLIGHT_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(important|error|warning|success|note)\b").expect("valid highlight regex")
});

pub struct HttpDocumentService {
    http: Client,
    backend_url: String,
    document_extension: String,
}

impl HttpDocumentService {
    pub fn new(settings: &ClientSettings) -> Self {
        Self::with_client(Client::new(), settings)
    }

    pub fn with_client(http: Client, settings: &ClientSettings) -> Self {
        Self {
            http,
            backend_url: settings.backend_url.clone(),
            document_extension: settings.document_extension.clone(),
        }
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = Url::parse(&self.backend_url)
            .map_err(|err| ServiceError::Transport(format!("invalid backend url: {err}")))?;
        if !segments.is_empty() {
            url.path_segments_mut()
                .map_err(|()| {
                    ServiceError::Transport(format!(
                        "backend url '{}' cannot carry a path",
                        self.backend_url
                    ))
                })?
                .pop_if_empty()
                .extend(segments);
        }
        Ok(url)
    }
}

#[async_trait]
impl DocumentService for HttpDocumentService {
    async fn list_documents(&self) -> Result<Vec<Document>, ServiceError> {
        let url = self.endpoint(&[])?;
        debug!(%url, "bridge: list documents");
        let res = ensure_success(self.http.get(url).send().await?).await?;
        res.json::<Vec<Document>>()
            .await
            .map_err(|err| ServiceError::Decode(err.to_string()))
    }

    async fn upload_document(&self, name: &str, payload_b64: &str) -> Result<String, ServiceError> {
        let bytes = STANDARD
            .decode(payload_b64)
            .map_err(|err| ServiceError::InvalidPayload(format!("base64 decode error: {err}")))?;
        let url = self.endpoint(&["upload"])?;
        debug!(%url, name, bytes = bytes.len(), "bridge: upload document");

        let part = Part::bytes(bytes)
            .file_name(name.to_string())
            .mime_str("application/octet-stream")?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        ensure_success(self.http.post(url).multipart(form).send().await?).await?;
        Ok(UPLOAD_ACK.to_string())
    }

    async fn fetch_content(&self, document: &Document) -> Result<String, ServiceError> {
        let stored = document.stored_file_name(&self.document_extension);
        let url = self.endpoint(&["file", &stored])?;
        debug!(%url, document = %document, "bridge: fetch content");
        let res = ensure_success(self.http.get(url).send().await?).await?;
        let raw = res.text().await?;
        Ok(style_content(&raw))
    }

    async fn process_query(
        &self,
        document: &Document,
        query: &str,
    ) -> Result<String, ServiceError> {
        let url = self.endpoint(&["prompt"])?;
        debug!(%url, document = %document, query_len = query.len(), "bridge: process query");
        let res = self
            .http
            .post(url)
            .json(&PromptRequest {
                user_query: query.to_string(),
                doc_name: document.stored_file_name(&self.document_extension),
            })
            .send()
            .await?;
        let res = ensure_success(res).await?;
        Ok(res.text().await?)
    }
}

async fn ensure_success(res: Response) -> Result<Response, ServiceError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Turns extracted document text into the paragraph markup the content pane
/// understands: short fragments are dropped and keywords are highlighted.
pub fn style_content(raw: &str) -> String {
    let normalized = raw.replace("\r\n", "\n");
    normalized
        .split("\n\n")
        .filter(|para| para.len() > MIN_PARAGRAPH_LEN)
        .map(|para| {
            let escaped = escape_text(para);
            let highlighted =
                HIGHLIGHT_WORDS.replace_all(&escaped, "<span class='highlight'>$0</span>");
            format!("<p>{highlighted}</p>")
        })
        .collect::<Vec<_>>()
        .join("<br/>")
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
