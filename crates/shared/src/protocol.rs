use serde::{Deserialize, Serialize};

/// Multipart field the service reads uploaded bytes from.
pub const UPLOAD_FIELD: &str = "file";

/// Acknowledgment returned by the bridge for an accepted upload.
pub const UPLOAD_ACK: &str = "File uploaded successfully!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    pub user_query: String,
    pub doc_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_request_uses_service_field_names() {
        let body = serde_json::to_value(PromptRequest {
            user_query: "summarize".to_string(),
            doc_name: "report.pdf".to_string(),
        })
        .expect("json");
        assert_eq!(body["user_query"], "summarize");
        assert_eq!(body["doc_name"], "report.pdf");
    }
}
