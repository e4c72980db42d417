use std::collections::VecDeque;

use tracing::debug;

use crate::{
    error::UploadError,
    service::DocumentService,
    workbench::{Completion, Effect, Workbench},
};

/// Performs one effect against the bridge (or the filesystem for file reads).
pub async fn execute(service: &dyn DocumentService, effect: Effect) -> Completion {
    debug!(effect = effect.name(), token = %effect.token(), "executing effect");
    match effect {
        Effect::ListDocuments { token } => Completion::DocumentsListed {
            token,
            result: service.list_documents().await,
        },
        Effect::FetchContent { token, document } => Completion::ContentFetched {
            token,
            result: service.fetch_content(&document).await,
        },
        Effect::ProcessQuery {
            token,
            document,
            query,
        } => Completion::QueryAnswered {
            token,
            result: service.process_query(&document, &query).await,
        },
        Effect::ReadFile { token, path } => {
            let read = tokio::fs::read(&path).await;
            Completion::FileRead {
                token,
                result: read.map_err(|err| UploadError::Unreadable {
                    path,
                    reason: err.to_string(),
                }),
            }
        }
        Effect::UploadDocument {
            token,
            name,
            payload_b64,
        } => Completion::UploadFinished {
            token,
            result: service.upload_document(&name, &payload_b64).await,
        },
    }
}

/// Runs `effects` and every follow-up effect in issue order until the
/// workbench has nothing left to do.
pub async fn drive(workbench: &mut Workbench, service: &dyn DocumentService, effects: Vec<Effect>) {
    let mut queue: VecDeque<Effect> = effects.into();
    while let Some(effect) = queue.pop_front() {
        let completion = execute(service, effect).await;
        queue.extend(workbench.complete(completion));
    }
}
