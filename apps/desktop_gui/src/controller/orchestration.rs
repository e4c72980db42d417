//! Command orchestration helpers from UI actions to backend command queue.

use client_core::{Completion, Effect, ServiceError, UploadError};
use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext};

/// A command the backend queue refused, handed back to the caller.
#[derive(Debug)]
pub struct RejectedCommand {
    pub command: BackendCommand,
    pub error: UiError,
}

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
) -> Result<(), RejectedCommand> {
    let cmd_name = cmd.name();
    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            Ok(())
        }
        Err(TrySendError::Full(command)) => Err(RejectedCommand {
            command,
            error: UiError::from_message(
                UiErrorContext::CommandQueue,
                "UI command queue is full; please retry",
            ),
        }),
        Err(TrySendError::Disconnected(command)) => Err(RejectedCommand {
            command,
            error: UiError::from_message(
                UiErrorContext::CommandQueue,
                "Backend command processor disconnected (possible startup/runtime failure); restart the app",
            ),
        }),
    }
}

/// The completion a workflow receives when its effect never reached the
/// backend, so the workflow settles instead of waiting forever.
pub fn undeliverable(effect: Effect, reason: &str) -> Completion {
    let err = ServiceError::Transport(reason.to_string());
    match effect {
        Effect::ListDocuments { token } => Completion::DocumentsListed {
            token,
            result: Err(err),
        },
        Effect::FetchContent { token, .. } => Completion::ContentFetched {
            token,
            result: Err(err),
        },
        Effect::ProcessQuery { token, .. } => Completion::QueryAnswered {
            token,
            result: Err(err),
        },
        Effect::ReadFile { token, .. } => Completion::FileRead {
            token,
            result: Err(UploadError::Service(err)),
        },
        Effect::UploadDocument { token, .. } => Completion::UploadFinished {
            token,
            result: Err(err),
        },
    }
}
