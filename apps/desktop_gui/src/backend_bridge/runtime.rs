//! Backend worker: owns the tokio runtime and the active document service.

use std::{sync::Arc, thread};

use client_core::{
    execute, ClientSettings, Completion, DocumentService, HttpDocumentService,
    MissingDocumentService,
};
use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

/// Hands a finished effect back to the UI without blocking the runtime.
/// Returns false when the completion was dropped.
fn deliver_completion(ui_tx: &Sender<UiEvent>, completion: Completion, effect: &str) -> bool {
    match ui_tx.try_send(UiEvent::Completed(completion)) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            tracing::warn!(effect, "ui event queue full; dropping completion");
            false
        }
        Err(TrySendError::Disconnected(_)) => {
            tracing::warn!(effect, "ui closed before completion");
            false
        }
    }
}

/// Spawns the backend worker thread. `settings` is the startup configuration;
/// when it failed to load the worker starts without a backend until the UI
/// supplies a URL.
pub fn launch(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    settings: anyhow::Result<ClientSettings>,
) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let (mut settings, mut service) = match settings {
                Ok(settings) => {
                    let service: Arc<dyn DocumentService> =
                        Arc::new(HttpDocumentService::new(&settings));
                    (settings, service)
                }
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::Configuration,
                        format!("backend configuration unavailable: {err:#}"),
                    )));
                    tracing::error!("starting without a backend: {err:#}");
                    let service: Arc<dyn DocumentService> = Arc::new(MissingDocumentService);
                    (ClientSettings::default(), service)
                }
            };
            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::Run(effect) => {
                        let service = Arc::clone(&service);
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            let name = effect.name();
                            let completion = execute(service.as_ref(), effect).await;
                            deliver_completion(&ui_tx, completion, name);
                        });
                    }
                    BackendCommand::Reconfigure { backend_url } => {
                        match settings.clone().with_backend_url(backend_url) {
                            Ok(updated) => {
                                tracing::info!(
                                    backend_url = %updated.backend_url,
                                    "backend reconfigured"
                                );
                                service = Arc::new(HttpDocumentService::new(&updated));
                                let _ = ui_tx.try_send(UiEvent::Info(format!(
                                    "Using backend {}",
                                    updated.backend_url
                                )));
                                settings = updated;
                            }
                            Err(err) => {
                                tracing::warn!("rejected backend url: {err:#}");
                                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                    UiErrorContext::Configuration,
                                    format!("{err:#}"),
                                )));
                            }
                        }
                    }
                }
            }
            tracing::info!("backend command channel closed; worker exiting");
        });
    });
}
