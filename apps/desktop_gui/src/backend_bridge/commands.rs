//! Backend commands queued from UI to backend worker.

use client_core::Effect;

#[derive(Debug)]
pub enum BackendCommand {
    /// Perform one workbench effect and report its completion.
    Run(Effect),
    /// Point the bridge at a different backend.
    Reconfigure { backend_url: String },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Run(effect) => effect.name(),
            Self::Reconfigure { .. } => "reconfigure",
        }
    }
}
