//! Error types for the script pipeline
//!
//! Every variant aborts the run. Variants that stem from a checked
//! snapshot carry its diagnostics so the caller can print them.

use rf_source::Diagnostic;
use rf_workspace::{LoadError, PendingEditError, WriteError};

/// Why a script run stopped
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A snapshot could not be produced at all
    #[error("{0}")]
    Load(#[from] LoadError),

    /// The workspace had errors before any command ran
    #[error("errors found before executing script")]
    PreexistingErrors { diagnostics: Vec<Diagnostic> },

    /// No handler registered under this name
    #[error("unknown command {0}")]
    UnknownCommand(String),

    /// Reloading after `command` found errors
    #[error("errors found after executing: {command}")]
    CommandIntroducedErrors {
        command: String,
        diagnostics: Vec<Diagnostic>,
    },

    /// `command` reported errors while it ran
    #[error("errors found while executing: {command}")]
    SynchronousHandlerError {
        command: String,
        diagnostics: Vec<Diagnostic>,
    },

    /// The final reload before writing failed
    #[error("checking rewritten files: {detail}")]
    FinalValidationFailed {
        detail: String,
        diagnostics: Vec<Diagnostic>,
    },

    /// `command` queued edits that conflict with each other
    #[error("normalizing after {command}: {source}")]
    Normalize {
        command: String,
        #[source]
        source: PendingEditError,
    },

    /// The final diff could not be computed
    #[error("computing diff: {0}")]
    Diff(#[source] PendingEditError),

    /// Writing the result failed
    #[error("{0}")]
    Write(#[from] WriteError),

    /// Writing to an output sink failed
    #[error("writing output: {0}")]
    Output(#[from] std::io::Error),
}

impl PipelineError {
    /// Diagnostics explaining the failure, if any
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::PreexistingErrors { diagnostics }
            | Self::CommandIntroducedErrors { diagnostics, .. }
            | Self::SynchronousHandlerError { diagnostics, .. }
            | Self::FinalValidationFailed { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }

    /// Script command the failure is attributed to
    #[must_use]
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::CommandIntroducedErrors { command, .. }
            | Self::SynchronousHandlerError { command, .. }
            | Self::Normalize { command, .. } => Some(command),
            Self::UnknownCommand(name) => Some(name),
            _ => None,
        }
    }
}
