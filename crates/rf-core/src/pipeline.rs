//! Snapshot chain controller and finalizer
//!
//! # Flow
//!
//! ```text
//! for each command:
//!   snapshot = base.load()          errors here belong to the previous command
//!   dispatch, run handler           errors here belong to this command
//!   normalize; base = snapshot
//! finalize:
//!   diff? → reload and check → write
//! ```
//!
//! Edits made by command N are only checked when command N+1 (or the
//! finalizer) loads them. When that check fails, the state before command N
//! is the last one known to be good, and that is what gets persisted.

use std::path::PathBuf;

use rf_workspace::{Base, Loader, Snapshot, View, Workspace};

use crate::error::PipelineError;
use crate::registry::{CommandContext, CommandRegistry};
use crate::script::parse_script;
use crate::session::{Session, TRACE};

/// Outcome of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Commands executed
    pub commands: usize,
    /// Files written back, relative to the workspace root
    pub written: Vec<PathBuf>,
    /// Whether a non-empty diff was emitted
    pub diffed: bool,
}

/// Runs scripts against a workspace
#[derive(Debug)]
pub struct Pipeline {
    registry: CommandRegistry,
    session: Session,
}

impl Pipeline {
    /// Pipeline with the built-in commands
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self::with_registry(session, CommandRegistry::with_defaults())
    }

    /// Pipeline with a caller-supplied command table
    #[must_use]
    pub fn with_registry(session: Session, registry: CommandRegistry) -> Self {
        Self { registry, session }
    }

    #[inline]
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    #[must_use]
    pub fn into_session(self) -> Session {
        self.session
    }

    /// Run `script` against `workspace`
    ///
    /// A script without commands succeeds without reading anything.
    ///
    /// # Errors
    ///
    /// Returns the first failure; see [`PipelineError`]. When a command's
    /// edits are found to be broken, the state before that command is still
    /// diffed or written before the error is returned.
    pub fn run(&mut self, workspace: Workspace, script: &str) -> Result<RunSummary, PipelineError> {
        let commands = parse_script(script);
        let mut base = Base::from(workspace);
        let mut last_cmd = String::new();
        let mut executed = 0;

        for command in &commands {
            if self.session.debug().is_set(TRACE) {
                writeln!(self.session.stderr(), "> {}", command.trace_line())?;
            }

            let mut snapshot = base.load()?;
            if snapshot.error_count() > 0 {
                let diagnostics = snapshot.diagnostics().to_vec();
                if last_cmd.is_empty() {
                    return Err(PipelineError::PreexistingErrors { diagnostics });
                }
                tracing::warn!(command = %last_cmd, errors = diagnostics.len(), "command introduced errors");
                if let Some(good) = base.snapshot() {
                    self.finalize_last_good(good);
                }
                return Err(PipelineError::CommandIntroducedErrors {
                    command: last_cmd,
                    diagnostics,
                });
            }

            last_cmd = command.summary();
            let handler = self.registry.dispatch(&command.name)?;

            tracing::info!(line = command.line, command = %last_cmd, "running");
            let mut ctx = CommandContext {
                snapshot: &mut snapshot,
                debug: self.session.debug_mut(),
            };
            handler(&mut ctx, &command.args);

            if snapshot.error_count() > 0 {
                return Err(PipelineError::SynchronousHandlerError {
                    command: last_cmd,
                    diagnostics: snapshot.diagnostics().to_vec(),
                });
            }

            snapshot
                .normalize()
                .map_err(|source| PipelineError::Normalize {
                    command: last_cmd.clone(),
                    source,
                })?;
            base = Base::from(snapshot);
            executed += 1;
        }

        match base.snapshot() {
            Some(last) => self.finalize(last, executed),
            None => Ok(RunSummary::default()),
        }
    }

    /// Validate the final state, then diff or write it
    fn finalize(&mut self, last: &Snapshot, executed: usize) -> Result<RunSummary, PipelineError> {
        let mut summary = RunSummary {
            commands: executed,
            ..RunSummary::default()
        };

        // shown before the check so a broken result can still be inspected
        if self.session.is_diff() {
            let diff = last.diff(View::Pending).map_err(PipelineError::Diff)?;
            let out = self.session.stdout();
            out.write_all(diff.as_bytes())?;
            out.flush()?;
            summary.diffed = !diff.is_empty();
        }

        let checked = last
            .reload()
            .map_err(|err| PipelineError::FinalValidationFailed {
                detail: err.to_string(),
                diagnostics: Vec::new(),
            })?;
        if checked.error_count() > 0 {
            return Err(PipelineError::FinalValidationFailed {
                detail: format!("{} errors", checked.error_count()),
                diagnostics: checked.diagnostics().to_vec(),
            });
        }

        if self.session.is_diff() {
            return Ok(summary);
        }

        summary.written = checked.write(View::Loaded)?;
        tracing::info!(
            commands = executed,
            files = summary.written.len(),
            "wrote result"
        );
        Ok(summary)
    }

    /// Persist the state before the failing command, best effort
    fn finalize_last_good(&mut self, good: &Snapshot) {
        if self.session.is_diff() {
            match good.diff(View::Loaded) {
                Ok(diff) => {
                    let out = self.session.stdout();
                    if let Err(err) = out.write_all(diff.as_bytes()).and_then(|()| out.flush()) {
                        tracing::warn!(%err, "writing diff of last good state");
                    }
                }
                Err(err) => tracing::warn!(%err, "computing diff of last good state"),
            }
        } else if let Err(err) = good.write(View::Loaded) {
            tracing::warn!(%err, "writing last good state");
        }
    }
}
