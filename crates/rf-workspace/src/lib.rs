//! rf Workspace
//!
//! Turns a directory of Rust or Go sources into a chain of checked
//! snapshots.
//!
//! # Flow
//!
//! ```text
//! Workspace ──load──▶ Snapshot₀ ──edits──▶ pending ──load──▶ Snapshot₁ ─▶ …
//!                                                             │
//!                                             diff / write ◀──┘
//! ```
//!
//! Every load parses and checks all files; problems become
//! [`Diagnostic`](rf_source::Diagnostic)s on the snapshot rather than errors.
//! Edits are queued against a snapshot's loaded text and only become real
//! on the next load, so a failed step never damages the last good state.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod check;
mod config;
mod diff;
mod edit;
mod error;
mod format;
mod loader;
mod snapshot;
mod workspace;

pub use config::{WorkspaceConfig, CONFIG_FILE, DEFAULT_EXCLUDES, DEFAULT_MAX_FILE_SIZE};
pub use diff::{unified_diff, CONTEXT_LINES};
pub use edit::{apply_edits, TextEdit};
pub use error::{ConfigError, EditError, LoadError, PendingEditError, WriteError};
pub use format::normalize;
pub use loader::{Base, Loader};
pub use snapshot::{Snapshot, SourceFile, Target, View};
pub use workspace::Workspace;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
