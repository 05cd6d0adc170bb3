//! The load seam between a workspace and its snapshots

use crate::error::LoadError;
use crate::snapshot::Snapshot;
use crate::workspace::Workspace;

/// Anything that can produce a checked [`Snapshot`]
///
/// A [`Workspace`] loads the files on disk; a [`Snapshot`] loads its own
/// pending view.
pub trait Loader {
    /// Load and check the next snapshot
    ///
    /// Diagnostics are recorded in the snapshot; only failures to produce
    /// one at all are errors.
    ///
    /// # Errors
    ///
    /// Returns error if files cannot be read, queued edits conflict, or
    /// there are no source files.
    fn load(&self) -> Result<Snapshot, LoadError>;
}

/// The state the next command starts from
#[derive(Debug)]
pub enum Base {
    /// Nothing loaded yet
    Workspace(Workspace),
    /// Last snapshot a command completed on
    Snapshot(Box<Snapshot>),
}

impl Base {
    /// Last completed snapshot, if any command ran
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            Base::Workspace(_) => None,
            Base::Snapshot(snapshot) => Some(snapshot),
        }
    }
}

impl Loader for Base {
    fn load(&self) -> Result<Snapshot, LoadError> {
        match self {
            Base::Workspace(workspace) => workspace.load(),
            Base::Snapshot(snapshot) => snapshot.load(),
        }
    }
}

impl From<Workspace> for Base {
    fn from(workspace: Workspace) -> Self {
        Base::Workspace(workspace)
    }
}

impl From<Snapshot> for Base {
    fn from(snapshot: Snapshot) -> Self {
        Base::Snapshot(Box::new(snapshot))
    }
}
