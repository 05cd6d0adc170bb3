//! rf Core - the refactoring script pipeline
//!
//! The pipeline:
//! - Tokenizes a script into commands
//! - Dispatches each command through a caller-supplied registry
//! - Loads a fresh checked snapshot before every command and blames the
//!   previous command for any errors it finds
//! - Diffs or writes the result after a final check
//!
//! # Example
//!
//! ```rust,no_run
//! use rf_core::{Mode, Pipeline, Session};
//! use rf_workspace::Workspace;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut pipeline = Pipeline::new(Session::new(Mode::Diff));
//! let summary = pipeline.run(Workspace::open("."), "mv oldName newName\n")?;
//!
//! println!("ran {} commands", summary.commands);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod commands;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod script;
pub mod session;

pub use error::PipelineError;
pub use pipeline::{Pipeline, RunSummary};
pub use registry::{CommandContext, CommandRegistry, Handler};
pub use script::{parse_script, trim_comments, ScriptCommand};
pub use session::{DebugOptions, Mode, Session, TRACE};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running scripts
    pub use crate::{
        CommandContext, CommandRegistry, Mode, Pipeline, PipelineError, RunSummary, Session,
    };
    pub use rf_workspace::{Loader, Snapshot, View, Workspace};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
