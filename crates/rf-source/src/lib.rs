//! rf Source Primitives
//!
//! The source-level building blocks every snapshot is made of.
//!
//! # Core Concepts
//!
//! - [`ContentHash`]: 32-byte Blake3 hash for change detection
//! - [`ItemPath`]: dot-separated declaration path used in scripts
//! - [`Language`]: supported languages and their tree-sitter grammars
//! - [`ItemArena`]: parent-linked declarations, walked upwards by [`ItemArena::top_item`]
//! - [`Diagnostic`]: an error recorded against a snapshot
//!
//! # Example
//!
//! ```rust
//! use rf_source::{collect_items, FileId, ItemArena, Language};
//!
//! let source = "struct Point { x: i32 }\n";
//! let tree = Language::Rust.parse(source).unwrap();
//! let mut arena = ItemArena::new();
//! collect_items(&tree, source, FileId(0), Language::Rust, &mut arena);
//!
//! let x = arena.resolve(&"Point.x".parse().unwrap())[0];
//! assert_eq!(arena[arena.top_item(x)].name, "Point");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod collect;
mod diagnostic;
mod hash;
mod item;
mod language;
mod path;

pub use collect::{
    collect_items, literal_rows, references, syntax_diagnostics, Occurrence, PendingReceiver, Reference,
};
pub use diagnostic::{Diagnostic, Location};
pub use hash::ContentHash;
pub use item::{FileId, Item, ItemArena, ItemId, ItemKind};
pub use language::{Language, ParseError};
pub use path::{ItemPath, PathError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
