//! Command registry
//!
//! Provides [`CommandRegistry`], the caller-supplied table that maps
//! script command names to handlers.

use std::collections::BTreeMap;

use rf_workspace::Snapshot;

use crate::commands;
use crate::error::PipelineError;
use crate::session::DebugOptions;

/// What a handler may touch while it runs
#[derive(Debug)]
pub struct CommandContext<'a> {
    /// Freshly loaded snapshot; handlers queue edits and report diagnostics here
    pub snapshot: &'a mut Snapshot,
    /// Session debug options
    pub debug: &'a mut DebugOptions,
}

/// A command implementation
///
/// Receives the raw argument string. Failures are reported as diagnostics
/// on the snapshot, never returned.
pub type Handler = fn(&mut CommandContext<'_>, &str);

/// Registry of script commands
#[derive(Debug, Default, Clone)]
pub struct CommandRegistry {
    handlers: BTreeMap<String, Handler>,
}

impl CommandRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Create registry with the built-in commands
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("add", commands::add::run);
        registry.register("debug", commands::debug::run);
        registry.register("inline", commands::inline::run);
        registry.register("mv", commands::mv::run);
        registry.register("rm", commands::rm::run);
        registry
    }

    /// Register a handler, replacing any previous one of the same name
    pub fn register(&mut self, name: &str, handler: Handler) {
        self.handlers.insert(name.to_string(), handler);
    }

    /// Look up the handler for `name`
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownCommand`] if nothing is registered.
    pub fn dispatch(&self, name: &str) -> Result<Handler, PipelineError> {
        self.handlers
            .get(name)
            .copied()
            .ok_or_else(|| PipelineError::UnknownCommand(name.to_string()))
    }

    /// Check if command exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Remove command
    #[inline]
    pub fn remove(&mut self, name: &str) -> bool {
        self.handlers.remove(name).is_some()
    }

    /// Registered names in sorted order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    /// Get number of registered commands
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut CommandContext<'_>, _: &str) {}

    #[test]
    fn defaults() {
        let registry = CommandRegistry::with_defaults();
        assert_eq!(registry.names(), vec!["add", "debug", "inline", "mv", "rm"]);
        assert!(registry.dispatch("mv").is_ok());
    }

    #[test]
    fn unknown_command() {
        let registry = CommandRegistry::new();
        assert!(registry.is_empty());
        let err = registry.dispatch("mv").unwrap_err();
        assert!(matches!(err, PipelineError::UnknownCommand(name) if name == "mv"));
    }

    #[test]
    fn register_and_remove() {
        let mut registry = CommandRegistry::new();
        registry.register("noop", noop);
        assert!(registry.contains("noop"));
        assert_eq!(registry.len(), 1);
        assert!(registry.remove("noop"));
        assert!(!registry.remove("noop"));
    }
}
