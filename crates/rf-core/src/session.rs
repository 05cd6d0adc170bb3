//! Per-run configuration and output sinks

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};

/// Debug option that echoes each command before it runs
pub const TRACE: &str = "trace";

/// Whether the result is written to disk or shown as a diff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Write,
    Diff,
}

/// String-keyed debug switches set by the `debug` command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugOptions {
    values: BTreeMap<String, String>,
}

impl DebugOptions {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set to a non-empty value
    #[must_use]
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Everything a run needs besides the workspace and the script
///
/// Diffs go to the stdout sink, trace lines to the stderr sink. Both
/// default to the process streams.
pub struct Session {
    mode: Mode,
    debug: DebugOptions,
    stdout: Box<dyn Write>,
    stderr: Box<dyn Write>,
}

impl Session {
    /// Session writing to the process streams
    #[must_use]
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            debug: DebugOptions::new(),
            stdout: Box::new(io::stdout()),
            stderr: Box::new(io::stderr()),
        }
    }

    /// Replace the diff sink
    #[must_use]
    pub fn with_stdout(mut self, sink: impl Write + 'static) -> Self {
        self.stdout = Box::new(sink);
        self
    }

    /// Replace the trace sink
    #[must_use]
    pub fn with_stderr(mut self, sink: impl Write + 'static) -> Self {
        self.stderr = Box::new(sink);
        self
    }

    /// Preset a debug option
    #[must_use]
    pub fn with_debug(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.debug.set(key, value);
        self
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    #[must_use]
    pub fn is_diff(&self) -> bool {
        self.mode == Mode::Diff
    }

    #[inline]
    #[must_use]
    pub fn debug(&self) -> &DebugOptions {
        &self.debug
    }

    #[inline]
    pub fn debug_mut(&mut self) -> &mut DebugOptions {
        &mut self.debug
    }

    #[inline]
    pub fn stdout(&mut self) -> &mut dyn Write {
        &mut *self.stdout
    }

    #[inline]
    pub fn stderr(&mut self) -> &mut dyn Write {
        &mut *self.stderr
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Mode::default())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("mode", &self.mode)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}
