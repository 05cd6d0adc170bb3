//! `debug key[=value]...`

use crate::registry::CommandContext;

/// Set session debug options; a bare key is set to `1`
pub fn run(ctx: &mut CommandContext<'_>, args: &str) {
    for field in args.split_whitespace() {
        let (key, value) = field.split_once('=').unwrap_or((field, "1"));
        tracing::debug!(key, value, "debug option");
        ctx.debug.set(key, value);
    }
}
