//! Small command language used by the daemon binary and its tests.

use tracing::debug;

use crate::isolation::IsolationScope;
use crate::session::SessionId;

use super::{CommandProcessor, DISPATCH_TARGET, Reply};

/// Processor understanding `ping`, `define`, `resolve`, `echo` and `bye`.
///
/// | command                 | reply                              |
/// |-------------------------|------------------------------------|
/// | `ping`                  | `pong`                             |
/// | `define <name> <value>` | `ok` after binding in the scope    |
/// | `resolve <name>`        | the value, or `missing <name>`     |
/// | `echo <text>`           | `<text>`, possibly empty           |
/// | `bye`                   | close without replying             |
///
/// Anything else yields `error unknown command: <cmd>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceProcessor;

impl ReferenceProcessor {
    /// Builds the processor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CommandProcessor for ReferenceProcessor {
    fn dispatch(&self, command: &str, session: SessionId, scope: &IsolationScope) -> Reply {
        let (verb, rest) = command.split_once(' ').unwrap_or((command, ""));
        debug!(
            target: DISPATCH_TARGET,
            session = %session,
            verb,
            "dispatching command"
        );
        let namespace = scope.namespace();
        match verb {
            "ping" => Reply::line("pong"),
            "echo" => Reply::line(rest),
            "bye" => Reply::Close,
            "define" => match rest.split_once(' ') {
                Some((name, value)) if !name.is_empty() => {
                    namespace.define(name, value);
                    Reply::line("ok")
                }
                _ => Reply::line("error usage: define <name> <value>"),
            },
            "resolve" if !rest.is_empty() => namespace
                .resolve(rest)
                .map_or_else(|| Reply::line(format!("missing {rest}")), Reply::Line),
            "resolve" => Reply::line("error usage: resolve <name>"),
            _ => Reply::line(format!("error unknown command: {command}")),
        }
    }
}
