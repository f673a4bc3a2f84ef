// Diagnostic sink (SPEC_FULL.md's ambient logging section): parse errors
// and evaluation diagnostics are never returned as Results to the caller
// of `compile`/`eval` (per spec.md §7's no-exceptions policy) — they are
// reported through a `Session` instead, then a fallback value is produced.
//
// Grounded on the teacher's `log`-crate usage pattern (src/main.rs) rather
// than introducing its own channel: the default `Session` just forwards to
// the `log` facade at the right level, so host applications get these
// diagnostics through whatever logger they already install.

use crate::error::{EvalDiagnostic, ParseError};

pub trait Session {
    fn parse_error(&self, error: &ParseError, source: &str);
    fn eval_diagnostic(&self, diagnostic: &EvalDiagnostic);
}

/// Forwards everything to the `log` facade. Parse errors are `warn!`,
/// evaluator diagnostics are `debug!` since they are far more common (e.g.
/// a dangling BoundSymbol after its context has been dropped) and rarely
/// actionable on their own.
#[derive(Default)]
pub struct LogSession;

impl Session for LogSession {
    fn parse_error(&self, error: &ParseError, source: &str) {
        log::warn!("data-binding parse error: {} in `{}`", error, source);
    }

    fn eval_diagnostic(&self, diagnostic: &EvalDiagnostic) {
        log::debug!("data-binding eval diagnostic: {}", diagnostic);
    }
}

/// Discards everything. Useful for tests and for callers that already
/// validate expressions ahead of time.
#[derive(Default)]
pub struct NullSession;

impl Session for NullSession {
    fn parse_error(&self, _error: &ParseError, _source: &str) {}
    fn eval_diagnostic(&self, _diagnostic: &EvalDiagnostic) {}
}
