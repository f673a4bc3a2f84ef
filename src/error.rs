// Error/diagnostic kinds (SPEC_FULL.md §7).
//
// Plain enums, no `thiserror`/`anyhow` — the teacher lineage (src/vm.rs's
// `Error`) never reaches for an error-derive crate, and these diagnostics
// are advisory only: they never propagate past `compile`/`eval`, they are
// just logged (see session.rs) before falling back to a literal or Null.

use std::fmt;

/// Every parse failure spec.md §7 enumerates, mapped 1:1 from the rule ->
/// error-kind table in
/// original_source/aplcore/include/apl/datagrammar/databindingerrors.h.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    InvalidNumberFormat,
    UnexpectedToken,
    UnexpectedTokenBeforeEof,
    ExpectedOperandAfterMultiplicative,
    ExpectedOperandAfterAdditive,
    ExpectedOperandAfterComparison,
    ExpectedOperandAfterEquality,
    ExpectedOperandAfterLogicalAnd,
    ExpectedOperandAfterLogicalOr,
    ExpectedOperandAfterNullCoalescing,
    ExpectedExpression,
    MalformedArray,
    MalformedMap,
    MalformedTernaryExpression,
    ExpectedMapValueAssignment,
    ExpectedMapAssignment,
    UnterminatedSingleQuotedString,
    UnterminatedDoubleQuotedString,
    ExpectedPostfixRightParen,
    ExpectedCloseParen,
    BciOverflow,
    NestingTooDeep,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub position: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {}", self.kind, self.position)
    }
}

/// Evaluator/optimizer diagnostics (spec.md §7's "Evaluation diagnostics").
/// Never fatal: always paired with a Null/NaN fallback result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalDiagnostic {
    UnexpectedTrivialInstruction,
    StackDepthNotOne(usize),
    NonCallableInvoked,
}

impl fmt::Display for EvalDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalDiagnostic::UnexpectedTrivialInstruction => write!(f, "unexpected trivial instruction"),
            EvalDiagnostic::StackDepthNotOne(n) => write!(f, "expected one value on the stack, found {}", n),
            EvalDiagnostic::NonCallableInvoked => write!(f, "attempted to call a non-callable value"),
        }
    }
}
