//! Error handling for the threeimp Scheme interpreter pipeline.
//!
//! The lexer/parser stage is an external collaborator, so there is no
//! `LexError`/`ParseError` variant here: every error this crate carries
//! originates at or after scope resolution, which takes a datum tree as
//! given. All errors are fatal for the current top-level evaluation --
//! there is no local recovery, only propagation to the VM entry point.

use crate::Span;
use thiserror::Error;

/// The error type threaded through scope resolution, compilation and
/// execution.
#[derive(Error, Debug, Clone)]
pub enum ThreeImpError {
    /// Undefined symbol, local redefinition, or global redefinition that
    /// should have used `set!`.
    #[error("scope error: {message}")]
    Scope {
        message: String,
        span: Option<Span>,
    },

    /// Malformed special form, non-symbol in formal-parameter position, or
    /// any other structural problem the compiler finds in a datum.
    #[error("compile error: {message}")]
    Compile {
        message: String,
        span: Option<Span>,
    },

    /// Applying a non-procedure, `car`/`cdr` on a non-pair, arithmetic on a
    /// non-number -- only raised when runtime typechecks are compiled in.
    #[error("runtime type error: {message}")]
    RuntimeType { message: String },

    /// `Apply` to an undefined global: the slot still holds the `undefined`
    /// singleton.
    #[error("runtime lookup error: {message}")]
    RuntimeLookup { message: String },

    /// Allocation failure or stack overflow.
    #[error("resource error: {message}")]
    Resource { message: String },
}

/// Result type alias used throughout the threeimp pipeline.
pub type ThreeImpResult<T> = Result<T, ThreeImpError>;

impl ThreeImpError {
    pub fn scope(message: impl Into<String>, span: Option<Span>) -> Self {
        Self::Scope { message: message.into(), span }
    }

    pub fn compile(message: impl Into<String>, span: Option<Span>) -> Self {
        Self::Compile { message: message.into(), span }
    }

    pub fn runtime_type(message: impl Into<String>) -> Self {
        Self::RuntimeType { message: message.into() }
    }

    pub fn runtime_lookup(message: impl Into<String>) -> Self {
        Self::RuntimeLookup { message: message.into() }
    }

    pub fn resource(message: impl Into<String>) -> Self {
        Self::Resource { message: message.into() }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Scope { span, .. } | Self::Compile { span, .. } => *span,
            _ => None,
        }
    }

    /// Render in the `ERROR:`-prefixed, consistently-indented form this
    /// interpreter uses as its user-visible error surface.
    pub fn render(&self) -> String {
        let body = match self.span() {
            Some(span) => format!("{self} at {span}"),
            None => self.to_string(),
        };
        let mut lines = body.lines();
        let mut out = format!("ERROR: {}", lines.next().unwrap_or_default());
        for line in lines {
            out.push_str("\n       ");
            out.push_str(line);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;

    #[test]
    fn render_without_span_has_error_prefix() {
        let err = ThreeImpError::runtime_lookup("undefined global: foo");
        assert_eq!(
            err.render(),
            "ERROR: runtime lookup error: undefined global: foo"
        );
    }

    #[test]
    fn render_with_span_includes_location() {
        let span = Span::single(Position::new(3, 5, 40), 0);
        let err = ThreeImpError::scope("symbol used but not defined: x", Some(span));
        assert_eq!(
            err.render(),
            "ERROR: scope error: symbol used but not defined: x at 3:5"
        );
    }
}
