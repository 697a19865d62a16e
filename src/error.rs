use thiserror::Error;

/// The error type returned by every fallible operation in this crate.
///
/// Exposes the four kinds callers are expected to distinguish: a bad parse
/// (`Syntax`), a grammatically valid but semantically invalid expression
/// (`Value`), a `RollContext` ceiling crossed (`TooManyRolls`), and an
/// internal fallthrough (`Internal`) that should never surface in practice.
#[derive(Debug, Error)]
pub enum RollError {
    /// The parser could not tokenize or parse the expression.
    #[error("syntax error: {message}{}", position.map(|p| format!(" (at position {p})")).unwrap_or_default())]
    Syntax {
        message: String,
        position: Option<usize>,
    },

    /// The expression parsed but is semantically invalid: division by zero,
    /// a dice-only operator applied to a plain set, a negative selector
    /// count, a non-integer die size, and so on.
    #[error("value error: {0}")]
    Value(String),

    /// Either of `RollContext`'s ceilings (rolls performed, AST operations
    /// visited) was crossed during evaluation.
    #[error("Exceeded maximum number of {0}")]
    TooManyRolls(String),

    /// Generic fallthrough for conditions that should be unreachable.
    #[error("roll error: {0}")]
    Internal(String),
}

impl RollError {
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        RollError::Syntax {
            message: message.into(),
            position: None,
        }
    }

    pub(crate) fn syntax_at(message: impl Into<String>, position: usize) -> Self {
        RollError::Syntax {
            message: message.into(),
            position: Some(position),
        }
    }

    pub(crate) fn value(message: impl Into<String>) -> Self {
        RollError::Value(message.into())
    }

    pub(crate) fn too_many_rolls(what: impl Into<String>) -> Self {
        RollError::TooManyRolls(what.into())
    }
}

pub type Result<T> = std::result::Result<T, RollError>;
