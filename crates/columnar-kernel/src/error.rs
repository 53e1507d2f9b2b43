#![forbid(unsafe_code)]

/// Errors raised by column operators.
///
/// Labels are the variant names returned by [`crate::ColumnKind::label`] (or
/// [`crate::Value::kind_label`] for scalars), so the evaluator can surface them
/// without knowing the concrete column types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColumnError {
    #[error("type mismatch: {expected} column cannot hold {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("illegal operation: {left} {op} {}", .right.unwrap_or("value"))]
    IllegalOperation {
        op: &'static str,
        left: &'static str,
        right: Option<&'static str>,
    },

    #[error("cannot compare {left} with {right}")]
    IncomparableOperands {
        left: &'static str,
        right: &'static str,
    },
}

impl ColumnError {
    pub(crate) fn illegal(op: &'static str, left: &'static str) -> Self {
        Self::IllegalOperation {
            op,
            left,
            right: None,
        }
    }

    pub(crate) fn illegal_with(op: &'static str, left: &'static str, right: &'static str) -> Self {
        Self::IllegalOperation {
            op,
            left,
            right: Some(right),
        }
    }

    pub(crate) fn incomparable(left: &'static str, right: &'static str) -> Self {
        Self::IncomparableOperands { left, right }
    }
}

/// Errors raised while decoding a persisted column frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("unknown column frame format {0}")]
    UnknownFormat(u8),

    #[error("unknown column kind tag {0}")]
    UnknownKind(u8),

    #[error("unknown value tag {0}")]
    UnknownValueTag(u8),

    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("date ordinal {0} is out of range")]
    InvalidDate(i32),

    #[error("frame holds {actual} values where {expected} was expected")]
    KindMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}
