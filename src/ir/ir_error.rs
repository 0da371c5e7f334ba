use thiserror::Error;

use super::kind::OperandKind;
use crate::runtime::runtime_error::RuntimeError;

/// A violated IR invariant. Never a fault of the program being run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalError {
    /// `retrieve` on an operand that has no runtime value.
    #[error("{0} operand is not directly retrievable")]
    NotRetrievable(OperandKind),

    /// An unreachable-code placeholder was evaluated.
    #[error("unexecutable nil was evaluated")]
    Unexecutable,

    /// An operand was built with parts it cannot hold.
    #[error("malformed {kind} operand: {reason}")]
    MalformedOperand { kind: OperandKind, reason: String },
}

/// Failure of `retrieve`.
#[derive(Debug, Clone, Error)]
pub enum IrError {
    #[error("internal IR error: {0}")]
    Internal(#[from] InternalError),

    #[error(transparent)]
    Raise(#[from] RuntimeError),
}

impl IrError {
    pub fn not_retrievable(kind: OperandKind) -> Self {
        IrError::Internal(InternalError::NotRetrievable(kind))
    }

    pub fn unexecutable() -> Self {
        IrError::Internal(InternalError::Unexecutable)
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, IrError::Internal(_))
    }
}

impl InternalError {
    pub fn malformed(kind: OperandKind, reason: impl Into<String>) -> Self {
        InternalError::MalformedOperand {
            kind,
            reason: reason.into(),
        }
    }
}
