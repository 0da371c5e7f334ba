use thiserror::Error;

use crate::ir::ir_error::InternalError;
use crate::ir::kind::OperandKind;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to encode operand field: {0}")]
    Postcard(#[from] postcard::Error),

    #[error("{kind} operand has {count} children, more than a u32 count can hold")]
    CountOverflow { kind: OperandKind, count: usize },
}

/// Any of these aborts decoding of the enclosing unit.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unknown operand kind tag {0}")]
    UnknownKind(u8),

    #[error("truncated or corrupt operand data: {0}")]
    Postcard(#[from] postcard::Error),

    #[error("no local variable '{name}' {depth} scope(s) out")]
    UnknownLocal { name: String, depth: u32 },

    #[error("local variable '{name}' was encoded at offset {encoded} but resolves to {resolved}")]
    SlotMismatch {
        name: String,
        encoded: u32,
        resolved: u32,
    },

    #[error("symbol index {0} is outside the symbol pool")]
    InvalidSymbolIndex(u32),

    #[error("invalid operand: {0}")]
    Invalid(#[from] InternalError),

    #[error("operands nested deeper than {0} levels")]
    NestingTooDeep(u32),
}

impl DecodeError {
    pub fn malformed(kind: OperandKind, reason: impl Into<String>) -> Self {
        DecodeError::Invalid(InternalError::malformed(kind, reason))
    }

    pub fn truncated() -> Self {
        DecodeError::Postcard(postcard::Error::DeserializeUnexpectedEnd)
    }
}
