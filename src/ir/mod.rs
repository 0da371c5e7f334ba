//! The operand model: what IR instructions take as arguments, how those
//! arguments evaluate, and how optimization passes rewrite them.
//!
//! Operands come in four families (see [`OperandFamily`]): literals that
//! cache their runtime value, variables naming storage slots, compound
//! operands built from other operands, and references to the evaluation
//! environment.

pub mod clone_info;
pub mod compound;
pub mod display;
pub mod interp;
pub mod ir_error;
pub mod kind;
pub mod literal;
pub mod operand;
pub mod reference;
pub mod string_literal;
pub mod variable;

pub use clone_info::{CloneInfo, InlineCloneInfo, SimpleCloneInfo};
pub use compound::{
    ArrayOperand, CompoundOperand, CompoundString, DynamicSymbol, HashOperand, KeyValuePair,
    MethodHandle, SValue, Splat,
};
pub use display::{dump_operands, print_operands};
pub use interp::{retrieve, retrieve_boolean, retrieve_fixnum, retrieve_float};
pub use ir_error::{InternalError, IrError};
pub use kind::{EqualityPolicy, OperandFamily, OperandKind};
pub use literal::LiteralCache;
pub use operand::{KnownValues, Operand};
pub use reference::{Backref, CurrentScope, GlobalVariable, Label, MethAddr, NthRef, ScopeModule};
pub use string_literal::{ChilledString, FrozenString, MutableString, StringPayload};
pub use variable::{
    ClosureLocalVariable, DepthCloneable, LocalVariable, TempKind, TemporaryVariable, Variable,
};
