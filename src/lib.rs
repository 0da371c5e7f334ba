//! # ember-ir
//!
//! The operand layer of an IR for a Ruby-like dynamic language: the values
//! IR instructions take as arguments, together with
//!
//! - evaluation (`ir::retrieve`) against a frame of thread context, `self`,
//!   scopes and temporary slots,
//! - the rewriting hooks optimization passes use (known values, copy
//!   propagation, cloning for inlining, depth rebinding),
//! - a binary codec for persisting operands (`persist`).
//!
//! Literals cache the runtime value they evaluate to on the operand node
//! itself, so sharing a node shares the value and two equal literals built
//! separately do not.

pub mod config;
pub mod ir;
pub mod lang;
pub mod persist;
pub mod runtime;

pub use config::{ChilledStringMode, IrConfig};
pub use ir::{
    CloneInfo, InlineCloneInfo, InternalError, IrError, KnownValues, Operand, OperandKind,
    SimpleCloneInfo, Variable, retrieve,
};
pub use lang::Value;
pub use persist::{DecodeContext, DecodeError, EncodeError};
pub use runtime::{Frame, Runtime, RuntimeError, ThreadContext};
