//! # Runtime object model
//!
//! The values that IR operands evaluate to. This is the small slice of the
//! host object system the operand layer needs: immediates, strings with
//! frozen/chilled state, interned symbols and the handful of heap objects a
//! literal can materialize into.
//!
//! ## Identity
//!
//! - Heap values live behind `Arc`; two values are *the same object* when
//!   the `Arc`s are pointer-equal (`Value::same`).
//! - Immediates (`nil`, booleans, fixnums, floats) are identical when equal.
//! - `PartialEq` on `Value` is structural equality.

pub mod object;
pub mod string;
pub mod symbol;
pub mod value;

pub use object::{
    BuiltinClass, MatchData, RArray, RComplex, RHash, RMethod, RModule, RProc, RRange,
    RRational, RRegexp, RegexpOptions,
};
pub use string::{CodeRange, CreationSite, Encoding, RString};
pub use symbol::{Symbol, SymbolTable};
pub use value::Value;
