//! Evaluation-frame collaborators: runtime, thread context, scopes and
//! temporary slots, plus the user-visible error type.

pub mod context;
pub mod runtime_error;
pub mod scope;

pub use context::{Frame, Runtime, TempSlots, ThreadContext};
pub use runtime_error::{ErrorKind, RuntimeError};
pub use scope::{DynamicScope, ScopeKind, StaticScope};
