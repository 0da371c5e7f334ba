//! Named and temporary storage-slot references.
//!
//! Local variables are addressed by `(depth, offset)` into the dynamic scope
//! chain but compare on `(name, offset)`: depth is relative to the use site
//! and changes whenever a closure is flattened or inlined.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::kind::OperandKind;
use crate::runtime::scope::StaticScope;

/// Operands that can be rebound to a different lexical depth.
pub trait DepthCloneable {
    /// Same operand, with its scope depth replaced by `depth`.
    fn clone_for_depth(&self, depth: u32) -> Self;
}

// =============================================================================
// Local variables
// =============================================================================

#[derive(Debug, Clone)]
pub struct LocalVariable {
    name: Arc<str>,
    scope_depth: u32,
    offset: u32,
}

impl LocalVariable {
    pub fn new(name: &str, scope_depth: u32, offset: u32) -> Self {
        LocalVariable {
            name: Arc::from(name),
            scope_depth,
            offset,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope_depth(&self) -> u32 {
        self.scope_depth
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }
}

impl DepthCloneable for LocalVariable {
    fn clone_for_depth(&self, depth: u32) -> Self {
        LocalVariable {
            name: self.name.clone(),
            scope_depth: depth,
            offset: self.offset,
        }
    }
}

impl PartialEq for LocalVariable {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.name == other.name
    }
}

impl Eq for LocalVariable {}

impl Hash for LocalVariable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.offset.hash(state);
    }
}

impl fmt::Display for LocalVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}:{})", self.name, self.scope_depth, self.offset)
    }
}

/// A local declared by an enclosing scope and captured by a closure.
#[derive(Clone)]
pub struct ClosureLocalVariable {
    local: LocalVariable,
    defining_scope: Arc<StaticScope>,
}

impl ClosureLocalVariable {
    pub fn new(name: &str, scope_depth: u32, offset: u32, defining_scope: Arc<StaticScope>) -> Self {
        ClosureLocalVariable {
            local: LocalVariable::new(name, scope_depth, offset),
            defining_scope,
        }
    }

    pub fn name(&self) -> &str {
        self.local.name()
    }

    pub fn scope_depth(&self) -> u32 {
        self.local.scope_depth()
    }

    pub fn offset(&self) -> u32 {
        self.local.offset()
    }

    pub fn defining_scope(&self) -> &Arc<StaticScope> {
        &self.defining_scope
    }

    pub fn as_local(&self) -> &LocalVariable {
        &self.local
    }
}

impl DepthCloneable for ClosureLocalVariable {
    fn clone_for_depth(&self, depth: u32) -> Self {
        ClosureLocalVariable {
            local: self.local.clone_for_depth(depth),
            defining_scope: self.defining_scope.clone(),
        }
    }
}

impl PartialEq for ClosureLocalVariable {
    fn eq(&self, other: &Self) -> bool {
        self.local == other.local
    }
}

impl Eq for ClosureLocalVariable {}

impl Hash for ClosureLocalVariable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.local.hash(state);
    }
}

impl fmt::Debug for ClosureLocalVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosureLocalVariable")
            .field("name", &self.name())
            .field("scope_depth", &self.scope_depth())
            .field("offset", &self.offset())
            .finish()
    }
}

// =============================================================================
// Temporaries
// =============================================================================

/// Representation hint of a temporary slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TempKind {
    Local,
    Fixnum,
    Float,
    Boolean,
    CurrentModule,
    CurrentScope,
    Closure { closure_id: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemporaryVariable {
    kind: TempKind,
    offset: u32,
}

impl TemporaryVariable {
    pub fn new(kind: TempKind, offset: u32) -> Self {
        TemporaryVariable { kind, offset }
    }

    pub fn local(offset: u32) -> Self {
        Self::new(TempKind::Local, offset)
    }

    pub fn fixnum(offset: u32) -> Self {
        Self::new(TempKind::Fixnum, offset)
    }

    pub fn float(offset: u32) -> Self {
        Self::new(TempKind::Float, offset)
    }

    pub fn boolean(offset: u32) -> Self {
        Self::new(TempKind::Boolean, offset)
    }

    pub fn current_module(offset: u32) -> Self {
        Self::new(TempKind::CurrentModule, offset)
    }

    pub fn current_scope(offset: u32) -> Self {
        Self::new(TempKind::CurrentScope, offset)
    }

    pub fn closure(closure_id: u32, offset: u32) -> Self {
        Self::new(TempKind::Closure { closure_id }, offset)
    }

    pub fn kind(&self) -> TempKind {
        self.kind
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Same representation, different slot.
    pub fn with_offset(&self, offset: u32) -> Self {
        Self::new(self.kind, offset)
    }

    pub fn operand_kind(&self) -> OperandKind {
        match self.kind {
            TempKind::Local => OperandKind::TemporaryVariable,
            TempKind::Fixnum => OperandKind::TemporaryFixnum,
            TempKind::Float => OperandKind::TemporaryFloat,
            TempKind::Boolean => OperandKind::TemporaryBoolean,
            TempKind::CurrentModule => OperandKind::TemporaryCurrentModule,
            TempKind::CurrentScope => OperandKind::TemporaryCurrentScope,
            TempKind::Closure { .. } => OperandKind::TemporaryClosure,
        }
    }
}

impl fmt::Display for TemporaryVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TempKind::Local => write!(f, "%v_{}", self.offset),
            TempKind::Fixnum => write!(f, "%i_{}", self.offset),
            TempKind::Float => write!(f, "%f_{}", self.offset),
            TempKind::Boolean => write!(f, "%b_{}", self.offset),
            TempKind::CurrentModule => write!(f, "%current_module"),
            TempKind::CurrentScope => write!(f, "%current_scope"),
            TempKind::Closure { closure_id } => write!(f, "%cl_{}_{}", closure_id, self.offset),
        }
    }
}

// =============================================================================
// Variable
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Variable {
    Local(LocalVariable),
    ClosureLocal(ClosureLocalVariable),
    Temporary(TemporaryVariable),
    SelfValue,
}

impl Variable {
    pub fn local(name: &str, scope_depth: u32, offset: u32) -> Self {
        Variable::Local(LocalVariable::new(name, scope_depth, offset))
    }

    pub fn temp(offset: u32) -> Self {
        Variable::Temporary(TemporaryVariable::local(offset))
    }

    pub fn kind(&self) -> OperandKind {
        match self {
            Variable::Local(_) => OperandKind::LocalVariable,
            Variable::ClosureLocal(_) => OperandKind::ClosureLocalVariable,
            Variable::Temporary(t) => t.operand_kind(),
            Variable::SelfValue => OperandKind::SelfValue,
        }
    }

    pub fn name(&self) -> String {
        self.to_string()
    }

    pub fn scope_depth(&self) -> Option<u32> {
        match self {
            Variable::Local(v) => Some(v.scope_depth()),
            Variable::ClosureLocal(v) => Some(v.scope_depth()),
            Variable::Temporary(_) | Variable::SelfValue => None,
        }
    }

    /// `None` for variables that are not addressed by depth.
    pub fn clone_for_depth(&self, depth: u32) -> Option<Variable> {
        match self {
            Variable::Local(v) => Some(Variable::Local(v.clone_for_depth(depth))),
            Variable::ClosureLocal(v) => Some(Variable::ClosureLocal(v.clone_for_depth(depth))),
            Variable::Temporary(_) | Variable::SelfValue => None,
        }
    }

    pub fn is_self(&self) -> bool {
        matches!(self, Variable::SelfValue)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Local(v) => write!(f, "{}", v),
            Variable::ClosureLocal(v) => write!(f, "{}", v.as_local()),
            Variable::Temporary(t) => write!(f, "{}", t),
            Variable::SelfValue => write!(f, "%self"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::scope::ScopeKind;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_clone_for_depth_preserves_slot() {
        let x = LocalVariable::new("x", 1, 2);
        let shifted = x.clone_for_depth(0);
        assert_eq!(shifted.name(), "x");
        assert_eq!(shifted.scope_depth(), 0);
        assert_eq!(shifted.offset(), 2);
        assert_eq!(x, shifted);

        let mut set = FxHashSet::default();
        set.insert(Variable::Local(x));
        assert!(set.contains(&Variable::Local(shifted)));
    }

    #[test]
    fn test_depth_round_trip() {
        let x = Variable::local("x", 3, 1);
        let twice = x.clone_for_depth(5).unwrap().clone_for_depth(2).unwrap();
        assert_eq!(twice.scope_depth(), Some(2));
        assert_eq!(twice, x);
    }

    #[test]
    fn test_closure_local_keeps_defining_scope() {
        let scope = Arc::new(StaticScope::new(ScopeKind::Method, "t.rb", None));
        let v = ClosureLocalVariable::new("y", 1, 0, scope.clone());
        let shifted = v.clone_for_depth(3);
        assert!(Arc::ptr_eq(shifted.defining_scope(), &scope));
        assert_eq!(shifted.scope_depth(), 3);
        assert_eq!(shifted, v);
    }

    #[test]
    fn test_different_offsets_differ() {
        assert_ne!(LocalVariable::new("x", 0, 1), LocalVariable::new("x", 0, 2));
        assert_ne!(LocalVariable::new("x", 0, 1), LocalVariable::new("y", 0, 1));
    }

    #[test]
    fn test_temporaries_compare_on_kind_and_offset() {
        assert_eq!(TemporaryVariable::local(3), TemporaryVariable::local(3));
        assert_ne!(TemporaryVariable::local(3), TemporaryVariable::fixnum(3));
        assert_ne!(TemporaryVariable::closure(1, 3), TemporaryVariable::closure(2, 3));
    }

    #[test]
    fn test_temporaries_are_not_depth_cloneable() {
        assert!(Variable::temp(0).clone_for_depth(1).is_none());
        assert!(Variable::SelfValue.clone_for_depth(1).is_none());
    }

    #[test]
    fn test_names() {
        assert_eq!(Variable::local("x", 1, 2).name(), "x(1:2)");
        assert_eq!(Variable::temp(4).name(), "%v_4");
        assert_eq!(
            Variable::Temporary(TemporaryVariable::fixnum(1)).name(),
            "%i_1"
        );
        assert_eq!(
            Variable::Temporary(TemporaryVariable::closure(2, 5)).name(),
            "%cl_2_5"
        );
        assert_eq!(Variable::SelfValue.name(), "%self");
    }
}
