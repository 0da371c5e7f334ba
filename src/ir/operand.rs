//! The operand sum type and the contract every kind honors.

use std::sync::Arc;

use num_bigint::BigInt;
use rustc_hash::FxHashMap;

use super::clone_info::CloneInfo;
use super::compound::{
    ArrayOperand, CompoundOperand, CompoundString, DynamicSymbol, HashOperand, KeyValuePair,
    MethodHandle, SValue, Splat, map_children,
};
use super::ir_error::InternalError;
use super::kind::{OperandFamily, OperandKind};
use super::literal::{
    BignumLiteral, ComplexLiteral, FixnumLiteral, FloatLiteral, RangeLiteral, RationalLiteral,
    RegexpLiteral, SymbolLiteral, SymbolProcLiteral,
};
use super::reference::{
    Backref, CurrentScope, GlobalVariable, Label, MethAddr, NthRef, ScopeModule,
};
use super::string_literal::{ChilledString, FrozenString, MutableString, StringPayload};
use super::variable::{DepthCloneable, Variable};
use crate::lang::object::{BuiltinClass, RegexpOptions};
use crate::lang::string::Encoding;

/// Variables whose value is known at a program point, as used by copy
/// propagation and constant folding.
pub type KnownValues = FxHashMap<Variable, Operand>;

/// A value-producing argument of an IR instruction.
///
/// Cloning shares the underlying node: a cloned literal keeps the same cache
/// slot, and `Operand::same` tells clones apart from equal-but-distinct
/// nodes.
#[derive(Debug, Clone)]
pub enum Operand {
    // Literals
    Fixnum(Arc<FixnumLiteral>),
    Bignum(Arc<BignumLiteral>),
    Float(Arc<FloatLiteral>),
    Boolean(bool),
    Nil,
    UnboxedFixnum(i64),
    UnboxedFloat(f64),
    UnboxedBoolean(bool),
    Symbol(Arc<SymbolLiteral>),
    Regexp(Arc<RegexpLiteral>),
    Range(Arc<RangeLiteral>),
    Rational(Arc<RationalLiteral>),
    Complex(Arc<ComplexLiteral>),
    FrozenString(Arc<FrozenString>),
    MutableString(Arc<MutableString>),
    ChilledString(Arc<ChilledString>),
    SymbolProc(Arc<SymbolProcLiteral>),

    Variable(Variable),

    // Compound
    Array(Arc<ArrayOperand>),
    Hash(Arc<HashOperand>),
    HashPair(Arc<KeyValuePair>),
    Splat(Arc<Splat>),
    CompoundString(Arc<CompoundString>),
    DynamicSymbol(Arc<DynamicSymbol>),
    SValue(Arc<SValue>),
    MethodHandle(Arc<MethodHandle>),

    // References and markers
    CurrentScope(CurrentScope),
    ScopeModule(ScopeModule),
    Backref(Backref),
    NthRef(NthRef),
    MethAddr(MethAddr),
    BuiltinClass(BuiltinClass),
    Filename,
    GlobalVariable(GlobalVariable),
    Label(Label),
    NullBlock,
    UndefinedValue,
    /// Placeholder in code that can never run.
    UnexecutableNil,
}

// =============================================================================
// Construction
// =============================================================================

fn utf8_payload(s: &str) -> StringPayload {
    StringPayload::new(s.as_bytes().to_vec(), Encoding::Utf8, "", 0)
}

impl Operand {
    pub fn fixnum(value: i64) -> Self {
        Operand::Fixnum(Arc::new(FixnumLiteral::new(value)))
    }

    pub fn bignum(value: BigInt) -> Self {
        Operand::Bignum(Arc::new(BignumLiteral::new(value)))
    }

    pub fn float(value: f64) -> Self {
        Operand::Float(Arc::new(FloatLiteral::new(value)))
    }

    pub fn boolean(value: bool) -> Self {
        Operand::Boolean(value)
    }

    pub fn symbol(name: &str) -> Self {
        Operand::Symbol(Arc::new(SymbolLiteral::new(name)))
    }

    pub fn symbol_proc(name: &str) -> Self {
        Operand::SymbolProc(Arc::new(SymbolProcLiteral::new(name)))
    }

    pub fn regexp(source: &str, options: RegexpOptions) -> Self {
        Operand::Regexp(Arc::new(RegexpLiteral::new(
            source.as_bytes().to_vec(),
            options,
            Encoding::Utf8,
        )))
    }

    pub fn range(begin: Operand, end: Operand, exclusive: bool) -> Result<Self, InternalError> {
        Ok(Operand::Range(Arc::new(RangeLiteral::new(begin, end, exclusive)?)))
    }

    pub fn rational(numerator: Operand, denominator: Operand) -> Result<Self, InternalError> {
        Ok(Operand::Rational(Arc::new(RationalLiteral::new(
            numerator,
            denominator,
        )?)))
    }

    pub fn complex(number: Operand) -> Result<Self, InternalError> {
        Ok(Operand::Complex(Arc::new(ComplexLiteral::new(number)?)))
    }

    pub fn frozen_string(s: &str) -> Self {
        Operand::FrozenString(Arc::new(FrozenString::new(utf8_payload(s))))
    }

    pub fn mutable_string(s: &str) -> Self {
        Operand::MutableString(Arc::new(MutableString::new(utf8_payload(s))))
    }

    pub fn chilled_string(s: &str) -> Self {
        Operand::ChilledString(Arc::new(ChilledString::new(utf8_payload(s))))
    }

    pub fn local(name: &str, scope_depth: u32, offset: u32) -> Self {
        Operand::Variable(Variable::local(name, scope_depth, offset))
    }

    pub fn temp(offset: u32) -> Self {
        Operand::Variable(Variable::temp(offset))
    }

    pub fn self_value() -> Self {
        Operand::Variable(Variable::SelfValue)
    }

    pub fn array(elements: Vec<Operand>) -> Self {
        Operand::Array(Arc::new(ArrayOperand::new(elements)))
    }

    pub fn hash(pairs: Vec<(Operand, Operand)>, kwargs: bool) -> Self {
        let pairs = pairs
            .into_iter()
            .map(|(key, value)| KeyValuePair::new(key, value))
            .collect();
        Operand::Hash(Arc::new(HashOperand::new(pairs, kwargs)))
    }

    pub fn hash_pair(key: Operand, value: Operand) -> Self {
        Operand::HashPair(Arc::new(KeyValuePair::new(key, value)))
    }

    pub fn splat(array: Operand) -> Self {
        Operand::Splat(Arc::new(Splat::new(array)))
    }

    pub fn compound_string(pieces: Vec<Operand>, encoding: Encoding, frozen: bool) -> Self {
        Operand::CompoundString(Arc::new(CompoundString::new(pieces, encoding, frozen)))
    }

    pub fn dynamic_symbol(string: Operand) -> Self {
        Operand::DynamicSymbol(Arc::new(DynamicSymbol::new(string)))
    }

    pub fn svalue(array: Operand) -> Self {
        Operand::SValue(Arc::new(SValue::new(array)))
    }

    pub fn method_handle(receiver: Operand, method_name: Operand) -> Self {
        Operand::MethodHandle(Arc::new(MethodHandle::new(receiver, method_name)))
    }

    pub fn current_scope(depth: u32) -> Self {
        Operand::CurrentScope(CurrentScope::new(depth))
    }

    pub fn scope_module(depth: u32) -> Self {
        Operand::ScopeModule(ScopeModule::new(depth))
    }

    pub fn nth_ref(n: u32) -> Self {
        Operand::NthRef(NthRef::new(n))
    }

    pub fn meth_addr(name: &str) -> Self {
        Operand::MethAddr(MethAddr::new(name))
    }

    pub fn global(name: &str) -> Self {
        Operand::GlobalVariable(GlobalVariable::new(name))
    }

    pub fn label(prefix: &str, id: u32) -> Self {
        Operand::Label(Label::new(prefix, id))
    }
}

impl From<Variable> for Operand {
    fn from(variable: Variable) -> Self {
        Operand::Variable(variable)
    }
}

// =============================================================================
// Contract
// =============================================================================

impl Operand {
    pub fn kind(&self) -> OperandKind {
        match self {
            Operand::Fixnum(_) => OperandKind::Fixnum,
            Operand::Bignum(_) => OperandKind::Bignum,
            Operand::Float(_) => OperandKind::Float,
            Operand::Boolean(_) => OperandKind::Boolean,
            Operand::Nil => OperandKind::Nil,
            Operand::UnboxedFixnum(_) => OperandKind::UnboxedFixnum,
            Operand::UnboxedFloat(_) => OperandKind::UnboxedFloat,
            Operand::UnboxedBoolean(_) => OperandKind::UnboxedBoolean,
            Operand::Symbol(_) => OperandKind::Symbol,
            Operand::Regexp(_) => OperandKind::Regexp,
            Operand::Range(_) => OperandKind::Range,
            Operand::Rational(_) => OperandKind::Rational,
            Operand::Complex(_) => OperandKind::Complex,
            Operand::FrozenString(_) => OperandKind::FrozenString,
            Operand::MutableString(_) => OperandKind::MutableString,
            Operand::ChilledString(_) => OperandKind::ChilledString,
            Operand::SymbolProc(_) => OperandKind::SymbolProc,
            Operand::Variable(v) => v.kind(),
            Operand::Array(_) => OperandKind::Array,
            Operand::Hash(_) => OperandKind::Hash,
            Operand::HashPair(_) => OperandKind::HashPair,
            Operand::Splat(_) => OperandKind::Splat,
            Operand::CompoundString(_) => OperandKind::CompoundString,
            Operand::DynamicSymbol(_) => OperandKind::DynamicSymbol,
            Operand::SValue(_) => OperandKind::SValue,
            Operand::MethodHandle(_) => OperandKind::MethodHandle,
            Operand::CurrentScope(_) => OperandKind::CurrentScope,
            Operand::ScopeModule(_) => OperandKind::ScopeModule,
            Operand::Backref(_) => OperandKind::Backref,
            Operand::NthRef(_) => OperandKind::NthRef,
            Operand::MethAddr(_) => OperandKind::MethAddr,
            Operand::BuiltinClass(_) => OperandKind::BuiltinClass,
            Operand::Filename => OperandKind::Filename,
            Operand::GlobalVariable(_) => OperandKind::GlobalVariable,
            Operand::Label(_) => OperandKind::Label,
            Operand::NullBlock => OperandKind::NullBlock,
            Operand::UndefinedValue => OperandKind::UndefinedValue,
            Operand::UnexecutableNil => OperandKind::UnexecutableNil,
        }
    }

    /// Reference identity. Nodes without an `Arc` are identical when equal
    /// in every field, including scope depth.
    pub fn same(&self, other: &Operand) -> bool {
        use Operand as O;
        match (self, other) {
            (O::Fixnum(a), O::Fixnum(b)) => Arc::ptr_eq(a, b),
            (O::Bignum(a), O::Bignum(b)) => Arc::ptr_eq(a, b),
            (O::Float(a), O::Float(b)) => Arc::ptr_eq(a, b),
            (O::Symbol(a), O::Symbol(b)) => Arc::ptr_eq(a, b),
            (O::Regexp(a), O::Regexp(b)) => Arc::ptr_eq(a, b),
            (O::Range(a), O::Range(b)) => Arc::ptr_eq(a, b),
            (O::Rational(a), O::Rational(b)) => Arc::ptr_eq(a, b),
            (O::Complex(a), O::Complex(b)) => Arc::ptr_eq(a, b),
            (O::FrozenString(a), O::FrozenString(b)) => Arc::ptr_eq(a, b),
            (O::MutableString(a), O::MutableString(b)) => Arc::ptr_eq(a, b),
            (O::ChilledString(a), O::ChilledString(b)) => Arc::ptr_eq(a, b),
            (O::SymbolProc(a), O::SymbolProc(b)) => Arc::ptr_eq(a, b),
            (O::Array(a), O::Array(b)) => Arc::ptr_eq(a, b),
            (O::Hash(a), O::Hash(b)) => Arc::ptr_eq(a, b),
            (O::HashPair(a), O::HashPair(b)) => Arc::ptr_eq(a, b),
            (O::Splat(a), O::Splat(b)) => Arc::ptr_eq(a, b),
            (O::CompoundString(a), O::CompoundString(b)) => Arc::ptr_eq(a, b),
            (O::DynamicSymbol(a), O::DynamicSymbol(b)) => Arc::ptr_eq(a, b),
            (O::SValue(a), O::SValue(b)) => Arc::ptr_eq(a, b),
            (O::MethodHandle(a), O::MethodHandle(b)) => Arc::ptr_eq(a, b),
            (O::Variable(a), O::Variable(b)) => a == b && a.scope_depth() == b.scope_depth(),
            _ => self == other,
        }
    }

    /// True when evaluation needs nothing from the frame.
    pub fn has_known_value(&self) -> bool {
        match self {
            Operand::Fixnum(_)
            | Operand::Bignum(_)
            | Operand::Float(_)
            | Operand::Boolean(_)
            | Operand::Nil
            | Operand::UnboxedFixnum(_)
            | Operand::UnboxedFloat(_)
            | Operand::UnboxedBoolean(_)
            | Operand::Symbol(_)
            | Operand::Regexp(_)
            | Operand::Range(_)
            | Operand::Rational(_)
            | Operand::Complex(_)
            | Operand::FrozenString(_)
            | Operand::MutableString(_)
            | Operand::ChilledString(_)
            | Operand::SymbolProc(_) => true,
            Operand::Array(a) => a.has_known_value(),
            Operand::Hash(h) => h.has_known_value(),
            Operand::HashPair(p) => p.has_known_value(),
            Operand::Splat(s) => s.has_known_value(),
            Operand::CompoundString(s) => s.has_known_value(),
            Operand::DynamicSymbol(s) => s.has_known_value(),
            Operand::SValue(s) => s.has_known_value(),
            Operand::MethodHandle(m) => m.has_known_value(),
            Operand::Variable(_)
            | Operand::CurrentScope(_)
            | Operand::ScopeModule(_)
            | Operand::Backref(_)
            | Operand::NthRef(_)
            | Operand::MethAddr(_)
            | Operand::BuiltinClass(_)
            | Operand::Filename
            | Operand::GlobalVariable(_)
            | Operand::Label(_)
            | Operand::NullBlock
            | Operand::UndefinedValue
            | Operand::UnexecutableNil => false,
        }
    }

    /// Whether this operand may replace a variable at its other uses.
    ///
    /// Immutable literals, the variables themselves and the scope-relative
    /// references qualify. A mutable string may not: each use must see a
    /// fresh object.
    pub fn can_copy_propagate(&self) -> bool {
        match self {
            Operand::Fixnum(_)
            | Operand::Bignum(_)
            | Operand::Float(_)
            | Operand::Boolean(_)
            | Operand::Nil
            | Operand::UnboxedFixnum(_)
            | Operand::UnboxedFloat(_)
            | Operand::UnboxedBoolean(_)
            | Operand::Symbol(_)
            | Operand::Regexp(_)
            | Operand::Range(_)
            | Operand::Rational(_)
            | Operand::Complex(_)
            | Operand::FrozenString(_)
            | Operand::SymbolProc(_)
            | Operand::Variable(_)
            | Operand::CurrentScope(_)
            | Operand::ScopeModule(_)
            | Operand::Backref(_)
            | Operand::NthRef(_)
            | Operand::MethAddr(_)
            | Operand::BuiltinClass(_)
            | Operand::NullBlock
            | Operand::UndefinedValue => true,
            Operand::MutableString(_)
            | Operand::ChilledString(_)
            | Operand::Array(_)
            | Operand::Hash(_)
            | Operand::HashPair(_)
            | Operand::Splat(_)
            | Operand::CompoundString(_)
            | Operand::DynamicSymbol(_)
            | Operand::SValue(_)
            | Operand::MethodHandle(_)
            | Operand::Filename
            | Operand::GlobalVariable(_)
            | Operand::Label(_)
            | Operand::UnexecutableNil => false,
        }
    }

    /// Append every variable this operand reads, in left-to-right order.
    pub fn add_used_variables(&self, acc: &mut Vec<Variable>) {
        match self {
            Operand::Variable(v) => acc.push(v.clone()),
            Operand::Range(r) => {
                r.begin().add_used_variables(acc);
                r.end().add_used_variables(acc);
            }
            Operand::Array(a) => a.add_used_variables(acc),
            Operand::Hash(h) => h.add_used_variables(acc),
            Operand::HashPair(p) => p.add_used_variables(acc),
            Operand::Splat(s) => s.add_used_variables(acc),
            Operand::CompoundString(s) => s.add_used_variables(acc),
            Operand::DynamicSymbol(s) => s.add_used_variables(acc),
            Operand::SValue(s) => s.add_used_variables(acc),
            Operand::MethodHandle(m) => m.add_used_variables(acc),
            _ => {}
        }
    }

    pub fn used_variables(&self) -> Vec<Variable> {
        let mut acc = Vec::new();
        self.add_used_variables(&mut acc);
        acc
    }

    /// Copy for splicing into another scope, renaming through `info`.
    /// Operands with nothing to rename come back as the same node.
    pub fn clone_for_inlining(&self, info: &mut dyn CloneInfo) -> Operand {
        match self {
            Operand::Variable(Variable::SelfValue) => info.renamed_self(),
            Operand::Variable(v) => Operand::Variable(info.renamed_variable(v)),
            Operand::Label(l) => Operand::Label(info.renamed_label(l)),
            Operand::Array(a) if !a.has_known_value() => {
                Operand::Array(map_children(a, |op| op.clone_for_inlining(&mut *info)))
            }
            Operand::Hash(h) if !h.has_known_value() => {
                Operand::Hash(map_children(h, |op| op.clone_for_inlining(&mut *info)))
            }
            Operand::HashPair(p) if !p.has_known_value() => {
                Operand::HashPair(map_children(p, |op| op.clone_for_inlining(&mut *info)))
            }
            Operand::Splat(s) if !s.has_known_value() => {
                Operand::Splat(map_children(s, |op| op.clone_for_inlining(&mut *info)))
            }
            Operand::CompoundString(s) if !s.has_known_value() => {
                Operand::CompoundString(map_children(s, |op| op.clone_for_inlining(&mut *info)))
            }
            Operand::DynamicSymbol(s) if !s.has_known_value() => {
                Operand::DynamicSymbol(map_children(s, |op| op.clone_for_inlining(&mut *info)))
            }
            Operand::SValue(s) if !s.has_known_value() => {
                Operand::SValue(map_children(s, |op| op.clone_for_inlining(&mut *info)))
            }
            Operand::MethodHandle(m) if !m.has_known_value() => {
                Operand::MethodHandle(map_children(m, |op| op.clone_for_inlining(&mut *info)))
            }
            _ => self.clone(),
        }
    }

    /// Rewrite with `known` substituted for variables.
    ///
    /// A variable is replaced only by a copy-propagatable operand unless
    /// `force` is set. The result is the same node when nothing changed.
    pub fn simplified(&self, known: &KnownValues, force: bool) -> Operand {
        match self {
            Operand::Variable(v) => match known.get(v) {
                Some(replacement) if force || replacement.can_copy_propagate() => {
                    tracing::trace!(variable = %v, replacement = %replacement, "propagated");
                    replacement.clone()
                }
                _ => self.clone(),
            },
            Operand::Array(a) => {
                Operand::Array(map_children(a, |op| op.simplified(known, force)))
            }
            Operand::Hash(h) => Operand::Hash(map_children(h, |op| op.simplified(known, force))),
            Operand::HashPair(p) => {
                Operand::HashPair(map_children(p, |op| op.simplified(known, force)))
            }
            Operand::Splat(s) => Operand::Splat(map_children(s, |op| op.simplified(known, force))),
            Operand::CompoundString(s) => {
                Operand::CompoundString(map_children(s, |op| op.simplified(known, force)))
            }
            Operand::DynamicSymbol(s) => {
                Operand::DynamicSymbol(map_children(s, |op| op.simplified(known, force)))
            }
            Operand::SValue(s) => {
                let array = s.array().simplified(known, force);
                if let Operand::Array(a) = &array {
                    if let Some(collapsed) = SValue::collapse(a) {
                        return collapsed;
                    }
                }
                if array.same(s.array()) {
                    self.clone()
                } else {
                    Operand::svalue(array)
                }
            }
            Operand::MethodHandle(m) => {
                Operand::MethodHandle(map_children(m, |op| op.simplified(known, force)))
            }
            _ => self.clone(),
        }
    }

    /// Same operand rebound to `depth`; `None` for kinds that are not
    /// addressed by scope depth.
    pub fn clone_for_depth(&self, depth: u32) -> Option<Operand> {
        match self {
            Operand::Variable(v) => v.clone_for_depth(depth).map(Operand::Variable),
            Operand::HashPair(p) => Some(Operand::HashPair(Arc::new(p.clone_for_depth(depth)))),
            Operand::CurrentScope(s) => Some(Operand::CurrentScope(s.clone_for_depth(depth))),
            Operand::ScopeModule(s) => Some(Operand::ScopeModule(s.clone_for_depth(depth))),
            _ => None,
        }
    }

    pub fn scope_depth(&self) -> Option<u32> {
        match self {
            Operand::Variable(v) => v.scope_depth(),
            Operand::HashPair(p) => p.value().scope_depth(),
            Operand::CurrentScope(s) => Some(s.depth()),
            Operand::ScopeModule(s) => Some(s.depth()),
            _ => None,
        }
    }

    /// Evaluates to a truthy value no matter the frame.
    pub fn is_truthy_immediate(&self) -> bool {
        match self {
            Operand::Boolean(b) | Operand::UnboxedBoolean(b) => *b,
            Operand::Nil => false,
            Operand::Array(_)
            | Operand::Hash(_)
            | Operand::CompoundString(_)
            | Operand::DynamicSymbol(_)
            | Operand::MethAddr(_)
            | Operand::BuiltinClass(_)
            | Operand::Filename => true,
            other => other.kind().family() == OperandFamily::Literal,
        }
    }

    /// Evaluates to `nil` or `false` no matter the frame.
    pub fn is_falsy_immediate(&self) -> bool {
        matches!(
            self,
            Operand::Nil | Operand::Boolean(false) | Operand::UnboxedBoolean(false)
        )
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Operand::Variable(v) => Some(v),
            _ => None,
        }
    }
}

impl PartialEq for Operand {
    fn eq(&self, other: &Self) -> bool {
        use Operand as O;
        match (self, other) {
            (O::Fixnum(a), O::Fixnum(b)) => a == b,
            (O::Bignum(a), O::Bignum(b)) => a == b,
            (O::Float(a), O::Float(b)) => a == b,
            (O::Boolean(a), O::Boolean(b)) => a == b,
            (O::Nil, O::Nil) => true,
            (O::UnboxedFixnum(a), O::UnboxedFixnum(b)) => a == b,
            (O::UnboxedFloat(a), O::UnboxedFloat(b)) => a.to_bits() == b.to_bits(),
            (O::UnboxedBoolean(a), O::UnboxedBoolean(b)) => a == b,
            (O::Symbol(a), O::Symbol(b)) => a == b,
            (O::Regexp(a), O::Regexp(b)) => a == b,
            (O::Range(a), O::Range(b)) => a == b,
            (O::Rational(a), O::Rational(b)) => a == b,
            (O::Complex(a), O::Complex(b)) => a == b,
            (O::FrozenString(a), O::FrozenString(b)) => a == b,
            (O::MutableString(a), O::MutableString(b)) => a == b,
            (O::ChilledString(a), O::ChilledString(b)) => a == b,
            (O::SymbolProc(a), O::SymbolProc(b)) => a == b,
            (O::Variable(a), O::Variable(b)) => a == b,
            (O::Array(a), O::Array(b)) => a == b,
            (O::Hash(a), O::Hash(b)) => a == b,
            (O::HashPair(a), O::HashPair(b)) => a == b,
            (O::Splat(a), O::Splat(b)) => a == b,
            (O::CompoundString(a), O::CompoundString(b)) => a == b,
            (O::DynamicSymbol(a), O::DynamicSymbol(b)) => a == b,
            (O::SValue(a), O::SValue(b)) => a == b,
            (O::MethodHandle(a), O::MethodHandle(b)) => a == b,
            (O::CurrentScope(a), O::CurrentScope(b)) => a == b,
            (O::ScopeModule(a), O::ScopeModule(b)) => a == b,
            (O::Backref(a), O::Backref(b)) => a == b,
            (O::NthRef(a), O::NthRef(b)) => a == b,
            (O::MethAddr(a), O::MethAddr(b)) => a == b,
            (O::BuiltinClass(a), O::BuiltinClass(b)) => a == b,
            (O::Filename, O::Filename) => true,
            (O::GlobalVariable(a), O::GlobalVariable(b)) => a == b,
            (O::Label(a), O::Label(b)) => a == b,
            (O::NullBlock, O::NullBlock) => true,
            (O::UndefinedValue, O::UndefinedValue) => true,
            (O::UnexecutableNil, O::UnexecutableNil) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::clone_info::SimpleCloneInfo;

    #[test]
    fn test_clone_shares_node() {
        let a = Operand::fixnum(1);
        let b = a.clone();
        let c = Operand::fixnum(1);
        assert!(a.same(&b));
        assert!(!a.same(&c));
        assert_eq!(a, c);
    }

    #[test]
    fn test_variable_identity_includes_depth() {
        let x0 = Operand::local("x", 0, 2);
        let x1 = Operand::local("x", 1, 2);
        assert_eq!(x0, x1);
        assert!(!x0.same(&x1));
        assert!(x0.same(&Operand::local("x", 0, 2)));
    }

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(Operand::temp(3).kind(), OperandKind::TemporaryVariable);
        assert_eq!(Operand::self_value().kind(), OperandKind::SelfValue);
        assert_eq!(Operand::hash_pair(Operand::Nil, Operand::Nil).kind(), OperandKind::HashPair);
        assert_eq!(Operand::UnexecutableNil.kind(), OperandKind::UnexecutableNil);
    }

    #[test]
    fn test_copy_propagation_excludes_mutable_values() {
        assert!(Operand::fixnum(1).can_copy_propagate());
        assert!(Operand::frozen_string("a").can_copy_propagate());
        assert!(Operand::temp(1).can_copy_propagate());
        assert!(!Operand::mutable_string("a").can_copy_propagate());
        assert!(!Operand::chilled_string("a").can_copy_propagate());
        assert!(!Operand::array(vec![]).can_copy_propagate());
        assert!(!Operand::global("$x").can_copy_propagate());
    }

    #[test]
    fn test_scope_references_propagate() {
        let references = [
            Operand::current_scope(0),
            Operand::scope_module(1),
            Operand::Backref(Backref::PostMatch),
            Operand::nth_ref(2),
        ];
        for reference in references {
            assert!(reference.can_copy_propagate(), "{reference}");
            let t = Variable::temp(0);
            let mut known = KnownValues::default();
            known.insert(t.clone(), reference.clone());
            let simplified = Operand::from(t).simplified(&known, false);
            assert!(simplified.same(&reference), "{reference}");
        }
    }

    #[test]
    fn test_simplify_replaces_known_variables() {
        let x = Variable::local("x", 0, 0);
        let mut known = KnownValues::default();
        known.insert(x.clone(), Operand::fixnum(5));
        let simplified = Operand::from(x).simplified(&known, false);
        assert_eq!(simplified, Operand::fixnum(5));
    }

    #[test]
    fn test_simplify_respects_copy_propagation_unless_forced() {
        let t = Variable::temp(0);
        let mut known = KnownValues::default();
        known.insert(t.clone(), Operand::mutable_string("s"));
        let op = Operand::from(t);
        assert!(op.simplified(&known, false).same(&op));
        assert_eq!(op.simplified(&known, true).kind(), OperandKind::MutableString);
    }

    #[test]
    fn test_simplify_returns_same_compound_when_unchanged() {
        let array = Operand::array(vec![Operand::fixnum(1), Operand::temp(0)]);
        let known = KnownValues::default();
        assert!(array.simplified(&known, false).same(&array));
    }

    #[test]
    fn test_simplify_rebuilds_changed_compound() {
        let one = Operand::fixnum(1);
        let array = Operand::array(vec![one.clone(), Operand::temp(0)]);
        let mut known = KnownValues::default();
        known.insert(Variable::temp(0), Operand::fixnum(2));
        let simplified = array.simplified(&known, false);
        assert!(!simplified.same(&array));
        assert!(simplified.has_known_value());
        let Operand::Array(a) = &simplified else {
            panic!("expected array");
        };
        assert!(a.elements()[0].same(&one));
    }

    #[test]
    fn test_svalue_simplification() {
        let known = KnownValues::default();
        assert_eq!(Operand::svalue(Operand::array(vec![])).simplified(&known, false), Operand::Nil);
        let inner = Operand::temp(4);
        assert!(Operand::svalue(Operand::array(vec![inner.clone()]))
            .simplified(&known, false)
            .same(&inner));
        let opaque = Operand::svalue(Operand::temp(0));
        assert!(opaque.simplified(&known, false).same(&opaque));
    }

    #[test]
    fn test_used_variables_in_order() {
        let op = Operand::hash(
            vec![
                (Operand::temp(1), Operand::local("a", 0, 0)),
                (Operand::symbol("k"), Operand::splat(Operand::local("b", 1, 3))),
            ],
            false,
        );
        let names: Vec<String> = op.used_variables().iter().map(|v| v.to_string()).collect();
        assert_eq!(names, ["%v_1", "a(0:0)", "b(1:3)"]);
    }

    #[test]
    fn test_known_value_of_compounds() {
        assert!(Operand::array(vec![Operand::fixnum(1), Operand::symbol("s")]).has_known_value());
        assert!(!Operand::array(vec![Operand::fixnum(1), Operand::temp(0)]).has_known_value());
        assert!(!Operand::current_scope(0).has_known_value());
    }

    #[test]
    fn test_clone_for_inlining_known_compound_is_shared() {
        let array = Operand::array(vec![Operand::fixnum(1)]);
        let mut info = SimpleCloneInfo::new();
        assert!(array.clone_for_inlining(&mut info).same(&array));
    }

    #[test]
    fn test_clone_for_depth() {
        let op = Operand::local("x", 2, 0);
        assert_eq!(op.clone_for_depth(0).unwrap().scope_depth(), Some(0));
        assert_eq!(Operand::scope_module(1).clone_for_depth(0), Some(Operand::scope_module(0)));
        assert!(Operand::temp(0).clone_for_depth(1).is_none());
        assert!(Operand::fixnum(1).clone_for_depth(1).is_none());
    }

    #[test]
    fn test_immediate_truthiness() {
        assert!(Operand::fixnum(0).is_truthy_immediate());
        assert!(Operand::mutable_string("").is_truthy_immediate());
        assert!(!Operand::Nil.is_truthy_immediate());
        assert!(!Operand::boolean(false).is_truthy_immediate());
        assert!(Operand::Nil.is_falsy_immediate());
        assert!(Operand::UnboxedBoolean(false).is_falsy_immediate());
        let t = Operand::temp(0);
        assert!(!t.is_truthy_immediate() && !t.is_falsy_immediate());
    }
}
