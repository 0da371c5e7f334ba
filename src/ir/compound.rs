//! Operands built from other operands.
//!
//! A compound node is rebuilt only when one of its children actually
//! changes; otherwise the caller gets the very same `Arc` back, which is what
//! lets optimization passes detect a fixed point with `Operand::same`.

use std::sync::Arc;

use super::interp;
use super::ir_error::IrError;
use super::operand::Operand;
use super::variable::{DepthCloneable, Variable};
use crate::lang::object::{RHash, RMethod};
use crate::lang::string::{Encoding, RString};
use crate::lang::value::Value;
use crate::runtime::context::Frame;
use crate::runtime::runtime_error::RuntimeError;

/// Shared traversal over a compound node's children.
pub trait CompoundOperand: Sized {
    fn children(&self) -> Vec<&Operand>;

    /// A copy with `f` applied to every child, or `None` when `f` returned
    /// each child unchanged.
    fn rebuild<F: FnMut(&Operand) -> Operand>(&self, f: F) -> Option<Self>;

    fn has_known_value(&self) -> bool {
        self.children().iter().all(|child| child.has_known_value())
    }

    fn add_used_variables(&self, acc: &mut Vec<Variable>) {
        for child in self.children() {
            child.add_used_variables(acc);
        }
    }
}

/// `node` itself when nothing changed, else a new node.
pub fn map_children<T, F>(node: &Arc<T>, f: F) -> Arc<T>
where
    T: CompoundOperand,
    F: FnMut(&Operand) -> Operand,
{
    match node.rebuild(f) {
        Some(rebuilt) => Arc::new(rebuilt),
        None => node.clone(),
    }
}

fn map_operands<F: FnMut(&Operand) -> Operand>(
    operands: &[Operand],
    mut f: F,
) -> Option<Vec<Operand>> {
    let mut changed = false;
    let mapped: Vec<Operand> = operands
        .iter()
        .map(|operand| {
            let new = f(operand);
            changed |= !new.same(operand);
            new
        })
        .collect();
    changed.then_some(mapped)
}

fn map_one<F: FnMut(&Operand) -> Operand>(operand: &Operand, mut f: F) -> Option<Operand> {
    let new = f(operand);
    (!new.same(operand)).then_some(new)
}

// =============================================================================
// Array
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayOperand {
    elements: Vec<Operand>,
}

impl ArrayOperand {
    pub fn new(elements: Vec<Operand>) -> Self {
        ArrayOperand { elements }
    }

    pub fn elements(&self) -> &[Operand] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// A fresh array on every call; splats are spliced in place.
    pub fn retrieve(&self, frame: &Frame<'_>) -> Result<Value, IrError> {
        let mut values = Vec::with_capacity(self.elements.len());
        for element in &self.elements {
            match element {
                Operand::Splat(splat) => values.extend(splat.retrieve_elements(frame)?),
                _ => values.push(interp::retrieve(element, frame)?),
            }
        }
        Ok(Value::array(values))
    }
}

impl CompoundOperand for ArrayOperand {
    fn children(&self) -> Vec<&Operand> {
        self.elements.iter().collect()
    }

    fn rebuild<F: FnMut(&Operand) -> Operand>(&self, f: F) -> Option<Self> {
        map_operands(&self.elements, f).map(ArrayOperand::new)
    }
}

// =============================================================================
// Hash
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct KeyValuePair {
    key: Operand,
    value: Operand,
}

impl KeyValuePair {
    pub fn new(key: Operand, value: Operand) -> Self {
        KeyValuePair { key, value }
    }

    pub fn key(&self) -> &Operand {
        &self.key
    }

    pub fn value(&self) -> &Operand {
        &self.value
    }
}

impl CompoundOperand for KeyValuePair {
    fn children(&self) -> Vec<&Operand> {
        vec![&self.key, &self.value]
    }

    fn rebuild<F: FnMut(&Operand) -> Operand>(&self, mut f: F) -> Option<Self> {
        let key = map_one(&self.key, &mut f);
        let value = map_one(&self.value, &mut f);
        if key.is_none() && value.is_none() {
            return None;
        }
        Some(KeyValuePair {
            key: key.unwrap_or_else(|| self.key.clone()),
            value: value.unwrap_or_else(|| self.value.clone()),
        })
    }
}

/// Rebinds the value; keys are never depth-addressed.
impl DepthCloneable for KeyValuePair {
    fn clone_for_depth(&self, depth: u32) -> Self {
        KeyValuePair {
            key: self.key.clone(),
            value: self
                .value
                .clone_for_depth(depth)
                .unwrap_or_else(|| self.value.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HashOperand {
    pairs: Vec<KeyValuePair>,
    kwargs: bool,
}

impl HashOperand {
    pub fn new(pairs: Vec<KeyValuePair>, kwargs: bool) -> Self {
        HashOperand { pairs, kwargs }
    }

    pub fn pairs(&self) -> &[KeyValuePair] {
        &self.pairs
    }

    pub fn is_kwargs(&self) -> bool {
        self.kwargs
    }

    pub fn retrieve(&self, frame: &Frame<'_>) -> Result<Value, IrError> {
        let hash = RHash::new(self.kwargs);
        for pair in &self.pairs {
            let key = interp::retrieve(&pair.key, frame)?;
            let value = interp::retrieve(&pair.value, frame)?;
            hash.insert(key, value);
        }
        Ok(Value::Hash(Arc::new(hash)))
    }
}

impl CompoundOperand for HashOperand {
    fn children(&self) -> Vec<&Operand> {
        self.pairs
            .iter()
            .flat_map(|pair| [&pair.key, &pair.value])
            .collect()
    }

    fn rebuild<F: FnMut(&Operand) -> Operand>(&self, mut f: F) -> Option<Self> {
        let mut changed = false;
        let pairs: Vec<KeyValuePair> = self
            .pairs
            .iter()
            .map(|pair| match pair.rebuild(&mut f) {
                Some(rebuilt) => {
                    changed = true;
                    rebuilt
                }
                None => pair.clone(),
            })
            .collect();
        changed.then(|| HashOperand::new(pairs, self.kwargs))
    }
}

// =============================================================================
// Splat
// =============================================================================

/// `*expr`
#[derive(Debug, Clone, PartialEq)]
pub struct Splat {
    array: Operand,
}

impl Splat {
    pub fn new(array: Operand) -> Self {
        Splat { array }
    }

    pub fn array(&self) -> &Operand {
        &self.array
    }

    fn retrieve_elements(&self, frame: &Frame<'_>) -> Result<Vec<Value>, IrError> {
        Ok(match interp::retrieve(&self.array, frame)? {
            Value::Array(array) => array.to_vec(),
            Value::Nil => Vec::new(),
            other => vec![other],
        })
    }

    pub fn retrieve(&self, frame: &Frame<'_>) -> Result<Value, IrError> {
        Ok(Value::array(self.retrieve_elements(frame)?))
    }
}

impl CompoundOperand for Splat {
    fn children(&self) -> Vec<&Operand> {
        vec![&self.array]
    }

    fn rebuild<F: FnMut(&Operand) -> Operand>(&self, f: F) -> Option<Self> {
        map_one(&self.array, f).map(Splat::new)
    }
}

// =============================================================================
// Strings and symbols
// =============================================================================

/// `"a#{b}c"`
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundString {
    pieces: Vec<Operand>,
    encoding: Encoding,
    frozen: bool,
}

impl CompoundString {
    pub fn new(pieces: Vec<Operand>, encoding: Encoding, frozen: bool) -> Self {
        CompoundString {
            pieces,
            encoding,
            frozen,
        }
    }

    pub fn pieces(&self) -> &[Operand] {
        &self.pieces
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn build_bytes(&self, frame: &Frame<'_>) -> Result<Vec<u8>, IrError> {
        let mut bytes = Vec::new();
        for piece in &self.pieces {
            bytes.extend(interp::retrieve(piece, frame)?.to_s_bytes());
        }
        Ok(bytes)
    }

    pub fn retrieve(&self, frame: &Frame<'_>) -> Result<Value, IrError> {
        let string = RString::new(self.build_bytes(frame)?, self.encoding);
        if self.frozen {
            string.freeze();
        }
        Ok(Value::string(string))
    }
}

impl CompoundOperand for CompoundString {
    fn children(&self) -> Vec<&Operand> {
        self.pieces.iter().collect()
    }

    fn rebuild<F: FnMut(&Operand) -> Operand>(&self, f: F) -> Option<Self> {
        map_operands(&self.pieces, f)
            .map(|pieces| CompoundString::new(pieces, self.encoding, self.frozen))
    }
}

/// `:"a#{b}"`
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicSymbol {
    string: Operand,
}

impl DynamicSymbol {
    pub fn new(string: Operand) -> Self {
        DynamicSymbol { string }
    }

    pub fn string(&self) -> &Operand {
        &self.string
    }

    pub fn retrieve(&self, frame: &Frame<'_>) -> Result<Value, IrError> {
        let bytes = interp::retrieve(&self.string, frame)?.to_s_bytes();
        let name = String::from_utf8_lossy(&bytes);
        Ok(Value::Symbol(frame.runtime().intern(&name)))
    }
}

impl CompoundOperand for DynamicSymbol {
    fn children(&self) -> Vec<&Operand> {
        vec![&self.string]
    }

    fn rebuild<F: FnMut(&Operand) -> Operand>(&self, f: F) -> Option<Self> {
        map_one(&self.string, f).map(DynamicSymbol::new)
    }
}

// =============================================================================
// SValue
// =============================================================================

/// Single value of a multiple-value expression such as `return *a`.
#[derive(Debug, Clone, PartialEq)]
pub struct SValue {
    array: Operand,
}

impl SValue {
    pub fn new(array: Operand) -> Self {
        SValue { array }
    }

    pub fn array(&self) -> &Operand {
        &self.array
    }

    pub fn retrieve(&self, frame: &Frame<'_>) -> Result<Value, IrError> {
        let value = interp::retrieve(&self.array, frame)?;
        Ok(match &value {
            Value::Array(array) => match array.len() {
                0 => Value::Nil,
                1 => array.get(0).unwrap_or(Value::Nil),
                _ => value,
            },
            _ => value,
        })
    }

    /// What an SValue over `array` reduces to, unless a splat hides the
    /// element count.
    pub fn collapse(array: &Arc<ArrayOperand>) -> Option<Operand> {
        let has_splat = array
            .elements()
            .iter()
            .any(|e| matches!(e, Operand::Splat(_)));
        if has_splat {
            return None;
        }
        match array.len() {
            0 => Some(Operand::Nil),
            1 => Some(array.elements()[0].clone()),
            _ => Some(Operand::Array(array.clone())),
        }
    }
}

impl CompoundOperand for SValue {
    fn children(&self) -> Vec<&Operand> {
        vec![&self.array]
    }

    fn rebuild<F: FnMut(&Operand) -> Operand>(&self, f: F) -> Option<Self> {
        map_one(&self.array, f).map(SValue::new)
    }
}

// =============================================================================
// MethodHandle
// =============================================================================

/// `receiver.method(:name)` bound at the IR level.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodHandle {
    receiver: Operand,
    method_name: Operand,
}

impl MethodHandle {
    pub fn new(receiver: Operand, method_name: Operand) -> Self {
        MethodHandle {
            receiver,
            method_name,
        }
    }

    pub fn receiver(&self) -> &Operand {
        &self.receiver
    }

    pub fn method_name(&self) -> &Operand {
        &self.method_name
    }

    pub fn retrieve(&self, frame: &Frame<'_>) -> Result<Value, IrError> {
        let receiver = interp::retrieve(&self.receiver, frame)?;
        let name = match interp::retrieve(&self.method_name, frame)? {
            Value::Symbol(symbol) => symbol,
            Value::String(string) => frame.runtime().intern(&string.to_string_lossy()),
            other => {
                return Err(RuntimeError::type_error("symbol nor a string", &other.to_string())
                    .into());
            }
        };
        Ok(Value::Method(Arc::new(RMethod { receiver, name })))
    }
}

impl CompoundOperand for MethodHandle {
    fn children(&self) -> Vec<&Operand> {
        vec![&self.receiver, &self.method_name]
    }

    fn rebuild<F: FnMut(&Operand) -> Operand>(&self, mut f: F) -> Option<Self> {
        let receiver = map_one(&self.receiver, &mut f);
        let method_name = map_one(&self.method_name, &mut f);
        if receiver.is_none() && method_name.is_none() {
            return None;
        }
        Some(MethodHandle {
            receiver: receiver.unwrap_or_else(|| self.receiver.clone()),
            method_name: method_name.unwrap_or_else(|| self.method_name.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::test_support::Harness;
    use crate::runtime::runtime_error::ErrorKind;

    #[test]
    fn test_array_splices_splats() {
        let h = Harness::new();
        h.set_local(0, Value::array(vec![Value::Fixnum(2), Value::Fixnum(3)]));
        let array = ArrayOperand::new(vec![
            Operand::fixnum(1),
            Operand::splat(Operand::local("a", 0, 0)),
            Operand::fixnum(4),
        ]);
        assert_eq!(array.retrieve(&h.frame()).unwrap().to_string(), "[1, 2, 3, 4]");
    }

    #[test]
    fn test_array_retrieve_is_fresh() {
        let h = Harness::new();
        let array = ArrayOperand::new(vec![Operand::fixnum(1)]);
        let a = array.retrieve(&h.frame()).unwrap();
        let b = array.retrieve(&h.frame()).unwrap();
        assert_eq!(a, b);
        assert!(!a.same(&b));
    }

    #[test]
    fn test_splat_of_nil_and_scalar() {
        let h = Harness::new();
        assert_eq!(Splat::new(Operand::Nil).retrieve(&h.frame()).unwrap().to_string(), "[]");
        assert_eq!(
            Splat::new(Operand::fixnum(5)).retrieve(&h.frame()).unwrap().to_string(),
            "[5]"
        );
    }

    #[test]
    fn test_splat_duplicates_array() {
        let h = Harness::new();
        let original = Value::array(vec![Value::Fixnum(1)]);
        h.set_local(0, original.clone());
        let copy = Splat::new(Operand::local("a", 0, 0)).retrieve(&h.frame()).unwrap();
        assert_eq!(copy, original);
        assert!(!copy.same(&original));
    }

    #[test]
    fn test_hash_later_keys_overwrite() {
        let h = Harness::new();
        let hash = HashOperand::new(
            vec![
                KeyValuePair::new(Operand::symbol("a"), Operand::fixnum(1)),
                KeyValuePair::new(Operand::symbol("b"), Operand::fixnum(2)),
                KeyValuePair::new(Operand::symbol("a"), Operand::fixnum(3)),
            ],
            true,
        );
        let Value::Hash(value) = hash.retrieve(&h.frame()).unwrap() else {
            panic!("expected hash");
        };
        assert!(value.is_kwargs());
        assert_eq!(value.len(), 2);
        assert_eq!(Value::Hash(value).to_string(), "{:a=>3, :b=>2}");
    }

    #[test]
    fn test_pair_clone_for_depth_moves_value_only() {
        let pair = KeyValuePair::new(Operand::symbol("k"), Operand::local("v", 2, 1));
        let shifted = pair.clone_for_depth(0);
        assert_eq!(shifted.value().scope_depth(), Some(0));
        assert!(shifted.key().same(pair.key()));

        let literal = KeyValuePair::new(Operand::symbol("k"), Operand::fixnum(1));
        assert!(literal.clone_for_depth(3).value().same(literal.value()));
    }

    #[test]
    fn test_compound_string_concatenates() {
        let h = Harness::new();
        let s = CompoundString::new(
            vec![Operand::frozen_string("n="), Operand::fixnum(3), Operand::symbol("x")],
            Encoding::Utf8,
            true,
        );
        let Value::String(value) = s.retrieve(&h.frame()).unwrap() else {
            panic!("expected string");
        };
        assert_eq!(value.to_string_lossy(), "n=3x");
        assert!(value.is_frozen());
    }

    #[test]
    fn test_dynamic_symbol_interns() {
        let h = Harness::new();
        let sym = DynamicSymbol::new(Operand::frozen_string("abc"));
        let a = sym.retrieve(&h.frame()).unwrap();
        let b = Value::Symbol(h.runtime.intern("abc"));
        assert!(a.same(&b));
    }

    #[test]
    fn test_svalue_shapes() {
        let h = Harness::new();
        h.set_local(0, Value::array(vec![]));
        h.set_local(1, Value::array(vec![Value::Fixnum(9)]));
        h.set_local(2, Value::array(vec![Value::Fixnum(1), Value::Fixnum(2)]));
        let get = |offset| SValue::new(Operand::local("a", 0, offset)).retrieve(&h.frame()).unwrap();
        assert_eq!(get(0), Value::Nil);
        assert_eq!(get(1), Value::Fixnum(9));
        assert_eq!(get(2).to_string(), "[1, 2]");
    }

    #[test]
    fn test_svalue_collapse() {
        let empty = Arc::new(ArrayOperand::new(vec![]));
        assert_eq!(SValue::collapse(&empty), Some(Operand::Nil));
        let one = Arc::new(ArrayOperand::new(vec![Operand::temp(1)]));
        assert_eq!(SValue::collapse(&one), Some(Operand::temp(1)));
        let two = Arc::new(ArrayOperand::new(vec![Operand::fixnum(1), Operand::fixnum(2)]));
        assert!(SValue::collapse(&two).unwrap().same(&Operand::Array(two.clone())));
        let splat = Arc::new(ArrayOperand::new(vec![Operand::splat(Operand::temp(0))]));
        assert_eq!(SValue::collapse(&splat), None);
    }

    #[test]
    fn test_method_handle_requires_name() {
        let h = Harness::new();
        let ok = MethodHandle::new(Operand::fixnum(1), Operand::symbol("succ"));
        assert_eq!(
            ok.retrieve(&h.frame()).unwrap().to_string(),
            "#<Method: 1#succ>"
        );
        let bad = MethodHandle::new(Operand::fixnum(1), Operand::fixnum(2));
        let err = bad.retrieve(&h.frame()).unwrap_err();
        match err {
            IrError::Raise(e) => assert_eq!(e.kind, ErrorKind::TypeError),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_rebuild_none_when_unchanged() {
        let array = ArrayOperand::new(vec![Operand::fixnum(1), Operand::temp(0)]);
        assert!(array.rebuild(|op| op.clone()).is_none());
        let rebuilt = array.rebuild(|op| match op {
            Operand::Variable(_) => Operand::fixnum(2),
            other => other.clone(),
        });
        let rebuilt = rebuilt.unwrap();
        assert!(rebuilt.elements()[0].same(&array.elements()[0]));
        assert_eq!(rebuilt.elements()[1], Operand::fixnum(2));
    }
}
