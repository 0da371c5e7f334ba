//! Operand evaluation.

use super::ir_error::IrError;
use super::operand::Operand;
use super::reference;
use super::variable::{TempKind, TemporaryVariable, Variable};
use crate::lang::value::Value;
use crate::runtime::context::Frame;
use crate::runtime::runtime_error::RuntimeError;

/// Evaluate `operand` in `frame`.
///
/// Labels and bare hash pairs have no runtime value and fail with an
/// internal error, as does `UnexecutableNil`. User-level failures such as an
/// invalid regexp come back as `IrError::Raise`.
pub fn retrieve(operand: &Operand, frame: &Frame<'_>) -> Result<Value, IrError> {
    match operand {
        Operand::Fixnum(lit) => lit.cached_object(),
        Operand::Bignum(lit) => lit.cached_object(),
        Operand::Float(lit) => lit.cached_object(),
        Operand::Boolean(b) | Operand::UnboxedBoolean(b) => Ok(Value::Bool(*b)),
        Operand::Nil => Ok(Value::Nil),
        Operand::UnboxedFixnum(n) => Ok(Value::Fixnum(*n)),
        Operand::UnboxedFloat(f) => Ok(Value::Float(*f)),
        Operand::Symbol(lit) => lit.cached_object(frame),
        Operand::Regexp(lit) => lit.cached_object(),
        Operand::Range(lit) => lit.cached_object(frame),
        Operand::Rational(lit) => lit.cached_object(frame),
        Operand::Complex(lit) => lit.cached_object(frame),
        Operand::FrozenString(lit) => lit.cached_object(frame),
        Operand::MutableString(lit) => lit.retrieve(frame),
        Operand::ChilledString(lit) => lit.retrieve(frame),
        Operand::SymbolProc(lit) => lit.cached_object(frame),

        Operand::Variable(v) => Ok(retrieve_variable(v, frame)),

        Operand::Array(a) => a.retrieve(frame),
        Operand::Hash(h) => h.retrieve(frame),
        Operand::Splat(s) => s.retrieve(frame),
        Operand::CompoundString(s) => s.retrieve(frame),
        Operand::DynamicSymbol(s) => s.retrieve(frame),
        Operand::SValue(s) => s.retrieve(frame),
        Operand::MethodHandle(m) => m.retrieve(frame),

        Operand::CurrentScope(s) => Ok(s.retrieve(frame)),
        Operand::ScopeModule(s) => Ok(s.retrieve(frame)),
        Operand::Backref(b) => Ok(b.retrieve(frame)),
        Operand::NthRef(n) => Ok(n.retrieve(frame)),
        Operand::MethAddr(m) => Ok(m.retrieve(frame)),
        Operand::BuiltinClass(c) => Ok(reference::retrieve_builtin(*c, frame)),
        Operand::Filename => Ok(reference::retrieve_filename(frame)),
        Operand::GlobalVariable(g) => Ok(g.retrieve(frame)),
        Operand::NullBlock => Ok(Value::NullBlock),
        Operand::UndefinedValue => Ok(Value::Undefined),

        Operand::HashPair(_) | Operand::Label(_) => Err(IrError::not_retrievable(operand.kind())),
        Operand::UnexecutableNil => Err(IrError::unexecutable()),
    }
}

fn retrieve_variable(variable: &Variable, frame: &Frame<'_>) -> Value {
    match variable {
        Variable::Local(v) => frame.dynamic_scope.get_value(v.offset(), v.scope_depth()),
        Variable::ClosureLocal(v) => frame.dynamic_scope.get_value(v.offset(), v.scope_depth()),
        Variable::Temporary(t) => retrieve_temp(t, frame),
        Variable::SelfValue => frame.self_value.clone(),
    }
}

fn retrieve_temp(temp: &TemporaryVariable, frame: &Frame<'_>) -> Value {
    let temps = frame.temps;
    let offset = temp.offset();
    let value = match temp.kind() {
        TempKind::Fixnum => temps.get_fixnum(offset).map(Value::Fixnum),
        TempKind::Float => temps.get_float(offset).map(Value::Float),
        TempKind::Boolean => temps.get_boolean(offset).map(Value::Bool),
        TempKind::Local
        | TempKind::CurrentModule
        | TempKind::CurrentScope
        | TempKind::Closure { .. } => temps.get(offset),
    };
    value.unwrap_or(Value::Nil)
}

fn typed_temp(operand: &Operand, kind: TempKind) -> Option<u32> {
    match operand {
        Operand::Variable(Variable::Temporary(t)) if t.kind() == kind => Some(t.offset()),
        _ => None,
    }
}

/// Raw integer for typed interpreter paths.
pub fn retrieve_fixnum(operand: &Operand, frame: &Frame<'_>) -> Result<i64, IrError> {
    match operand {
        Operand::UnboxedFixnum(n) => return Ok(*n),
        Operand::Fixnum(lit) => return Ok(lit.value()),
        _ => {}
    }
    if let Some(n) = typed_temp(operand, TempKind::Fixnum).and_then(|o| frame.temps.get_fixnum(o))
    {
        return Ok(n);
    }
    match retrieve(operand, frame)? {
        Value::Fixnum(n) => Ok(n),
        other => Err(RuntimeError::type_error("Integer", other.type_name()).into()),
    }
}

/// Raw float for typed interpreter paths; integers widen.
pub fn retrieve_float(operand: &Operand, frame: &Frame<'_>) -> Result<f64, IrError> {
    match operand {
        Operand::UnboxedFloat(f) => return Ok(*f),
        Operand::Float(lit) => return Ok(lit.value()),
        _ => {}
    }
    if let Some(f) = typed_temp(operand, TempKind::Float).and_then(|o| frame.temps.get_float(o)) {
        return Ok(f);
    }
    match retrieve(operand, frame)? {
        Value::Float(f) => Ok(f),
        Value::Fixnum(n) => Ok(n as f64),
        other => Err(RuntimeError::type_error("Float", other.type_name()).into()),
    }
}

/// Raw truthiness for typed interpreter paths.
pub fn retrieve_boolean(operand: &Operand, frame: &Frame<'_>) -> Result<bool, IrError> {
    match operand {
        Operand::UnboxedBoolean(b) | Operand::Boolean(b) => return Ok(*b),
        _ => {}
    }
    if let Some(b) =
        typed_temp(operand, TempKind::Boolean).and_then(|o| frame.temps.get_boolean(o))
    {
        return Ok(b);
    }
    Ok(retrieve(operand, frame)?.is_truthy())
}
