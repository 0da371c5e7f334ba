use std::fmt;
use std::sync::Arc;

use num_bigint::BigInt;

use super::object::{RArray, RComplex, RHash, RMethod, RModule, RProc, RRange, RRational, RRegexp};
use super::string::RString;
use super::symbol::Symbol;
use crate::runtime::scope::StaticScope;

/// Runtime value produced by evaluating an operand.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,

    /// Marker for "no value supplied" (e.g. an omitted optional argument).
    Undefined,

    /// The block argument of a call that passed no block.
    NullBlock,

    Bool(bool),

    /// Immediate 64-bit integer.
    Fixnum(i64),

    /// Immediate 64-bit float.
    Float(f64),

    Bignum(Arc<BigInt>),
    String(Arc<RString>),
    Symbol(Symbol),
    Array(Arc<RArray>),
    Hash(Arc<RHash>),
    Range(Arc<RRange>),
    Regexp(Arc<RRegexp>),
    Rational(Arc<RRational>),
    Complex(Arc<RComplex>),
    Module(Arc<RModule>),
    Proc(Arc<RProc>),
    Method(Arc<RMethod>),

    /// A static scope handed to instructions that need lexical context.
    Scope(Arc<StaticScope>),
}

impl Value {
    pub fn string(s: RString) -> Value {
        Value::String(Arc::new(s))
    }

    pub fn array(elements: Vec<Value>) -> Value {
        Value::Array(Arc::new(RArray::new(elements)))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Only `nil` and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Object identity: immediates by value, heap objects by reference.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil)
            | (Value::Undefined, Value::Undefined)
            | (Value::NullBlock, Value::NullBlock) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Fixnum(a), Value::Fixnum(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Symbol(a), Value::Symbol(b)) => a.same(b),
            (Value::Bignum(a), Value::Bignum(b)) => Arc::ptr_eq(a, b),
            (Value::String(a), Value::String(b)) => Arc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Hash(a), Value::Hash(b)) => Arc::ptr_eq(a, b),
            (Value::Range(a), Value::Range(b)) => Arc::ptr_eq(a, b),
            (Value::Regexp(a), Value::Regexp(b)) => Arc::ptr_eq(a, b),
            (Value::Rational(a), Value::Rational(b)) => Arc::ptr_eq(a, b),
            (Value::Complex(a), Value::Complex(b)) => Arc::ptr_eq(a, b),
            (Value::Module(a), Value::Module(b)) => Arc::ptr_eq(a, b),
            (Value::Proc(a), Value::Proc(b)) => Arc::ptr_eq(a, b),
            (Value::Method(a), Value::Method(b)) => Arc::ptr_eq(a, b),
            (Value::Scope(a), Value::Scope(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "NilClass",
            Value::Undefined => "undefined",
            Value::NullBlock => "null block",
            Value::Bool(true) => "TrueClass",
            Value::Bool(false) => "FalseClass",
            Value::Fixnum(_) | Value::Bignum(_) => "Integer",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Symbol(_) => "Symbol",
            Value::Array(_) => "Array",
            Value::Hash(_) => "Hash",
            Value::Range(_) => "Range",
            Value::Regexp(_) => "Regexp",
            Value::Rational(_) => "Rational",
            Value::Complex(_) => "Complex",
            Value::Module(_) => "Module",
            Value::Proc(_) => "Proc",
            Value::Method(_) => "Method",
            Value::Scope(_) => "StaticScope",
        }
    }

    /// Bytes produced by string interpolation (`"#{value}"`).
    pub fn to_s_bytes(&self) -> Vec<u8> {
        match self {
            Value::String(s) => s.bytes(),
            Value::Symbol(s) => s.name().as_bytes().to_vec(),
            Value::Nil => Vec::new(),
            other => other.to_string().into_bytes(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bignum(a), Value::Bignum(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => a == b,
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::Regexp(a), Value::Regexp(b)) => a == b,
            (Value::Rational(a), Value::Rational(b)) => a == b,
            (Value::Complex(a), Value::Complex(b)) => a == b,
            (Value::Module(a), Value::Module(b)) => a == b,
            (Value::Proc(a), Value::Proc(b)) => a == b,
            (Value::Method(a), Value::Method(b)) => a == b,
            _ => self.same(other),
        }
    }
}

pub(crate) fn format_float(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 {
        write!(f, "{:.1}", n)
    } else if n.is_nan() {
        write!(f, "NaN")
    } else if n.is_infinite() {
        write!(f, "{}Infinity", if n < 0.0 { "-" } else { "" })
    } else {
        write!(f, "{}", n)
    }
}

impl fmt::Display for Value {
    /// Format a value the way `inspect` shows it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Undefined => write!(f, "undefined"),
            Value::NullBlock => write!(f, "null_block"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Fixnum(n) => write!(f, "{}", n),
            Value::Float(n) => format_float(*n, f),
            Value::Bignum(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s.to_string_lossy()),
            Value::Symbol(s) => write!(f, ":{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.to_vec().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Hash(hash) => {
                write!(f, "{{")?;
                for (i, (k, v)) in hash.entries().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}=>{}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Range(r) => {
                let dots = if r.exclusive { "..." } else { ".." };
                write!(f, "{}{}{}", r.begin, dots, r.end)
            }
            Value::Regexp(re) => write!(
                f,
                "/{}/{}",
                String::from_utf8_lossy(re.source()),
                re.options()
            ),
            Value::Rational(r) => write!(f, "({}/{})", r.numerator, r.denominator),
            Value::Complex(c) => write!(f, "({}+{}i)", c.real, c.imaginary),
            Value::Module(m) => write!(f, "{}", m.name),
            Value::Proc(p) => match p.as_ref() {
                RProc::Symbol(s) => write!(f, "#<Proc(&:{})>", s),
            },
            Value::Method(m) => write!(f, "#<Method: {}#{}>", m.receiver, m.name),
            Value::Scope(_) => write!(f, "#<StaticScope>"),
        }
    }
}
