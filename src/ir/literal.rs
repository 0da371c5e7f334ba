//! Immutable literals and their per-instance value cache.
//!
//! A literal converts its payload into a runtime value the first time it is
//! evaluated and hands back that same value afterwards. The cache belongs to
//! the operand node, not to the payload: two nodes holding `42` fill two
//! slots. Nodes are shared by cloning the enclosing `Arc`, which is how an
//! instruction re-executed in a loop keeps seeing one object.

use std::fmt;
use std::sync::Arc;

use num_bigint::BigInt;
use once_cell::sync::OnceCell;

use super::interp;
use super::ir_error::{InternalError, IrError};
use super::kind::{OperandFamily, OperandKind};
use super::operand::Operand;
use crate::lang::object::{RComplex, RProc, RRange, RRational, RRegexp, RegexpOptions};
use crate::lang::string::Encoding;
use crate::lang::value::Value;
use crate::runtime::context::Frame;

/// Write-once slot holding a literal's materialized value.
///
/// Initialization runs at most once even when several threads evaluate the
/// same literal for the first time concurrently; the losers block until the
/// value is published and then observe it. A failed initialization leaves
/// the slot empty.
#[derive(Default)]
pub struct LiteralCache {
    slot: OnceCell<Value>,
}

impl LiteralCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create<F>(&self, kind: OperandKind, create: F) -> Result<Value, IrError>
    where
        F: FnOnce() -> Result<Value, IrError>,
    {
        let value = self.slot.get_or_try_init(|| {
            let value = create()?;
            tracing::trace!(%kind, value = %value, "materialized literal");
            Ok::<Value, IrError>(value)
        })?;
        Ok(value.clone())
    }

    pub fn is_cached(&self) -> bool {
        self.slot.get().is_some()
    }

    pub fn cached(&self) -> Option<&Value> {
        self.slot.get()
    }
}

impl fmt::Debug for LiteralCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LiteralCache({})", if self.is_cached() { "filled" } else { "empty" })
    }
}

// =============================================================================
// Numbers
// =============================================================================

#[derive(Debug)]
pub struct FixnumLiteral {
    value: i64,
    cache: LiteralCache,
}

impl FixnumLiteral {
    pub fn new(value: i64) -> Self {
        FixnumLiteral {
            value,
            cache: LiteralCache::new(),
        }
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn cache(&self) -> &LiteralCache {
        &self.cache
    }

    pub fn cached_object(&self) -> Result<Value, IrError> {
        self.cache
            .get_or_create(OperandKind::Fixnum, || Ok(Value::Fixnum(self.value)))
    }
}

impl PartialEq for FixnumLiteral {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

#[derive(Debug)]
pub struct BignumLiteral {
    value: BigInt,
    cache: LiteralCache,
}

impl BignumLiteral {
    pub fn new(value: BigInt) -> Self {
        BignumLiteral {
            value,
            cache: LiteralCache::new(),
        }
    }

    pub fn value(&self) -> &BigInt {
        &self.value
    }

    pub fn cache(&self) -> &LiteralCache {
        &self.cache
    }

    pub fn cached_object(&self) -> Result<Value, IrError> {
        self.cache.get_or_create(OperandKind::Bignum, || {
            Ok(Value::Bignum(Arc::new(self.value.clone())))
        })
    }
}

impl PartialEq for BignumLiteral {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

#[derive(Debug)]
pub struct FloatLiteral {
    value: f64,
    cache: LiteralCache,
}

impl FloatLiteral {
    pub fn new(value: f64) -> Self {
        FloatLiteral {
            value,
            cache: LiteralCache::new(),
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn cached_object(&self) -> Result<Value, IrError> {
        self.cache
            .get_or_create(OperandKind::Float, || Ok(Value::Float(self.value)))
    }
}

/// Bitwise, so NaN payloads survive a persistence round trip as equal.
impl PartialEq for FloatLiteral {
    fn eq(&self, other: &Self) -> bool {
        self.value.to_bits() == other.value.to_bits()
    }
}

fn is_integer_literal(operand: &Operand) -> bool {
    matches!(operand, Operand::Fixnum(_) | Operand::Bignum(_))
}

#[derive(Debug)]
pub struct RationalLiteral {
    numerator: Operand,
    denominator: Operand,
    cache: LiteralCache,
}

impl RationalLiteral {
    pub fn new(numerator: Operand, denominator: Operand) -> Result<Self, InternalError> {
        if !is_integer_literal(&numerator) || !is_integer_literal(&denominator) {
            return Err(InternalError::malformed(
                OperandKind::Rational,
                "numerator and denominator must be integer literals",
            ));
        }
        Ok(RationalLiteral {
            numerator,
            denominator,
            cache: LiteralCache::new(),
        })
    }

    pub fn numerator(&self) -> &Operand {
        &self.numerator
    }

    pub fn denominator(&self) -> &Operand {
        &self.denominator
    }

    pub fn cached_object(&self, frame: &Frame<'_>) -> Result<Value, IrError> {
        self.cache.get_or_create(OperandKind::Rational, || {
            Ok(Value::Rational(Arc::new(RRational {
                numerator: interp::retrieve(&self.numerator, frame)?,
                denominator: interp::retrieve(&self.denominator, frame)?,
            })))
        })
    }
}

impl PartialEq for RationalLiteral {
    fn eq(&self, other: &Self) -> bool {
        self.numerator == other.numerator && self.denominator == other.denominator
    }
}

/// An imaginary literal such as `2i` or `1.5ri`.
#[derive(Debug)]
pub struct ComplexLiteral {
    number: Operand,
    cache: LiteralCache,
}

impl ComplexLiteral {
    pub fn new(number: Operand) -> Result<Self, InternalError> {
        let numeric = matches!(
            number,
            Operand::Fixnum(_) | Operand::Bignum(_) | Operand::Float(_) | Operand::Rational(_)
        );
        if !numeric {
            return Err(InternalError::malformed(
                OperandKind::Complex,
                "imaginary part must be a numeric literal",
            ));
        }
        Ok(ComplexLiteral {
            number,
            cache: LiteralCache::new(),
        })
    }

    pub fn number(&self) -> &Operand {
        &self.number
    }

    pub fn cached_object(&self, frame: &Frame<'_>) -> Result<Value, IrError> {
        self.cache.get_or_create(OperandKind::Complex, || {
            Ok(Value::Complex(Arc::new(RComplex {
                real: Value::Fixnum(0),
                imaginary: interp::retrieve(&self.number, frame)?,
            })))
        })
    }
}

impl PartialEq for ComplexLiteral {
    fn eq(&self, other: &Self) -> bool {
        self.number == other.number
    }
}

// =============================================================================
// Symbols, procs, regexps, ranges
// =============================================================================

#[derive(Debug)]
pub struct SymbolLiteral {
    name: Arc<str>,
    cache: LiteralCache,
}

impl SymbolLiteral {
    pub fn new(name: &str) -> Self {
        SymbolLiteral {
            name: Arc::from(name),
            cache: LiteralCache::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cached_object(&self, frame: &Frame<'_>) -> Result<Value, IrError> {
        self.cache.get_or_create(OperandKind::Symbol, || {
            Ok(Value::Symbol(frame.runtime().intern(&self.name)))
        })
    }
}

impl PartialEq for SymbolLiteral {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// `&:name`
#[derive(Debug)]
pub struct SymbolProcLiteral {
    name: Arc<str>,
    cache: LiteralCache,
}

impl SymbolProcLiteral {
    pub fn new(name: &str) -> Self {
        SymbolProcLiteral {
            name: Arc::from(name),
            cache: LiteralCache::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cached_object(&self, frame: &Frame<'_>) -> Result<Value, IrError> {
        self.cache.get_or_create(OperandKind::SymbolProc, || {
            let symbol = frame.runtime().intern(&self.name);
            Ok(Value::Proc(Arc::new(RProc::Symbol(symbol))))
        })
    }
}

impl PartialEq for SymbolProcLiteral {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

#[derive(Debug)]
pub struct RegexpLiteral {
    source: Vec<u8>,
    options: RegexpOptions,
    encoding: Encoding,
    cache: LiteralCache,
}

impl RegexpLiteral {
    pub fn new(source: Vec<u8>, options: RegexpOptions, encoding: Encoding) -> Self {
        RegexpLiteral {
            source,
            options,
            encoding,
            cache: LiteralCache::new(),
        }
    }

    pub fn source(&self) -> &[u8] {
        &self.source
    }

    pub fn options(&self) -> RegexpOptions {
        self.options
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// An invalid pattern raises RegexpError and leaves the slot empty.
    pub fn cached_object(&self) -> Result<Value, IrError> {
        self.cache.get_or_create(OperandKind::Regexp, || {
            let regexp = RRegexp::new(&self.source, self.options, self.encoding)?;
            Ok(Value::Regexp(Arc::new(regexp)))
        })
    }
}

impl PartialEq for RegexpLiteral {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
            && self.options == other.options
            && self.encoding == other.encoding
    }
}

#[derive(Debug)]
pub struct RangeLiteral {
    begin: Operand,
    end: Operand,
    exclusive: bool,
    cache: LiteralCache,
}

impl RangeLiteral {
    /// Both endpoints must be immutable literals.
    pub fn new(begin: Operand, end: Operand, exclusive: bool) -> Result<Self, InternalError> {
        for endpoint in [&begin, &end] {
            let immutable = endpoint.kind().family() == OperandFamily::Literal
                && endpoint.can_copy_propagate();
            if !immutable {
                return Err(InternalError::malformed(
                    OperandKind::Range,
                    format!("endpoint {} is not an immutable literal", endpoint),
                ));
            }
        }
        Ok(RangeLiteral {
            begin,
            end,
            exclusive,
            cache: LiteralCache::new(),
        })
    }

    pub fn begin(&self) -> &Operand {
        &self.begin
    }

    pub fn end(&self) -> &Operand {
        &self.end
    }

    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    pub fn cached_object(&self, frame: &Frame<'_>) -> Result<Value, IrError> {
        self.cache.get_or_create(OperandKind::Range, || {
            Ok(Value::Range(Arc::new(RRange {
                begin: interp::retrieve(&self.begin, frame)?,
                end: interp::retrieve(&self.end, frame)?,
                exclusive: self.exclusive,
            })))
        })
    }
}

impl PartialEq for RangeLiteral {
    fn eq(&self, other: &Self) -> bool {
        self.begin == other.begin && self.end == other.end && self.exclusive == other.exclusive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::test_support::Harness;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_cache_creates_once() {
        let cache = LiteralCache::new();
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let value = cache
                .get_or_create(OperandKind::Fixnum, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Value::Fixnum(1))
                })
                .unwrap();
            assert_eq!(value, Value::Fixnum(1));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_creation_leaves_slot_empty() {
        let cache = LiteralCache::new();
        let err = cache.get_or_create(OperandKind::Regexp, || Err(IrError::unexecutable()));
        assert!(err.is_err());
        assert!(!cache.is_cached());
        let ok = cache.get_or_create(OperandKind::Regexp, || Ok(Value::Nil));
        assert!(ok.is_ok());
        assert!(cache.is_cached());
    }

    #[test]
    fn test_concurrent_first_evaluation_builds_one_value() {
        let literal = BignumLiteral::new(BigInt::from(u64::MAX) * 4u32);
        let values: Vec<Value> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| literal.cached_object().unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for value in &values {
            assert!(value.same(&values[0]));
        }
    }

    #[test]
    fn test_range_rejects_variable_endpoint() {
        let err = RangeLiteral::new(Operand::fixnum(1), Operand::temp(0), false).unwrap_err();
        assert!(matches!(
            err,
            InternalError::MalformedOperand {
                kind: OperandKind::Range,
                ..
            }
        ));
    }

    #[test]
    fn test_range_rejects_mutable_string_endpoint() {
        assert!(RangeLiteral::new(Operand::mutable_string("a"), Operand::fixnum(1), true).is_err());
    }

    #[test]
    fn test_range_value_is_cached() {
        let h = Harness::new();
        let range = RangeLiteral::new(Operand::fixnum(1), Operand::fixnum(5), true).unwrap();
        let a = range.cached_object(&h.frame()).unwrap();
        let b = range.cached_object(&h.frame()).unwrap();
        assert!(a.same(&b));
        assert_eq!(a.to_string(), "1...5");
    }

    #[test]
    fn test_rational_requires_integers() {
        assert!(RationalLiteral::new(Operand::fixnum(1), Operand::float(2.0)).is_err());
        let h = Harness::new();
        let r = RationalLiteral::new(Operand::fixnum(3), Operand::fixnum(4)).unwrap();
        assert_eq!(r.cached_object(&h.frame()).unwrap().to_string(), "(3/4)");
    }

    #[test]
    fn test_complex_literal() {
        assert!(ComplexLiteral::new(Operand::symbol("x")).is_err());
        let h = Harness::new();
        let c = ComplexLiteral::new(Operand::fixnum(2)).unwrap();
        assert_eq!(c.cached_object(&h.frame()).unwrap().to_string(), "(0+2i)");
    }

    #[test]
    fn test_invalid_regexp_raises_user_error() {
        let re = RegexpLiteral::new(b"(".to_vec(), RegexpOptions::default(), Encoding::Utf8);
        let err = re.cached_object().unwrap_err();
        assert!(!err.is_internal());
        assert!(!re.cache.is_cached());
    }

    #[test]
    fn test_symbol_literal_interns() {
        let h = Harness::new();
        let a = SymbolLiteral::new("k").cached_object(&h.frame()).unwrap();
        let b = SymbolLiteral::new("k").cached_object(&h.frame()).unwrap();
        assert!(a.same(&b));
    }

    #[test]
    fn test_float_equality_is_bitwise() {
        assert_eq!(FloatLiteral::new(f64::NAN), FloatLiteral::new(f64::NAN));
        assert_ne!(FloatLiteral::new(0.0), FloatLiteral::new(-0.0));
    }
}
