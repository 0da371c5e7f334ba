//! Binary form of operands.
//!
//! Every operand is its kind tag followed by the kind's fields in the order
//! below. `uint` fields (offsets, depths, ids, counts, line numbers) are
//! unsigned varints. Children are nested operands, at most
//! [`DecodeContext::max_operand_depth`] levels deep. Locals are written by name, depth and
//! offset and re-resolved against the decoding scope; string literals do not
//! carry their file, which comes from the [`DecodeContext`] instead.
//!
//! | kind                          | fields                                        |
//! |-------------------------------|-----------------------------------------------|
//! | Fixnum, UnboxedFixnum         | long                                          |
//! | Bignum                        | string (decimal)                              |
//! | Float, UnboxedFloat           | double                                        |
//! | Boolean, UnboxedBoolean       | bool                                          |
//! | Symbol, SymbolProc, MethAddr  | symbol                                        |
//! | Regexp                        | bytes source, byte options, byte encoding     |
//! | Range                         | operand begin, operand end, bool exclusive    |
//! | Rational                      | operand numerator, operand denominator        |
//! | Complex                       | operand number                                |
//! | *String literals              | bytes, byte encoding, byte code range, uint line |
//! | LocalVariable, ClosureLocal   | string name, uint depth, uint offset          |
//! | Temporary (all but closure)   | uint offset                                   |
//! | TemporaryClosure              | uint closure id, uint offset                  |
//! | Array                         | uint count, operand*                          |
//! | Hash                          | bool kwargs, uint count, (operand, operand)*  |
//! | HashPair, MethodHandle        | operand, operand                              |
//! | Splat, DynamicSymbol, SValue  | operand                                       |
//! | CompoundString                | byte encoding, bool frozen, uint count, operand* |
//! | CurrentScope, ScopeModule     | uint depth                                    |
//! | Backref                       | char                                          |
//! | NthRef                        | uint n                                        |
//! | BuiltinClass                  | byte                                          |
//! | GlobalVariable                | string name                                   |
//! | Label                         | string prefix, uint id                        |
//! | Nil, SelfValue, Filename, NullBlock, UndefinedValue, UnexecutableNil | none   |

use std::sync::Arc;

use num_bigint::BigInt;

use super::decode_error::{DecodeError, EncodeError};
use super::reader::{BufferReader, DecodeContext, IrReader, SymbolPool};
use super::writer::{BufferWriter, IrWriter};
use crate::ir::compound::{
    ArrayOperand, CompoundString, DynamicSymbol, HashOperand, KeyValuePair, MethodHandle, SValue,
    Splat,
};
use crate::ir::kind::OperandKind;
use crate::ir::literal::{
    BignumLiteral, FloatLiteral, RegexpLiteral, SymbolLiteral, SymbolProcLiteral,
};
use crate::ir::operand::Operand;
use crate::ir::reference::{
    Backref, CurrentScope, GlobalVariable, Label, MethAddr, NthRef, ScopeModule,
};
use crate::ir::string_literal::{ChilledString, FrozenString, MutableString, StringPayload};
use crate::ir::variable::{
    ClosureLocalVariable, LocalVariable, TempKind, TemporaryVariable, Variable,
};
use crate::lang::object::{BuiltinClass, RegexpOptions};
use crate::lang::string::{CodeRange, Encoding};
use crate::runtime::scope::StaticScope;

// =============================================================================
// Encoding
// =============================================================================

fn write_count(
    w: &mut dyn IrWriter,
    kind: OperandKind,
    count: usize,
) -> Result<(), EncodeError> {
    let count = u32::try_from(count).map_err(|_| EncodeError::CountOverflow { kind, count })?;
    w.write_uint(count)
}

fn write_payload(w: &mut dyn IrWriter, payload: &StringPayload) -> Result<(), EncodeError> {
    w.write_bytes(payload.bytes())?;
    w.write_byte(payload.encoding() as u8)?;
    w.write_byte(payload.code_range() as u8)?;
    w.write_uint(payload.line())
}

fn write_operands(
    w: &mut dyn IrWriter,
    kind: OperandKind,
    operands: &[Operand],
) -> Result<(), EncodeError> {
    write_count(w, kind, operands.len())?;
    for operand in operands {
        w.write_operand(operand)?;
    }
    Ok(())
}

fn write_variable(w: &mut dyn IrWriter, variable: &Variable) -> Result<(), EncodeError> {
    match variable {
        Variable::Local(v) => {
            w.write_string(v.name())?;
            w.write_uint(v.scope_depth())?;
            w.write_uint(v.offset())
        }
        Variable::ClosureLocal(v) => {
            w.write_string(v.name())?;
            w.write_uint(v.scope_depth())?;
            w.write_uint(v.offset())
        }
        Variable::Temporary(t) => {
            if let TempKind::Closure { closure_id } = t.kind() {
                w.write_uint(closure_id)?;
            }
            w.write_uint(t.offset())
        }
        Variable::SelfValue => Ok(()),
    }
}

/// Write `operand` and everything it contains.
pub fn encode_operand(w: &mut dyn IrWriter, operand: &Operand) -> Result<(), EncodeError> {
    let kind = operand.kind();
    tracing::debug!(%kind, "encoding operand");
    w.write_kind(kind)?;
    match operand {
        Operand::Fixnum(lit) => w.write_long(lit.value()),
        Operand::Bignum(lit) => w.write_string(&lit.value().to_string()),
        Operand::Float(lit) => w.write_double(lit.value()),
        Operand::Boolean(b) | Operand::UnboxedBoolean(b) => w.write_bool(*b),
        Operand::UnboxedFixnum(n) => w.write_long(*n),
        Operand::UnboxedFloat(f) => w.write_double(*f),
        Operand::Symbol(lit) => w.write_symbol(lit.name()),
        Operand::Regexp(lit) => {
            w.write_bytes(lit.source())?;
            w.write_byte(lit.options().bits())?;
            w.write_byte(lit.encoding() as u8)
        }
        Operand::Range(lit) => {
            w.write_operand(lit.begin())?;
            w.write_operand(lit.end())?;
            w.write_bool(lit.is_exclusive())
        }
        Operand::Rational(lit) => {
            w.write_operand(lit.numerator())?;
            w.write_operand(lit.denominator())
        }
        Operand::Complex(lit) => w.write_operand(lit.number()),
        Operand::FrozenString(lit) => write_payload(w, lit.payload()),
        Operand::MutableString(lit) => write_payload(w, lit.payload()),
        Operand::ChilledString(lit) => write_payload(w, lit.payload()),
        Operand::SymbolProc(lit) => w.write_symbol(lit.name()),

        Operand::Variable(v) => write_variable(w, v),

        Operand::Array(a) => write_operands(w, kind, a.elements()),
        Operand::Hash(h) => {
            w.write_bool(h.is_kwargs())?;
            write_count(w, kind, h.pairs().len())?;
            for pair in h.pairs() {
                w.write_operand(pair.key())?;
                w.write_operand(pair.value())?;
            }
            Ok(())
        }
        Operand::HashPair(p) => {
            w.write_operand(p.key())?;
            w.write_operand(p.value())
        }
        Operand::Splat(s) => w.write_operand(s.array()),
        Operand::CompoundString(s) => {
            w.write_byte(s.encoding() as u8)?;
            w.write_bool(s.is_frozen())?;
            write_operands(w, kind, s.pieces())
        }
        Operand::DynamicSymbol(s) => w.write_operand(s.string()),
        Operand::SValue(s) => w.write_operand(s.array()),
        Operand::MethodHandle(m) => {
            w.write_operand(m.receiver())?;
            w.write_operand(m.method_name())
        }

        Operand::CurrentScope(s) => w.write_uint(s.depth()),
        Operand::ScopeModule(s) => w.write_uint(s.depth()),
        Operand::Backref(b) => w.write_char(b.as_char()),
        Operand::NthRef(n) => w.write_uint(n.n()),
        Operand::MethAddr(m) => w.write_symbol(m.name()),
        Operand::BuiltinClass(c) => w.write_byte(*c as u8),
        Operand::GlobalVariable(g) => w.write_string(g.name()),
        Operand::Label(l) => {
            w.write_string(l.prefix())?;
            w.write_uint(l.id())
        }
        Operand::Nil
        | Operand::Filename
        | Operand::NullBlock
        | Operand::UndefinedValue
        | Operand::UnexecutableNil => Ok(()),
    }
}

// =============================================================================
// Decoding
// =============================================================================

fn read_encoding(r: &mut dyn IrReader, kind: OperandKind) -> Result<Encoding, DecodeError> {
    let byte = r.read_byte()?;
    Encoding::from_u8(byte).ok_or_else(|| DecodeError::malformed(kind, format!("encoding {byte}")))
}

fn read_payload(r: &mut dyn IrReader, kind: OperandKind) -> Result<StringPayload, DecodeError> {
    let bytes = r.read_bytes()?;
    let encoding = read_encoding(r, kind)?;
    let code_range = r.read_byte()?;
    let code_range = CodeRange::from_u8(code_range)
        .ok_or_else(|| DecodeError::malformed(kind, format!("code range {code_range}")))?;
    let line = r.read_uint()?;
    let file = r.context().file();
    Ok(StringPayload::with_code_range(
        bytes, encoding, code_range, &file, line,
    ))
}

fn read_operands(r: &mut dyn IrReader) -> Result<Vec<Operand>, DecodeError> {
    let count = r.read_uint()?;
    // Capped so a corrupt count cannot reserve unbounded memory.
    let mut operands = Vec::with_capacity(count.min(1024) as usize);
    for _ in 0..count {
        operands.push(r.read_operand()?);
    }
    Ok(operands)
}

/// Name, depth and offset, checked against the decoding scope.
fn read_local(r: &mut dyn IrReader) -> Result<(String, u32, u32, Arc<StaticScope>), DecodeError> {
    let name = r.read_string()?;
    let depth = r.read_uint()?;
    let encoded = r.read_uint()?;
    let Some((resolved, defining)) = StaticScope::resolve_local(&r.context().scope, &name, depth)
    else {
        return Err(DecodeError::UnknownLocal { name, depth });
    };
    if resolved != encoded {
        return Err(DecodeError::SlotMismatch {
            name,
            encoded,
            resolved,
        });
    }
    Ok((name, depth, resolved, defining))
}

fn read_temp(r: &mut dyn IrReader, temp_kind: TempKind) -> Result<Operand, DecodeError> {
    let offset = r.read_uint()?;
    Ok(Operand::Variable(Variable::Temporary(TemporaryVariable::new(
        temp_kind, offset,
    ))))
}

/// Read one operand, including its kind tag.
pub fn decode_operand(r: &mut dyn IrReader) -> Result<Operand, DecodeError> {
    let kind = r.read_kind()?;
    tracing::debug!(%kind, "decoding operand");
    let operand = match kind {
        OperandKind::Fixnum => Operand::fixnum(r.read_long()?),
        OperandKind::Bignum => {
            let digits = r.read_string()?;
            let value: BigInt = digits
                .parse()
                .map_err(|_| DecodeError::malformed(kind, format!("digits {digits:?}")))?;
            Operand::Bignum(Arc::new(BignumLiteral::new(value)))
        }
        OperandKind::Float => Operand::Float(Arc::new(FloatLiteral::new(r.read_double()?))),
        OperandKind::Boolean => Operand::Boolean(r.read_bool()?),
        OperandKind::Nil => Operand::Nil,
        OperandKind::UnboxedFixnum => Operand::UnboxedFixnum(r.read_long()?),
        OperandKind::UnboxedFloat => Operand::UnboxedFloat(r.read_double()?),
        OperandKind::UnboxedBoolean => Operand::UnboxedBoolean(r.read_bool()?),
        OperandKind::Symbol => Operand::Symbol(Arc::new(SymbolLiteral::new(&r.read_symbol()?))),
        OperandKind::Regexp => {
            let source = r.read_bytes()?;
            let options = RegexpOptions::from_bits(r.read_byte()?);
            let encoding = read_encoding(r, kind)?;
            Operand::Regexp(Arc::new(RegexpLiteral::new(source, options, encoding)))
        }
        OperandKind::Range => {
            let begin = r.read_operand()?;
            let end = r.read_operand()?;
            Operand::range(begin, end, r.read_bool()?)?
        }
        OperandKind::Rational => {
            let numerator = r.read_operand()?;
            Operand::rational(numerator, r.read_operand()?)?
        }
        OperandKind::Complex => Operand::complex(r.read_operand()?)?,
        OperandKind::FrozenString => {
            Operand::FrozenString(Arc::new(FrozenString::new(read_payload(r, kind)?)))
        }
        OperandKind::MutableString => {
            Operand::MutableString(Arc::new(MutableString::new(read_payload(r, kind)?)))
        }
        OperandKind::ChilledString => {
            Operand::ChilledString(Arc::new(ChilledString::new(read_payload(r, kind)?)))
        }
        OperandKind::SymbolProc => {
            Operand::SymbolProc(Arc::new(SymbolProcLiteral::new(&r.read_symbol()?)))
        }

        OperandKind::LocalVariable => {
            let (name, depth, offset, _) = read_local(r)?;
            Operand::Variable(Variable::Local(LocalVariable::new(&name, depth, offset)))
        }
        OperandKind::ClosureLocalVariable => {
            let (name, depth, offset, defining) = read_local(r)?;
            Operand::Variable(Variable::ClosureLocal(ClosureLocalVariable::new(
                &name, depth, offset, defining,
            )))
        }
        OperandKind::TemporaryVariable => read_temp(r, TempKind::Local)?,
        OperandKind::TemporaryFixnum => read_temp(r, TempKind::Fixnum)?,
        OperandKind::TemporaryFloat => read_temp(r, TempKind::Float)?,
        OperandKind::TemporaryBoolean => read_temp(r, TempKind::Boolean)?,
        OperandKind::TemporaryCurrentModule => read_temp(r, TempKind::CurrentModule)?,
        OperandKind::TemporaryCurrentScope => read_temp(r, TempKind::CurrentScope)?,
        OperandKind::TemporaryClosure => {
            let closure_id = r.read_uint()?;
            read_temp(r, TempKind::Closure { closure_id })?
        }
        OperandKind::SelfValue => Operand::self_value(),

        OperandKind::Array => Operand::Array(Arc::new(ArrayOperand::new(read_operands(r)?))),
        OperandKind::Hash => {
            let kwargs = r.read_bool()?;
            let count = r.read_uint()?;
            let mut pairs = Vec::with_capacity(count.min(1024) as usize);
            for _ in 0..count {
                let key = r.read_operand()?;
                pairs.push(KeyValuePair::new(key, r.read_operand()?));
            }
            Operand::Hash(Arc::new(HashOperand::new(pairs, kwargs)))
        }
        OperandKind::HashPair => {
            let key = r.read_operand()?;
            Operand::HashPair(Arc::new(KeyValuePair::new(key, r.read_operand()?)))
        }
        OperandKind::Splat => Operand::Splat(Arc::new(Splat::new(r.read_operand()?))),
        OperandKind::CompoundString => {
            let encoding = read_encoding(r, kind)?;
            let frozen = r.read_bool()?;
            let pieces = read_operands(r)?;
            Operand::CompoundString(Arc::new(CompoundString::new(pieces, encoding, frozen)))
        }
        OperandKind::DynamicSymbol => {
            Operand::DynamicSymbol(Arc::new(DynamicSymbol::new(r.read_operand()?)))
        }
        OperandKind::SValue => Operand::SValue(Arc::new(SValue::new(r.read_operand()?))),
        OperandKind::MethodHandle => {
            let receiver = r.read_operand()?;
            Operand::MethodHandle(Arc::new(MethodHandle::new(receiver, r.read_operand()?)))
        }

        OperandKind::CurrentScope => Operand::CurrentScope(CurrentScope::new(r.read_uint()?)),
        OperandKind::ScopeModule => Operand::ScopeModule(ScopeModule::new(r.read_uint()?)),
        OperandKind::Backref => {
            let c = r.read_char()?;
            let backref = Backref::from_char(c)
                .ok_or_else(|| DecodeError::malformed(kind, format!("backref ${c}")))?;
            Operand::Backref(backref)
        }
        OperandKind::NthRef => {
            let n = r.read_uint()?;
            let limit = r.context().max_nth_ref;
            if n > limit {
                return Err(DecodeError::malformed(
                    kind,
                    format!("index {n} exceeds limit {limit}"),
                ));
            }
            Operand::NthRef(NthRef::new(n))
        }
        OperandKind::MethAddr => Operand::MethAddr(MethAddr::new(&r.read_symbol()?)),
        OperandKind::BuiltinClass => {
            let byte = r.read_byte()?;
            let class = BuiltinClass::from_u8(byte)
                .ok_or_else(|| DecodeError::malformed(kind, format!("class id {byte}")))?;
            Operand::BuiltinClass(class)
        }
        OperandKind::Filename => Operand::Filename,
        OperandKind::GlobalVariable => {
            Operand::GlobalVariable(GlobalVariable::new(&r.read_string()?))
        }
        OperandKind::Label => {
            let prefix = r.read_string()?;
            Operand::Label(Label::new(&prefix, r.read_uint()?))
        }
        OperandKind::NullBlock => Operand::NullBlock,
        OperandKind::UndefinedValue => Operand::UndefinedValue,
        OperandKind::UnexecutableNil => Operand::UnexecutableNil,
    };
    Ok(operand)
}

/// Encode `operands` back to back into a fresh buffer.
pub fn encode_operands(operands: &[Operand]) -> Result<(Vec<u8>, SymbolPool), EncodeError> {
    let mut writer = BufferWriter::new();
    for operand in operands {
        writer.write_operand(operand)?;
    }
    Ok(writer.finish())
}

/// Decode operands until `bytes` is exhausted.
pub fn decode_operands(bytes: &[u8], context: &DecodeContext) -> Result<Vec<Operand>, DecodeError> {
    let mut reader = BufferReader::new(bytes, context);
    let mut operands = Vec::new();
    while !reader.is_empty() {
        operands.push(reader.read_operand()?);
    }
    Ok(operands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::scope::ScopeKind;

    fn scope() -> Arc<StaticScope> {
        let outer = Arc::new(
            StaticScope::new(ScopeKind::Method, "lib/app.rb", None).with_variables(&["a", "b"]),
        );
        Arc::new(
            StaticScope::new(ScopeKind::Block, "lib/app.rb", Some(outer)).with_variables(&["x"]),
        )
    }

    fn round_trip(operand: &Operand) -> Operand {
        let (bytes, pool) = encode_operands(std::slice::from_ref(operand)).unwrap();
        let context = DecodeContext::new(scope(), pool);
        let mut decoded = decode_operands(&bytes, &context).unwrap();
        assert_eq!(decoded.len(), 1);
        decoded.remove(0)
    }

    #[test]
    fn test_literals_round_trip() {
        let samples = vec![
            Operand::fixnum(-34853),
            Operand::bignum(BigInt::from(u64::MAX) * 1000u32),
            Operand::float(-0.5),
            Operand::boolean(true),
            Operand::Nil,
            Operand::UnboxedFixnum(7),
            Operand::UnboxedFloat(f64::INFINITY),
            Operand::UnboxedBoolean(false),
            Operand::symbol("name"),
            Operand::regexp("a+b", RegexpOptions::from_bits(RegexpOptions::IGNORECASE)),
            Operand::range(Operand::fixnum(1), Operand::frozen_string("z"), true).unwrap(),
            Operand::rational(Operand::fixnum(1), Operand::fixnum(3)).unwrap(),
            Operand::complex(Operand::float(1.5)).unwrap(),
            Operand::frozen_string("frozen"),
            Operand::mutable_string("mutable \u{e9}"),
            Operand::chilled_string(""),
            Operand::symbol_proc("upcase"),
        ];
        for operand in samples {
            assert_eq!(round_trip(&operand), operand, "{operand}");
        }
    }

    #[test]
    fn test_variables_round_trip() {
        let temps = [
            TemporaryVariable::local(0),
            TemporaryVariable::fixnum(1),
            TemporaryVariable::float(2),
            TemporaryVariable::boolean(3),
            TemporaryVariable::current_module(4),
            TemporaryVariable::current_scope(5),
            TemporaryVariable::closure(9, 6),
        ];
        for temp in temps {
            let operand = Operand::Variable(Variable::Temporary(temp));
            let back = round_trip(&operand);
            assert_eq!(back, operand);
            assert_eq!(back.kind(), operand.kind());
        }
        let local = Operand::local("b", 1, 1);
        let back = round_trip(&local);
        assert!(back.same(&local));
        assert_eq!(round_trip(&Operand::self_value()), Operand::self_value());
    }

    #[test]
    fn test_closure_local_resolves_defining_scope() {
        let defining = StaticScope::enclosing(&scope(), 1).unwrap();
        let operand = Operand::Variable(Variable::ClosureLocal(ClosureLocalVariable::new(
            "a", 1, 0, defining,
        )));
        let Operand::Variable(Variable::ClosureLocal(back)) = round_trip(&operand) else {
            panic!("expected closure local");
        };
        assert_eq!(back.defining_scope().variables()[0].as_ref(), "a");
    }

    #[test]
    fn test_compounds_and_references_round_trip() {
        let samples = vec![
            Operand::array(vec![Operand::fixnum(1), Operand::local("x", 0, 0)]),
            Operand::hash(vec![(Operand::symbol("k"), Operand::temp(1))], true),
            Operand::hash_pair(Operand::symbol("k"), Operand::fixnum(1)),
            Operand::splat(Operand::temp(0)),
            Operand::compound_string(
                vec![Operand::frozen_string("a"), Operand::temp(1)],
                Encoding::Binary,
                true,
            ),
            Operand::dynamic_symbol(Operand::temp(2)),
            Operand::svalue(Operand::splat(Operand::temp(3))),
            Operand::method_handle(Operand::self_value(), Operand::symbol("call")),
            Operand::current_scope(1),
            Operand::scope_module(0),
            Operand::Backref(Backref::PostMatch),
            Operand::nth_ref(2),
            Operand::meth_addr("each"),
            Operand::BuiltinClass(BuiltinClass::StandardError),
            Operand::Filename,
            Operand::global("$stderr"),
            Operand::label("LBL", 12),
            Operand::NullBlock,
            Operand::UndefinedValue,
            Operand::UnexecutableNil,
        ];
        for operand in samples {
            assert_eq!(round_trip(&operand), operand, "{operand}");
        }
    }

    #[test]
    fn test_string_file_comes_from_context() {
        let operand = Operand::FrozenString(Arc::new(FrozenString::new(StringPayload::new(
            b"s".to_vec(),
            Encoding::Utf8,
            "original.rb",
            4,
        ))));
        let (bytes, pool) = encode_operands(&[operand.clone()]).unwrap();

        let context = DecodeContext::new(scope(), pool.clone());
        let Operand::FrozenString(lit) = &decode_operands(&bytes, &context).unwrap()[0] else {
            panic!("expected frozen string");
        };
        assert_eq!(lit.payload().file(), "lib/app.rb");
        assert_eq!(lit.payload().line(), 4);

        let context = DecodeContext::new(scope(), pool).with_filename("moved.rb");
        let Operand::FrozenString(lit) = &decode_operands(&bytes, &context).unwrap()[0] else {
            panic!("expected frozen string");
        };
        assert_eq!(lit.payload().file(), "moved.rb");
    }

    #[test]
    fn test_filename_has_no_payload() {
        let (bytes, _) = encode_operands(&[Operand::Filename]).unwrap();
        assert_eq!(bytes, vec![OperandKind::Filename.tag()]);
    }

    #[test]
    fn test_unknown_local_is_rejected() {
        let (bytes, pool) = encode_operands(&[Operand::local("missing", 0, 0)]).unwrap();
        let context = DecodeContext::new(scope(), pool);
        let err = decode_operands(&bytes, &context).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownLocal { ref name, depth: 0 } if name == "missing"));
    }

    #[test]
    fn test_slot_mismatch_is_rejected() {
        let (bytes, pool) = encode_operands(&[Operand::local("b", 1, 0)]).unwrap();
        let context = DecodeContext::new(scope(), pool);
        let err = decode_operands(&bytes, &context).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::SlotMismatch {
                encoded: 0,
                resolved: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_tag_and_truncation() {
        let context = DecodeContext::new(scope(), SymbolPool::new());
        assert!(matches!(
            decode_operands(&[200], &context),
            Err(DecodeError::UnknownKind(200))
        ));
        let (bytes, _) = encode_operands(&[Operand::fixnum(1 << 40)]).unwrap();
        assert!(matches!(
            decode_operands(&bytes[..bytes.len() - 1], &context),
            Err(DecodeError::Postcard(_))
        ));
    }

    #[test]
    fn test_nth_ref_limit() {
        let (bytes, pool) = encode_operands(&[Operand::nth_ref(50)]).unwrap();
        let mut config = crate::config::IrConfig::default();
        config.max_nth_ref = 9;
        let context = DecodeContext::new(scope(), pool).with_config(&config);
        assert!(matches!(
            decode_operands(&bytes, &context),
            Err(DecodeError::Invalid(_))
        ));
    }

    #[test]
    fn test_full_width_fields_round_trip() {
        let samples = vec![
            Operand::label("LBL", 3_000_000_000),
            Operand::label("LBL", u32::MAX),
            Operand::Variable(Variable::Temporary(TemporaryVariable::closure(u32::MAX, u32::MAX))),
            Operand::Variable(Variable::Temporary(TemporaryVariable::fixnum(u32::MAX))),
            Operand::current_scope(u32::MAX),
            Operand::nth_ref(u32::MAX),
        ];
        let mut config = crate::config::IrConfig::default();
        config.max_nth_ref = u32::MAX;
        for operand in samples {
            let (bytes, pool) = encode_operands(std::slice::from_ref(&operand)).unwrap();
            let context = DecodeContext::new(scope(), pool).with_config(&config);
            let decoded = decode_operands(&bytes, &context).unwrap();
            assert_eq!(decoded, vec![operand.clone()], "{operand}");
        }

        let string = Operand::FrozenString(Arc::new(FrozenString::new(StringPayload::new(
            b"s".to_vec(),
            Encoding::Utf8,
            "a.rb",
            u32::MAX,
        ))));
        let Operand::FrozenString(lit) = round_trip(&string) else {
            panic!("expected frozen string");
        };
        assert_eq!(lit.payload().line(), u32::MAX);
    }

    #[test]
    fn test_nesting_limit() {
        let mut nested = Operand::Nil;
        for _ in 0..10 {
            nested = Operand::splat(nested);
        }
        let (bytes, pool) = encode_operands(&[nested.clone()]).unwrap();

        let mut config = crate::config::IrConfig::default();
        config.max_operand_depth = 11;
        let context = DecodeContext::new(scope(), pool.clone()).with_config(&config);
        assert_eq!(decode_operands(&bytes, &context).unwrap(), vec![nested]);

        config.max_operand_depth = 10;
        let context = DecodeContext::new(scope(), pool).with_config(&config);
        assert!(matches!(
            decode_operands(&bytes, &context),
            Err(DecodeError::NestingTooDeep(10))
        ));
    }

    #[test]
    fn test_corrupt_deep_nesting_fails_cleanly() {
        let mut bytes = vec![OperandKind::Splat.tag(); 2_000_000];
        bytes.push(OperandKind::Nil.tag());
        let context = DecodeContext::new(scope(), SymbolPool::new());
        assert!(matches!(
            decode_operands(&bytes, &context),
            Err(DecodeError::NestingTooDeep(128))
        ));
    }

    #[test]
    fn test_decoded_literal_has_fresh_cache() {
        let original = Operand::fixnum(5);
        let back = round_trip(&original);
        assert_eq!(back, original);
        assert!(!back.same(&original));
    }
}
