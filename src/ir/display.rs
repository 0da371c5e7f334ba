//! Text form of operands as it appears in IR dumps.

use std::fmt::{self, Write};

use super::compound::CompoundString;
use super::operand::Operand;
use super::reference::Backref;
use super::string_literal::StringPayload;
use crate::lang::value::format_float;

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Operand]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_quoted(f: &mut fmt::Formatter<'_>, payload: &StringPayload) -> fmt::Result {
    write!(f, "{:?}", payload.to_string_lossy())
}

fn write_compound_string(f: &mut fmt::Formatter<'_>, s: &CompoundString) -> fmt::Result {
    if s.is_frozen() {
        write!(f, "frozen:")?;
    }
    write!(f, "\"")?;
    for piece in s.pieces() {
        match piece {
            Operand::FrozenString(lit) => {
                let text = format!("{:?}", lit.payload().to_string_lossy());
                write!(f, "{}", &text[1..text.len() - 1])?;
            }
            other => write!(f, "#{{{}}}", other)?,
        }
    }
    write!(f, "\"")
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Fixnum(lit) => write!(f, "{}", lit.value()),
            Operand::Bignum(lit) => write!(f, "{}", lit.value()),
            Operand::Float(lit) => format_float(lit.value(), f),
            Operand::Boolean(b) => write!(f, "{}", b),
            Operand::Nil => write!(f, "nil"),
            Operand::UnboxedFixnum(n) => write!(f, "unboxed({})", n),
            Operand::UnboxedFloat(n) => {
                write!(f, "unboxed(")?;
                format_float(*n, f)?;
                write!(f, ")")
            }
            Operand::UnboxedBoolean(b) => write!(f, "unboxed({})", b),
            Operand::Symbol(lit) => write!(f, ":{}", lit.name()),
            Operand::Regexp(lit) => write!(
                f,
                "/{}/{}",
                String::from_utf8_lossy(lit.source()),
                lit.options()
            ),
            Operand::Range(lit) => {
                let dots = if lit.is_exclusive() { "..." } else { ".." };
                write!(f, "{}{}{}", lit.begin(), dots, lit.end())
            }
            Operand::Rational(lit) => write!(f, "({}/{})", lit.numerator(), lit.denominator()),
            Operand::Complex(lit) => write!(f, "{}i", lit.number()),
            Operand::FrozenString(lit) => {
                write!(f, "frozen:")?;
                write_quoted(f, lit.payload())
            }
            Operand::MutableString(lit) => write_quoted(f, lit.payload()),
            Operand::ChilledString(lit) => {
                write!(f, "chilled:")?;
                write_quoted(f, lit.payload())
            }
            Operand::SymbolProc(lit) => write!(f, "&:{}", lit.name()),

            Operand::Variable(v) => write!(f, "{}", v),

            Operand::Array(a) => {
                write!(f, "[")?;
                write_list(f, a.elements())?;
                write!(f, "]")
            }
            Operand::Hash(h) => {
                if h.is_kwargs() {
                    write!(f, "kw")?;
                }
                write!(f, "{{")?;
                for (i, pair) in h.pairs().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}=>{}", pair.key(), pair.value())?;
                }
                write!(f, "}}")
            }
            Operand::HashPair(p) => write!(f, "{}=>{}", p.key(), p.value()),
            Operand::Splat(s) => write!(f, "*{}", s.array()),
            Operand::CompoundString(s) => write_compound_string(f, s),
            Operand::DynamicSymbol(s) => write!(f, ":{}", s.string()),
            Operand::SValue(s) => write!(f, "svalue({})", s.array()),
            Operand::MethodHandle(m) => write!(f, "{}.method({})", m.receiver(), m.method_name()),

            Operand::CurrentScope(s) => write!(f, "scope<{}>", s.depth()),
            Operand::ScopeModule(s) => write!(f, "module<{}>", s.depth()),
            Operand::Backref(b) => write!(f, "{}", b),
            Operand::NthRef(n) => write!(f, "${}", n.n()),
            Operand::MethAddr(m) => write!(f, "'{}'", m.name()),
            Operand::BuiltinClass(c) => write!(f, "<Class:{}>", c.name()),
            Operand::Filename => write!(f, "__FILE__"),
            Operand::GlobalVariable(g) => write!(f, "{}", g.name()),
            Operand::Label(l) => write!(f, "{}", l),
            Operand::NullBlock => write!(f, "null_block"),
            Operand::UndefinedValue => write!(f, "undefined"),
            Operand::UnexecutableNil => write!(f, "nil(unexecutable)"),
        }
    }
}

impl fmt::Display for Backref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.as_char())
    }
}

/// Numbered listing of `operands` with their kinds.
pub fn dump_operands(title: &str, operands: &[Operand]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "════════════════════════════════════════");
    let _ = writeln!(out, " {}", title);
    let _ = writeln!(out, " {} operands", operands.len());
    let _ = writeln!(out, "════════════════════════════════════════");
    for (i, operand) in operands.iter().enumerate() {
        let _ = writeln!(out, "{:04}  {:<24} {}", i, operand.kind().name(), operand);
    }
    out
}

pub fn print_operands(title: &str, operands: &[Operand]) {
    print!("{}", dump_operands(title, operands));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::object::{BuiltinClass, RegexpOptions};
    use crate::lang::string::Encoding;

    #[test]
    fn test_literal_forms() {
        assert_eq!(Operand::fixnum(34853).to_string(), "34853");
        assert_eq!(Operand::float(2.0).to_string(), "2.0");
        assert_eq!(Operand::frozen_string("x").to_string(), "frozen:\"x\"");
        assert_eq!(Operand::mutable_string("x").to_string(), "\"x\"");
        assert_eq!(Operand::chilled_string("x").to_string(), "chilled:\"x\"");
        assert_eq!(Operand::symbol_proc("up").to_string(), "&:up");
        let opts = RegexpOptions::default()
            .with(RegexpOptions::MULTILINE)
            .with(RegexpOptions::IGNORECASE);
        assert_eq!(Operand::regexp("re", opts).to_string(), "/re/mi");
        let range = Operand::range(Operand::fixnum(1), Operand::fixnum(5), false).unwrap();
        assert_eq!(range.to_string(), "1..5");
        assert_eq!(Operand::UnboxedFixnum(3).to_string(), "unboxed(3)");
    }

    #[test]
    fn test_compound_forms() {
        let array = Operand::array(vec![Operand::fixnum(1), Operand::local("x", 0, 1)]);
        assert_eq!(array.to_string(), "[1, x(0:1)]");
        let hash = Operand::hash(vec![(Operand::symbol("k"), Operand::fixnum(1))], false);
        assert_eq!(hash.to_string(), "{:k=>1}");
        assert_eq!(Operand::splat(Operand::temp(1)).to_string(), "*%v_1");
        let s = Operand::compound_string(
            vec![Operand::frozen_string("a\"b"), Operand::temp(2)],
            Encoding::Utf8,
            false,
        );
        assert_eq!(s.to_string(), "\"a\\\"b#{%v_2}\"");
    }

    #[test]
    fn test_reference_forms() {
        assert_eq!(Operand::current_scope(0).to_string(), "scope<0>");
        assert_eq!(Operand::scope_module(0).to_string(), "module<0>");
        assert_eq!(Operand::Backref(Backref::Match).to_string(), "$&");
        assert_eq!(Operand::nth_ref(1).to_string(), "$1");
        assert_eq!(Operand::meth_addr("foo").to_string(), "'foo'");
        assert_eq!(Operand::BuiltinClass(BuiltinClass::Object).to_string(), "<Class:Object>");
        assert_eq!(Operand::Filename.to_string(), "__FILE__");
        assert_eq!(Operand::global("$foo").to_string(), "$foo");
        assert_eq!(Operand::label("LBL", 3).to_string(), "LBL_3");
        assert_eq!(Operand::UnexecutableNil.to_string(), "nil(unexecutable)");
    }

    #[test]
    fn test_dump_operands() {
        let dump = dump_operands("args", &[Operand::fixnum(1), Operand::self_value()]);
        assert!(dump.contains(" 2 operands"));
        assert!(dump.contains("0000  fixnum"));
        assert!(dump.contains("0001  self"));
        assert!(dump.lines().last().unwrap().ends_with("%self"));
    }
}
