//! Closed registry of operand kinds.
//!
//! The tag byte of each kind is written at the head of every persisted
//! operand, so existing tags never change meaning.

use std::fmt;

/// Which notion of equality a kind's `PartialEq` implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqualityPolicy {
    /// Equal payloads; cache identity stays per instance.
    Payload,
    /// Same storage slot, independent of scope depth.
    Slot,
    /// Child-by-child.
    Structural,
    /// Same depth, index or name.
    Position,
    /// Payload-free; all instances are equal.
    Singleton,
}

/// Broad grouping of kinds, mirroring the module layout of `ir`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandFamily {
    Literal,
    Variable,
    Compound,
    Reference,
}

macro_rules! operand_kinds {
    ($($name:ident = $tag:literal => ($display:literal, $family:ident, $equality:ident)),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum OperandKind {
            $($name = $tag),+
        }

        impl OperandKind {
            pub const ALL: &'static [OperandKind] = &[$(OperandKind::$name),+];

            pub fn from_tag(tag: u8) -> Option<OperandKind> {
                match tag {
                    $($tag => Some(OperandKind::$name),)+
                    _ => None,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(OperandKind::$name => $display),+
                }
            }

            pub fn family(self) -> OperandFamily {
                match self {
                    $(OperandKind::$name => OperandFamily::$family),+
                }
            }

            pub fn equality(self) -> EqualityPolicy {
                match self {
                    $(OperandKind::$name => EqualityPolicy::$equality),+
                }
            }
        }
    };
}

operand_kinds! {
    // ───────────────────────────── Literals ─────────────────────────────
    Fixnum = 0 => ("fixnum", Literal, Payload),
    Bignum = 1 => ("bignum", Literal, Payload),
    Float = 2 => ("float", Literal, Payload),
    Boolean = 3 => ("boolean", Literal, Payload),
    Nil = 4 => ("nil", Literal, Singleton),
    UnboxedFixnum = 5 => ("unboxed fixnum", Literal, Payload),
    UnboxedFloat = 6 => ("unboxed float", Literal, Payload),
    UnboxedBoolean = 7 => ("unboxed boolean", Literal, Payload),
    Symbol = 8 => ("symbol", Literal, Payload),
    Regexp = 9 => ("regexp", Literal, Payload),
    Range = 10 => ("range", Literal, Payload),
    Rational = 11 => ("rational", Literal, Payload),
    Complex = 12 => ("complex", Literal, Payload),
    FrozenString = 13 => ("frozen string", Literal, Payload),
    MutableString = 14 => ("mutable string", Literal, Payload),
    ChilledString = 15 => ("chilled string", Literal, Payload),
    SymbolProc = 16 => ("symbol proc", Literal, Payload),

    // ───────────────────────────── Variables ────────────────────────────
    LocalVariable = 20 => ("local variable", Variable, Slot),
    ClosureLocalVariable = 21 => ("closure local variable", Variable, Slot),
    TemporaryVariable = 22 => ("temporary variable", Variable, Slot),
    TemporaryFixnum = 23 => ("temporary fixnum", Variable, Slot),
    TemporaryFloat = 24 => ("temporary float", Variable, Slot),
    TemporaryBoolean = 25 => ("temporary boolean", Variable, Slot),
    TemporaryCurrentModule = 26 => ("temporary current module", Variable, Slot),
    TemporaryCurrentScope = 27 => ("temporary current scope", Variable, Slot),
    TemporaryClosure = 28 => ("temporary closure variable", Variable, Slot),
    SelfValue = 29 => ("self", Variable, Singleton),

    // ───────────────────────────── Compound ─────────────────────────────
    Array = 40 => ("array", Compound, Structural),
    Hash = 41 => ("hash", Compound, Structural),
    HashPair = 42 => ("hash pair", Compound, Structural),
    Splat = 43 => ("splat", Compound, Structural),
    CompoundString = 44 => ("compound string", Compound, Structural),
    DynamicSymbol = 45 => ("dynamic symbol", Compound, Structural),
    SValue = 46 => ("svalue", Compound, Structural),
    MethodHandle = 47 => ("method handle", Compound, Structural),

    // ──────────────────────── References & markers ───────────────────────
    CurrentScope = 60 => ("current scope", Reference, Position),
    ScopeModule = 61 => ("scope module", Reference, Position),
    Backref = 62 => ("backref", Reference, Position),
    NthRef = 63 => ("nth ref", Reference, Position),
    MethAddr = 64 => ("method address", Reference, Position),
    BuiltinClass = 65 => ("builtin class", Reference, Position),
    Filename = 66 => ("filename", Reference, Singleton),
    GlobalVariable = 67 => ("global variable", Reference, Position),
    Label = 68 => ("label", Reference, Position),
    NullBlock = 69 => ("null block", Reference, Singleton),
    UndefinedValue = 70 => ("undefined value", Reference, Singleton),
    UnexecutableNil = 71 => ("unexecutable nil", Reference, Singleton),
}

impl OperandKind {
    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for OperandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
