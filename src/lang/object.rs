use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use regex::bytes::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::string::Encoding;
use super::symbol::Symbol;
use super::value::Value;
use crate::runtime::runtime_error::RuntimeError;

// =============================================================================
// Collections
// =============================================================================

#[derive(Debug, Default)]
pub struct RArray {
    elements: RwLock<Vec<Value>>,
}

impl RArray {
    pub fn new(elements: Vec<Value>) -> Self {
        RArray {
            elements: RwLock::new(elements),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.elements.read().get(index).cloned()
    }

    pub fn push(&self, value: Value) {
        self.elements.write().push(value);
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.elements.read().clone()
    }
}

impl PartialEq for RArray {
    fn eq(&self, other: &Self) -> bool {
        *self.elements.read() == *other.elements.read()
    }
}

/// Insertion-ordered hash.
#[derive(Debug, Default)]
pub struct RHash {
    entries: RwLock<Vec<(Value, Value)>>,
    kwargs: bool,
}

impl RHash {
    pub fn new(kwargs: bool) -> Self {
        RHash {
            entries: RwLock::new(Vec::new()),
            kwargs,
        }
    }

    pub fn is_kwargs(&self) -> bool {
        self.kwargs
    }

    /// Insert or overwrite; an existing key keeps its position.
    pub fn insert(&self, key: Value, value: Value) {
        let mut entries = self.entries.write();
        if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            entries.push((key, value));
        }
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.entries
            .read()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.entries.read().clone()
    }
}

impl PartialEq for RHash {
    fn eq(&self, other: &Self) -> bool {
        *self.entries.read() == *other.entries.read()
    }
}

/// Always frozen.
#[derive(Debug, Clone, PartialEq)]
pub struct RRange {
    pub begin: Value,
    pub end: Value,
    pub exclusive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RRational {
    pub numerator: Value,
    pub denominator: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RComplex {
    pub real: Value,
    pub imaginary: Value,
}

// =============================================================================
// Regular expressions
// =============================================================================

/// Regexp literal flags, stored as the bit set used in the IR encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RegexpOptions(u8);

impl RegexpOptions {
    pub const IGNORECASE: u8 = 1 << 0;
    pub const EXTENDED: u8 = 1 << 1;
    pub const MULTILINE: u8 = 1 << 2;
    pub const ONCE: u8 = 1 << 3;

    pub fn from_bits(bits: u8) -> Self {
        RegexpOptions(bits & (Self::IGNORECASE | Self::EXTENDED | Self::MULTILINE | Self::ONCE))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn has(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn with(self, flag: u8) -> Self {
        RegexpOptions(self.0 | flag)
    }
}

impl fmt::Display for RegexpOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has(Self::MULTILINE) {
            write!(f, "m")?;
        }
        if self.has(Self::IGNORECASE) {
            write!(f, "i")?;
        }
        if self.has(Self::EXTENDED) {
            write!(f, "x")?;
        }
        if self.has(Self::ONCE) {
            write!(f, "o")?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct RRegexp {
    source: Vec<u8>,
    options: RegexpOptions,
    encoding: Encoding,
    regex: Regex,
}

impl RRegexp {
    pub fn new(
        source: &[u8],
        options: RegexpOptions,
        encoding: Encoding,
    ) -> Result<Self, RuntimeError> {
        let pattern = std::str::from_utf8(source)
            .map_err(|_| RuntimeError::regexp("invalid multibyte character in pattern"))?;
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(options.has(RegexpOptions::IGNORECASE))
            .ignore_whitespace(options.has(RegexpOptions::EXTENDED))
            .dot_matches_new_line(options.has(RegexpOptions::MULTILINE))
            .multi_line(true)
            .unicode(encoding != Encoding::Binary)
            .build()
            .map_err(|e| RuntimeError::regexp(&e.to_string()))?;
        Ok(RRegexp {
            source: source.to_vec(),
            options,
            encoding,
            regex,
        })
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

    pub fn match_bytes(&self, haystack: &[u8]) -> Option<MatchData> {
        let captures = self.regex.captures(haystack)?;
        let groups = captures
            .iter()
            .map(|group| group.map(|m| (m.start(), m.end())))
            .collect();
        Some(MatchData {
            haystack: haystack.to_vec(),
            groups,
        })
    }
}

impl PartialEq for RRegexp {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.options == other.options
    }
}

/// Result of the last successful match, read by `$~`-derived references.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchData {
    haystack: Vec<u8>,
    groups: Vec<Option<(usize, usize)>>,
}

impl MatchData {
    pub fn new(haystack: Vec<u8>, groups: Vec<Option<(usize, usize)>>) -> Self {
        MatchData { haystack, groups }
    }

    /// Group `n`; group 0 is the whole match.
    pub fn group(&self, n: usize) -> Option<&[u8]> {
        let (start, end) = (*self.groups.get(n)?)?;
        self.haystack.get(start..end)
    }

    pub fn pre_match(&self) -> Option<&[u8]> {
        let (start, _) = (*self.groups.first()?)?;
        self.haystack.get(..start)
    }

    pub fn post_match(&self) -> Option<&[u8]> {
        let (_, end) = (*self.groups.first()?)?;
        self.haystack.get(end..)
    }

    /// Highest-numbered group that participated in the match.
    pub fn last_group(&self) -> Option<&[u8]> {
        (1..self.groups.len()).rev().find_map(|n| self.group(n))
    }
}

// =============================================================================
// Modules, procs, methods
// =============================================================================

/// Classes the IR can reference without a constant lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BuiltinClass {
    Object = 0,
    BasicObject = 1,
    Module = 2,
    Class = 3,
    Array = 4,
    Hash = 5,
    String = 6,
    Symbol = 7,
    Integer = 8,
    Float = 9,
    Proc = 10,
    StandardError = 11,
}

impl BuiltinClass {
    pub const ALL: [BuiltinClass; 12] = [
        BuiltinClass::Object,
        BuiltinClass::BasicObject,
        BuiltinClass::Module,
        BuiltinClass::Class,
        BuiltinClass::Array,
        BuiltinClass::Hash,
        BuiltinClass::String,
        BuiltinClass::Symbol,
        BuiltinClass::Integer,
        BuiltinClass::Float,
        BuiltinClass::Proc,
        BuiltinClass::StandardError,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            BuiltinClass::Object => "Object",
            BuiltinClass::BasicObject => "BasicObject",
            BuiltinClass::Module => "Module",
            BuiltinClass::Class => "Class",
            BuiltinClass::Array => "Array",
            BuiltinClass::Hash => "Hash",
            BuiltinClass::String => "String",
            BuiltinClass::Symbol => "Symbol",
            BuiltinClass::Integer => "Integer",
            BuiltinClass::Float => "Float",
            BuiltinClass::Proc => "Proc",
            BuiltinClass::StandardError => "StandardError",
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct RModule {
    pub name: Arc<str>,
    pub builtin: Option<BuiltinClass>,
}

impl RModule {
    pub fn new(name: &str) -> Self {
        RModule {
            name: Arc::from(name),
            builtin: None,
        }
    }

    pub fn builtin(class: BuiltinClass) -> Self {
        RModule {
            name: Arc::from(class.name()),
            builtin: Some(class),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum RProc {
    /// `&:name`
    Symbol(Symbol),
}

/// A method bound to its receiver.
#[derive(Debug, PartialEq)]
pub struct RMethod {
    pub receiver: Value,
    pub name: Symbol,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_insert_overwrites_in_place() {
        let hash = RHash::new(false);
        hash.insert(Value::Fixnum(1), Value::Fixnum(10));
        hash.insert(Value::Fixnum(2), Value::Fixnum(20));
        hash.insert(Value::Fixnum(1), Value::Fixnum(11));
        assert_eq!(hash.len(), 2);
        assert_eq!(hash.entries()[0], (Value::Fixnum(1), Value::Fixnum(11)));
    }

    #[test]
    fn test_regexp_match_groups() {
        let re = RRegexp::new(br"(\d+)-(x)?(\d+)", RegexpOptions::default(), Encoding::Utf8)
            .unwrap();
        let m = re.match_bytes(b"ab 12-34 cd").unwrap();
        assert_eq!(m.group(0), Some(&b"12-34"[..]));
        assert_eq!(m.group(1), Some(&b"12"[..]));
        assert_eq!(m.group(2), None);
        assert_eq!(m.pre_match(), Some(&b"ab "[..]));
        assert_eq!(m.post_match(), Some(&b" cd"[..]));
        assert_eq!(m.last_group(), Some(&b"34"[..]));
    }

    #[test]
    fn test_regexp_ignorecase() {
        let options = RegexpOptions::default().with(RegexpOptions::IGNORECASE);
        let re = RRegexp::new(b"abc", options, Encoding::Utf8).unwrap();
        assert!(re.match_bytes(b"xABCx").is_some());
    }

    #[test]
    fn test_invalid_regexp_is_user_error() {
        let err = RRegexp::new(b"(unclosed", RegexpOptions::default(), Encoding::Utf8)
            .unwrap_err();
        assert!(err.to_string().contains("RegexpError"));
    }

    #[test]
    fn test_regexp_options_display() {
        let options = RegexpOptions::from_bits(RegexpOptions::IGNORECASE | RegexpOptions::MULTILINE);
        assert_eq!(options.to_string(), "mi");
    }

    #[test]
    fn test_builtin_class_tags() {
        for class in BuiltinClass::ALL {
            assert_eq!(BuiltinClass::from_u8(class as u8), Some(class));
        }
        assert_eq!(BuiltinClass::from_u8(200), None);
    }
}
