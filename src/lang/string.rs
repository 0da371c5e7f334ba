use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::ChilledStringMode;
use crate::runtime::context::ThreadContext;
use crate::runtime::runtime_error::RuntimeError;

/// Character encoding attached to string bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Encoding {
    #[default]
    Utf8 = 0,
    UsAscii = 1,
    Binary = 2,
}

impl Encoding {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Encoding::Utf8),
            1 => Some(Encoding::UsAscii),
            2 => Some(Encoding::Binary),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::UsAscii => "US-ASCII",
            Encoding::Binary => "ASCII-8BIT",
        }
    }
}

/// Cached result of scanning string bytes against their encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CodeRange {
    #[default]
    Unknown = 0,
    SevenBit = 1,
    Valid = 2,
    Broken = 3,
}

impl CodeRange {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(CodeRange::Unknown),
            1 => Some(CodeRange::SevenBit),
            2 => Some(CodeRange::Valid),
            3 => Some(CodeRange::Broken),
            _ => None,
        }
    }

    pub fn scan(bytes: &[u8], encoding: Encoding) -> CodeRange {
        if bytes.is_ascii() {
            return CodeRange::SevenBit;
        }
        match encoding {
            Encoding::Binary => CodeRange::Valid,
            Encoding::UsAscii => CodeRange::Broken,
            Encoding::Utf8 => {
                if std::str::from_utf8(bytes).is_ok() {
                    CodeRange::Valid
                } else {
                    CodeRange::Broken
                }
            }
        }
    }
}

/// Source position recorded on debug frozen string literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationSite {
    pub file: Arc<str>,
    pub line: u32,
}

impl fmt::Display for CreationSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

const FROZEN: u8 = 1 << 0;
const CHILLED: u8 = 1 << 1;

/// A runtime string object.
pub struct RString {
    bytes: RwLock<Vec<u8>>,
    encoding: Encoding,
    code_range: AtomicU8,
    flags: AtomicU8,
    site: Option<CreationSite>,
}

impl RString {
    pub fn new(bytes: Vec<u8>, encoding: Encoding) -> Self {
        Self::with_flags(bytes, encoding, CodeRange::Unknown, 0)
    }

    pub fn new_frozen(bytes: Vec<u8>, encoding: Encoding, code_range: CodeRange) -> Self {
        Self::with_flags(bytes, encoding, code_range, FROZEN)
    }

    fn with_flags(bytes: Vec<u8>, encoding: Encoding, code_range: CodeRange, flags: u8) -> Self {
        RString {
            bytes: RwLock::new(bytes),
            encoding,
            code_range: AtomicU8::new(code_range as u8),
            flags: AtomicU8::new(flags),
            site: None,
        }
    }

    pub fn with_site(mut self, site: CreationSite) -> Self {
        self.site = Some(site);
        self
    }

    /// A mutable, unflagged copy sharing nothing with `self`.
    pub fn dup(&self) -> RString {
        Self::with_flags(self.bytes(), self.encoding, self.code_range(), 0)
    }

    /// A copy flagged chilled: mutable, but mutation is reported.
    pub fn dup_chilled(&self) -> RString {
        Self::with_flags(self.bytes(), self.encoding, self.code_range(), CHILLED)
    }

    pub fn freeze(&self) {
        self.flags.fetch_or(FROZEN, Ordering::AcqRel);
    }

    pub fn is_frozen(&self) -> bool {
        self.flags.load(Ordering::Acquire) & FROZEN != 0
    }

    pub fn is_chilled(&self) -> bool {
        self.flags.load(Ordering::Acquire) & CHILLED != 0
    }

    pub fn site(&self) -> Option<&CreationSite> {
        self.site.as_ref()
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn code_range(&self) -> CodeRange {
        let cached = CodeRange::from_u8(self.code_range.load(Ordering::Acquire))
            .unwrap_or(CodeRange::Unknown);
        if cached != CodeRange::Unknown {
            return cached;
        }
        let scanned = CodeRange::scan(&self.bytes.read(), self.encoding);
        self.code_range.store(scanned as u8, Ordering::Release);
        scanned
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.read().clone()
    }

    pub fn len(&self) -> usize {
        self.bytes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes.read()).into_owned()
    }

    pub fn append(&self, context: &ThreadContext, other: &[u8]) -> Result<(), RuntimeError> {
        self.modify_check(context)?;
        self.bytes.write().extend_from_slice(other);
        self.code_range.store(CodeRange::Unknown as u8, Ordering::Release);
        Ok(())
    }

    pub fn replace(&self, context: &ThreadContext, bytes: Vec<u8>) -> Result<(), RuntimeError> {
        self.modify_check(context)?;
        *self.bytes.write() = bytes;
        self.code_range.store(CodeRange::Unknown as u8, Ordering::Release);
        Ok(())
    }

    /// Raise if frozen; report and un-chill a chilled string.
    pub fn modify_check(&self, context: &ThreadContext) -> Result<(), RuntimeError> {
        if self.is_frozen() {
            return Err(RuntimeError::frozen(
                "String",
                &self.to_string_lossy(),
                self.site.as_ref(),
            ));
        }
        if self.unchill() && context.config().chilled_strings == ChilledStringMode::Warn {
            tracing::warn!(
                value = %self.to_string_lossy(),
                "literal string will be frozen in the future"
            );
        }
        Ok(())
    }

    /// Clear the chilled flag; true only for the call that cleared it.
    fn unchill(&self) -> bool {
        self.flags.fetch_and(!CHILLED, Ordering::AcqRel) & CHILLED != 0
    }
}

impl PartialEq for RString {
    fn eq(&self, other: &Self) -> bool {
        self.encoding == other.encoding && *self.bytes.read() == *other.bytes.read()
    }
}

impl fmt::Debug for RString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RString")
            .field("value", &self.to_string_lossy())
            .field("encoding", &self.encoding)
            .field("frozen", &self.is_frozen())
            .field("chilled", &self.is_chilled())
            .finish()
    }
}
