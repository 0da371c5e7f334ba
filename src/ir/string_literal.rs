//! String literals: frozen, mutable and chilled.
//!
//! All three share one payload and one frozen cached value. They differ only
//! in what a single evaluation hands back.

use std::sync::Arc;

use super::ir_error::IrError;
use super::kind::OperandKind;
use super::literal::LiteralCache;
use crate::config::ChilledStringMode;
use crate::lang::string::{CodeRange, CreationSite, Encoding, RString};
use crate::lang::value::Value;
use crate::runtime::context::Frame;

/// Bytes of a string literal plus where it appeared.
#[derive(Debug, Clone)]
pub struct StringPayload {
    bytes: Vec<u8>,
    encoding: Encoding,
    code_range: CodeRange,
    file: Arc<str>,
    line: u32,
}

impl StringPayload {
    pub fn new(bytes: Vec<u8>, encoding: Encoding, file: &str, line: u32) -> Self {
        let code_range = CodeRange::scan(&bytes, encoding);
        Self::with_code_range(bytes, encoding, code_range, file, line)
    }

    pub fn with_code_range(
        bytes: Vec<u8>,
        encoding: Encoding,
        code_range: CodeRange,
        file: &str,
        line: u32,
    ) -> Self {
        StringPayload {
            bytes,
            encoding,
            code_range,
            file: Arc::from(file),
            line,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn code_range(&self) -> CodeRange {
        self.code_range
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    fn site(&self) -> CreationSite {
        CreationSite {
            file: self.file.clone(),
            line: self.line,
        }
    }
}

/// Position is not part of a literal's identity as a value.
impl PartialEq for StringPayload {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes && self.encoding == other.encoding
    }
}

#[derive(Debug)]
pub struct FrozenString {
    payload: StringPayload,
    cache: LiteralCache,
}

impl FrozenString {
    pub fn new(payload: StringPayload) -> Self {
        FrozenString {
            payload,
            cache: LiteralCache::new(),
        }
    }

    pub fn payload(&self) -> &StringPayload {
        &self.payload
    }

    pub fn cache(&self) -> &LiteralCache {
        &self.cache
    }

    pub fn cached_object(&self, frame: &Frame<'_>) -> Result<Value, IrError> {
        self.cache.get_or_create(OperandKind::FrozenString, || {
            let payload = &self.payload;
            let runtime = frame.runtime();
            let string = if runtime.config().debug_frozen_string_literals {
                let string = RString::new_frozen(
                    payload.bytes.clone(),
                    payload.encoding,
                    payload.code_range,
                );
                Arc::new(string.with_site(payload.site()))
            } else {
                runtime.freeze_and_dedup(&payload.bytes, payload.encoding, payload.code_range)
            };
            Ok(Value::String(string))
        })
    }

    fn frozen_rstring(&self, frame: &Frame<'_>) -> Result<Arc<RString>, IrError> {
        match self.cached_object(frame)? {
            Value::String(string) => Ok(string),
            _ => Err(IrError::not_retrievable(OperandKind::FrozenString)),
        }
    }
}

impl PartialEq for FrozenString {
    fn eq(&self, other: &Self) -> bool {
        self.payload == other.payload
    }
}

/// A plain `"..."` literal: every evaluation yields a new mutable string.
#[derive(Debug)]
pub struct MutableString {
    frozen: FrozenString,
}

impl MutableString {
    pub fn new(payload: StringPayload) -> Self {
        MutableString {
            frozen: FrozenString::new(payload),
        }
    }

    pub fn payload(&self) -> &StringPayload {
        self.frozen.payload()
    }

    pub fn frozen(&self) -> &FrozenString {
        &self.frozen
    }

    pub fn retrieve(&self, frame: &Frame<'_>) -> Result<Value, IrError> {
        let frozen = self.frozen.frozen_rstring(frame)?;
        Ok(Value::string(frozen.dup()))
    }
}

impl PartialEq for MutableString {
    fn eq(&self, other: &Self) -> bool {
        self.frozen == other.frozen
    }
}

/// A string literal in a file without a frozen-string-literal magic comment.
#[derive(Debug)]
pub struct ChilledString {
    frozen: FrozenString,
}

impl ChilledString {
    pub fn new(payload: StringPayload) -> Self {
        ChilledString {
            frozen: FrozenString::new(payload),
        }
    }

    pub fn payload(&self) -> &StringPayload {
        self.frozen.payload()
    }

    pub fn frozen(&self) -> &FrozenString {
        &self.frozen
    }

    pub fn retrieve(&self, frame: &Frame<'_>) -> Result<Value, IrError> {
        match frame.context.config().chilled_strings {
            ChilledStringMode::Frozen => self.frozen.cached_object(frame),
            ChilledStringMode::Mutable => {
                let frozen = self.frozen.frozen_rstring(frame)?;
                Ok(Value::string(frozen.dup()))
            }
            ChilledStringMode::Warn => {
                let frozen = self.frozen.frozen_rstring(frame)?;
                Ok(Value::string(frozen.dup_chilled()))
            }
        }
    }
}

impl PartialEq for ChilledString {
    fn eq(&self, other: &Self) -> bool {
        self.frozen == other.frozen
    }
}
