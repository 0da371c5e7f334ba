//! Input side of the operand codec.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::decode_error::DecodeError;
use crate::config::IrConfig;
use crate::ir::kind::OperandKind;
use crate::ir::operand::Operand;
use crate::runtime::scope::StaticScope;

/// Interned symbol names referenced by index from operand data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolPool {
    names: Vec<String>,
    #[serde(skip)]
    index: FxHashMap<String, u32>,
}

impl SymbolPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: &str) -> u32 {
        if let Some(&index) = self.index.get(name) {
            return index;
        }
        let index = self.names.len() as u32;
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), index);
        index
    }

    pub fn get(&self, index: u32) -> Option<&str> {
        self.names.get(index as usize).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// What decoding needs from the surrounding unit.
#[derive(Debug, Clone)]
pub struct DecodeContext {
    /// Scope that local variables are re-resolved against.
    pub scope: Arc<StaticScope>,
    /// File recorded on string literals; the scope's file when unset.
    pub filename: Option<Arc<str>>,
    pub symbols: SymbolPool,
    pub max_nth_ref: u32,
    /// Deepest operand nesting accepted before the input is treated as corrupt.
    pub max_operand_depth: u32,
}

impl DecodeContext {
    pub fn new(scope: Arc<StaticScope>, symbols: SymbolPool) -> Self {
        DecodeContext {
            scope,
            filename: None,
            symbols,
            max_nth_ref: IrConfig::default().max_nth_ref,
            max_operand_depth: IrConfig::default().max_operand_depth,
        }
    }

    pub fn with_filename(mut self, filename: &str) -> Self {
        self.filename = Some(Arc::from(filename));
        self
    }

    pub fn with_config(mut self, config: &IrConfig) -> Self {
        self.max_nth_ref = config.max_nth_ref;
        self.max_operand_depth = config.max_operand_depth;
        self
    }

    pub fn file(&self) -> Arc<str> {
        match &self.filename {
            Some(name) => name.clone(),
            None => self.scope.file().clone(),
        }
    }
}

/// Primitive source mirroring [`IrWriter`](super::writer::IrWriter).
pub trait IrReader {
    fn read_byte(&mut self) -> Result<u8, DecodeError>;
    fn read_bool(&mut self) -> Result<bool, DecodeError>;
    fn read_int(&mut self) -> Result<i32, DecodeError>;
    fn read_uint(&mut self) -> Result<u32, DecodeError>;
    fn read_long(&mut self) -> Result<i64, DecodeError>;
    fn read_double(&mut self) -> Result<f64, DecodeError>;
    fn read_char(&mut self) -> Result<char, DecodeError>;
    fn read_string(&mut self) -> Result<String, DecodeError>;
    fn read_bytes(&mut self) -> Result<Vec<u8>, DecodeError>;
    fn read_symbol(&mut self) -> Result<String, DecodeError>;

    fn read_kind(&mut self) -> Result<OperandKind, DecodeError> {
        let tag = self.read_byte()?;
        OperandKind::from_tag(tag).ok_or(DecodeError::UnknownKind(tag))
    }

    fn read_operand(&mut self) -> Result<Operand, DecodeError>;

    fn context(&self) -> &DecodeContext;
}

pub struct BufferReader<'a> {
    input: &'a [u8],
    context: &'a DecodeContext,
    depth: u32,
}

impl<'a> BufferReader<'a> {
    pub fn new(input: &'a [u8], context: &'a DecodeContext) -> Self {
        BufferReader {
            input,
            context,
            depth: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    fn take<T: Deserialize<'a>>(&mut self) -> Result<T, DecodeError> {
        let (value, rest) = postcard::take_from_bytes(self.input)?;
        self.input = rest;
        Ok(value)
    }
}

impl IrReader for BufferReader<'_> {
    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        let (&byte, rest) = self.input.split_first().ok_or_else(DecodeError::truncated)?;
        self.input = rest;
        Ok(byte)
    }

    fn read_bool(&mut self) -> Result<bool, DecodeError> {
        self.take()
    }

    fn read_int(&mut self) -> Result<i32, DecodeError> {
        self.take()
    }

    fn read_uint(&mut self) -> Result<u32, DecodeError> {
        self.take()
    }

    fn read_long(&mut self) -> Result<i64, DecodeError> {
        self.take()
    }

    fn read_double(&mut self) -> Result<f64, DecodeError> {
        self.take()
    }

    fn read_char(&mut self) -> Result<char, DecodeError> {
        self.take()
    }

    fn read_string(&mut self) -> Result<String, DecodeError> {
        self.take()
    }

    fn read_bytes(&mut self) -> Result<Vec<u8>, DecodeError> {
        self.take()
    }

    fn read_symbol(&mut self) -> Result<String, DecodeError> {
        let index: u32 = self.take()?;
        self.context
            .symbols
            .get(index)
            .map(str::to_string)
            .ok_or(DecodeError::InvalidSymbolIndex(index))
    }

    fn read_operand(&mut self) -> Result<Operand, DecodeError> {
        let limit = self.context.max_operand_depth;
        if self.depth >= limit {
            return Err(DecodeError::NestingTooDeep(limit));
        }
        self.depth += 1;
        let operand = super::codec::decode_operand(self);
        self.depth -= 1;
        operand
    }

    fn context(&self) -> &DecodeContext {
        self.context
    }
}
