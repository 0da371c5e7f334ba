//! Output side of the operand codec.

use serde::Serialize;

use super::decode_error::EncodeError;
use super::reader::SymbolPool;
use crate::ir::kind::OperandKind;
use crate::ir::operand::Operand;

/// Primitive sink the codec writes operand fields to.
pub trait IrWriter {
    fn write_byte(&mut self, value: u8) -> Result<(), EncodeError>;
    fn write_bool(&mut self, value: bool) -> Result<(), EncodeError>;
    fn write_int(&mut self, value: i32) -> Result<(), EncodeError>;
    /// Offsets, depths, ids and counts.
    fn write_uint(&mut self, value: u32) -> Result<(), EncodeError>;
    fn write_long(&mut self, value: i64) -> Result<(), EncodeError>;
    fn write_double(&mut self, value: f64) -> Result<(), EncodeError>;
    fn write_char(&mut self, value: char) -> Result<(), EncodeError>;
    fn write_string(&mut self, value: &str) -> Result<(), EncodeError>;
    fn write_bytes(&mut self, value: &[u8]) -> Result<(), EncodeError>;

    /// Symbols go through a pool so repeated names cost one index each.
    fn write_symbol(&mut self, name: &str) -> Result<(), EncodeError>;

    fn write_kind(&mut self, kind: OperandKind) -> Result<(), EncodeError> {
        self.write_byte(kind.tag())
    }

    fn write_operand(&mut self, operand: &Operand) -> Result<(), EncodeError>;
}

/// In-memory writer using postcard for every field.
#[derive(Debug, Default)]
pub struct BufferWriter {
    buffer: Vec<u8>,
    symbols: SymbolPool,
}

impl BufferWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn symbols(&self) -> &SymbolPool {
        &self.symbols
    }

    /// The operand bytes and the pool their symbol indices refer to.
    pub fn finish(self) -> (Vec<u8>, SymbolPool) {
        (self.buffer, self.symbols)
    }

    fn put<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        let buffer = std::mem::take(&mut self.buffer);
        self.buffer = postcard::to_extend(value, buffer)?;
        Ok(())
    }
}

impl IrWriter for BufferWriter {
    fn write_byte(&mut self, value: u8) -> Result<(), EncodeError> {
        self.buffer.push(value);
        Ok(())
    }

    fn write_bool(&mut self, value: bool) -> Result<(), EncodeError> {
        self.put(&value)
    }

    fn write_int(&mut self, value: i32) -> Result<(), EncodeError> {
        self.put(&value)
    }

    fn write_uint(&mut self, value: u32) -> Result<(), EncodeError> {
        self.put(&value)
    }

    fn write_long(&mut self, value: i64) -> Result<(), EncodeError> {
        self.put(&value)
    }

    fn write_double(&mut self, value: f64) -> Result<(), EncodeError> {
        self.put(&value)
    }

    fn write_char(&mut self, value: char) -> Result<(), EncodeError> {
        self.put(&value)
    }

    fn write_string(&mut self, value: &str) -> Result<(), EncodeError> {
        self.put(value)
    }

    fn write_bytes(&mut self, value: &[u8]) -> Result<(), EncodeError> {
        self.put(value)
    }

    fn write_symbol(&mut self, name: &str) -> Result<(), EncodeError> {
        let index = self.symbols.intern(name);
        self.put(&index)
    }

    fn write_operand(&mut self, operand: &Operand) -> Result<(), EncodeError> {
        super::codec::encode_operand(self, operand)
    }
}
