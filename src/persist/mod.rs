//! Binary persistence of operands.
//!
//! Operands are written through an [`IrWriter`] and read back through an
//! [`IrReader`]. The field layout of each kind lives in [`codec`]; the
//! buffer-backed implementations encode primitives with postcard.

pub mod codec;
pub mod decode_error;
pub mod reader;
pub mod writer;

pub use codec::{decode_operand, decode_operands, encode_operand, encode_operands};
pub use decode_error::{DecodeError, EncodeError};
pub use reader::{BufferReader, DecodeContext, IrReader, SymbolPool};
pub use writer::{BufferWriter, IrWriter};
