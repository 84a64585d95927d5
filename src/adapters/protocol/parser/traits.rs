use bytes::{Buf, Bytes};
use crate::application::error::ApplicationError;

/// Parses values out of a byte buffer.
pub trait ByteParser {
    /// Fails unless at least `required` bytes are left.
    fn ensure_remaining(&self, buf: &Bytes, required: usize) -> Result<(), ApplicationError> {
        if buf.remaining() < required {
            return Err(ApplicationError::Protocol(
                format!("buffer too short: need {} bytes but has {}", required, buf.remaining())
            ));
        }
        Ok(())
    }

    /// Splits the next `len` bytes off as their own buffer.
    fn take_bytes(&self, buf: &mut Bytes, len: usize) -> Result<Bytes, ApplicationError> {
        self.ensure_remaining(buf, len)?;
        Ok(buf.split_to(len))
    }
}

/// Fixed-width big-endian integers.
pub trait PrimitiveParser: ByteParser {
    fn parse_i8(&self, buf: &mut Bytes) -> Result<i8, ApplicationError>;
    fn parse_i16(&self, buf: &mut Bytes) -> Result<i16, ApplicationError>;
    fn parse_i32(&self, buf: &mut Bytes) -> Result<i32, ApplicationError>;
    fn parse_i64(&self, buf: &mut Bytes) -> Result<i64, ApplicationError>;
    fn parse_u32(&self, buf: &mut Bytes) -> Result<u32, ApplicationError>;
}

/// Base-128 varints as used by record batches and compact types.
pub trait VarIntParser: ByteParser {
    fn parse_unsigned_varint(&self, buf: &mut Bytes) -> Result<u64, ApplicationError>;

    /// Zigzag-encoded signed varint.
    fn parse_varint(&self, buf: &mut Bytes) -> Result<i64, ApplicationError> {
        let raw = self.parse_unsigned_varint(buf)?;
        Ok((raw >> 1) as i64 ^ -((raw & 1) as i64))
    }
}

pub trait CompactStringParser: VarIntParser {
    fn parse_compact_string(&self, buf: &mut Bytes) -> Result<String, ApplicationError>;
}

pub trait CompactArrayParser: VarIntParser {
    fn parse_compact_array<T, F>(&self, buf: &mut Bytes, parser: F) -> Result<Vec<T>, ApplicationError>
    where
        F: Fn(&mut Bytes) -> Result<T, ApplicationError>;
}
