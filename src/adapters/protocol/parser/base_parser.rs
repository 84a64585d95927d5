use bytes::{Buf, Bytes};
use crate::application::error::ApplicationError;
use super::traits::*;

const MAX_VARINT_BYTES: usize = 10;

#[derive(Debug, Default, Clone)]
pub struct BaseParser;

impl ByteParser for BaseParser {}

impl PrimitiveParser for BaseParser {
    fn parse_i8(&self, buf: &mut Bytes) -> Result<i8, ApplicationError> {
        self.ensure_remaining(buf, 1)?;
        Ok(buf.get_i8())
    }

    fn parse_i16(&self, buf: &mut Bytes) -> Result<i16, ApplicationError> {
        self.ensure_remaining(buf, 2)?;
        Ok(buf.get_i16())
    }

    fn parse_i32(&self, buf: &mut Bytes) -> Result<i32, ApplicationError> {
        self.ensure_remaining(buf, 4)?;
        Ok(buf.get_i32())
    }

    fn parse_i64(&self, buf: &mut Bytes) -> Result<i64, ApplicationError> {
        self.ensure_remaining(buf, 8)?;
        Ok(buf.get_i64())
    }

    fn parse_u32(&self, buf: &mut Bytes) -> Result<u32, ApplicationError> {
        self.ensure_remaining(buf, 4)?;
        Ok(buf.get_u32())
    }
}

impl VarIntParser for BaseParser {
    fn parse_unsigned_varint(&self, buf: &mut Bytes) -> Result<u64, ApplicationError> {
        let mut value: u64 = 0;
        for n_bytes in 0..MAX_VARINT_BYTES {
            self.ensure_remaining(buf, 1)?;
            let byte = buf.get_u8();
            value |= u64::from(byte & 0x7f) << (7 * n_bytes);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(ApplicationError::Protocol(format!(
            "varint longer than {} bytes",
            MAX_VARINT_BYTES
        )))
    }
}

impl CompactStringParser for BaseParser {
    fn parse_compact_string(&self, buf: &mut Bytes) -> Result<String, ApplicationError> {
        let len = self.parse_unsigned_varint(buf)?;
        let string_len = len.saturating_sub(1) as usize;

        let bytes = self.take_bytes(buf, string_len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| ApplicationError::Protocol(format!("invalid UTF-8 sequence: {}", e)))
    }
}

impl CompactArrayParser for BaseParser {
    fn parse_compact_array<T, F>(&self, buf: &mut Bytes, parser: F) -> Result<Vec<T>, ApplicationError>
    where
        F: Fn(&mut Bytes) -> Result<T, ApplicationError>,
    {
        let len = self.parse_unsigned_varint(buf)?;
        let items_len = len.saturating_sub(1) as usize;
        // Every element takes at least one byte.
        self.ensure_remaining(buf, items_len)?;

        let mut items = Vec::with_capacity(items_len);
        for _ in 0..items_len {
            items.push(parser(buf)?);
        }
        Ok(items)
    }
}
