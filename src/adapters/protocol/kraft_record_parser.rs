use crate::adapters::protocol::dto::*;
use crate::adapters::protocol::parser::{
    BaseParser, ByteParser, CompactArrayParser, CompactStringParser, PrimitiveParser, VarIntParser,
};
use crate::application::error::ApplicationError;
use crate::domain::{TopicId, TopicName};
use bytes::{Buf, Bytes};
use tracing::{trace, warn};

/// Reads the record batches of a KRaft `__cluster_metadata` log.
#[derive(Debug, Default, Clone)]
pub struct KraftRecordParser {
    base: BaseParser,
}

impl KraftRecordParser {
    pub fn new() -> Self {
        Self {
            base: BaseParser,
        }
    }

    /// Decodes every understood record in the log, in log order.
    ///
    /// A batch cut short at the end of the data is a write still in progress
    /// and ends the read.
    pub fn parse_log(&self, mut data: Bytes) -> Result<Vec<MetadataRecord>, ApplicationError> {
        let mut records = Vec::new();

        while data.has_remaining() {
            if data.remaining() < 12 {
                warn!(remaining = data.remaining(), "ignoring truncated batch header at end of log");
                break;
            }
            let base_offset = self.base.parse_i64(&mut data)?;
            let batch_length = self.base.parse_i32(&mut data)?;
            let batch_length = usize::try_from(batch_length).map_err(|_| {
                ApplicationError::Protocol(format!(
                    "negative batch length {} at offset {}",
                    batch_length, base_offset
                ))
            })?;
            if data.remaining() < batch_length {
                warn!(base_offset, batch_length, "ignoring truncated batch at end of log");
                break;
            }

            let mut batch = data.split_to(batch_length);
            self.parse_record_batch(base_offset, &mut batch, &mut records)?;
        }

        Ok(records)
    }

    fn parse_record_batch(
        &self,
        base_offset: i64,
        src: &mut Bytes,
        out: &mut Vec<MetadataRecord>,
    ) -> Result<(), ApplicationError> {
        self.base.ensure_remaining(src, BATCH_HEADER_LEN)?;
        let _partition_leader_epoch = self.base.parse_i32(src)?;
        let magic = self.base.parse_i8(src)?;
        if magic != RECORD_BATCH_MAGIC {
            return Err(ApplicationError::Protocol(format!(
                "unsupported record batch magic {} at offset {}",
                magic, base_offset
            )));
        }
        let _crc = self.base.parse_u32(src)?;
        let attributes = self.base.parse_i16(src)?;
        let _last_offset_delta = self.base.parse_i32(src)?;
        let _base_timestamp = self.base.parse_i64(src)?;
        let _max_timestamp = self.base.parse_i64(src)?;
        let _producer_id = self.base.parse_i64(src)?;
        let _producer_epoch = self.base.parse_i16(src)?;
        let _base_sequence = self.base.parse_i32(src)?;
        let records_count = self.base.parse_i32(src)?;

        if attributes & CONTROL_BATCH_FLAG != 0 {
            trace!(base_offset, "skipping control batch");
            return Ok(());
        }
        if attributes & COMPRESSION_CODEC_MASK != 0 {
            return Err(ApplicationError::Protocol(format!(
                "compressed metadata batch at offset {} is not supported",
                base_offset
            )));
        }

        for _ in 0..records_count.max(0) {
            if let Some(record) = self.parse_record(src)? {
                out.push(record);
            }
        }
        Ok(())
    }

    fn parse_record(&self, src: &mut Bytes) -> Result<Option<MetadataRecord>, ApplicationError> {
        let length = self.base.parse_varint(src)?;
        let length = usize::try_from(length)
            .map_err(|_| ApplicationError::Protocol(format!("negative record length {}", length)))?;
        let mut record = self.base.take_bytes(src, length)?;

        let _attributes = self.base.parse_i8(&mut record)?;
        let _timestamp_delta = self.base.parse_varint(&mut record)?;
        let _offset_delta = self.base.parse_varint(&mut record)?;
        let key_length = self.base.parse_varint(&mut record)?;
        if key_length > 0 {
            self.base.take_bytes(&mut record, key_length as usize)?;
        }
        let value_length = self.base.parse_varint(&mut record)?;
        if value_length < 0 {
            return Ok(None);
        }
        let mut value = self.base.take_bytes(&mut record, value_length as usize)?;
        // Headers are never set on metadata records.

        self.parse_record_value(&mut value)
    }

    fn parse_record_value(&self, src: &mut Bytes) -> Result<Option<MetadataRecord>, ApplicationError> {
        let frame_version = self.base.parse_unsigned_varint(src)?;
        if frame_version != METADATA_FRAME_VERSION {
            return Err(ApplicationError::Protocol(format!(
                "invalid frame version: {}",
                frame_version
            )));
        }
        let record_type = self.base.parse_unsigned_varint(src)?;
        let _version = self.base.parse_unsigned_varint(src)?;

        let record = match record_type {
            TOPIC_RECORD => self.parse_topic_record(src)?,
            PARTITION_RECORD => self.parse_partition_record(src)?,
            REMOVE_TOPIC_RECORD => MetadataRecord::RemoveTopic {
                topic_id: self.parse_uuid(src)?,
            },
            FEATURE_LEVEL_RECORD => self.parse_feature_level_record(src)?,
            other => {
                trace!(record_type = other, "skipping metadata record");
                return Ok(None);
            }
        };
        Ok(Some(record))
    }

    fn parse_topic_record(&self, src: &mut Bytes) -> Result<MetadataRecord, ApplicationError> {
        let name = self.base.parse_compact_string(src)?;
        let name = TopicName::new(name)
            .map_err(|e| ApplicationError::Protocol(format!("invalid topic record: {}", e)))?;
        let topic_id = self.parse_uuid(src)?;

        Ok(MetadataRecord::Topic { name, topic_id })
    }

    fn parse_partition_record(&self, src: &mut Bytes) -> Result<MetadataRecord, ApplicationError> {
        let partition_id = self.base.parse_u32(src)?;
        let topic_id = self.parse_uuid(src)?;

        let replicas = self.parse_broker_ids(src)?;
        let in_sync_replicas = self.parse_broker_ids(src)?;
        let _removing_replicas = self.parse_broker_ids(src)?;
        let _adding_replicas = self.parse_broker_ids(src)?;

        let leader = self.base.parse_i32(src)?;
        let _leader_epoch = self.base.parse_i32(src)?;
        let _partition_epoch = self.base.parse_i32(src)?;

        Ok(MetadataRecord::Partition {
            partition_id,
            topic_id,
            replicas,
            in_sync_replicas,
            leader: u32::try_from(leader).ok(),
        })
    }

    fn parse_feature_level_record(&self, src: &mut Bytes) -> Result<MetadataRecord, ApplicationError> {
        let name = self.base.parse_compact_string(src)?;
        let level = self.base.parse_i16(src)?;

        Ok(MetadataRecord::FeatureLevel { name, level })
    }

    fn parse_broker_ids(&self, src: &mut Bytes) -> Result<Vec<u32>, ApplicationError> {
        self.base.parse_compact_array(src, |src| self.base.parse_u32(src))
    }

    fn parse_uuid(&self, src: &mut Bytes) -> Result<TopicId, ApplicationError> {
        let bytes = self.base.take_bytes(src, 16)?;
        let mut id = [0u8; 16];
        id.copy_from_slice(&bytes);
        Ok(TopicId::new(id))
    }
}
