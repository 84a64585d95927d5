use crate::adapters::protocol::dto::*;
use bytes::{BufMut, Bytes, BytesMut};
use std::path::{Path, PathBuf};
use tokio::fs;

pub const METADATA_LOG_DIR: &str = "__cluster_metadata-0";
pub const SEGMENT_EXTENSION: &str = "log";

pub fn metadata_log_dir(log_dir: &Path) -> PathBuf {
    log_dir.join(METADATA_LOG_DIR)
}

/// Path of the segment whose first record has offset `base_offset`.
pub fn segment_path(log_dir: &Path, base_offset: u64) -> PathBuf {
    metadata_log_dir(log_dir).join(format!("{:020}.{}", base_offset, SEGMENT_EXTENSION))
}

/// Base offset encoded in a segment file name, `None` for anything that is
/// not a log segment.
pub fn segment_base_offset(path: &Path) -> Option<u64> {
    if path.extension()? != SEGMENT_EXTENSION {
        return None;
    }
    path.file_stem()?.to_str()?.parse().ok()
}

pub trait PutVarint {
    fn put_unsigned_varint(&mut self, num: u64);

    /// Zigzag-encodes `num`.
    fn put_varint(&mut self, num: i64) {
        self.put_unsigned_varint(((num << 1) ^ (num >> 63)) as u64);
    }
}

impl<B: BufMut> PutVarint for B {
    fn put_unsigned_varint(&mut self, mut num: u64) {
        while num & !0x7f != 0 {
            self.put_u8(((num & 0x7f) | 0x80) as u8);
            num >>= 7;
        }
        self.put_u8(num as u8);
    }
}

/// Builds a KRaft metadata log segment, one record batch at a time.
///
/// Used to seed clusters for local runs and tests. The CRC field is written
/// as zero; readers in this crate do not verify it.
#[derive(Debug, Default)]
pub struct MetadataLogWriter {
    buf: BytesMut,
    base_offset: u64,
    next_offset: i64,
}

impl MetadataLogWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer for a segment rolled at `base_offset`.
    pub fn starting_at(base_offset: u64) -> Self {
        Self {
            buf: BytesMut::new(),
            base_offset,
            next_offset: base_offset as i64,
        }
    }

    /// Appends `records` as a single uncompressed batch.
    pub fn append_batch(&mut self, records: &[MetadataRecord]) -> &mut Self {
        let mut body = BytesMut::new();
        for (offset_delta, record) in records.iter().enumerate() {
            let value = encode_value(record);

            let mut rec = BytesMut::new();
            rec.put_i8(0); // attributes
            rec.put_varint(0); // timestamp delta
            rec.put_varint(offset_delta as i64);
            rec.put_varint(-1); // null key
            rec.put_varint(value.len() as i64);
            rec.put_slice(&value);
            rec.put_varint(0); // headers

            body.put_varint(rec.len() as i64);
            body.put_slice(&rec);
        }

        let batch_length = BATCH_HEADER_LEN + body.len();
        self.buf.put_i64(self.next_offset);
        self.buf.put_i32(batch_length as i32);
        self.buf.put_i32(0); // partition leader epoch
        self.buf.put_i8(RECORD_BATCH_MAGIC);
        self.buf.put_u32(0); // crc
        self.buf.put_i16(0); // attributes
        self.buf.put_i32(records.len().saturating_sub(1) as i32);
        self.buf.put_i64(0); // base timestamp
        self.buf.put_i64(0); // max timestamp
        self.buf.put_i64(-1); // producer id
        self.buf.put_i16(-1); // producer epoch
        self.buf.put_i32(-1); // base sequence
        self.buf.put_i32(records.len() as i32);
        self.buf.put_slice(&body);

        self.next_offset += records.len() as i64;
        self
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    /// Writes the segment to `<log_dir>/__cluster_metadata-0/`, replacing any
    /// segment with the same base offset.
    pub async fn write_to(self, log_dir: &Path) -> std::io::Result<PathBuf> {
        let path = segment_path(log_dir, self.base_offset);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, self.buf.freeze()).await?;
        Ok(path)
    }
}

fn put_compact_string(buf: &mut BytesMut, s: &str) {
    buf.put_unsigned_varint(s.len() as u64 + 1);
    buf.put_slice(s.as_bytes());
}

fn put_broker_ids(buf: &mut BytesMut, ids: &[u32]) {
    buf.put_unsigned_varint(ids.len() as u64 + 1);
    for id in ids {
        buf.put_u32(*id);
    }
}

fn encode_value(record: &MetadataRecord) -> BytesMut {
    let mut value = BytesMut::new();
    value.put_unsigned_varint(METADATA_FRAME_VERSION);
    value.put_unsigned_varint(record.record_type());
    value.put_unsigned_varint(0); // record version

    match record {
        MetadataRecord::Topic { name, topic_id } => {
            put_compact_string(&mut value, name.as_str());
            value.put_slice(topic_id.as_bytes());
        }
        MetadataRecord::Partition {
            partition_id,
            topic_id,
            replicas,
            in_sync_replicas,
            leader,
        } => {
            value.put_u32(*partition_id);
            value.put_slice(topic_id.as_bytes());
            put_broker_ids(&mut value, replicas);
            put_broker_ids(&mut value, in_sync_replicas);
            put_broker_ids(&mut value, &[]); // removing replicas
            put_broker_ids(&mut value, &[]); // adding replicas
            value.put_i32(leader.map_or(NO_LEADER, |id| id as i32));
            value.put_i32(0); // leader epoch
            value.put_i32(0); // partition epoch
        }
        MetadataRecord::RemoveTopic { topic_id } => {
            value.put_slice(topic_id.as_bytes());
        }
        MetadataRecord::FeatureLevel { name, level } => {
            put_compact_string(&mut value, name);
            value.put_i16(*level);
        }
    }

    value.put_unsigned_varint(0); // tagged fields
    value
}
