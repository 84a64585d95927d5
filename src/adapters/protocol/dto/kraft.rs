use crate::domain::{TopicId, TopicName};

pub const METADATA_FRAME_VERSION: u64 = 1;

pub const TOPIC_RECORD: u64 = 2;
pub const PARTITION_RECORD: u64 = 3;
pub const REMOVE_TOPIC_RECORD: u64 = 9;
pub const FEATURE_LEVEL_RECORD: u64 = 12;

pub const RECORD_BATCH_MAGIC: i8 = 2;
pub const CONTROL_BATCH_FLAG: i16 = 0x20;
pub const COMPRESSION_CODEC_MASK: i16 = 0x07;
pub const NO_LEADER: i32 = -1;

/// Batch header bytes that follow the `batch_length` field.
pub const BATCH_HEADER_LEN: usize = 49;

/// Cluster metadata records this crate understands. Other record types are
/// skipped when reading a log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataRecord {
    Topic {
        name: TopicName,
        topic_id: TopicId,
    },
    Partition {
        partition_id: u32,
        topic_id: TopicId,
        replicas: Vec<u32>,
        in_sync_replicas: Vec<u32>,
        leader: Option<u32>,
    },
    RemoveTopic {
        topic_id: TopicId,
    },
    FeatureLevel {
        name: String,
        level: i16,
    },
}

impl MetadataRecord {
    pub fn record_type(&self) -> u64 {
        match self {
            MetadataRecord::Topic { .. } => TOPIC_RECORD,
            MetadataRecord::Partition { .. } => PARTITION_RECORD,
            MetadataRecord::RemoveTopic { .. } => REMOVE_TOPIC_RECORD,
            MetadataRecord::FeatureLevel { .. } => FEATURE_LEVEL_RECORD,
        }
    }
}
