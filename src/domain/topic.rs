use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Topics the broker creates and owns for its own bookkeeping. User topics
/// may share the `__` prefix without being internal.
const INTERNAL_TOPICS: [&str; 2] = ["__consumer_offsets", "__transaction_state"];

/// Broker-assigned topic UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(Uuid);

impl TopicId {
    pub fn new(id: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(id))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    pub fn zero() -> Self {
        Self(Uuid::nil())
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for TopicId {
    type Err = DomainError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| DomainError::InvalidTopicId(s.to_string()))
    }
}

impl From<[u8; 16]> for TopicId {
    fn from(id: [u8; 16]) -> Self {
        Self::new(id)
    }
}

/// Non-empty topic name, unique within a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TopicName(String);

impl TopicName {
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        if name.is_empty() {
            return Err(DomainError::EmptyTopicName);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_internal(&self) -> bool {
        INTERNAL_TOPICS.contains(&self.0.as_str())
    }
}

impl fmt::Display for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TopicName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TopicName {
    type Error = DomainError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl TryFrom<&str> for TopicName {
    type Error = DomainError;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl From<TopicName> for String {
    fn from(name: TopicName) -> Self {
        name.0
    }
}

impl AsRef<str> for TopicName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partition {
    pub partition_id: u32,
    pub leader: Option<u32>,
    pub replicas: Vec<u32>,
    pub in_sync_replicas: Vec<u32>,
}

impl Partition {
    pub fn new(
        partition_id: u32,
        leader: Option<u32>,
        replicas: Vec<u32>,
        in_sync_replicas: Vec<u32>,
    ) -> Self {
        Self {
            partition_id,
            leader,
            replicas,
            in_sync_replicas,
        }
    }
}

/// Externally visible metadata of a single topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topic {
    name: TopicName,
    #[serde(skip_serializing_if = "Option::is_none")]
    topic_id: Option<TopicId>,
    partition_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    replication_factor: Option<u16>,
    is_internal: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    partitions: Vec<Partition>,
}

impl Topic {
    /// Builds a topic from its full partition assignment. The replication
    /// factor is the widest replica set; it stays absent when no partition
    /// reports replicas.
    pub fn new(name: TopicName, mut partitions: Vec<Partition>) -> Self {
        partitions.sort_by_key(|p| p.partition_id);
        let replication_factor = partitions
            .iter()
            .map(|p| p.replicas.len())
            .max()
            .and_then(|rf| u16::try_from(rf).ok())
            .filter(|rf| *rf > 0);
        let is_internal = name.is_internal();

        Self {
            name,
            topic_id: None,
            partition_count: partitions.len() as u32,
            replication_factor,
            is_internal,
            partitions,
        }
    }

    /// Builds a topic from counts alone, without per-partition detail.
    pub fn summary(name: TopicName, partition_count: u32, replication_factor: Option<u16>) -> Self {
        let is_internal = name.is_internal();
        Self {
            name,
            topic_id: None,
            partition_count,
            replication_factor: replication_factor.filter(|rf| *rf > 0),
            is_internal,
            partitions: Vec::new(),
        }
    }

    pub fn with_topic_id(mut self, topic_id: TopicId) -> Self {
        self.topic_id = Some(topic_id);
        self
    }

    pub fn name(&self) -> &TopicName {
        &self.name
    }

    pub fn topic_id(&self) -> Option<TopicId> {
        self.topic_id
    }

    pub fn partition_count(&self) -> u32 {
        self.partition_count
    }

    pub fn replication_factor(&self) -> Option<u16> {
        self.replication_factor
    }

    pub fn is_internal(&self) -> bool {
        self.is_internal
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }
}
