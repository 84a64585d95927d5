use crate::adapters::protocol::dto::MetadataRecord;
use crate::adapters::protocol::kraft_record_parser::KraftRecordParser;
use crate::adapters::protocol::kraft_record_writer::{metadata_log_dir, segment_base_offset};
use crate::application::error::ApplicationError;
use crate::domain::{ClusterId, Partition, Topic, TopicId, TopicName};
use crate::ports::outgoing::cluster_admin::{
    dedup_names, ClusterAdmin, DescribeFailure, DescribeTopicsResult,
};
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, instrument};

#[derive(Debug)]
struct TopicImage {
    name: TopicName,
    partitions: BTreeMap<u32, Partition>,
}

/// Topic state obtained by replaying a metadata log, in creation order.
#[derive(Debug, Default)]
struct MetadataImage {
    topics: IndexMap<TopicId, TopicImage>,
    by_name: HashMap<TopicName, TopicId>,
}

impl MetadataImage {
    fn replay(records: Vec<MetadataRecord>) -> Self {
        let mut image = Self::default();
        for record in records {
            image.apply(record);
        }
        image
    }

    fn apply(&mut self, record: MetadataRecord) {
        match record {
            MetadataRecord::Topic { name, topic_id } => {
                // A name re-registered under a new id replaces the old topic.
                if let Some(previous) = self.by_name.insert(name.clone(), topic_id) {
                    if previous != topic_id {
                        self.topics.shift_remove(&previous);
                    }
                }
                let replaced = self.topics.insert(
                    topic_id,
                    TopicImage {
                        name: name.clone(),
                        partitions: BTreeMap::new(),
                    },
                );
                if let Some(replaced) = replaced {
                    if replaced.name != name {
                        self.by_name.remove(&replaced.name);
                    }
                }
            }
            MetadataRecord::Partition {
                partition_id,
                topic_id,
                replicas,
                in_sync_replicas,
                leader,
            } => {
                if let Some(topic) = self.topics.get_mut(&topic_id) {
                    topic.partitions.insert(
                        partition_id,
                        Partition::new(partition_id, leader, replicas, in_sync_replicas),
                    );
                }
            }
            MetadataRecord::RemoveTopic { topic_id } => {
                if let Some(removed) = self.topics.shift_remove(&topic_id) {
                    self.by_name.remove(&removed.name);
                }
            }
            MetadataRecord::FeatureLevel { .. } => {}
        }
    }

    fn names(&self) -> Vec<TopicName> {
        self.topics.values().map(|topic| topic.name.clone()).collect()
    }

    fn describe(&self, name: &TopicName) -> std::result::Result<Topic, DescribeFailure> {
        let Some((topic_id, image)) = self
            .by_name
            .get(name)
            .and_then(|id| self.topics.get(id).map(|image| (id, image)))
        else {
            return Err(DescribeFailure::NotFound);
        };
        if image.partitions.is_empty() {
            return Err(DescribeFailure::Error(format!(
                "no partition metadata for topic {}",
                name
            )));
        }

        let partitions = image.partitions.values().cloned().collect();
        Ok(Topic::new(name.clone(), partitions).with_topic_id(*topic_id))
    }
}

/// Cluster admin that answers from each cluster's KRaft metadata log.
///
/// Every call reads and replays the log, so results always reflect the log
/// at call time.
#[derive(Debug, Clone)]
pub struct KraftClusterAdmin {
    clusters: HashMap<ClusterId, PathBuf>,
    protocol_timeout: Duration,
    parser: KraftRecordParser,
}

impl KraftClusterAdmin {
    pub fn new(clusters: HashMap<ClusterId, PathBuf>, protocol_timeout: Duration) -> Self {
        Self {
            clusters,
            protocol_timeout,
            parser: KraftRecordParser::new(),
        }
    }

    async fn load_image(&self, cluster_id: &ClusterId) -> Result<MetadataImage> {
        let log_dir = self
            .clusters
            .get(cluster_id)
            .ok_or_else(|| ApplicationError::ClusterUnknown(cluster_id.clone()))?;

        let records = tokio::time::timeout(self.protocol_timeout, self.read_log(cluster_id, log_dir))
            .await
            .map_err(|_| {
                ApplicationError::unreachable(
                    cluster_id,
                    format!("no response within {:?}", self.protocol_timeout),
                )
            })??;
        Ok(MetadataImage::replay(records))
    }

    /// Reads every segment of the metadata log in offset order.
    async fn read_log(&self, cluster_id: &ClusterId, log_dir: &Path) -> Result<Vec<MetadataRecord>> {
        let dir = metadata_log_dir(log_dir);
        let unreadable = |path: &Path, e: std::io::Error| {
            ApplicationError::unreachable(cluster_id, format!("cannot read {}: {}", path.display(), e))
        };

        let segments = list_segments(&dir).await.map_err(|e| unreadable(&dir, e))?;
        match segments.first() {
            None => {
                return Err(ApplicationError::unreachable(
                    cluster_id,
                    format!("no metadata log segments in {}", dir.display()),
                ))
            }
            // Earlier records only survive in a snapshot, which is not replayed.
            Some((base_offset, path)) if *base_offset != 0 => {
                return Err(ApplicationError::Protocol(format!(
                    "metadata log starts at offset {} ({}); snapshot replay is not supported",
                    base_offset,
                    path.display()
                )))
            }
            Some(_) => {}
        }

        let mut records = Vec::new();
        for (_, path) in &segments {
            let content = fs::read(path).await.map_err(|e| unreadable(path, e))?;
            records.extend(self.parser.parse_log(Bytes::from(content))?);
        }
        debug!(
            segments = segments.len(),
            records = records.len(),
            dir = %dir.display(),
            "replayed metadata log"
        );
        Ok(records)
    }
}

/// Log segments in `dir`, ordered by base offset.
async fn list_segments(dir: &Path) -> std::io::Result<Vec<(u64, PathBuf)>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut segments = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if let Some(base_offset) = segment_base_offset(&path) {
            segments.push((base_offset, path));
        }
    }
    segments.sort_unstable_by_key(|(base_offset, _)| *base_offset);
    Ok(segments)
}

#[async_trait]
impl ClusterAdmin for KraftClusterAdmin {
    #[instrument(skip(self))]
    async fn list_topic_names(&self, cluster_id: &ClusterId) -> Result<Vec<TopicName>> {
        let image = self.load_image(cluster_id).await?;
        Ok(image.names())
    }

    #[instrument(skip(self, names), fields(requested = names.len()))]
    async fn describe_topics(
        &self,
        cluster_id: &ClusterId,
        names: &[TopicName],
    ) -> Result<DescribeTopicsResult> {
        if names.is_empty() {
            return Err(ApplicationError::InvalidRequest(
                "describe requires at least one topic name".to_string(),
            ));
        }
        let image = self.load_image(cluster_id).await?;

        Ok(dedup_names(names)
            .into_iter()
            .map(|name| {
                let outcome = image.describe(&name);
                (name, outcome)
            })
            .collect())
    }
}
