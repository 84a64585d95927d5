use crate::domain::{ClusterId, Topic, TopicName};
use crate::Result;
use async_trait::async_trait;
use indexmap::IndexMap;
use thiserror::Error;

/// Why a single topic could not be described.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescribeFailure {
    #[error("topic not found")]
    NotFound,
    #[error("describe timed out")]
    Timeout,
    #[error("describe failed: {0}")]
    Error(String),
}

/// Per-name outcome of a describe call, in request order.
pub type DescribeTopicsResult = IndexMap<TopicName, std::result::Result<Topic, DescribeFailure>>;

/// Administrative access to a broker cluster.
///
/// Implementations must tolerate any number of concurrent calls. A call only
/// fails as a whole when the cluster itself cannot be reached or resolved;
/// per-topic problems are reported inside [`DescribeTopicsResult`].
#[async_trait]
pub trait ClusterAdmin: Send + Sync {
    /// Names of all topics known to the cluster, without duplicates, in the
    /// order the cluster reports them.
    async fn list_topic_names(&self, cluster_id: &ClusterId) -> Result<Vec<TopicName>>;

    /// Describes the named topics. `names` must not be empty; duplicates are
    /// collapsed.
    async fn describe_topics(
        &self,
        cluster_id: &ClusterId,
        names: &[TopicName],
    ) -> Result<DescribeTopicsResult>;
}

/// Collapses duplicate names, keeping first-seen order.
pub fn dedup_names(names: &[TopicName]) -> Vec<TopicName> {
    let mut seen = std::collections::HashSet::with_capacity(names.len());
    names
        .iter()
        .filter(|name| seen.insert(*name))
        .cloned()
        .collect()
}
