use crate::domain::{ClusterId, Topic, TopicName, TopicsMap};
use crate::Result;
use async_trait::async_trait;

/// Topic lookups served to the HTTP layer.
#[async_trait]
pub trait TopicManager: Send + Sync {
    /// Returns every topic currently visible in the cluster.
    async fn list_topics(&self, cluster_id: &ClusterId) -> Result<TopicsMap>;

    /// Returns the named topic, or `None` when the cluster does not have it.
    async fn get_topic(&self, cluster_id: &ClusterId, topic_name: &TopicName) -> Result<Option<Topic>>;
}
