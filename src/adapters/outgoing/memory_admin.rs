use crate::application::error::ApplicationError;
use crate::domain::{ClusterId, Topic, TopicName};
use crate::ports::outgoing::cluster_admin::{
    dedup_names, ClusterAdmin, DescribeFailure, DescribeTopicsResult,
};
use crate::Result;
use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, instrument};

/// Fault reported for a single topic on describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicFault {
    Timeout,
    Error(String),
}

#[derive(Debug, Default)]
struct InMemoryCluster {
    topics: IndexMap<TopicName, Topic>,
    faults: HashMap<TopicName, TopicFault>,
    unreachable: bool,
}

/// Cluster admin backed by in-process topic tables.
///
/// Clusters can be changed while requests are in flight, which makes this
/// adapter suitable for exercising list/describe races.
#[derive(Debug, Default)]
pub struct InMemoryClusterAdmin {
    clusters: RwLock<HashMap<ClusterId, InMemoryCluster>>,
    latency: Option<Duration>,
}

impl InMemoryClusterAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every call by `latency` before it touches cluster state.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            clusters: RwLock::default(),
            latency: Some(latency),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ClusterId, InMemoryCluster>> {
        self.clusters.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ClusterId, InMemoryCluster>> {
        self.clusters.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_cluster(&self, cluster_id: ClusterId, topics: Vec<Topic>) {
        let topics = topics
            .into_iter()
            .map(|topic| (topic.name().clone(), topic))
            .collect();
        self.write().insert(
            cluster_id,
            InMemoryCluster {
                topics,
                ..Default::default()
            },
        );
    }

    pub fn upsert_topic(&self, cluster_id: &ClusterId, topic: Topic) {
        if let Some(cluster) = self.write().get_mut(cluster_id) {
            cluster.topics.insert(topic.name().clone(), topic);
        }
    }

    pub fn delete_topic(&self, cluster_id: &ClusterId, name: &TopicName) {
        if let Some(cluster) = self.write().get_mut(cluster_id) {
            cluster.topics.shift_remove(name);
        }
    }

    pub fn set_unreachable(&self, cluster_id: &ClusterId, unreachable: bool) {
        if let Some(cluster) = self.write().get_mut(cluster_id) {
            cluster.unreachable = unreachable;
        }
    }

    pub fn inject_topic_fault(&self, cluster_id: &ClusterId, name: &TopicName, fault: TopicFault) {
        if let Some(cluster) = self.write().get_mut(cluster_id) {
            cluster.faults.insert(name.clone(), fault);
        }
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn check_reachable(cluster_id: &ClusterId, cluster: Option<&InMemoryCluster>) -> Result<()> {
        match cluster {
            None => Err(ApplicationError::ClusterUnknown(cluster_id.clone())),
            Some(cluster) if cluster.unreachable => Err(ApplicationError::unreachable(
                cluster_id,
                "no broker responded",
            )),
            Some(_) => Ok(()),
        }
    }
}

#[async_trait]
impl ClusterAdmin for InMemoryClusterAdmin {
    #[instrument(skip(self))]
    async fn list_topic_names(&self, cluster_id: &ClusterId) -> Result<Vec<TopicName>> {
        self.simulate_latency().await;

        let clusters = self.read();
        let cluster = clusters.get(cluster_id);
        Self::check_reachable(cluster_id, cluster)?;

        let names: Vec<TopicName> = cluster
            .map(|c| c.topics.keys().cloned().collect())
            .unwrap_or_default();
        debug!(count = names.len(), "listed topic names");
        Ok(names)
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
        self.simulate_latency().await;

        let clusters = self.read();
        let cluster = clusters.get(cluster_id);
        Self::check_reachable(cluster_id, cluster)?;
        let Some(cluster) = cluster else {
            return Err(ApplicationError::ClusterUnknown(cluster_id.clone()));
        };

        let described = dedup_names(names)
            .into_iter()
            .map(|name| {
                let outcome = match (cluster.faults.get(&name), cluster.topics.get(&name)) {
                    (Some(TopicFault::Timeout), _) => Err(DescribeFailure::Timeout),
                    (Some(TopicFault::Error(msg)), _) => Err(DescribeFailure::Error(msg.clone())),
                    (None, Some(topic)) => Ok(topic.clone()),
                    (None, None) => Err(DescribeFailure::NotFound),
                };
                (name, outcome)
            })
            .collect();
        Ok(described)
    }
}
