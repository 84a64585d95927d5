use crate::application::error::ApplicationError;
use crate::application::request::RequestHandle;
use crate::domain::{ClusterId, Topic, TopicName, TopicsMap};
use crate::ports::incoming::topic_manager::TopicManager;
use crate::ports::outgoing::cluster_admin::{ClusterAdmin, DescribeFailure};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Resolves topic listings and lookups against a cluster through a
/// [`ClusterAdmin`] gateway.
///
/// The service keeps no state of its own; each call builds its result from
/// fresh gateway responses, so any number of calls may run concurrently.
#[derive(Clone)]
pub struct TopicResolutionService {
    admin: Arc<dyn ClusterAdmin>,
}

impl TopicResolutionService {
    pub fn new(admin: Arc<dyn ClusterAdmin>) -> Self {
        Self { admin }
    }

    /// Runs [`TopicManager::list_topics`] on the runtime and returns a handle
    /// to its result.
    pub fn spawn_list_topics(&self, cluster_id: ClusterId) -> RequestHandle<TopicsMap> {
        let service = self.clone();
        RequestHandle::spawn(async move { service.list_topics(&cluster_id).await })
    }

    /// Runs [`TopicManager::get_topic`] on the runtime and returns a handle to
    /// its result.
    pub fn spawn_get_topic(
        &self,
        cluster_id: ClusterId,
        topic_name: TopicName,
    ) -> RequestHandle<Option<Topic>> {
        let service = self.clone();
        RequestHandle::spawn(async move { service.get_topic(&cluster_id, &topic_name).await })
    }

    fn resolution_failed(
        cluster_id: &ClusterId,
        topic: &TopicName,
        cause: DescribeFailure,
    ) -> ApplicationError {
        ApplicationError::TopicResolutionFailed {
            cluster_id: cluster_id.clone(),
            topic: topic.clone(),
            cause,
        }
    }

    fn ensure_same_name(requested: &TopicName, topic: &Topic) -> Result<()> {
        if requested != topic.name() {
            return Err(ApplicationError::Protocol(format!(
                "describe for topic {} returned topic {}",
                requested,
                topic.name()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TopicManager for TopicResolutionService {
    #[instrument(skip_all, fields(cluster_id = %cluster_id))]
    async fn list_topics(&self, cluster_id: &ClusterId) -> Result<TopicsMap> {
        let names = self.admin.list_topic_names(cluster_id).await?;
        if names.is_empty() {
            debug!("cluster has no topics");
            return Ok(TopicsMap::new());
        }

        let mut described = self.admin.describe_topics(cluster_id, &names).await?;
        let mut topics = TopicsMap::with_capacity(names.len());

        // Listing order drives the result order; names the describe call
        // dropped are treated as deleted in between.
        for name in &names {
            if topics.contains(name) {
                continue;
            }
            match described.swap_remove(name) {
                Some(Ok(topic)) => {
                    Self::ensure_same_name(name, &topic)?;
                    topics.insert(topic);
                }
                Some(Err(DescribeFailure::NotFound)) | None => {
                    debug!(topic = %name, "topic disappeared between list and describe");
                }
                Some(Err(cause)) => {
                    return Err(Self::resolution_failed(cluster_id, name, cause));
                }
            }
        }

        debug!(topics = topics.len(), "resolved topic listing");
        Ok(topics)
    }

    #[instrument(skip_all, fields(cluster_id = %cluster_id, topic = %topic_name))]
    async fn get_topic(&self, cluster_id: &ClusterId, topic_name: &TopicName) -> Result<Option<Topic>> {
        let mut described = self
            .admin
            .describe_topics(cluster_id, std::slice::from_ref(topic_name))
            .await?;

        match described.swap_remove(topic_name) {
            Some(Ok(topic)) => {
                Self::ensure_same_name(topic_name, &topic)?;
                Ok(Some(topic))
            }
            Some(Err(DescribeFailure::NotFound)) | None => Ok(None),
            Some(Err(cause)) => Err(Self::resolution_failed(cluster_id, topic_name, cause)),
        }
    }
}
