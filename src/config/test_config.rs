use crate::adapters::outgoing::memory_admin::InMemoryClusterAdmin;
use crate::application::topic_service::TopicResolutionService;
use crate::domain::{ClusterId, Topic};
use std::sync::Arc;

/// Service over an in-memory cluster holding `topics`.
pub fn create_test_service(
    cluster_id: &ClusterId,
    topics: Vec<Topic>,
) -> (TopicResolutionService, Arc<InMemoryClusterAdmin>) {
    let admin = Arc::new(InMemoryClusterAdmin::new());
    admin.add_cluster(cluster_id.clone(), topics);
    (TopicResolutionService::new(admin.clone()), admin)
}
