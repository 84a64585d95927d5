use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use topic_resolver::{
    adapters::outgoing::memory_admin::InMemoryClusterAdmin,
    adapters::protocol::dto::MetadataRecord,
    adapters::protocol::kraft_record_writer::MetadataLogWriter,
    config::{create_test_service, AppConfig},
    domain::{Partition, TopicId},
    ApplicationError, ClusterAdmin, ClusterId, DescribeFailure, DescribeTopicsResult,
    RequestState, Result, Topic, TopicManager, TopicName, TopicResolutionService,
};

fn name(s: &str) -> TopicName {
    TopicName::new(s).unwrap()
}

fn topic_records(topic: &str, id: u8, partitions: u32) -> Vec<MetadataRecord> {
    let topic_id = TopicId::new([id; 16]);
    let mut records = vec![MetadataRecord::Topic {
        name: name(topic),
        topic_id,
    }];
    records.extend((0..partitions).map(|partition_id| MetadataRecord::Partition {
        partition_id,
        topic_id,
        replicas: vec![1, 2, 3],
        in_sync_replicas: vec![1, 2, 3],
        leader: Some(1 + partition_id % 3),
    }));
    records
}

async fn write_cluster_log(dir: &TempDir) {
    let mut writer = MetadataLogWriter::new();
    writer.append_batch(&[MetadataRecord::FeatureLevel {
        name: "metadata.version".to_string(),
        level: 20,
    }]);
    writer.append_batch(&topic_records("orders", 1, 12));
    writer.append_batch(&topic_records("payments", 2, 6));
    writer.append_batch(&topic_records("archived", 3, 1));
    writer.append_batch(&[MetadataRecord::RemoveTopic {
        topic_id: TopicId::new([3; 16]),
    }]);
    writer.append_batch(&topic_records("__consumer_offsets", 4, 50));
    writer
        .write_to(dir.path())
        .await
        .expect("Failed to write metadata log");
}

fn service_for(dir: &TempDir) -> TopicResolutionService {
    let config_toml = format!(
        "protocol_timeout_ms = 2000\n\n[clusters.prod-1]\nlog_dir = {:?}\n",
        dir.path().display().to_string()
    );
    let config_path = dir.path().join("topic-resolver.toml");
    std::fs::write(&config_path, config_toml).expect("Failed to write config");

    AppConfig::load(&config_path)
        .expect("Failed to load config")
        .build_service()
}

#[tokio::test]
async fn test_list_topics_from_kraft_log() -> Result<()> {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_cluster_log(&temp_dir).await;
    let service = service_for(&temp_dir);

    let topics = service.list_topics(&ClusterId::from("prod-1")).await?;

    let names: Vec<&str> = topics.names().map(|n| n.as_str()).collect();
    assert_eq!(names, vec!["orders", "payments", "__consumer_offsets"]);

    let orders = topics.get(&name("orders")).unwrap();
    assert_eq!(orders.partition_count(), 12);
    assert_eq!(orders.replication_factor(), Some(3));
    assert_eq!(orders.topic_id(), Some(TopicId::new([1; 16])));
    assert!(!orders.is_internal());
    assert_eq!(topics.get(&name("payments")).unwrap().partition_count(), 6);
    assert!(topics.get(&name("__consumer_offsets")).unwrap().is_internal());

    for (key, topic) in topics.iter() {
        assert_eq!(key, topic.name());
    }
    Ok(())
}

#[tokio::test]
async fn test_get_topic_from_kraft_log() -> Result<()> {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_cluster_log(&temp_dir).await;
    let service = service_for(&temp_dir);
    let cluster_id = ClusterId::from("prod-1");

    let payments = service.get_topic(&cluster_id, &name("payments")).await?;
    assert_eq!(payments.map(|t| t.partition_count()), Some(6));

    let archived = service.get_topic(&cluster_id, &name("archived")).await?;
    assert!(archived.is_none());
    Ok(())
}

#[tokio::test]
async fn test_kraft_topic_without_partitions_fails_listing() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut writer = MetadataLogWriter::new();
    writer.append_batch(&topic_records("orders", 1, 3));
    writer.append_batch(&topic_records("pending", 2, 0));
    writer
        .write_to(temp_dir.path())
        .await
        .expect("Failed to write metadata log");
    let service = service_for(&temp_dir);

    let err = service
        .list_topics(&ClusterId::from("prod-1"))
        .await
        .unwrap_err();

    match err {
        ApplicationError::TopicResolutionFailed { topic, cause, .. } => {
            assert_eq!(topic.as_str(), "pending");
            assert!(matches!(cause, DescribeFailure::Error(_)));
        }
        other => panic!("Expected TopicResolutionFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_and_unreachable_clusters() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    // No metadata log written: the configured cluster cannot be read.
    let service = service_for(&temp_dir);

    let err = service
        .list_topics(&ClusterId::from("prod-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApplicationError::ClusterUnreachable { .. }));

    let err = service
        .get_topic(&ClusterId::from("prod-2"), &name("orders"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApplicationError::ClusterUnknown(_)));
}

/// Deletes a topic right after the listing call, before describe runs.
struct RacingClusterAdmin {
    inner: Arc<InMemoryClusterAdmin>,
    deleted: TopicName,
}

#[async_trait]
impl ClusterAdmin for RacingClusterAdmin {
    async fn list_topic_names(&self, cluster_id: &ClusterId) -> Result<Vec<TopicName>> {
        let names = self.inner.list_topic_names(cluster_id).await?;
        self.inner.delete_topic(cluster_id, &self.deleted);
        Ok(names)
    }

    async fn describe_topics(
        &self,
        cluster_id: &ClusterId,
        names: &[TopicName],
    ) -> Result<DescribeTopicsResult> {
        self.inner.describe_topics(cluster_id, names).await
    }
}

#[tokio::test]
async fn test_topic_deleted_between_list_and_describe_is_omitted() -> Result<()> {
    let cluster_id = ClusterId::from("prod-1");
    let inner = Arc::new(InMemoryClusterAdmin::new());
    inner.add_cluster(
        cluster_id.clone(),
        vec![
            Topic::summary(name("orders"), 12, Some(3)),
            Topic::summary(name("payments"), 6, Some(3)),
            Topic::summary(name("audit"), 1, Some(3)),
        ],
    );
    let service = TopicResolutionService::new(Arc::new(RacingClusterAdmin {
        inner,
        deleted: name("payments"),
    }));

    let topics = service.list_topics(&cluster_id).await?;

    let names: Vec<&str> = topics.names().map(|n| n.as_str()).collect();
    assert_eq!(names, vec!["orders", "audit"]);
    Ok(())
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Gateway whose calls never complete; records when an in-flight call is
/// dropped.
struct StalledClusterAdmin {
    released: Arc<AtomicBool>,
}

#[async_trait]
impl ClusterAdmin for StalledClusterAdmin {
    async fn list_topic_names(&self, _cluster_id: &ClusterId) -> Result<Vec<TopicName>> {
        let _guard = DropFlag(self.released.clone());
        std::future::pending::<()>().await;
        Ok(vec![])
    }

    async fn describe_topics(
        &self,
        _cluster_id: &ClusterId,
        _names: &[TopicName],
    ) -> Result<DescribeTopicsResult> {
        let _guard = DropFlag(self.released.clone());
        std::future::pending::<()>().await;
        Ok(DescribeTopicsResult::new())
    }
}

#[tokio::test]
async fn test_cancel_releases_inflight_gateway_call() {
    let released = Arc::new(AtomicBool::new(false));
    let service = TopicResolutionService::new(Arc::new(StalledClusterAdmin {
        released: released.clone(),
    }));

    let handle = service.spawn_list_topics(ClusterId::from("prod-1"));
    // Let the request reach the gateway.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(handle.state(), RequestState::Pending);
    assert!(!released.load(Ordering::SeqCst));

    handle.cancel();
    let err = handle.await.unwrap_err();

    assert!(matches!(err, ApplicationError::Cancelled));
    assert!(released.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_spawned_get_topic_resolves() -> Result<()> {
    let cluster_id = ClusterId::from("prod-1");
    let partitions = (0..12)
        .map(|p| Partition::new(p, Some(1), vec![1, 2], vec![1, 2]))
        .collect();
    let (service, admin) = create_test_service(&cluster_id, vec![Topic::new(name("orders"), partitions)]);

    let handle = service.spawn_get_topic(cluster_id.clone(), name("orders"));
    let orders = handle.await?.expect("orders should exist");
    assert_eq!(orders.partition_count(), 12);
    assert_eq!(orders.replication_factor(), Some(2));

    admin.delete_topic(&cluster_id, &name("orders"));
    let handle = service.spawn_get_topic(cluster_id, name("orders"));
    assert!(handle.await?.is_none());
    Ok(())
}

async fn settled<T>(handle: &topic_resolver::RequestHandle<T>) -> RequestState {
    for _ in 0..100 {
        if handle.state() != RequestState::Pending {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    handle.state()
}

#[tokio::test]
async fn test_request_state_tracks_outcome() -> Result<()> {
    let cluster_id = ClusterId::from("prod-1");
    let (service, _admin) =
        create_test_service(&cluster_id, vec![Topic::summary(name("orders"), 3, Some(1))]);

    let resolved = service.spawn_list_topics(cluster_id);
    assert_eq!(settled(&resolved).await, RequestState::Resolved);
    resolved.cancel();
    assert_eq!(resolved.state(), RequestState::Resolved);
    assert_eq!(resolved.await?.len(), 1);

    let failed = service.spawn_list_topics(ClusterId::from("staging"));
    assert_eq!(settled(&failed).await, RequestState::Failed);
    assert!(matches!(failed.await, Err(ApplicationError::ClusterUnknown(_))));
    Ok(())
}

#[tokio::test]
async fn test_user_topic_with_reserved_prefix_is_not_internal() -> Result<()> {
    let cluster_id = ClusterId::from("prod-1");
    let (service, _admin) = create_test_service(
        &cluster_id,
        vec![
            Topic::summary(name("__app_changelog"), 3, Some(3)),
            Topic::summary(name("__transaction_state"), 50, Some(3)),
        ],
    );

    let changelog = service
        .get_topic(&cluster_id, &name("__app_changelog"))
        .await?
        .expect("__app_changelog should exist");
    assert!(!changelog.is_internal());

    let topics = service.list_topics(&cluster_id).await?;
    assert!(topics.get(&name("__transaction_state")).unwrap().is_internal());
    Ok(())
}

#[tokio::test]
async fn test_list_topics_spans_rolled_log_segments() -> Result<()> {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut first = MetadataLogWriter::new();
    first.append_batch(&topic_records("orders", 1, 3));
    let next_offset = 4;
    first
        .write_to(temp_dir.path())
        .await
        .expect("Failed to write metadata log");
    let mut rolled = MetadataLogWriter::starting_at(next_offset);
    rolled.append_batch(&topic_records("payments", 2, 6));
    rolled
        .write_to(temp_dir.path())
        .await
        .expect("Failed to write metadata log");
    let service = service_for(&temp_dir);

    let topics = service.list_topics(&ClusterId::from("prod-1")).await?;

    let names: Vec<&str> = topics.names().map(|n| n.as_str()).collect();
    assert_eq!(names, vec!["orders", "payments"]);
    assert_eq!(topics.get(&name("payments")).unwrap().partition_count(), 6);
    Ok(())
}

#[tokio::test]
async fn test_slow_gateway_does_not_block_concurrent_requests() -> Result<()> {
    let cluster_id = ClusterId::from("prod-1");
    let admin = Arc::new(InMemoryClusterAdmin::with_latency(Duration::from_millis(50)));
    admin.add_cluster(
        cluster_id.clone(),
        vec![Topic::summary(name("orders"), 12, Some(3))],
    );
    let service = TopicResolutionService::new(admin);

    let started = std::time::Instant::now();
    let handles: Vec<_> = (0..20)
        .map(|_| service.spawn_list_topics(cluster_id.clone()))
        .collect();
    for handle in handles {
        assert_eq!(handle.await?.len(), 1);
    }

    // Each listing makes two gateway calls; serialized they would take 2s.
    assert!(started.elapsed() < Duration::from_secs(1));
    Ok(())
}
