use crate::domain::error::DomainError;
use crate::domain::{ClusterId, TopicName};
use crate::ports::outgoing::cluster_admin::DescribeFailure;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("Cluster not found: {0}")]
    ClusterUnknown(ClusterId),
    #[error("Cluster {cluster_id} is unreachable: {reason}")]
    ClusterUnreachable { cluster_id: ClusterId, reason: String },
    #[error("Failed to resolve topic {topic} in cluster {cluster_id}")]
    TopicResolutionFailed {
        cluster_id: ClusterId,
        topic: TopicName,
        #[source]
        cause: DescribeFailure,
    },
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Request cancelled")]
    Cancelled,
}

impl ApplicationError {
    pub fn unreachable(cluster_id: &ClusterId, reason: impl Into<String>) -> Self {
        ApplicationError::ClusterUnreachable {
            cluster_id: cluster_id.clone(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ApplicationError>;
