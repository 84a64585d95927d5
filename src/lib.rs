pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::error::{ApplicationError, Result};
pub use application::{RequestHandle, RequestState, TopicResolutionService};
pub use domain::{ClusterId, Topic, TopicName, TopicsMap};
pub use ports::incoming::topic_manager::TopicManager;
pub use ports::outgoing::cluster_admin::{ClusterAdmin, DescribeFailure, DescribeTopicsResult};
