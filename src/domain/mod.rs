pub mod cluster;
pub mod error;
pub mod topic;
pub mod topics_map;

pub use cluster::ClusterId;
pub use error::DomainError;
pub use topic::*;
pub use topics_map::TopicsMap;
