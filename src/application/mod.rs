pub mod error;
pub mod request;
pub mod topic_service;

pub use error::{ApplicationError, Result};
pub use request::{RequestHandle, RequestState};
pub use topic_service::TopicResolutionService;
