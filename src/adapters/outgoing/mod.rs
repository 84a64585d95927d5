pub mod kraft_admin;
pub mod memory_admin;

pub use kraft_admin::KraftClusterAdmin;
pub use memory_admin::{InMemoryClusterAdmin, TopicFault};
