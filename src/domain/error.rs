#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    EmptyTopicName,
    InvalidTopicId(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::EmptyTopicName => write!(f, "Topic name must not be empty"),
            DomainError::InvalidTopicId(id) => write!(f, "Invalid topic id: {}", id),
        }
    }
}

impl std::error::Error for DomainError {}
