use crate::domain::topic::{Topic, TopicName};
use indexmap::IndexMap;
use serde::Serialize;

/// Topics of one cluster keyed by name, in the order the listing returned
/// them. Every value is stored under its own name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TopicsMap {
    topics: IndexMap<TopicName, Topic>,
}

impl TopicsMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: IndexMap::with_capacity(capacity),
        }
    }

    /// Inserts a topic under its own name, replacing any previous entry while
    /// keeping that entry's position.
    pub fn insert(&mut self, topic: Topic) -> Option<Topic> {
        self.topics.insert(topic.name().clone(), topic)
    }

    pub fn get(&self, name: &TopicName) -> Option<&Topic> {
        self.topics.get(name)
    }

    pub fn contains(&self, name: &TopicName) -> bool {
        self.topics.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &TopicName> {
        self.topics.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TopicName, &Topic)> {
        self.topics.iter()
    }
}

impl IntoIterator for TopicsMap {
    type Item = (TopicName, Topic);
    type IntoIter = indexmap::map::IntoIter<TopicName, Topic>;

    fn into_iter(self) -> Self::IntoIter {
        self.topics.into_iter()
    }
}

impl FromIterator<Topic> for TopicsMap {
    fn from_iter<I: IntoIterator<Item = Topic>>(iter: I) -> Self {
        let mut map = TopicsMap::new();
        for topic in iter {
            map.insert(topic);
        }
        map
    }
}
