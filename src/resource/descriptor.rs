//! Request descriptors
//!
//! A [`Descriptor`] is the path from the API root to the resource an
//! operation targets, one [`Segment`] per hop.

use super::registry::ResourceClass;
use serde_json::Value;

/// One hop of a descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub key: ResourceClass,
    pub id: Option<String>,
    /// List filters, in insertion order
    pub filters: Vec<(String, String)>,
    /// Raw accessor arguments; take precedence over `id` and `filters`
    pub args: Option<Vec<Value>>,
}

impl Segment {
    pub fn new(key: ResourceClass) -> Self {
        Self {
            key,
            id: None,
            filters: Vec::new(),
            args: None,
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the id only when one is given
    pub fn maybe_id(mut self, id: Option<&str>) -> Self {
        self.id = id.map(|s| s.to_string());
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    pub fn args(mut self, args: Vec<Value>) -> Self {
        self.args = Some(args);
        self
    }
}

/// Ordered path of segments, root first
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Descriptor {
    segments: Vec<Segment>,
}

impl Descriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at an account; `None` resolves to the current account at compile time
    pub fn account(account_id: Option<&str>) -> Self {
        Self::new().segment(Segment::new(ResourceClass::Account).maybe_id(account_id))
    }

    pub fn segment(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    pub fn then(self, key: ResourceClass) -> Self {
        self.segment(Segment::new(key))
    }

    pub fn then_id(self, key: ResourceClass, id: impl Into<String>) -> Self {
        self.segment(Segment::new(key).id(id))
    }

    pub fn then_filtered<K, V>(self, key: ResourceClass, filters: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let segment = filters
            .into_iter()
            .fold(Segment::new(key), |segment, (k, v)| segment.filter(k, v));
        self.segment(segment)
    }

    pub fn then_args(self, key: ResourceClass, args: Vec<Value>) -> Self {
        self.segment(Segment::new(key).args(args))
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
