use crate::qname::QName;
use smallvec::SmallVec;
use std::fmt;

/// One step of a [`ModelNodeId`]: the node name plus list keys, if any.
///
/// Entries of a keyless (state) list carry their 1-based position instead.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdSegment {
    name: QName,
    keys: SmallVec<[(QName, String); 2]>,
    position: Option<usize>,
}

impl IdSegment {
    pub fn new(name: QName) -> Self {
        Self { name, keys: SmallVec::new(), position: None }
    }

    pub fn with_key(mut self, key: QName, value: impl Into<String>) -> Self {
        self.keys.push((key, value.into()));
        self
    }

    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn keys(&self) -> &[(QName, String)] {
        &self.keys
    }
}

/// Instance identifier of a node in the configuration tree.
///
/// Used as the identity of instance nodes inside one request and to build the
/// error path reported to the client.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ModelNodeId {
    segments: Vec<IdSegment>,
}

impl ModelNodeId {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&self, segment: IdSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self { segments: rest.to_vec() })
    }

    pub fn segments(&self) -> &[IdSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for ModelNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment.name.local())?;
            for (key, value) in &segment.keys {
                write!(f, "[{}='{}']", key.local(), value)?;
            }
            if let Some(position) = segment.position {
                write!(f, "[{position}]")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn renders_keys_in_order() {
        let ns = "urn:ex";
        let id = ModelNodeId::root()
            .child(IdSegment::new(QName::new(ns, "interfaces")))
            .child(IdSegment::new(QName::new(ns, "interface")).with_key(QName::new(ns, "name"), "eth0"));
        assert_eq!(id.to_string(), "/interfaces/interface[name='eth0']");
        assert_eq!(id.parent().map(|p| p.to_string()).as_deref(), Some("/interfaces"));
        assert_eq!(ModelNodeId::root().to_string(), "/");
    }

    #[rstest]
    fn keyless_entries_differ_by_position() {
        let sample = |position| {
            ModelNodeId::root().child(IdSegment::new(QName::new("urn:ex", "sample")).with_position(position))
        };
        assert_ne!(sample(1), sample(2));
        assert_eq!(sample(2).to_string(), "/sample[2]");
    }
}
