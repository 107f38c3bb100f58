use crate::qname::QName;
use std::fmt;
use std::sync::Arc;

/// Absolute path of qualified names from the schema root to one schema node.
///
/// Choice and case nodes are part of the path; instance navigation flattens
/// them. The value is immutable, every "mutating" helper returns a new path.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SchemaPath(Arc<[QName]>);

impl SchemaPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_names<I: IntoIterator<Item = QName>>(names: I) -> Self {
        Self(names.into_iter().collect())
    }

    pub fn child(&self, name: QName) -> Self {
        let mut names = self.0.to_vec();
        names.push(name);
        Self(names.into())
    }

    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].into()))
    }

    pub fn last(&self) -> Option<&QName> {
        self.0.last()
    }

    pub fn names(&self) -> &[QName] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn starts_with(&self, prefix: &SchemaPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Names below `ancestor`, if this path lies inside it.
    pub fn relative_to(&self, ancestor: &SchemaPath) -> Option<&[QName]> {
        self.0.strip_prefix(&*ancestor.0)
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for name in self.0.iter() {
            write!(f, "/{}", name.local())?;
        }
        Ok(())
    }
}

impl fmt::Debug for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SchemaPath(")?;
        for name in self.0.iter() {
            write!(f, "/{name}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn q(local: &str) -> QName {
        QName::new("urn:ex", local)
    }

    #[rstest]
    fn child_and_parent_are_inverse() {
        let base = SchemaPath::root().child(q("a"));
        let child = base.child(q("b"));
        assert_eq!(child.parent(), Some(base.clone()));
        assert!(child.starts_with(&base));
        assert_eq!(child.relative_to(&base), Some(&[q("b")][..]));
        assert_eq!(child.to_string(), "/a/b");
        assert_eq!(SchemaPath::root().parent(), None);
    }
}
