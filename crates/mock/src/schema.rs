use std::collections::BTreeMap;
use std::sync::Arc;
use yangval_core::{
    Expr, IdentityDecl, LeafType, MustConstraint, QName, SchemaNavigator, SchemaNode, SchemaNodeKind, SchemaNodeRef,
    SchemaPath, UniqueConstraint,
};

/// Declarative description of one schema node and its subtree.
///
/// Names are local; the namespace is inherited from the parent unless set
/// with [`NodeSpec::with_namespace`].
#[derive(Clone, Debug)]
pub struct NodeSpec {
    name: String,
    namespace: Option<String>,
    kind: SchemaNodeKind,
    config: bool,
    mandatory: bool,
    presence: bool,
    mount_point: bool,
    keys: Vec<String>,
    must: Vec<MustConstraint>,
    when: Option<Expr>,
    default: Option<String>,
    leaf_type: Option<LeafType>,
    unique: Vec<Vec<String>>,
    children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new(kind: SchemaNodeKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            kind,
            config: true,
            mandatory: false,
            presence: false,
            mount_point: false,
            keys: Vec::new(),
            must: Vec::new(),
            when: None,
            default: None,
            leaf_type: None,
            unique: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn container(name: impl Into<String>) -> Self {
        Self::new(SchemaNodeKind::Container, name)
    }

    pub fn list<I, S>(name: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut spec = Self::new(SchemaNodeKind::List, name);
        spec.keys = keys.into_iter().map(Into::into).collect();
        spec
    }

    pub fn leaf(name: impl Into<String>, leaf_type: LeafType) -> Self {
        Self::new(SchemaNodeKind::Leaf, name).with_type(leaf_type)
    }

    pub fn leaf_list(name: impl Into<String>, leaf_type: LeafType) -> Self {
        Self::new(SchemaNodeKind::LeafList, name).with_type(leaf_type)
    }

    pub fn choice(name: impl Into<String>) -> Self {
        Self::new(SchemaNodeKind::Choice, name)
    }

    pub fn case(name: impl Into<String>) -> Self {
        Self::new(SchemaNodeKind::Case, name)
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_config(mut self, config: bool) -> Self {
        self.config = config;
        self
    }

    pub fn with_mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }

    pub fn with_presence(mut self, presence: bool) -> Self {
        self.presence = presence;
        self
    }

    pub fn with_mount_point(mut self, mount_point: bool) -> Self {
        self.mount_point = mount_point;
        self
    }

    pub fn with_must(mut self, must: MustConstraint) -> Self {
        self.must.push(must);
        self
    }

    pub fn with_when(mut self, when: Expr) -> Self {
        self.when = Some(when);
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_type(mut self, leaf_type: LeafType) -> Self {
        self.leaf_type = Some(leaf_type);
        self
    }

    /// One `unique` statement; each tag is a `/`-separated descendant path.
    pub fn with_unique<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique.push(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }
}

/// In-memory [`SchemaNavigator`] assembled from [`NodeSpec`] trees.
#[derive(Debug, Clone, Default)]
pub struct MockSchema {
    namespace: String,
    nodes: BTreeMap<SchemaPath, SchemaNodeRef>,
    children: BTreeMap<SchemaPath, Vec<SchemaNodeRef>>,
    prefixes: Vec<(String, String)>,
    identities: Vec<IdentityDecl>,
    mounts: BTreeMap<SchemaPath, Arc<MockSchema>>,
}

impl MockSchema {
    /// Schema whose unqualified names live in `namespace`, bound to `prefix`.
    pub fn new(prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self { prefixes: vec![(prefix.into(), namespace.clone())], namespace, ..Self::default() }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn with_module(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.prefixes.push((prefix.into(), namespace.into()));
        self
    }

    pub fn with_root(mut self, spec: NodeSpec) -> Self {
        let namespace = self.namespace.clone();
        self.register(&SchemaPath::root(), &namespace, spec);
        self
    }

    /// Declares `name` with direct bases; names may be `prefix:local`.
    pub fn with_identity(mut self, name: &str, bases: &[&str]) -> Self {
        let decl = IdentityDecl::new(self.qname(name), bases.iter().map(|base| self.qname(base)).collect());
        self.identities.push(decl);
        self
    }

    /// Attaches `schema` below the mount point at `path`.
    pub fn with_mount(mut self, path: &str, schema: MockSchema) -> Self {
        let path = self.path(path);
        self.mounts.insert(path, Arc::new(schema));
        self
    }

    /// Resolves `prefix:local` (or a bare local name) against the known modules.
    pub fn qname(&self, name: &str) -> QName {
        match name.split_once(':') {
            Some((prefix, local)) => {
                let namespace = self.namespace_for(prefix).unwrap_or_else(|| self.namespace.clone());
                QName::new(namespace, local)
            }
            None => QName::new(self.namespace.as_str(), name),
        }
    }

    /// Parses `/a/b/c` into a schema path, choice and case names included.
    pub fn path(&self, path: &str) -> SchemaPath {
        SchemaPath::from_names(path.split('/').filter(|segment| !segment.is_empty()).map(|segment| self.qname(segment)))
    }

    pub fn node(&self, path: &str) -> Option<SchemaNodeRef> {
        self.nodes.get(&self.path(path)).cloned()
    }

    fn register(&mut self, parent: &SchemaPath, inherited: &str, spec: NodeSpec) {
        let namespace = spec.namespace.clone().unwrap_or_else(|| inherited.to_owned());
        let name = QName::new(namespace.as_str(), spec.name.as_str());
        let path = parent.child(name.clone());
        let mut node = SchemaNode::new(path.clone(), spec.kind)
            .with_config(spec.config)
            .with_mandatory(spec.mandatory)
            .with_presence(spec.presence)
            .with_mount_point(spec.mount_point)
            .with_keys(spec.keys.iter().map(|key| name.sibling(key.as_str())).collect());
        for must in spec.must {
            node = node.with_must(must);
        }
        if let Some(when) = spec.when {
            node = node.with_when(when);
        }
        if let Some(default) = spec.default {
            node = node.with_default(default);
        }
        if let Some(leaf_type) = spec.leaf_type {
            node = node.with_type(leaf_type);
        }
        for tags in spec.unique {
            let constraint = UniqueConstraint::new(tags.iter().map(|tag| {
                tag.split('/').filter(|s| !s.is_empty()).map(|s| self.qname_in(s, &namespace)).collect::<Vec<_>>()
            }));
            node = node.with_unique(constraint);
        }
        let node = Arc::new(node);
        self.children.entry(parent.clone()).or_default().push(Arc::clone(&node));
        self.nodes.insert(path.clone(), node);
        for child in spec.children {
            self.register(&path, &namespace, child);
        }
    }

    fn qname_in(&self, name: &str, namespace: &str) -> QName {
        if name.contains(':') { self.qname(name) } else { QName::new(namespace, name) }
    }
}

impl SchemaNavigator for MockSchema {
    fn data_node_at(&self, path: &SchemaPath) -> Option<SchemaNodeRef> {
        self.nodes.get(path).cloned()
    }

    fn children_of(&self, path: &SchemaPath) -> Vec<SchemaNodeRef> {
        self.children.get(path).cloned().unwrap_or_default()
    }

    fn prefix_for(&self, namespace: &str) -> Option<String> {
        self.prefixes.iter().find(|(_, ns)| ns == namespace).map(|(prefix, _)| prefix.clone())
    }

    fn namespace_for(&self, prefix: &str) -> Option<String> {
        self.prefixes.iter().find(|(p, _)| p == prefix).map(|(_, ns)| ns.clone())
    }

    fn mount_registry_for(&self, path: &SchemaPath) -> Option<Arc<dyn SchemaNavigator>> {
        self.mounts.get(path).map(|schema| Arc::clone(schema) as Arc<dyn SchemaNavigator>)
    }

    fn identities(&self) -> Vec<IdentityDecl> {
        self.identities.clone()
    }
}
