use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use std::sync::{Arc, Weak};
use yangval_core::{
    IdSegment, InstanceNode, InstanceRoots, ModelNodeId, NodeRef, NodeValue, QName, Scalar, SchemaNavigator,
    SchemaNodeKind, SchemaPath,
};

/// Values held by one named attribute of a [`MockNode`].
#[derive(Debug)]
enum Slot {
    Leaf(Scalar),
    LeafList(Vec<Scalar>),
    Container(Arc<MockNode>),
    List(Vec<Arc<MockNode>>),
}

/// Container or list entry of a [`MockTree`].
#[derive(Debug)]
pub struct MockNode {
    name: QName,
    parent: Option<Weak<MockNode>>,
    schema_path: SchemaPath,
    id: ModelNodeId,
    attributes: Vec<(QName, Slot)>,
}

impl MockNode {
    /// Child nodes in document order, leaves excluded.
    pub fn child_nodes(&self) -> Vec<Arc<MockNode>> {
        let mut out = Vec::new();
        for (_, slot) in &self.attributes {
            match slot {
                Slot::Container(node) => out.push(Arc::clone(node)),
                Slot::List(entries) => out.extend(entries.iter().cloned()),
                Slot::Leaf(_) | Slot::LeafList(_) => {}
            }
        }
        out
    }

    fn slot(&self, name: &QName) -> Option<&Slot> {
        self.attributes.iter().find(|(n, _)| n == name).map(|(_, slot)| slot)
    }
}

impl InstanceNode for MockNode {
    fn name(&self) -> QName {
        self.name.clone()
    }

    fn parent(&self) -> Option<NodeRef> {
        let parent = self.parent.as_ref()?.upgrade()?;
        Some(parent as NodeRef)
    }

    fn attribute(&self, name: &QName) -> NodeValue {
        match self.slot(name) {
            Some(Slot::Leaf(value)) => NodeValue::Scalar(value.clone()),
            Some(Slot::LeafList(values)) => NodeValue::LeafSet(values.clone()),
            Some(Slot::Container(node)) => NodeValue::Child(Arc::clone(node) as NodeRef),
            Some(Slot::List(entries)) => {
                NodeValue::Children(entries.iter().map(|entry| Arc::clone(entry) as NodeRef).collect())
            }
            None => NodeValue::Absent,
        }
    }

    fn schema_path(&self) -> SchemaPath {
        self.schema_path.clone()
    }

    fn model_node_id(&self) -> ModelNodeId {
        self.id.clone()
    }
}

/// Instance tree loaded from NETCONF-style XML and classified against a schema.
#[derive(Debug, Clone, Default)]
pub struct MockTree {
    roots: Vec<Arc<MockNode>>,
}

impl MockTree {
    /// Loads `xml`, which is either a single top-level element or a `<data>` /
    /// `<config>` wrapper around several of them. Elements without a namespace
    /// declaration fall into the schema's default namespace.
    pub fn from_xml(
        schema: &dyn SchemaNavigator,
        default_namespace: &str,
        xml: &str,
    ) -> Result<Self, MockTreeLoadError> {
        let mut elements = parse_elements(xml, default_namespace)?;
        if let [single] = elements.as_slice()
            && matches!(single.name.local(), "data" | "config")
            && schema.data_child(&SchemaPath::root(), &single.name).is_none()
        {
            elements = elements.remove(0).children;
        }
        let mut roots = Vec::with_capacity(elements.len());
        for element in elements {
            let draft = classify(schema, &SchemaPath::root(), element)?;
            if !draft.kind.is_interior() {
                return Err(MockTreeLoadError::UnexpectedLeaf(draft.schema_path.to_string()));
            }
            roots.push(instantiate(draft, None, &ModelNodeId::root()));
        }
        Ok(Self { roots })
    }

    pub fn roots(&self) -> &[Arc<MockNode>] {
        &self.roots
    }

    /// Looks a node up by `/local[key=value]/local` form.
    pub fn select(&self, path: &str) -> Option<NodeRef> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let first = parse_selector(segments.next()?);
        let mut current = self.roots.iter().find(|root| first.matches(root)).cloned()?;
        for segment in segments {
            let selector = parse_selector(segment);
            current = current.child_nodes().into_iter().find(|child| selector.matches(child))?;
        }
        Some(current as NodeRef)
    }
}

impl InstanceRoots for MockTree {
    fn root(&self, name: &QName) -> Option<NodeRef> {
        self.roots.iter().find(|root| &root.name == name).map(|root| Arc::clone(root) as NodeRef)
    }
}

struct Selector<'a> {
    local: &'a str,
    keys: Vec<(&'a str, &'a str)>,
}

impl Selector<'_> {
    fn matches(&self, node: &MockNode) -> bool {
        if node.name.local() != self.local {
            return false;
        }
        let Some(segment) = node.id.segments().last() else {
            return false;
        };
        self.keys.iter().all(|(key, value)| {
            segment.keys().iter().any(|(name, actual)| name.local() == *key && actual == value)
        })
    }
}

fn parse_selector(segment: &str) -> Selector<'_> {
    let (local, rest) = segment.split_once('[').map_or((segment, ""), |(l, r)| (l, r));
    let keys = rest
        .split('[')
        .filter_map(|predicate| predicate.trim_end_matches(']').split_once('='))
        .map(|(k, v)| (k.trim(), v.trim().trim_matches('\'')))
        .collect();
    Selector { local, keys }
}

#[derive(Debug)]
struct XmlElement {
    name: QName,
    text: String,
    children: Vec<XmlElement>,
}

fn parse_elements(xml: &str, default_namespace: &str) -> Result<Vec<XmlElement>, MockTreeLoadError> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut roots = Vec::new();
    loop {
        let (resolved, event) = reader.read_resolved_event()?;
        match event {
            Event::Start(start) => {
                let name = element_name(&resolved, start.local_name().as_ref(), default_namespace)?;
                stack.push(XmlElement { name, text: String::new(), children: Vec::new() });
            }
            Event::Empty(start) => {
                let name = element_name(&resolved, start.local_name().as_ref(), default_namespace)?;
                let element = XmlElement { name, text: String::new(), children: Vec::new() };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => roots.push(element),
                }
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(std::str::from_utf8(&text).map_err(|_| MockTreeLoadError::Utf8)?);
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(std::str::from_utf8(&data).map_err(|_| MockTreeLoadError::Utf8)?);
                }
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(MockTreeLoadError::Unbalanced);
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => roots.push(element),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if !stack.is_empty() {
        return Err(MockTreeLoadError::Unbalanced);
    }
    Ok(roots)
}

fn element_name(resolved: &ResolveResult<'_>, local: &[u8], default_namespace: &str) -> Result<QName, MockTreeLoadError> {
    let local = std::str::from_utf8(local).map_err(|_| MockTreeLoadError::Utf8)?;
    let namespace = match resolved {
        ResolveResult::Bound(ns) => std::str::from_utf8(ns.as_ref()).map_err(|_| MockTreeLoadError::Utf8)?,
        ResolveResult::Unbound => default_namespace,
        ResolveResult::Unknown(prefix) => {
            return Err(MockTreeLoadError::UnknownPrefix(String::from_utf8_lossy(prefix).into_owned()));
        }
    };
    Ok(QName::new(namespace, local))
}

/// An element matched to its schema node, ready to be instantiated.
struct Draft {
    name: QName,
    kind: SchemaNodeKind,
    schema_path: SchemaPath,
    value: String,
    keys: Vec<(QName, String)>,
    children: Vec<Draft>,
}

fn classify(
    schema: &dyn SchemaNavigator,
    parent: &SchemaPath,
    element: XmlElement,
) -> Result<Draft, MockTreeLoadError> {
    let Some(node) = schema.data_child(parent, &element.name) else {
        return Err(MockTreeLoadError::UnknownElement(format!("{parent}/{}", element.name.local())));
    };
    let schema_path = node.path().clone();
    let mut keys = Vec::with_capacity(node.keys().len());
    for key in node.keys() {
        let Some(value) = element.children.iter().find(|child| child.name == *key) else {
            return Err(MockTreeLoadError::MissingKey(format!("{schema_path}/{}", key.local())));
        };
        keys.push((key.clone(), value.text.clone()));
    }
    let children = if node.is_mount_point() {
        let Some(mounted) = schema.mount_registry_for(&schema_path) else {
            return Err(MockTreeLoadError::UnknownElement(schema_path.to_string()));
        };
        element
            .children
            .into_iter()
            .map(|child| classify(mounted.as_ref(), &SchemaPath::root(), child))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        element
            .children
            .into_iter()
            .map(|child| classify(schema, &schema_path, child))
            .collect::<Result<Vec<_>, _>>()?
    };
    Ok(Draft { name: element.name, kind: node.kind(), schema_path, value: element.text, keys, children })
}

fn instantiate(draft: Draft, parent: Option<Weak<MockNode>>, parent_id: &ModelNodeId) -> Arc<MockNode> {
    let mut segment = IdSegment::new(draft.name.clone());
    for (key, value) in &draft.keys {
        segment = segment.with_key(key.clone(), value.as_str());
    }
    let id = parent_id.child(segment);
    Arc::new_cyclic(|me: &Weak<MockNode>| {
        let mut attributes: Vec<(QName, Slot)> = Vec::new();
        for child in draft.children {
            let position = attributes.iter().position(|(name, _)| *name == child.name);
            match child.kind {
                SchemaNodeKind::Leaf => attributes.push((child.name, Slot::Leaf(Scalar::from(child.value)))),
                SchemaNodeKind::LeafList => {
                    let value = Scalar::from(child.value);
                    if let Some(i) = position
                        && let Slot::LeafList(values) = &mut attributes[i].1
                    {
                        values.push(value);
                    } else {
                        attributes.push((child.name, Slot::LeafList(vec![value])));
                    }
                }
                SchemaNodeKind::List => {
                    let entry = instantiate(child, Some(me.clone()), &id);
                    if let Some(i) = position
                        && let Slot::List(entries) = &mut attributes[i].1
                    {
                        entries.push(entry);
                    } else {
                        attributes.push((entry.name.clone(), Slot::List(vec![entry])));
                    }
                }
                _ => {
                    let node = instantiate(child, Some(me.clone()), &id);
                    attributes.push((node.name.clone(), Slot::Container(node)));
                }
            }
        }
        MockNode { name: draft.name, parent, schema_path: draft.schema_path, id: id.clone(), attributes }
    })
}

#[derive(Debug, thiserror::Error)]
pub enum MockTreeLoadError {
    #[error("XML parsing failed: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("element text is not valid UTF-8")]
    Utf8,
    #[error("unbalanced XML element nesting")]
    Unbalanced,
    #[error("unknown namespace prefix '{0}'")]
    UnknownPrefix(String),
    #[error("element {0} has no schema node")]
    UnknownElement(String),
    #[error("list entry {0} is missing its key")]
    MissingKey(String),
    #[error("top-level element {0} is not a container or list")]
    UnexpectedLeaf(String),
}
