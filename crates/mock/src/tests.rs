use crate::{MockSchema, MockStateProvider, MockTree, MockTreeLoadError, NodeSpec};
use futures_lite::future::block_on;
use rstest::{fixture, rstest};
use std::collections::BTreeMap;
use yangval_core::{
    Element, FilterNode, InstanceRoots, LeafType, ModelNodeId, NodeValue, QName, Scalar, SchemaNavigator,
    StateError, StateFilter, StateProvider,
};

const NS: &str = "urn:example:ifaces";

#[fixture]
fn schema() -> MockSchema {
    MockSchema::new("if", NS).with_root(
        NodeSpec::container("interfaces")
            .with_child(
                NodeSpec::list("interface", ["name"])
                    .with_child(NodeSpec::leaf("name", LeafType::String))
                    .with_child(NodeSpec::leaf("mtu", LeafType::Integer))
                    .with_child(NodeSpec::leaf_list("address", LeafType::String))
                    .with_child(
                        NodeSpec::choice("medium")
                            .with_child(NodeSpec::case("copper").with_child(NodeSpec::leaf("speed", LeafType::Integer))),
                    ),
            )
            .with_child(NodeSpec::container("stats").with_config(false)),
    )
}

const XML: &str = r"
<data>
  <interfaces>
    <interface><name>eth0</name><mtu>1500</mtu><address>10.0.0.1</address><address>10.0.0.2</address></interface>
    <interface><name>eth1</name><speed>100</speed></interface>
  </interfaces>
</data>";

#[rstest]
fn xml_is_classified_against_the_schema(schema: MockSchema) {
    let tree = MockTree::from_xml(&schema, schema.namespace(), XML).unwrap();
    let eth0 = tree.select("/interfaces/interface[name=eth0]").unwrap();
    assert_eq!(eth0.model_node_id().to_string(), "/interfaces/interface[name='eth0']");
    assert!(matches!(eth0.attribute(&QName::new(NS, "mtu")), NodeValue::Scalar(Scalar::String(ref v)) if &**v == "1500"));
    match eth0.attribute(&QName::new(NS, "address")) {
        NodeValue::LeafSet(values) => assert_eq!(values.len(), 2),
        other => panic!("expected leaf-list, got {other:?}"),
    }
    let interfaces = eth0.parent().unwrap();
    match interfaces.attribute(&QName::new(NS, "interface")) {
        NodeValue::Children(entries) => assert_eq!(entries.len(), 2),
        other => panic!("expected list entries, got {other:?}"),
    }
}

#[rstest]
fn choice_members_keep_their_full_schema_path(schema: MockSchema) {
    let tree = MockTree::from_xml(&schema, schema.namespace(), XML).unwrap();
    let eth1 = tree.select("/interfaces/interface[name=eth1]").unwrap();
    assert!(!eth1.attribute(&QName::new(NS, "speed")).is_absent());
    let speed = schema.data_child(&eth1.schema_path(), &QName::new(NS, "speed")).unwrap();
    assert_eq!(speed.path().to_string(), "/interfaces/interface/medium/copper/speed");
}

#[rstest]
fn roots_are_found_by_name(schema: MockSchema) {
    let tree = MockTree::from_xml(&schema, schema.namespace(), XML).unwrap();
    assert!(tree.root(&QName::new(NS, "interfaces")).is_some());
    assert!(tree.root(&QName::new(NS, "routing")).is_none());
}

#[rstest]
fn unknown_elements_are_rejected(schema: MockSchema) {
    let err = MockTree::from_xml(&schema, schema.namespace(), "<interfaces><bogus/></interfaces>").unwrap_err();
    assert!(matches!(err, MockTreeLoadError::UnknownElement(ref path) if path == "/interfaces/bogus"), "{err}");
}

#[rstest]
fn missing_list_key_is_rejected(schema: MockSchema) {
    let xml = "<interfaces><interface><mtu>1</mtu></interface></interfaces>";
    let err = MockTree::from_xml(&schema, schema.namespace(), xml).unwrap_err();
    assert!(matches!(err, MockTreeLoadError::MissingKey(_)), "{err}");
}

#[rstest]
fn mounted_subtrees_use_the_mounted_schema() {
    let inner = MockSchema::new("sys", "urn:example:system")
        .with_root(NodeSpec::container("system").with_child(NodeSpec::leaf("hostname", LeafType::String)));
    let outer = MockSchema::new("dev", "urn:example:devices")
        .with_root(NodeSpec::list("device", ["id"]).with_child(NodeSpec::leaf("id", LeafType::String)).with_child(
            NodeSpec::container("root").with_mount_point(true),
        ))
        .with_mount("/device/root", inner);
    let xml = r#"<device><id>d1</id><root><system xmlns="urn:example:system"><hostname>r1</hostname></system></root></device>"#;
    let tree = MockTree::from_xml(&outer, outer.namespace(), xml).unwrap();
    let system = tree.select("/device[id=d1]/root/system").unwrap();
    assert_eq!(system.schema_path().to_string(), "/system");
    assert!(outer.mount_registry_for(&outer.path("/device/root")).is_some());
}

#[rstest]
fn state_provider_answers_and_records_requests() {
    let counter = QName::new(NS, "in-octets");
    let provider = MockStateProvider::new().with_element(Element::leaf(counter.clone(), 42_i64));
    let anchor = ModelNodeId::root();
    let request = BTreeMap::from([(anchor.clone(), StateFilter::new(vec![counter.clone()], Vec::new()))]);
    let response = block_on(provider.retrieve_state(request)).unwrap();
    assert_eq!(response[&anchor].len(), 1);
    assert_eq!(response[&anchor][0].value(), Some(&Scalar::from(42_i64)));
    assert_eq!(provider.request_count(), 1);
}

#[rstest]
fn failing_provider_reports_its_error() {
    let provider = MockStateProvider::new().failing(StateError::Unavailable);
    let result = block_on(provider.retrieve_state(BTreeMap::new()));
    assert_eq!(result.unwrap_err(), StateError::Unavailable);
}

#[rstest]
fn filtering_provider_drops_entries_without_the_match_value() {
    let q = |local: &str| QName::new(NS, local);
    let counter = |name: &str, value: i64| {
        Element::new(q("counter")).with_child(Element::leaf(q("name"), name)).with_child(Element::leaf(q("value"), value))
    };
    let stats = Element::new(q("stats")).with_child(counter("a", 1)).with_child(counter("b", 2));
    let provider = MockStateProvider::new().with_element(stats).with_filtering();
    let tree = FilterNode::new(q("stats")).with_child(FilterNode::new(q("counter")).with_match("b"));
    let anchor = ModelNodeId::root();
    let request = BTreeMap::from([(anchor.clone(), StateFilter::new(vec![q("stats")], vec![tree]))]);

    let response = block_on(provider.retrieve_state(request)).unwrap();
    let entries = response[&anchor][0].children();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].children()[0].value(), Some(&Scalar::from("b")));
}
