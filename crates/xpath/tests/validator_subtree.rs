use rstest::{fixture, rstest};
use std::collections::BTreeSet;
use std::sync::Arc;
use yangval_core::{BinaryOp, Expr, LeafType, MustConstraint, NodeRef, Step, ValidationError};
use yangval_mock::{MockSchema, MockTree, NodeSpec};
use yangval_xpath::{ValidationContext, Validator, unique_key};

const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Validator>();
};

fn up(name: &str) -> Expr {
    Expr::relative(vec![Step::parent(), Step::child(name)])
}

#[fixture]
fn schema() -> MockSchema {
    let port_names = Expr::absolute(vec![Step::child("net"), Step::child("port"), Step::child("name")]);
    let mtu_floor = Expr::binary(BinaryOp::Ge, Expr::relative(vec![Step::context()]), Expr::number(576.0));
    MockSchema::new("net", "urn:net").with_root(
        NodeSpec::container("net")
            .with_child(NodeSpec::leaf("hostname", LeafType::String).with_mandatory(true))
            .with_child(NodeSpec::leaf("mode", LeafType::String))
            .with_child(
                NodeSpec::leaf("license", LeafType::String)
                    .with_mandatory(true)
                    .with_when(Expr::equals(up("mode"), Expr::string("pro"))),
            )
            .with_child(
                NodeSpec::list("port", ["name"])
                    .with_unique(["vlan/id"])
                    .with_child(NodeSpec::leaf("name", LeafType::String))
                    .with_child(NodeSpec::leaf("mtu", LeafType::Integer).with_must(MustConstraint::new(mtu_floor)))
                    .with_child(NodeSpec::container("vlan").with_child(NodeSpec::leaf("id", LeafType::Integer))),
            )
            .with_child(
                NodeSpec::choice("uplink")
                    .with_mandatory(true)
                    .with_child(NodeSpec::case("wired").with_child(NodeSpec::leaf(
                        "via",
                        LeafType::LeafRef { path: port_names.clone(), require_instance: true },
                    )))
                    .with_child(NodeSpec::case("wireless").with_child(NodeSpec::leaf("ssid", LeafType::String))),
            )
            .with_child(NodeSpec::leaf("hint", LeafType::LeafRef { path: port_names, require_instance: false })),
    )
}

fn load(schema: &MockSchema, body: &str) -> (MockTree, NodeRef) {
    let tree = MockTree::from_xml(schema, schema.namespace(), &format!("<net>{body}</net>")).expect("valid document");
    let net = tree.select("/net").expect("container net");
    (tree, net)
}

const PORTS: &str = "<port><name>p1</name><mtu>1500</mtu><vlan><id>10</id></vlan></port>\
                     <port><name>p2</name><mtu>9000</mtu><vlan><id>20</id></vlan></port>";

#[rstest]
fn valid_tree_passes(schema: MockSchema) {
    let (_tree, net) = load(&schema, &format!("<hostname>r1</hostname><mode>basic</mode>{PORTS}<via>p2</via><hint>p9</hint>"));
    let validator = Validator::new(Arc::new(schema));

    assert_eq!(validator.validate_subtree(&mut ValidationContext::new(), &net), Ok(()));
}

#[rstest]
fn missing_mandatory_leaf(schema: MockSchema) {
    let (_tree, net) = load(&schema, &format!("{PORTS}<via>p1</via>"));
    let hostname = schema.node("/net/hostname").expect("schema node");
    let validator = Validator::new(Arc::new(schema));

    let outcome = validator.check_mandatory(&mut ValidationContext::new(), &hostname, &net);
    let Err(ValidationError::MissingMandatoryNode { path, message }) = outcome else {
        panic!("expected a missing mandatory node, got {outcome:?}");
    };
    assert_eq!(path.to_string(), "/net/hostname");
    assert_eq!(message, "mandatory leaf 'hostname' is missing");
}

#[rstest]
#[case("<mode>basic</mode>", true)]
#[case("<mode>pro</mode>", false)]
fn mandatory_leaf_under_false_when_is_not_required(schema: MockSchema, #[case] mode: &str, #[case] ok: bool) {
    let (_tree, net) = load(&schema, mode);
    let license = schema.node("/net/license").expect("schema node");
    let validator = Validator::new(Arc::new(schema));

    let outcome = validator.check_mandatory(&mut ValidationContext::new(), &license, &net);
    assert_eq!(outcome.is_ok(), ok, "{outcome:?}");
}

#[rstest]
fn missing_mandatory_choice(schema: MockSchema) {
    let (_tree, net) = load(&schema, &format!("<hostname>r1</hostname><mode>basic</mode>{PORTS}"));
    let uplink = schema.node("/net/uplink").expect("schema node");
    let validator = Validator::new(Arc::new(schema.clone()));

    let outcome = validator.check_mandatory(&mut ValidationContext::new(), &uplink, &net);
    let Err(ValidationError::MissingMandatoryNode { message, .. }) = outcome else {
        panic!("expected a missing mandatory choice, got {outcome:?}");
    };
    assert_eq!(message, "mandatory choice 'uplink' is missing");

    let outcome = validator.validate_subtree(&mut ValidationContext::new(), &net);
    assert!(matches!(outcome, Err(ValidationError::MissingMandatoryNode { .. })), "{outcome:?}");
}

#[rstest]
fn dangling_leafref_requires_an_instance(schema: MockSchema) {
    let (_tree, net) = load(&schema, &format!("<hostname>r1</hostname><mode>basic</mode>{PORTS}<via>p7</via>"));
    let validator = Validator::new(Arc::new(schema));

    let outcome = validator.validate_subtree(&mut ValidationContext::new(), &net);
    let Err(error @ ValidationError::InstanceRequired { .. }) = outcome else {
        panic!("expected instance-required, got {outcome:?}");
    };
    assert_eq!(error.path().to_string(), "/net/via");
    assert_eq!(error.app_tag(), Some("instance-required"));
}

#[rstest]
fn must_failure_inside_a_list_entry(schema: MockSchema) {
    let ports = "<port><name>p1</name><mtu>100</mtu></port>";
    let (_tree, net) = load(&schema, &format!("<hostname>r1</hostname><mode>basic</mode>{ports}<ssid>lab</ssid>"));
    let validator = Validator::new(Arc::new(schema));

    let outcome = validator.validate_subtree(&mut ValidationContext::new(), &net);
    let Err(ValidationError::MustViolation { path, .. }) = outcome else {
        panic!("expected a must violation, got {outcome:?}");
    };
    assert_eq!(path.to_string(), "/net/port[name='p1']/mtu");
}

#[rstest]
fn unique_over_nested_leaf(schema: MockSchema) {
    let ports = "<port><name>p1</name><vlan><id>10</id></vlan></port>\
                 <port><name>p2</name><vlan><id>10</id></vlan></port>\
                 <port><name>p3</name></port>";
    let (_tree, net) = load(&schema, &format!("<hostname>r1</hostname><mode>basic</mode>{ports}<ssid>lab</ssid>"));
    let validator = Validator::new(Arc::new(schema));

    let outcome = validator.validate_subtree(&mut ValidationContext::new(), &net);
    let Err(ValidationError::NonUniqueInstance { instances, .. }) = outcome else {
        panic!("expected a unique violation, got {outcome:?}");
    };
    assert_eq!(instances.len(), 2);
}

#[rstest]
fn distinct_entries_have_distinct_keys(schema: MockSchema) {
    let (tree, _net) = load(&schema, PORTS);
    let list = schema.node("/net/port").expect("schema node");
    let constraint = &list.unique()[0];

    let keys: BTreeSet<_> = ["p1", "p2"]
        .iter()
        .map(|name| {
            let entry = tree.select(&format!("/net/port[name={name}]")).expect("list entry");
            unique_key(&schema, list.path(), &entry, constraint).expect("complete key")
        })
        .collect();
    assert_eq!(keys.len(), 2);
    assert_eq!(Validator::new(Arc::new(schema.clone())).check_unique(&list, &tree.select("/net").expect("net")), Ok(()));
}
