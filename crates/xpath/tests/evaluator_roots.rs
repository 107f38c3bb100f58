use rstest::rstest;
use std::sync::Arc;
use yangval_core::{Expr, LeafType, NodeRef, Scalar, Step};
use yangval_mock::{MockSchema, MockTree, NodeSpec};
use yangval_xpath::{Item, ValidationContext, Validator};

fn mounted() -> MockSchema {
    MockSchema::new("sys", "urn:sys").with_root(
        NodeSpec::container("system")
            .with_child(NodeSpec::leaf("hostname", LeafType::String))
            .with_child(NodeSpec::leaf("domain", LeafType::String)),
    )
}

fn devices() -> MockSchema {
    MockSchema::new("dev", "urn:dev")
        .with_root(
            NodeSpec::container("devices").with_child(
                NodeSpec::list("device", ["id"])
                    .with_child(NodeSpec::leaf("id", LeafType::String))
                    .with_child(NodeSpec::container("root").with_mount_point(true)),
            ),
        )
        .with_mount("/devices/device/root", mounted())
}

fn device_tree(schema: &MockSchema) -> MockTree {
    MockTree::from_xml(
        schema,
        schema.namespace(),
        r#"<devices>
             <device><id>r1</id><root><system xmlns="urn:sys"><hostname>r1</hostname><domain>lab</domain></system></root></device>
             <device><id>r2</id><root><system xmlns="urn:sys"><hostname>r2</hostname></system></root></device>
           </devices>"#,
    )
    .expect("valid instance document")
}

fn domain_of(tree: &MockTree, id: &str) -> Item {
    let system = tree.select(&format!("/devices/device[id={id}]/root/system")).expect("mounted system");
    Item::leaf(system, mounted().qname("domain"), Scalar::from("lab"))
}

#[rstest]
#[case("r1", true)]
#[case("r2", false)]
fn absolute_paths_start_at_the_mount_point(#[case] id: &str, #[case] expected: bool) {
    let schema = devices();
    let tree = device_tree(&schema);
    let validator = Validator::new(Arc::new(schema));
    let expr = Expr::equals(
        Expr::absolute(vec![Step::child("system"), Step::child("hostname")]),
        Expr::string("r1"),
    );

    let result = validator.evaluate(&mut ValidationContext::new(), &expr, domain_of(&tree, id)).expect("evaluates");
    assert_eq!(result, expected);
}

#[rstest]
fn relative_paths_stay_inside_the_mounted_schema() {
    let schema = devices();
    let tree = device_tree(&schema);
    let validator = Validator::new(Arc::new(schema));
    let expr = Expr::relative(vec![Step::parent(), Step::child("hostname")]);

    let result = validator.evaluate(&mut ValidationContext::new(), &expr, domain_of(&tree, "r2")).expect("evaluates");
    assert_eq!(result.leaf_values(), ["r2"]);
}

fn routing() -> MockSchema {
    let target = Expr::absolute(vec![Step::child("interfaces"), Step::child("interface"), Step::child("name")]);
    MockSchema::new("rt", "urn:rt")
        .with_root(
            NodeSpec::container("interfaces").with_child(
                NodeSpec::list("interface", ["name"]).with_child(NodeSpec::leaf("name", LeafType::String)),
            ),
        )
        .with_root(NodeSpec::container("routing").with_child(NodeSpec::leaf(
            "out",
            LeafType::LeafRef { path: target, require_instance: true },
        )))
}

fn routing_tree(schema: &MockSchema, out: &str) -> MockTree {
    MockTree::from_xml(
        schema,
        schema.namespace(),
        &format!(
            "<data>\
               <interfaces><interface><name>eth0</name></interface><interface><name>eth1</name></interface></interfaces>\
               <routing><out>{out}</out></routing>\
             </data>"
        ),
    )
    .expect("valid instance document")
}

#[rstest]
fn absolute_paths_reach_other_top_level_trees() {
    let schema = routing();
    let tree = routing_tree(&schema, "eth1");
    let routing: NodeRef = tree.select("/routing").expect("container routing");
    let out = schema.node("/routing/out").expect("schema node");
    let path = out.leaf_type().and_then(LeafType::leafref_path).cloned().expect("leafref path");

    let without_roots = Validator::new(Arc::new(schema.clone()));
    let focus = Item::leaf(NodeRef::clone(&routing), schema.qname("out"), Scalar::from("eth1"));
    let result = without_roots.evaluate(&mut ValidationContext::new(), &path, focus.clone()).expect("evaluates");
    assert!(result.is_absent());

    let with_roots = Validator::new(Arc::new(schema.clone())).with_roots(Arc::new(tree.clone()));
    let result = with_roots.evaluate(&mut ValidationContext::new(), &path, focus).expect("evaluates");
    assert_eq!(result.leaf_values(), ["eth0", "eth1"]);
}

#[rstest]
#[case("eth1", true)]
#[case("eth9", false)]
fn leafref_across_top_level_trees(#[case] out: &str, #[case] expected: bool) {
    let schema = routing();
    let tree = routing_tree(&schema, out);
    let routing = tree.select("/routing").expect("container routing");
    let leaf = schema.node("/routing/out").expect("schema node");
    let path = leaf.leaf_type().and_then(LeafType::leafref_path).cloned().expect("leafref path");
    let validator = Validator::new(Arc::new(schema)).with_roots(Arc::new(tree.clone()));

    let valid = validator.validate_leafref(&mut ValidationContext::new(), &path, &leaf, &routing).expect("evaluates");
    assert_eq!(valid, expected);
}
