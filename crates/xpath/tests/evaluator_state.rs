use rstest::{fixture, rstest};
use std::sync::Arc;
use std::time::Duration;
use yangval_core::{
    BinaryOp, Element, Expr, Function, LeafType, MustConstraint, NodeRef, Scalar, Step, StateError, ValidationError,
    ValidatorConfig,
};
use yangval_mock::{MockSchema, MockStateProvider, MockTree, NodeSpec};
use yangval_xpath::{Item, ValidationContext, Validator};

fn load_below_ten() -> Expr {
    Expr::binary(
        BinaryOp::Lt,
        Expr::relative(vec![Step::parent(), Step::child("stats"), Step::child("load")]),
        Expr::number(10.0),
    )
}

#[fixture]
fn schema() -> MockSchema {
    MockSchema::new("sys", "urn:sys").with_root(
        NodeSpec::container("system")
            .with_child(NodeSpec::leaf("limit", LeafType::Integer).with_must(MustConstraint::new(load_below_ten())))
            .with_child(
                NodeSpec::container("stats")
                    .with_config(false)
                    .with_child(NodeSpec::leaf("load", LeafType::Integer).with_config(false)),
            ),
    )
}

fn stats(schema: &MockSchema, load: i64) -> Element {
    Element::new(schema.qname("stats")).with_child(Element::leaf(schema.qname("load"), load))
}

fn limit_of(schema: &MockSchema) -> (MockTree, NodeRef, Item) {
    let tree = MockTree::from_xml(schema, schema.namespace(), "<system><limit>8</limit></system>")
        .expect("valid instance document");
    let system = tree.select("/system").expect("container system");
    let limit = Item::leaf(NodeRef::clone(&system), schema.qname("limit"), Scalar::from(8_i64));
    (tree, system, limit)
}

#[rstest]
#[case(5, true)]
#[case(42, false)]
fn config_constraint_reads_state(schema: MockSchema, #[case] load: i64, #[case] expected: bool) {
    let provider = Arc::new(MockStateProvider::new().with_element(stats(&schema, load)));
    let (_tree, _system, limit) = limit_of(&schema);
    let validator = Validator::new(Arc::new(schema)).with_state_provider(provider.clone());

    let result = validator.evaluate(&mut ValidationContext::new(), &load_below_ten(), limit).expect("evaluates");
    assert_eq!(result, expected);
    assert_eq!(provider.request_count(), 1);
}

#[rstest]
fn state_is_requested_once_per_context(schema: MockSchema) {
    let provider = Arc::new(MockStateProvider::new().with_element(stats(&schema, 5)));
    let (_tree, _system, limit) = limit_of(&schema);
    let validator = Validator::new(Arc::new(schema)).with_state_provider(provider.clone());
    let mut ctx = ValidationContext::new();

    for _ in 0..3 {
        assert_eq!(validator.evaluate(&mut ctx, &load_below_ten(), limit.clone()).expect("evaluates"), true);
    }
    assert_eq!(provider.request_count(), 1);
    assert_eq!(ctx.state_snapshot_count(), 1);

    ctx.reset();
    assert_eq!(validator.evaluate(&mut ctx, &load_below_ten(), limit).expect("evaluates"), true);
    assert_eq!(provider.request_count(), 2);
}

#[rstest]
fn request_filter_names_the_walked_nodes(schema: MockSchema) {
    let provider = Arc::new(MockStateProvider::new().with_element(stats(&schema, 5)));
    let (_tree, system, limit) = limit_of(&schema);
    let validator = Validator::new(Arc::new(schema.clone())).with_state_provider(provider.clone());

    validator.evaluate(&mut ValidationContext::new(), &load_below_ten(), limit).expect("evaluates");
    let requests = provider.requests();
    let filter = requests[0].get(&system.model_node_id()).expect("request for the system container");
    assert_eq!(filter.names(), [schema.qname("stats")]);
    let stats = &filter.tree()[0];
    assert_eq!(stats.name(), &schema.qname("stats"));
    assert_eq!(stats.children()[0].name(), &schema.qname("load"));
}

#[rstest]
fn validate_must_sees_state(schema: MockSchema) {
    let provider = Arc::new(MockStateProvider::new().with_element(stats(&schema, 42)));
    let (_tree, system, _limit) = limit_of(&schema);
    let limit = schema.node("/system/limit").expect("schema node");
    let validator = Validator::new(Arc::new(schema)).with_state_provider(provider);

    let outcome = validator.validate_must(&mut ValidationContext::new(), &limit.must()[0], &limit, &system);
    assert!(matches!(outcome, Err(ValidationError::MustViolation { .. })), "{outcome:?}");
}

#[rstest]
fn slow_provider_times_out(schema: MockSchema) {
    let provider = Arc::new(MockStateProvider::new().with_element(stats(&schema, 5)).with_delay(Duration::from_secs(2)));
    let (_tree, _system, limit) = limit_of(&schema);
    let config = ValidatorConfig { state_timeout_ms: 20, ..ValidatorConfig::default() };
    let validator = Validator::new(Arc::new(schema)).with_state_provider(provider).with_config(config);

    let outcome = validator.evaluate(&mut ValidationContext::new(), &load_below_ten(), limit);
    let Err(ValidationError::StateRetrievalFailure { path, message }) = outcome else {
        panic!("expected a state retrieval failure, got {outcome:?}");
    };
    assert_eq!(path.to_string(), "/system/limit");
    assert_eq!(message, "state retrieval timed out after 20 ms");
}

#[rstest]
#[case(StateError::Unavailable)]
#[case(StateError::Provider("backend down".to_owned()))]
fn provider_failure_is_reported(schema: MockSchema, #[case] error: StateError) {
    let provider = Arc::new(MockStateProvider::new().failing(error.clone()));
    let (_tree, _system, limit) = limit_of(&schema);
    let validator = Validator::new(Arc::new(schema)).with_state_provider(provider);

    let outcome = validator.evaluate(&mut ValidationContext::new(), &load_below_ten(), limit);
    let Err(ValidationError::StateRetrievalFailure { message, .. }) = outcome else {
        panic!("expected a state retrieval failure, got {outcome:?}");
    };
    assert_eq!(message, error.to_string());
}

#[rstest]
fn without_a_provider_state_is_absent(schema: MockSchema) {
    let (_tree, _system, limit) = limit_of(&schema);
    let validator = Validator::new(Arc::new(schema));

    let result = validator.evaluate(&mut ValidationContext::new(), &load_below_ten(), limit).expect("evaluates");
    assert!(result.is_absent());
}

fn counters_schema() -> MockSchema {
    MockSchema::new("mon", "urn:mon").with_root(
        NodeSpec::container("system").with_child(NodeSpec::leaf("limit", LeafType::Integer)).with_child(
            NodeSpec::container("stats")
                .with_config(false)
                .with_child(NodeSpec::leaf("total", LeafType::Integer).with_config(false))
                .with_child(
                    NodeSpec::list("counter", ["name"])
                        .with_config(false)
                        .with_child(NodeSpec::leaf("name", LeafType::String).with_config(false))
                        .with_child(NodeSpec::leaf("value", LeafType::Integer).with_config(false)),
                )
                .with_child(
                    NodeSpec::list("sample", Vec::<String>::new())
                        .with_config(false)
                        .with_child(NodeSpec::leaf("v", LeafType::Integer).with_config(false)),
                ),
        ),
    )
}

fn counters_state(schema: &MockSchema) -> Element {
    let counter = |name: &str, value: i64| {
        Element::new(schema.qname("counter"))
            .with_child(Element::leaf(schema.qname("name"), name))
            .with_child(Element::leaf(schema.qname("value"), value))
    };
    let sample = |v: i64| Element::new(schema.qname("sample")).with_child(Element::leaf(schema.qname("v"), v));
    Element::new(schema.qname("stats"))
        .with_child(Element::leaf(schema.qname("total"), 7_i64))
        .with_child(counter("a", 1))
        .with_child(counter("b", 2))
        .with_child(sample(1))
        .with_child(sample(2))
        .with_child(sample(3))
}

fn counter_value(name: &str, expected: f64) -> Expr {
    let by_name = Expr::equals(Expr::relative(vec![Step::child("name")]), Expr::string(name));
    Expr::equals(
        Expr::relative(vec![
            Step::parent(),
            Step::child("stats"),
            Step::child("counter").with_predicate(by_name),
            Step::child("value"),
        ]),
        Expr::number(expected),
    )
}

#[rstest]
fn narrowed_requests_do_not_share_a_snapshot() {
    let schema = counters_schema();
    let provider = Arc::new(MockStateProvider::new().with_element(counters_state(&schema)).with_filtering());
    let (_tree, system, limit) = limit_of(&schema);
    let validator = Validator::new(Arc::new(schema.clone())).with_state_provider(provider.clone());
    let mut ctx = ValidationContext::new();

    assert_eq!(validator.evaluate(&mut ctx, &counter_value("a", 1.0), limit.clone()).expect("evaluates"), true);
    assert_eq!(validator.evaluate(&mut ctx, &counter_value("b", 2.0), limit.clone()).expect("evaluates"), true);
    assert_eq!(validator.evaluate(&mut ctx, &counter_value("a", 1.0), limit).expect("evaluates"), true);
    assert_eq!(provider.request_count(), 2);
    assert_eq!(ctx.state_snapshot_count(), 2);

    let requests = provider.requests();
    let counter = &requests[1][&system.model_node_id()].tree()[0].children()[0];
    assert_eq!(counter.match_value(), Some("b"));
}

#[rstest]
fn only_key_predicates_narrow_the_request() {
    let schema = counters_schema();
    let provider = Arc::new(MockStateProvider::new().with_element(counters_state(&schema)).with_filtering());
    let (_tree, system, limit) = limit_of(&schema);
    let validator = Validator::new(Arc::new(schema.clone())).with_state_provider(provider.clone());
    let by_value = Expr::equals(Expr::relative(vec![Step::child("value")]), Expr::number(2.0));
    let name_of_two = Expr::relative(vec![
        Step::parent(),
        Step::child("stats"),
        Step::child("counter").with_predicate(by_value),
        Step::child("name"),
    ]);

    let result = validator.evaluate(&mut ValidationContext::new(), &name_of_two, limit).expect("evaluates");
    assert_eq!(result.leaf_values(), ["b"]);
    let requests = provider.requests();
    let counter = &requests[0][&system.model_node_id()].tree()[0].children()[0];
    assert_eq!(counter.name(), &schema.qname("counter"));
    assert_eq!(counter.match_value(), None);
}

#[rstest]
fn keyless_state_entries_are_counted_separately() {
    let schema = counters_schema();
    let provider = Arc::new(MockStateProvider::new().with_element(counters_state(&schema)));
    let (_tree, _system, limit) = limit_of(&schema);
    let validator = Validator::new(Arc::new(schema)).with_state_provider(provider);
    let mut ctx = ValidationContext::new();
    let samples = Expr::relative(vec![Step::parent(), Step::child("stats"), Step::child("sample")]);
    let values = Expr::relative(vec![Step::parent(), Step::child("stats"), Step::child("sample"), Step::child("v")]);

    let count = validator.evaluate(&mut ctx, &Expr::call(Function::Count, vec![samples]), limit.clone()).expect("evaluates");
    assert!((count.to_number() - 3.0).abs() < f64::EPSILON, "{count:?}");
    let sum = validator.evaluate(&mut ctx, &Expr::call(Function::Sum, vec![values]), limit).expect("evaluates");
    assert!((sum.to_number() - 6.0).abs() < f64::EPSILON, "{sum:?}");
}

#[rstest]
fn parent_step_from_state_entry_reaches_its_container() {
    let schema = counters_schema();
    let provider = Arc::new(MockStateProvider::new().with_element(counters_state(&schema)));
    let (_tree, _system, limit) = limit_of(&schema);
    let validator = Validator::new(Arc::new(schema)).with_state_provider(provider);
    let by_name = Expr::equals(Expr::relative(vec![Step::child("name")]), Expr::string("a"));
    let total = Expr::relative(vec![
        Step::parent(),
        Step::child("stats"),
        Step::child("counter").with_predicate(by_name),
        Step::parent(),
        Step::child("total"),
    ]);

    let result = validator.evaluate(&mut ValidationContext::new(), &total, limit).expect("evaluates");
    assert_eq!(result.leaf_values(), ["7"]);
}
