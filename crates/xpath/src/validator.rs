//! Entry points used by the datastore.

use crate::access_path::{AccessPathMap, resolve_references};
use crate::context::ValidationContext;
use crate::engine::{Env, Evaluator, attribute_items, children_scope, navigator_for};
use crate::identity::IdentityResolver;
use crate::normalize::Normalizer;
use crate::unique::check_unique;
use crate::value::{EvalResult, Item};
use std::sync::Arc;
use tracing::{debug, trace};
use yangval_core::{
    ErrorPath, Expr, InstanceRoots, LeafType, Literal, MustConstraint, NodeRef, Scalar, SchemaNavigator, SchemaNode,
    SchemaNodeKind, SchemaPath, StateProvider, ValidationError, ValidatorConfig,
};

/// Constraint validator for one schema.
///
/// Shared across requests; every request brings its own
/// [`ValidationContext`].
pub struct Validator {
    navigator: Arc<dyn SchemaNavigator>,
    roots: Option<Arc<dyn InstanceRoots>>,
    state: Option<Arc<dyn StateProvider>>,
    identities: IdentityResolver,
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(navigator: Arc<dyn SchemaNavigator>) -> Self {
        let identities = IdentityResolver::new(&navigator.identities());
        Self { navigator, roots: None, state: None, identities, config: ValidatorConfig::default() }
    }

    /// Top-level nodes of other data trees, reachable by absolute paths.
    pub fn with_roots(mut self, roots: Arc<dyn InstanceRoots>) -> Self {
        self.roots = Some(roots);
        self
    }

    pub fn with_state_provider(mut self, provider: Arc<dyn StateProvider>) -> Self {
        self.state = Some(provider);
        self
    }

    pub fn with_config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn navigator(&self) -> &Arc<dyn SchemaNavigator> {
        &self.navigator
    }

    pub fn identities(&self) -> &IdentityResolver {
        &self.identities
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    fn env(&self) -> Env<'_> {
        Env {
            navigator: &self.navigator,
            roots: self.roots.as_deref(),
            state: self.state.as_deref(),
            identities: &self.identities,
            config: &self.config,
        }
    }

    /// Normalizes `expr` for `focus` and evaluates it there. `focus` is also
    /// what `current()` returns.
    pub fn evaluate(&self, ctx: &mut ValidationContext, expr: &Expr, focus: Item) -> Result<EvalResult, ValidationError> {
        let (navigator, origin) = self.scope_of(&focus);
        let env = self.env();
        let bind = |operand: &Expr| bound_literal(env.without_state(), &focus, operand);
        let mut normalizer = Normalizer::new(navigator.as_ref(), origin).with_current_binding(&bind);
        if let Some(prefix) = ctx.state_namespace().and_then(|namespace| navigator.prefix_for(namespace)) {
            normalizer = normalizer.with_state_prefix(prefix);
        }
        let normalized = normalizer.normalize(expr);
        trace!(expr = %normalized, focus = ?focus, "evaluating");
        Evaluator::new(env, ctx, focus).evaluate(&normalized)
    }

    /// Navigator and schema path describing `item`.
    fn scope_of(&self, item: &Item) -> (Arc<dyn SchemaNavigator>, SchemaPath) {
        match item {
            Item::Node(node) => (navigator_for(&self.navigator, node), node.schema_path()),
            Item::Leaf { owner, name, .. } | Item::Pending { parent: owner, name } => {
                let (navigator, parent_path) = children_scope(&self.navigator, owner);
                let path = navigator
                    .data_child(&parent_path, name)
                    .map_or_else(|| parent_path.child(name.clone()), |node| node.path().clone());
                (navigator, path)
            }
        }
    }

    /// Checks `constraint` on every instance of `schema_node` below `parent`.
    /// Nothing is checked when no instance exists.
    pub fn validate_must(
        &self,
        ctx: &mut ValidationContext,
        constraint: &MustConstraint,
        schema_node: &SchemaNode,
        parent: &NodeRef,
    ) -> Result<(), ValidationError> {
        for target in attribute_items(parent, schema_node.name()) {
            let result = self.evaluate(ctx, constraint.expr(), target.clone())?;
            if result.to_bool() {
                continue;
            }
            debug!(target = %target.error_path(), expr = %constraint.expr(), absent = result.is_absent(), "must violated");
            let message = constraint
                .error_message()
                .map_or_else(|| format!("must condition '{}' is not satisfied", constraint.expr()), str::to_owned);
            let app_tag = constraint.error_app_tag().unwrap_or(&self.config.default_error_app_tag).to_owned();
            return Err(ValidationError::MustViolation { path: target.error_path(), message, app_tag });
        }
        Ok(())
    }

    /// Evaluates the `when` of `schema_node` below `parent` and records what
    /// the datastore has to do about it:
    ///
    /// * absent data, or true for a missing node: create (with its default),
    /// * true for an existing container or list: merge,
    /// * false for an existing node: delete, and the result is `false`.
    pub fn validate_when(
        &self,
        ctx: &mut ValidationContext,
        expr: &Expr,
        schema_node: &SchemaNode,
        parent: &NodeRef,
    ) -> Result<bool, ValidationError> {
        let (present, foci) = self.when_foci(schema_node, parent);
        let mut absent = false;
        for focus in foci {
            let result = self.evaluate(ctx, expr, focus)?;
            if result.is_absent() {
                absent = true;
                continue;
            }
            if !result.to_bool() {
                if present {
                    ctx.record_delete(&parent.model_node_id(), schema_node.path());
                    debug!(node = %schema_node.path(), parent = %parent.model_node_id(), "when false, node to delete");
                }
                return Ok(false);
            }
        }
        let parent_id = parent.model_node_id();
        if !present {
            ctx.record_create(&parent_id, schema_node.path());
            if let Some(default) = schema_node.default_value() {
                ctx.record_default(&parent_id, schema_node.path(), default);
            }
            debug!(node = %schema_node.path(), parent = %parent_id, absent, "when satisfied, node to create");
        } else if schema_node.kind().is_interior() {
            ctx.record_merge(&parent_id, schema_node.path());
            debug!(node = %schema_node.path(), parent = %parent_id, "when satisfied, node to merge");
        }
        Ok(true)
    }

    /// Like [`validate_when`](Self::validate_when), but a false condition on
    /// an existing node is a [`ValidationError::WhenViolation`].
    pub fn require_when(
        &self,
        ctx: &mut ValidationContext,
        expr: &Expr,
        schema_node: &SchemaNode,
        parent: &NodeRef,
    ) -> Result<(), ValidationError> {
        if self.validate_when(ctx, expr, schema_node, parent)? {
            return Ok(());
        }
        let Some(target) = attribute_items(parent, schema_node.name()).into_iter().next() else {
            return Ok(());
        };
        Err(ValidationError::WhenViolation {
            path: target.error_path(),
            message: format!("when condition '{expr}' is not satisfied"),
        })
    }

    /// Whether the node exists, and the items the condition is evaluated on.
    fn when_foci(&self, schema_node: &SchemaNode, parent: &NodeRef) -> (bool, Vec<Item>) {
        if !schema_node.kind().is_data_node() {
            let present = self.has_data_below(schema_node.path(), parent);
            return (present, vec![Item::Node(NodeRef::clone(parent))]);
        }
        let targets = attribute_items(parent, schema_node.name());
        if targets.is_empty() {
            return (false, vec![Item::pending(NodeRef::clone(parent), schema_node.name().clone())]);
        }
        (true, targets)
    }

    fn has_data_below(&self, path: &SchemaPath, parent: &NodeRef) -> bool {
        let (navigator, _) = children_scope(&self.navigator, parent);
        navigator.data_children_of(path).iter().any(|child| !parent.attribute(child.name()).is_absent())
    }

    /// `true` when every value of the leafref `schema_node` names an existing
    /// target, or the type does not require one.
    pub fn validate_leafref(
        &self,
        ctx: &mut ValidationContext,
        path: &Expr,
        schema_node: &SchemaNode,
        parent: &NodeRef,
    ) -> Result<bool, ValidationError> {
        let require_instance =
            !matches!(schema_node.leaf_type(), Some(LeafType::LeafRef { require_instance: false, .. }));
        for target in attribute_items(parent, schema_node.name()) {
            let Some(value) = target.scalar().map(Scalar::to_text) else {
                continue;
            };
            let candidates = self.evaluate(ctx, path, target.clone())?.leaf_values();
            if candidates.contains(&value) {
                continue;
            }
            debug!(leaf = %target.error_path(), %value, candidates = candidates.len(), "leafref target missing");
            if require_instance {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// See [`resolve_references`](crate::resolve_references).
    pub fn resolve_references(&self, schema_node: &SchemaNode, expr: &Expr) -> AccessPathMap {
        resolve_references(self.navigator.as_ref(), schema_node, expr)
    }

    pub fn check_unique(&self, list: &SchemaNode, parent: &NodeRef) -> Result<(), ValidationError> {
        let (navigator, _) = children_scope(&self.navigator, parent);
        check_unique(navigator.as_ref(), list, parent)
    }

    /// A mandatory leaf or choice must exist unless its `when` is false.
    pub fn check_mandatory(
        &self,
        ctx: &mut ValidationContext,
        schema_node: &SchemaNode,
        parent: &NodeRef,
    ) -> Result<(), ValidationError> {
        if !schema_node.is_mandatory() {
            return Ok(());
        }
        let (present, foci) = self.when_foci(schema_node, parent);
        if present {
            return Ok(());
        }
        if let Some(when) = schema_node.when() {
            for focus in foci {
                let result = self.evaluate(ctx, when, focus)?;
                if !result.is_absent() && !result.to_bool() {
                    trace!(node = %schema_node.path(), "mandatory node inactive");
                    return Ok(());
                }
            }
        }
        let what = match schema_node.kind() {
            SchemaNodeKind::Choice => "choice",
            SchemaNodeKind::LeafList => "leaf-list",
            SchemaNodeKind::List => "list",
            SchemaNodeKind::Container => "container",
            _ => "leaf",
        };
        Err(ValidationError::MissingMandatoryNode {
            path: ErrorPath::leaf(parent.model_node_id(), schema_node.name().clone()),
            message: format!("mandatory {what} '{}' is missing", schema_node.name().local()),
        })
    }

    /// Runs when, must, leafref, mandatory and unique checks on the schema
    /// children of `node` and recurses into the instance tree. Stops at the
    /// first error.
    pub fn validate_subtree(&self, ctx: &mut ValidationContext, node: &NodeRef) -> Result<(), ValidationError> {
        let (navigator, path) = children_scope(&self.navigator, node);
        self.validate_children(ctx, node, navigator.as_ref(), &path)
    }

    fn validate_children(
        &self,
        ctx: &mut ValidationContext,
        node: &NodeRef,
        navigator: &dyn SchemaNavigator,
        path: &SchemaPath,
    ) -> Result<(), ValidationError> {
        for schema in navigator.children_of(path) {
            if !schema.kind().is_data_node() {
                if let Some(when) = schema.when()
                    && !self.validate_when(ctx, when, &schema, node)?
                {
                    continue;
                }
                self.check_mandatory(ctx, &schema, node)?;
                self.validate_children(ctx, node, navigator, schema.path())?;
                continue;
            }
            if let Some(when) = schema.when() {
                self.require_when(ctx, when, &schema, node)?;
            }
            for must in schema.must() {
                self.validate_must(ctx, must, &schema, node)?;
            }
            if let Some(leafref) = schema.leaf_type().and_then(LeafType::leafref_path)
                && !self.validate_leafref(ctx, leafref, &schema, node)?
            {
                return Err(ValidationError::InstanceRequired {
                    path: ErrorPath::leaf(node.model_node_id(), schema.name().clone()),
                    message: format!("leafref '{leafref}' has no target"),
                });
            }
            self.check_mandatory(ctx, &schema, node)?;
            if schema.kind() == SchemaNodeKind::List {
                check_unique(navigator, &schema, node)?;
            }
            if schema.kind().is_interior() {
                for child in attribute_items(node, schema.name()) {
                    if let Item::Node(child) = child {
                        self.validate_subtree(ctx, &child)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Literal a `current()`-rooted operand evaluates to: a single leaf value or
/// a string or number. State data is not consulted.
fn bound_literal(env: Env<'_>, focus: &Item, operand: &Expr) -> Option<Literal> {
    let mut scratch = ValidationContext::new();
    let result = Evaluator::new(env, &mut scratch, focus.clone()).evaluate(operand).ok()?;
    match result {
        EvalResult::Scalar(Scalar::String(s)) => Some(Literal::String(s)),
        EvalResult::Scalar(Scalar::Number(n)) => Some(Literal::Number(n)),
        EvalResult::NodeSet(items) => match items.as_slice() {
            [Item::Leaf { value: Scalar::Number(n), .. }] => Some(Literal::Number(*n)),
            [Item::Leaf { value, .. }] => Some(Literal::String(value.to_text().into())),
            _ => None,
        },
        EvalResult::Scalar(Scalar::Boolean(_)) | EvalResult::Bool(_) | EvalResult::Absent => None,
    }
}
