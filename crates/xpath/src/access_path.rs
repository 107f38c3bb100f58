//! Reverse references of constraint expressions.
//!
//! For an expression attached to schema node `N`, every schema node `T` the
//! expression reads is mapped to the relative path that leads from `T` back
//! to `N`. A change to `T` can then find the constraints it affects.

use crate::names::{name_test, resolve_child};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use tracing::debug;
use yangval_core::{Axis, Expr, Function, LocationPath, SchemaNavigator, SchemaNode, SchemaPath, Step};

/// Relative path from a referenced node back to the constraint owner.
pub type AccessPath = LocationPath;

/// Referenced schema node to the access paths that lead back to the owner.
pub type AccessPathMap = BTreeMap<SchemaPath, Vec<AccessPath>>;

/// Maps each schema node `expr` reads to its access paths back to
/// `schema_node`.
///
/// Choice and case nodes never appear in access paths. A `..` step over a
/// node inside a choice leads to the container holding the choice.
pub fn resolve_references(navigator: &dyn SchemaNavigator, schema_node: &SchemaNode, expr: &Expr) -> AccessPathMap {
    let origin = schema_node.path().clone();
    let default_namespace = schema_node.name().namespace().to_owned();
    let mut resolver = Resolver { navigator, origin, default_namespace, references: BTreeMap::new() };
    let start = resolver.origin_route();
    resolver.expr(expr, &start);
    resolver.references
}

/// Schema position reached so far and the steps that lead back, in the order
/// they were taken.
#[derive(Clone)]
struct Route {
    at: SchemaPath,
    back: SmallVec<[Step; 8]>,
}

struct Resolver<'a> {
    navigator: &'a dyn SchemaNavigator,
    origin: SchemaPath,
    default_namespace: String,
    references: AccessPathMap,
}

impl Resolver<'_> {
    fn origin_route(&self) -> Route {
        Route { at: self.origin.clone(), back: SmallVec::new() }
    }

    /// Route at the schema root, holding the way down to the origin.
    fn absolute_route(&self) -> Route {
        let back = self
            .navigator
            .data_names_of(&self.origin)
            .iter()
            .rev()
            .map(|name| Step::child(name_test(self.navigator, name)))
            .collect();
        Route { at: SchemaPath::root(), back }
    }

    fn expr(&mut self, expr: &Expr, route: &Route) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Path(path) => {
                let start = if path.is_absolute() { self.absolute_route() } else { route.clone() };
                self.steps(path.steps(), start);
            }
            Expr::Binary { left, right, .. } => {
                self.expr(left, route);
                self.expr(right, route);
            }
            Expr::Negate(inner) => self.expr(inner, route),
            Expr::Call { func: Function::Current, .. } => {
                let origin = self.origin_route();
                self.terminal(&origin);
            }
            Expr::Call { args, .. } | Expr::Extension { args, .. } => {
                for arg in args {
                    self.expr(arg, route);
                }
            }
            Expr::Filter { base, predicates, steps } => {
                let starts = match base.as_ref() {
                    base if base.is_current() => vec![self.origin_route()],
                    Expr::Extension { name, args } if &**name == "deref" => {
                        self.expr(base, route);
                        self.deref_routes(args, route)
                    }
                    base => {
                        self.expr(base, route);
                        Vec::new()
                    }
                };
                for start in starts {
                    for predicate in predicates {
                        self.expr(predicate, &start);
                    }
                    self.steps(steps, start);
                }
            }
        }
    }

    fn steps(&mut self, steps: &[Step], route: Route) {
        let Some((step, rest)) = steps.split_first() else {
            self.terminal(&route);
            return;
        };
        for next in self.advance(&route, step) {
            for predicate in step.predicates() {
                self.expr(predicate, &next);
            }
            self.steps(rest, next);
        }
    }

    fn advance(&self, route: &Route, step: &Step) -> Vec<Route> {
        match step.axis() {
            Axis::SelfNode => vec![route.clone()],
            Axis::Parent => {
                let (Some(name), Some(parent)) = (route.at.last(), self.navigator.data_parent_of(&route.at)) else {
                    debug!(at = %route.at, "parent step above the schema root");
                    return Vec::new();
                };
                let mut back = route.back.clone();
                back.push(Step::child(name_test(self.navigator, name)));
                vec![Route { at: parent, back }]
            }
            Axis::Child => self
                .children(&route.at, step)
                .into_iter()
                .map(|at| {
                    let mut back = route.back.clone();
                    back.push(Step::parent());
                    Route { at, back }
                })
                .collect(),
        }
    }

    fn children(&self, at: &SchemaPath, step: &Step) -> Vec<SchemaPath> {
        let children: Vec<SchemaPath> = match step.test() {
            Some(test) => resolve_child(self.navigator, at, test, &self.default_namespace)
                .map(|child| child.path().clone())
                .into_iter()
                .collect(),
            None => self.navigator.data_children_of(at).iter().map(|child| child.path().clone()).collect(),
        };
        if children.is_empty() {
            debug!(at = %at, step = %step, "step does not resolve in the schema");
        }
        children
    }

    fn terminal(&mut self, route: &Route) {
        if route.at.is_root() {
            return;
        }
        let steps: Vec<Step> = route.back.iter().rev().cloned().collect();
        let path = if steps.is_empty() { LocationPath::relative(vec![Step::context()]) } else { LocationPath::relative(steps) };
        let paths = self.references.entry(route.at.clone()).or_default();
        let text = path.to_string();
        if !paths.iter().any(|known| known.to_string() == text) {
            paths.push(path);
        }
    }

    /// Routes starting at the targets of the leafrefs `args` select.
    fn deref_routes(&self, args: &[Expr], route: &Route) -> Vec<Route> {
        let Some(arg) = args.first() else {
            return Vec::new();
        };
        let mut routes = Vec::new();
        for leaf in self.targets_of(arg, route) {
            let Some(path) = self
                .navigator
                .data_node_at(&leaf)
                .and_then(|node| node.leaf_type().and_then(|leaf_type| leaf_type.leafref_path()).cloned())
            else {
                continue;
            };
            let from_leaf = Route { at: leaf, back: SmallVec::new() };
            for target in self.targets_of(&path, &from_leaf) {
                let mut back = self.absolute_route().back;
                back.extend((0..self.navigator.data_names_of(&target).len()).map(|_| Step::parent()));
                routes.push(Route { at: target, back });
            }
        }
        routes
    }

    /// Schema nodes a path expression ends on, predicates ignored.
    fn targets_of(&self, expr: &Expr, route: &Route) -> Vec<SchemaPath> {
        let (start, steps) = match expr {
            Expr::Path(path) if path.is_absolute() => (SchemaPath::root(), path.steps()),
            Expr::Path(path) => (route.at.clone(), path.steps()),
            Expr::Filter { base, steps, .. } if base.is_current() => (route.at.clone(), steps.as_slice()),
            _ => return Vec::new(),
        };
        let mut frontier = vec![Route { at: start, back: SmallVec::new() }];
        for step in steps {
            frontier = frontier.iter().flat_map(|route| self.advance(route, step)).collect();
        }
        frontier.into_iter().map(|route| route.at).filter(|at| !at.is_root()).collect()
    }
}
