//! YANG 1.1 functions: `derived-from`, `derived-from-or-self`, `enum-value`,
//! `bit-is-set`, `re-match` and `deref`.

use crate::context::IdentityKey;
use crate::engine::evaluator::{EvalOutcome, Evaluator, Focus};
use crate::names::resolve_qname;
use crate::value::{EvalResult, Item};
use fancy_regex::Regex;
use itertools::Itertools;
use tracing::debug;
use yangval_core::{Expr, LeafType, ValidationError};

impl Evaluator<'_> {
    pub(in crate::engine) fn extension(&mut self, name: &str, args: &[Expr], focus: &Focus) -> EvalOutcome {
        match (name, args) {
            ("derived-from", [nodes, identity]) => self.derived_from(nodes, identity, false, focus),
            ("derived-from-or-self", [nodes, identity]) => self.derived_from(nodes, identity, true, focus),
            ("enum-value", [nodes]) => self.enum_value(nodes, focus),
            ("bit-is-set", [nodes, bit]) => self.bit_is_set(nodes, bit, focus),
            ("re-match", [subject, pattern]) => self.re_match(subject, pattern, focus),
            ("deref", [nodes]) => self.deref(nodes, focus),
            _ => Err(ValidationError::UnsupportedExtensionFunction {
                path: self.error_path(),
                function: format!("{name}/{}", args.len()),
            }),
        }
    }

    fn derived_from(&mut self, nodes: &Expr, identity: &Expr, include_self: bool, focus: &Focus) -> EvalOutcome {
        let subject = self.eval(nodes, focus)?;
        if subject.is_absent() {
            return Ok(EvalResult::Absent);
        }
        let expected_text = self.eval(identity, focus)?.to_text().unwrap_or_default();
        let expected = resolve_qname(
            self.navigator(self.origin.anchor()).as_ref(),
            &expected_text,
            &self.default_namespace,
        );
        let Some(expected) = expected else {
            debug!(identity = %expected_text, "identity literal does not resolve");
            return Ok(EvalResult::Bool(false));
        };
        for item in subject.items() {
            let Item::Leaf { owner, name, value } = item else {
                continue;
            };
            let navigator = self.navigator(owner);
            let Some(candidate) = resolve_qname(navigator.as_ref(), &value.to_text(), name.namespace()) else {
                continue;
            };
            let base = item
                .schema_node(navigator.as_ref())
                .and_then(|schema| schema.leaf_type().map(|leaf_type| leaf_type.identity_bases().iter().join(",")))
                .unwrap_or_default();
            let key = IdentityKey {
                base,
                expected: expected.to_string(),
                candidate: candidate.to_string(),
                include_self,
            };
            let derived = match self.ctx.identity_result(&key) {
                Some(cached) => cached,
                None => {
                    let derived = self.env.identities.is_derived_from(&expected, &candidate, include_self);
                    self.ctx.record_identity(key, derived)
                }
            };
            if derived {
                return Ok(EvalResult::Bool(true));
            }
        }
        Ok(EvalResult::Bool(false))
    }

    fn enum_value(&mut self, nodes: &Expr, focus: &Focus) -> EvalOutcome {
        let subject = self.eval(nodes, focus)?;
        if subject.is_absent() {
            return Ok(EvalResult::Absent);
        }
        let value = subject.items().iter().find_map(|item| {
            let label = item.scalar()?.to_text();
            let schema = item.schema_node(self.navigator(item.anchor()).as_ref())?;
            schema.leaf_type()?.enum_value(&label)
        });
        #[allow(clippy::cast_precision_loss)]
        let number = value.map_or(f64::NAN, |value| value as f64);
        Ok(EvalResult::number(number))
    }

    fn bit_is_set(&mut self, nodes: &Expr, bit: &Expr, focus: &Focus) -> EvalOutcome {
        let subject = self.eval(nodes, focus)?;
        if subject.is_absent() {
            return Ok(EvalResult::Absent);
        }
        let bit = self.eval(bit, focus)?.to_text().unwrap_or_default();
        let set = subject
            .items()
            .first()
            .and_then(Item::scalar)
            .is_some_and(|value| value.to_text().split_whitespace().any(|name| name == bit));
        Ok(EvalResult::Bool(set))
    }

    /// Whole-string match against an XSD-style pattern.
    fn re_match(&mut self, subject: &Expr, pattern: &Expr, focus: &Focus) -> EvalOutcome {
        let subject = self.eval(subject, focus)?;
        let Some(text) = subject.to_text().filter(|_| !subject.is_absent()) else {
            return Ok(EvalResult::Absent);
        };
        let pattern = self.eval(pattern, focus)?.to_text().unwrap_or_default();
        let matched = match Regex::new(&format!("^(?:{pattern})$")) {
            Ok(regex) => regex.is_match(&text).unwrap_or_else(|error| {
                debug!(%pattern, %error, "pattern evaluation failed");
                false
            }),
            Err(error) => {
                debug!(%pattern, %error, "invalid pattern");
                false
            }
        };
        Ok(EvalResult::Bool(matched))
    }

    /// Leaf nodes the first leafref in `nodes` points to.
    fn deref(&mut self, nodes: &Expr, focus: &Focus) -> EvalOutcome {
        let subject = self.eval(nodes, focus)?;
        if subject.is_absent() {
            return Ok(EvalResult::Absent);
        }
        let Some(leaf @ Item::Leaf { value, .. }) = subject.items().first() else {
            return Ok(EvalResult::NodeSet(Vec::new()));
        };
        let path = leaf
            .schema_node(self.navigator(leaf.anchor()).as_ref())
            .and_then(|schema| schema.leaf_type().and_then(LeafType::leafref_path).cloned());
        let Some(path) = path else {
            debug!(leaf = ?leaf, "deref of a leaf that is not a leafref");
            return Ok(EvalResult::NodeSet(Vec::new()));
        };
        let wanted = value.to_text();
        let targets = self.with_origin(leaf.clone(), |evaluator| {
            let focus = Focus::single(evaluator.origin.clone());
            evaluator.eval(&path, &focus)
        })?;
        let matched = targets
            .into_items()
            .into_iter()
            .filter(|target| target.string_value().as_deref() == Some(wanted.as_str()))
            .collect();
        Ok(EvalResult::NodeSet(matched))
    }
}
