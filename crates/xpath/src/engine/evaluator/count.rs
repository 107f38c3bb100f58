//! `count()` over paths that climb the tree.
//!
//! A path that starts with `..` or `/` may reach the same node along several
//! routes. Such paths are counted with a depth-first walk that visits every
//! terminal node once. The result is memoized per start node and path text,
//! plus the `current()` node when a predicate refers to it.

use super::{EvalOutcome, Evaluator, Focus};
use crate::value::{EvalResult, Item};
use tracing::{debug, trace};
use yangval_core::{Expr, LocationPath, Step, ValidationError};

impl Evaluator<'_> {
    pub(in crate::engine) fn count(&mut self, arg: &Expr, focus: &Focus) -> EvalOutcome {
        match arg {
            Expr::Path(path) if path.is_absolute() || path.leading_parent_steps() > 0 => self.count_walk(path, focus),
            _ => Ok(match self.eval(arg, focus)? {
                EvalResult::NodeSet(items) => count_of(items.len()),
                _ => count_of(0),
            }),
        }
    }

    fn count_walk(&mut self, path: &LocationPath, focus: &Focus) -> EvalOutcome {
        let (start, steps): (Vec<Item>, &[Step]) = if path.is_absolute() {
            let Some((first, rest)) = path.steps().split_first() else {
                return Ok(count_of(0));
            };
            match self.absolute_start(first, rest, focus)? {
                Some(items) => (items, rest),
                None => return Ok(count_of(0)),
            }
        } else {
            let up = path.leading_parent_steps();
            let mut item = focus.item.clone();
            for _ in 0..up {
                match item.parent() {
                    Some(parent) => item = Item::Node(parent),
                    None => return Ok(count_of(0)),
                }
            }
            (vec![item], &path.steps()[up..])
        };
        let Some(first) = start.first() else {
            return Ok(count_of(0));
        };
        let start_id = first.id();
        let key = if path.steps().iter().flat_map(Step::predicates).any(Expr::contains_current) {
            format!("{path} @ {}", self.origin.id())
        } else {
            path.to_string()
        };
        if let Some(count) = self.ctx.memoized_count(&start_id, &key) {
            trace!(path = %key, count, "count served from memo");
            return Ok(count_of(count));
        }
        let counter = steps.last().map_or_else(|| ".".to_owned(), ToString::to_string);
        let outer = self.ctx.begin_count_walk();
        let walked = start.iter().try_for_each(|item| self.count_from(item, steps, 0, &counter));
        let count = self.ctx.take_step_count(&counter);
        self.ctx.end_count_walk(outer);
        walked?;
        self.ctx.memoize_count(start_id, key, count);
        Ok(count_of(count))
    }

    fn count_from(&mut self, item: &Item, steps: &[Step], depth: usize, counter: &str) -> Result<(), ValidationError> {
        let Some((step, rest)) = steps.split_first() else {
            if self.ctx.visit(item.id()) {
                self.ctx.bump_step_count(counter);
            }
            return Ok(());
        };
        if depth >= self.env.config.max_count_depth {
            debug!(depth, step = %step, "count walk depth limit reached");
            return Ok(());
        }
        let Some(candidates) = self.axis_items(item, step, rest)? else {
            return Ok(());
        };
        for next in self.apply_predicates(candidates, step.predicates())? {
            self.count_from(&next, rest, depth + 1, counter)?;
        }
        Ok(())
    }
}

#[allow(clippy::cast_precision_loss)]
fn count_of(n: usize) -> EvalResult {
    EvalResult::number(n as f64)
}
