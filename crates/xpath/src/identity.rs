//! Identity derivation checks for `derived-from` and `derived-from-or-self`.
//!
//! Identities live in an arena indexed by `usize`; every entry lists the
//! identities directly derived from it. Results are memoized by index pair,
//! which is safe to share between requests because the graph is schema data.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::trace;
use yangval_core::{IdentityDecl, QName};

#[derive(Debug)]
struct IdentityEntry {
    name: QName,
    derived: Vec<usize>,
}

#[derive(Debug, Default)]
pub struct IdentityResolver {
    arena: Vec<IdentityEntry>,
    index: HashMap<QName, usize>,
    memo: RwLock<HashMap<(usize, usize, bool), bool>>,
}

impl IdentityResolver {
    pub fn new(decls: &[IdentityDecl]) -> Self {
        let mut resolver = Self::default();
        for decl in decls {
            resolver.intern(&decl.name);
            for base in &decl.bases {
                resolver.intern(base);
            }
        }
        for decl in decls {
            let derived = resolver.index[&decl.name];
            for base in &decl.bases {
                let base = resolver.index[base];
                if !resolver.arena[base].derived.contains(&derived) {
                    resolver.arena[base].derived.push(derived);
                }
            }
        }
        resolver
    }

    fn intern(&mut self, name: &QName) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.arena.len();
        self.arena.push(IdentityEntry { name: name.clone(), derived: Vec::new() });
        self.index.insert(name.clone(), idx);
        idx
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains(&self, name: &QName) -> bool {
        self.index.contains_key(name)
    }

    /// True when `candidate` is reachable from `base` along derivation edges,
    /// or equals `base` and `include_self` is set. Unknown names never match.
    pub fn is_derived_from(&self, base: &QName, candidate: &QName, include_self: bool) -> bool {
        let (Some(&base_idx), Some(&candidate_idx)) = (self.index.get(base), self.index.get(candidate)) else {
            return false;
        };
        let key = (base_idx, candidate_idx, include_self);
        if let Some(&hit) = self.memo.read().unwrap_or_else(PoisonError::into_inner).get(&key) {
            return hit;
        }
        let result = if base_idx == candidate_idx { include_self } else { self.search(base_idx, candidate_idx) };
        trace!(base = %self.arena[base_idx].name, candidate = %self.arena[candidate_idx].name, include_self, result, "identity check");
        self.memo.write().unwrap_or_else(PoisonError::into_inner).insert(key, result);
        result
    }

    /// Depth-first search below `from` for `target`; `from` itself is excluded.
    fn search(&self, from: usize, target: usize) -> bool {
        let mut seen = vec![false; self.arena.len()];
        let mut stack: Vec<usize> = self.arena[from].derived.clone();
        while let Some(idx) = stack.pop() {
            if idx == target {
                return true;
            }
            if std::mem::replace(&mut seen[idx], true) {
                continue;
            }
            stack.extend(self.arena[idx].derived.iter().rev().copied());
        }
        false
    }

    /// Number of memoized results; exposed for cache behaviour tests.
    pub fn cached_results(&self) -> usize {
        self.memo.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}
