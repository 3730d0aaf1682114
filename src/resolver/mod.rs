// src/resolver/mod.rs

//! Candidate selection, dependency walking, and conflict detection
//!
//! The resolver is greedy and deterministic: given an abstract package it
//! picks one best concrete candidate, expands its dependency closure into
//! an ordered set of packages to install, and reports installed packages
//! a candidate would collide with. There is no backtracking; an
//! unresolvable hard dependency comes back as data, not an error.

mod conflict;
mod selector;
mod walker;

pub use conflict::{fetch_conflicts, pkg_conflicts, pkg_replaces};
pub use selector::best_installation_candidate;
pub use walker::fetch_unsatisfied;

use crate::catalog::AbstractId;
use std::collections::HashSet;

/// Per-walk scratch state
///
/// Each top-level walk carries its own visited sets (one for ordinary
/// dependency walks, one for the resolvability pre-checks the selector
/// runs), threaded through the mutual recursion between the walker and
/// the selector. Cycles terminate because every recursion step has to
/// mark a fresh abstract package; nothing on the catalog itself is
/// mutated, so callers never clear anything between walks.
#[derive(Debug, Default)]
pub struct WalkState {
    visited: HashSet<AbstractId>,
    visited_pre: HashSet<AbstractId>,
}

impl WalkState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an abstract package visited; false if it already was
    fn mark(&mut self, id: AbstractId, pre_check: bool) -> bool {
        if pre_check {
            self.visited_pre.insert(id)
        } else {
            self.visited.insert(id)
        }
    }

    fn contains(&self, id: AbstractId, pre_check: bool) -> bool {
        if pre_check {
            self.visited_pre.contains(&id)
        } else {
            self.visited.contains(&id)
        }
    }
}
