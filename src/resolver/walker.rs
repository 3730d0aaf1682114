// src/resolver/walker.rs

//! Transitive expansion of unsatisfied dependencies
//!
//! The walker accumulates the concrete packages that must be installed
//! before a given package, and the printable dependency strings nothing
//! in the catalog can satisfy. It always returns: a missing hard
//! dependency becomes data for the caller, never an error.

use super::{selector, WalkState};
use crate::catalog::{Catalog, PkgId};
use crate::depend::{CompoundDepend, DependKind};
use crate::pkg::StateWant;
use tracing::{debug, error, warn};

/// Expand the dependency closure of a package
///
/// `unsatisfied` accumulates not-yet-installed packages required by
/// `pkg_id`, dependencies before dependents; the returned list holds the
/// printable form of every hard dependency with no available satisfier.
/// `pre_check` walks use a separate visited set so the selector's
/// resolvability probes never contaminate an ordinary walk.
pub fn fetch_unsatisfied(
    catalog: &Catalog,
    pkg_id: PkgId,
    unsatisfied: &mut Vec<PkgId>,
    pre_check: bool,
) -> (usize, Vec<String>) {
    let mut walk = WalkState::new();
    fetch_unsatisfied_with(catalog, pkg_id, unsatisfied, pre_check, &mut walk)
}

/// Whether a candidate's own dependency closure is fully resolvable;
/// used by the selector to filter candidates before scoring
pub(crate) fn deps_resolvable(catalog: &Catalog, pkg_id: PkgId, walk: &mut WalkState) -> bool {
    let mut depends = Vec::new();
    let (_, unresolved) = fetch_unsatisfied_with(catalog, pkg_id, &mut depends, true, walk);

    for dep in &unresolved {
        error!(
            "cannot find dependency {} for {}",
            dep,
            catalog.pkg(pkg_id).name
        );
    }
    unresolved.is_empty()
}

pub(crate) fn fetch_unsatisfied_with(
    catalog: &Catalog,
    pkg_id: PkgId,
    unsatisfied: &mut Vec<PkgId>,
    pre_check: bool,
    walk: &mut WalkState,
) -> (usize, Vec<String>) {
    let pkg = catalog.pkg(pkg_id);
    let Some(parent) = pkg.parent else {
        error!("Internal error, with pkg {}.", pkg.name);
        return (0, Vec::new());
    };

    // cycles and repeated visits stop here
    if !walk.mark(parent, pre_check) {
        return (0, Vec::new());
    }

    let mut the_lost: Vec<String> = Vec::new();

    for compound in &pkg.depends {
        if compound.kind == DependKind::GreedyDepend {
            walk_greedy(catalog, compound, unsatisfied, pre_check, walk);
            continue;
        }

        // an installed satisfier settles the compound outright
        let mut found = false;
        for atom in &compound.possibilities {
            let candidate = selector::best_candidate_with(
                catalog,
                atom.target,
                &|_, p| p.is_installed() && atom.satisfied_by(p),
                true,
                walk,
            );
            // the selector's later passes may hand back a candidate the
            // predicate rejects, so re-check
            if let Some(cand) = candidate {
                let scout = catalog.pkg(cand);
                if scout.is_installed() && atom.satisfied_by(scout) {
                    found = true;
                    break;
                }
            }
        }

        // otherwise any installable one
        let mut satisfier = None;
        if !found {
            for atom in &compound.possibilities {
                let candidate = selector::best_candidate_with(
                    catalog,
                    atom.target,
                    &|_, p| atom.satisfied_by(p),
                    true,
                    walk,
                );
                let Some(cand) = candidate else {
                    continue;
                };
                let scout = catalog.pkg(cand);
                if !atom.satisfied_by(scout) {
                    continue;
                }

                // user request overrides package recommendation
                if matches!(compound.kind, DependKind::Recommend | DependKind::Suggest)
                    && matches!(
                        scout.state_want,
                        StateWant::Deinstall | StateWant::Purge
                    )
                {
                    warn!(
                        "{}: ignoring recommendation for {} at user request",
                        pkg.name, scout.name
                    );
                    continue;
                }

                satisfier = Some(cand);
                break;
            }
        }

        if found {
            continue;
        }

        match satisfier {
            None => {
                // failure to meet recommendations is not an error
                if matches!(compound.kind, DependKind::Recommend | DependKind::Suggest) {
                    let first = &compound.possibilities[0];
                    warn!(
                        "{}: unsatisfied recommendation for {}",
                        pkg.name,
                        catalog.abstract_pkg(first.target).name
                    );
                } else {
                    the_lost.push(catalog.compound_str(compound));
                }
            }
            Some(cand) => {
                if compound.kind == DependKind::Suggest {
                    // just mention it politely
                    warn!(
                        "package {} suggests installing {}",
                        pkg.name,
                        catalog.pkg(cand).name
                    );
                    continue;
                }
                if cand == pkg_id || unsatisfied.contains(&cand) {
                    continue;
                }
                // a satisfier whose abstract is already on this walk is an
                // ancestor being processed; the cycle closes without
                // re-listing it
                let cand_parent = catalog.pkg(cand).parent;
                if cand_parent.is_some_and(|p| walk.contains(p, pre_check)) {
                    continue;
                }
                let (_, newstuff) =
                    fetch_unsatisfied_with(catalog, cand, unsatisfied, pre_check, walk);
                unsatisfied.push(cand);
                the_lost.extend(newstuff);
            }
        }
    }

    (unsatisfied.len(), the_lost)
}

/// Opportunistic expansion of one greedy compound: every provider version
/// whose own dependencies are already satisfied or queued gets added.
/// Greedy dependencies never fail the outer walk.
fn walk_greedy(
    catalog: &Catalog,
    compound: &CompoundDepend,
    unsatisfied: &mut Vec<PkgId>,
    pre_check: bool,
    walk: &mut WalkState,
) {
    for atom in &compound.possibilities {
        for &provider in &catalog.abstract_pkg(atom.target).provided_by {
            for &cand in &catalog.abstract_pkg(provider).versions {
                let scout = catalog.pkg(cand);
                if scout.state_want == StateWant::Install {
                    continue;
                }
                if scout.parent.map_or(true, |p| walk.contains(p, pre_check)) {
                    continue;
                }
                if unsatisfied.contains(&cand) {
                    continue;
                }

                let mut sub = Vec::new();
                let (_, newstuff) = fetch_unsatisfied_with(catalog, cand, &mut sub, pre_check, walk);
                if !newstuff.is_empty() {
                    debug!("Not installing {} due to broken depends.", scout.name);
                    continue;
                }

                let mut ok = true;
                for &required in &sub {
                    if catalog.pkg(required).state_want == StateWant::Install {
                        continue;
                    }
                    debug!(
                        "Not installing {} due to requirement for {}.",
                        scout.name,
                        catalog.pkg(required).name
                    );
                    ok = false;
                    break;
                }
                if ok {
                    warn!("Adding satisfier for greedy dependence {}.", scout.name);
                    unsatisfied.push(cand);
                }
            }
        }
    }
}
