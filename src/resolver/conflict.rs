// src/resolver/conflict.rs

//! Conflict detection
//!
//! Reports the installed (or install-marked) packages a candidate would
//! collide with. A package that both replaces and conflicts with a name
//! is upgrading it, not colliding with it, so replaced names are
//! excluded.

use crate::catalog::{Catalog, PkgId};
use crate::pkg::{Package, StateStatus, StateWant};
use tracing::error;

/// Installed or install-marked packages matching any of `pkg_id`'s
/// conflict atoms, minus the names `pkg_id` replaces
pub fn fetch_conflicts(catalog: &Catalog, pkg_id: PkgId) -> Vec<PkgId> {
    let pkg = catalog.pkg(pkg_id);
    if pkg.parent.is_none() {
        error!("Internal error: {} not in hash table", pkg.name);
        return Vec::new();
    }

    let mut installed_conflicts: Vec<PkgId> = Vec::new();

    for compound in &pkg.conflicts {
        for atom in &compound.possibilities {
            for &cand in &catalog.abstract_pkg(atom.target).versions {
                let scout = catalog.pkg(cand);
                let active = scout.state_status == StateStatus::Installed
                    || scout.state_want == StateWant::Install;
                if active
                    && atom.satisfied_by(scout)
                    && !replaces_name(pkg, scout)
                    && !installed_conflicts.contains(&cand)
                {
                    installed_conflicts.push(cand);
                }
            }
        }
    }

    installed_conflicts
}

/// The conflicting package is one `pkg` replaces by name, i.e. the
/// conflict is really an upgrade
fn replaces_name(pkg: &Package, scout: &Package) -> bool {
    scout.parent.is_some_and(|p| pkg.replaces.contains(&p))
}

/// Whether `pkg`'s replaces list covers any name `replacee` provides
pub fn pkg_replaces(pkg: &Package, replacee: &Package) -> bool {
    pkg.replaces
        .iter()
        .any(|name| replacee.provides.contains(name))
}

/// Whether `pkg`'s conflicts list covers any name `conflictee` provides
pub fn pkg_conflicts(pkg: &Package, conflictee: &Package) -> bool {
    conflictee
        .provides
        .iter()
        .any(|&name| pkg.conflicts_with_abstract(name))
}
