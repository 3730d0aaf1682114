// src/resolver/selector.rs

//! Best-installation-candidate selection
//!
//! Given an abstract package, enumerate every provider (substituting
//! replacers), filter to architectures this system installs and to
//! candidates whose own dependency closure is resolvable, then choose by
//! a fixed precedence: predicate-gated name score, held or preferred
//! versions, the already-installed version, architecture priority, and
//! finally the latest sorted match when a single provider remains.

use super::{walker, WalkState};
use crate::catalog::{AbstractId, Catalog, PkgId};
use crate::pkg::{order_by_name_version_arch, Package, StateFlags, StateStatus};
use tracing::{debug, error, info, warn};

/// Pick the best concrete candidate for an abstract package
///
/// The predicate gates the name-scoring pass only; later passes may
/// return a candidate the predicate rejects (a held or installed
/// version), so callers that require the predicate must re-check the
/// result. `quiet` suppresses the architecture-priority fallback, which
/// is only meaningful for user-initiated selection.
pub fn best_installation_candidate<F>(
    catalog: &Catalog,
    apkg: AbstractId,
    constraint: F,
    quiet: bool,
) -> Option<PkgId>
where
    F: Fn(&Catalog, &Package) -> bool,
{
    let mut walk = WalkState::new();
    best_candidate_with(catalog, apkg, &constraint, quiet, &mut walk)
}

pub(crate) fn best_candidate_with(
    catalog: &Catalog,
    apkg: AbstractId,
    constraint: &dyn Fn(&Catalog, &Package) -> bool,
    quiet: bool,
    walk: &mut WalkState,
) -> Option<PkgId> {
    let ab = catalog.abstract_pkg(apkg);
    if ab.provided_by.is_empty() {
        return None;
    }

    debug!("Best installation candidate for {}:", ab.name);

    let providers = &ab.provided_by;
    if providers.len() > 1 {
        debug!("apkg={} nprovides={}.", ab.name, providers.len());
    }

    let mut matching_pkgs: Vec<PkgId> = Vec::new();
    let mut matching_apkgs: Vec<AbstractId> = Vec::new();
    let mut wrong_arch_found = false;

    for &listed in providers {
        let mut provider = listed;

        // a provider that has itself been replaced stands in for its
        // first replacer, unless the replacer is already listed
        if let Some(&replacement) = catalog.abstract_pkg(listed).replaced_by.first() {
            if catalog.abstract_pkg(listed).replaced_by.len() > 1 {
                warn!(
                    "Multiple replacers for {}, using first one ({}).",
                    catalog.abstract_pkg(listed).name,
                    catalog.abstract_pkg(replacement).name
                );
            }
            debug!(
                "replacement_apkg={} for provider_apkg={}.",
                catalog.abstract_pkg(replacement).name,
                catalog.abstract_pkg(listed).name
            );
            if replacement != listed {
                if providers.contains(&replacement) {
                    continue;
                }
                provider = replacement;
            }
        }

        let versions = &catalog.abstract_pkg(provider).versions;
        if versions.is_empty() {
            debug!(
                "No pkgs for provider_apkg {}.",
                catalog.abstract_pkg(provider).name
            );
            continue;
        }

        for &cand in versions {
            let pkg = catalog.pkg(cand);
            debug!(
                "{} arch={} arch_priority={} version={}.",
                pkg.name, pkg.architecture, pkg.arch_priority, pkg.version
            );
            if pkg.arch_priority > 0
                && !matching_pkgs.contains(&cand)
                && walker::deps_resolvable(catalog, cand, walk)
            {
                if !matching_apkgs.contains(&provider) {
                    matching_apkgs.push(provider);
                }
                matching_pkgs.push(cand);
            }
        }
        if matching_pkgs.is_empty() {
            wrong_arch_found = true;
        }
    }

    if matching_pkgs.is_empty() {
        if wrong_arch_found {
            error!(
                "Packages for {} found, but incompatible with the architectures configured",
                ab.name
            );
        }
        return None;
    }

    matching_pkgs.sort_by(|&a, &b| order_by_name_version_arch(catalog.pkg(a), catalog.pkg(b)));

    // name-scoring pass, gated on the caller's predicate
    let mut good_pkg_by_name = None;
    let mut good_score = 0;
    for &cand in &matching_pkgs {
        let pkg = catalog.pkg(cand);
        if !constraint(catalog, pkg) {
            continue;
        }
        let mut score = 1;
        if pkg.name == ab.name {
            score += 1;
        }
        if catalog.config().requested.iter().any(|r| r == &pkg.name) {
            score += 1;
        }
        debug!("Candidate: {} {} (score {}).", pkg.name, pkg.version, score);
        if score < good_score {
            continue;
        }
        good_pkg_by_name = Some(cand);
        good_score = score;
        // introduced by explicit path, so it is what the user wants
        if pkg.provided_by_hand {
            break;
        }
    }

    let mut latest_matching = None;
    let mut latest_installed_parent = None;
    let mut held_pkg: Option<PkgId> = None;
    for &cand in &matching_pkgs {
        let pkg = catalog.pkg(cand);
        latest_matching = Some(cand);
        let parent_status = pkg.parent.map(|p| catalog.abstract_pkg(p).status);
        if matches!(
            parent_status,
            Some(StateStatus::Installed | StateStatus::Unpacked)
        ) {
            latest_installed_parent = Some(cand);
        }
        if pkg
            .state_flags
            .intersects(StateFlags::HOLD | StateFlags::PREFER)
        {
            if let Some(previous) = held_pkg {
                warn!(
                    "Multiple packages ({} and {}) providing same name marked HOLD or PREFER. Using latest.",
                    catalog.pkg(previous).name, pkg.name
                );
            }
            held_pkg = Some(cand);
        }
    }

    let mut priorized_matching = None;
    if good_pkg_by_name.is_none()
        && held_pkg.is_none()
        && latest_installed_parent.is_none()
        && matching_apkgs.len() > 1
        && !quiet
    {
        let mut prio = 0;
        for &cand in &matching_pkgs {
            let pkg = catalog.pkg(cand);
            if pkg.arch_priority > prio {
                priorized_matching = Some(cand);
                prio = pkg.arch_priority;
                debug!("Match {} with priority {}.", pkg.name, prio);
            }
        }
    }

    if matching_apkgs.len() > 1 {
        info!(
            "{} matching pkgs for apkg={}:",
            matching_pkgs.len(),
            ab.name
        );
        for &cand in &matching_pkgs {
            let pkg = catalog.pkg(cand);
            info!("{} {} {}", pkg.name, pkg.version, pkg.architecture);
        }
    }

    if let Some(cand) = good_pkg_by_name {
        return Some(cand);
    }
    if let Some(cand) = held_pkg {
        info!("Using held package {}.", catalog.pkg(cand).name);
        return Some(cand);
    }
    if let Some(cand) = latest_installed_parent {
        info!(
            "Using latest version of installed package {}.",
            catalog.pkg(cand).name
        );
        return Some(cand);
    }
    if let Some(cand) = priorized_matching {
        let pkg = catalog.pkg(cand);
        info!(
            "Using priorized matching {} {} {}.",
            pkg.name, pkg.version, pkg.architecture
        );
        return Some(cand);
    }
    if matching_apkgs.len() > 1 {
        info!(
            "No matching pkg out of {} matching_apkgs.",
            matching_apkgs.len()
        );
        return None;
    }
    if let Some(cand) = latest_matching {
        let pkg = catalog.pkg(cand);
        info!(
            "Using latest matching {} {} {}.",
            pkg.name, pkg.version, pkg.architecture
        );
        return Some(cand);
    }
    None
}
