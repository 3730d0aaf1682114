// src/catalog.rs

//! The package catalog
//!
//! One abstract package per name, holding the concrete versions that bear
//! the name plus the provider, replacer, and reverse-dependency edges.
//! The catalog owns every node in two arenas; all cross-references are
//! stable arena ids, which keeps the cyclic graph safe to build and walk
//! without shared ownership.

use crate::config::Config;
use crate::depend::{CompoundDepend, Depend, DependKind};
use crate::pkg::{Package, StateFlags, StateStatus};
use std::collections::HashMap;
use tracing::debug;

/// Handle to an [`AbstractPackage`] in a catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AbstractId(u32);

/// Handle to a concrete [`Package`] in a catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PkgId(u32);

/// A package name: zero or more concrete versions plus the graph edges
/// that tie names together
#[derive(Debug)]
pub struct AbstractPackage {
    pub name: String,
    /// Concrete packages bearing this name, in insertion order
    pub versions: Vec<PkgId>,
    /// Abstracts whose concrete versions declare this name in `Provides`
    /// (contains `self` whenever a concrete version exists)
    pub provided_by: Vec<AbstractId>,
    /// Abstracts that both replace and conflict with this name; the
    /// selector silently substitutes the first as an upgrade
    pub replaced_by: Vec<AbstractId>,
    /// Abstracts whose versions depend on, pre-depend on, or recommend
    /// this name
    pub depended_upon_by: Vec<AbstractId>,
    /// Highest installation state any concrete version has reached
    pub status: StateStatus,
    /// NEED_DETAIL and MARKED bits for the detail-reload driver
    pub flags: StateFlags,
}

impl AbstractPackage {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            versions: Vec::new(),
            provided_by: Vec::new(),
            replaced_by: Vec::new(),
            depended_upon_by: Vec::new(),
            status: StateStatus::NotInstalled,
            flags: StateFlags::empty(),
        }
    }
}

/// Hash-backed store of every known package name
pub struct Catalog {
    config: Config,
    abstracts: Vec<AbstractPackage>,
    packages: Vec<Package>,
    by_name: HashMap<String, AbstractId>,
}

impl Catalog {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            abstracts: Vec::new(),
            packages: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Look up an abstract package by name
    pub fn lookup(&self, name: &str) -> Option<AbstractId> {
        self.by_name.get(name).copied()
    }

    /// Abstract package for a name, created on first reference
    pub fn ensure_abstract(&mut self, name: &str) -> AbstractId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = AbstractId(self.abstracts.len() as u32);
        self.abstracts.push(AbstractPackage::new(name));
        self.by_name.insert(name.to_string(), id);
        id
    }

    pub fn abstract_pkg(&self, id: AbstractId) -> &AbstractPackage {
        &self.abstracts[id.0 as usize]
    }

    pub fn abstract_pkg_mut(&mut self, id: AbstractId) -> &mut AbstractPackage {
        &mut self.abstracts[id.0 as usize]
    }

    pub fn pkg(&self, id: PkgId) -> &Package {
        &self.packages[id.0 as usize]
    }

    pub fn pkg_mut(&mut self, id: PkgId) -> &mut Package {
        &mut self.packages[id.0 as usize]
    }

    pub fn abstract_ids(&self) -> impl Iterator<Item = AbstractId> {
        (0..self.abstracts.len() as u32).map(AbstractId)
    }

    pub fn package_ids(&self) -> impl Iterator<Item = PkgId> {
        (0..self.packages.len() as u32).map(PkgId)
    }

    /// Insert a concrete package, merging if the catalog already holds a
    /// record with the same `(name, version, architecture)`
    ///
    /// Registers the provider, replaced-by, and reverse-dependency edges
    /// and propagates the NEED_DETAIL flag to every abstract the package
    /// references. `set_status` forwards the parsed state triple into an
    /// existing record (status-file loads).
    pub fn insert(&mut self, mut pkg: Package, set_status: bool) -> PkgId {
        let parent = self.ensure_abstract(&pkg.name);

        // aggregate status on the abstract node, promoted only
        match pkg.state_status {
            StateStatus::Installed => {
                self.abstract_pkg_mut(parent).status = StateStatus::Installed;
            }
            StateStatus::Unpacked => {
                let ab = self.abstract_pkg_mut(parent);
                if ab.status != StateStatus::Installed {
                    ab.status = StateStatus::Unpacked;
                }
            }
            _ => {}
        }

        // every package provides its own name
        if !pkg.provides.contains(&parent) {
            pkg.provides.insert(0, parent);
        }

        if pkg.state_flags.contains(StateFlags::NEED_DETAIL) {
            self.flag_related(&pkg);
        }

        for &provided in &pkg.provides {
            let ab = self.abstract_pkg_mut(provided);
            if !ab.provided_by.contains(&parent) {
                ab.provided_by.push(parent);
            }
        }

        // a package that both replaces and conflicts with a name becomes
        // its silent upgrade
        for &replaced in &pkg.replaces {
            if pkg.conflicts_with_abstract(replaced) {
                let ab = self.abstract_pkg_mut(replaced);
                if !ab.replaced_by.contains(&parent) {
                    ab.replaced_by.push(parent);
                }
            }
        }

        for compound in &pkg.depends {
            if !matches!(
                compound.kind,
                DependKind::Depend | DependKind::PreDepend | DependKind::Recommend
            ) {
                continue;
            }
            for atom in &compound.possibilities {
                let ab = self.abstract_pkg_mut(atom.target);
                if !ab.depended_upon_by.contains(&parent) {
                    ab.depended_upon_by.push(parent);
                }
            }
        }

        let existing = self
            .abstract_pkg(parent)
            .versions
            .iter()
            .copied()
            .find(|&id| {
                let known = self.pkg(id);
                known.version == pkg.version && known.architecture == pkg.architecture
            });

        if let Some(id) = existing {
            self.pkg_mut(id).merge(pkg, set_status);
            return id;
        }

        let id = PkgId(self.packages.len() as u32);
        pkg.parent = Some(parent);
        self.packages.push(pkg);
        self.abstract_pkg_mut(parent).versions.push(id);
        id
    }

    /// Propagate NEED_DETAIL to every abstract the package references
    fn flag_related(&mut self, pkg: &Package) {
        let mut related: Vec<AbstractId> = Vec::new();
        related.extend(&pkg.provides);
        related.extend(&pkg.replaces);
        for compound in pkg.depends.iter().chain(&pkg.conflicts) {
            related.extend(compound.possibilities.iter().map(|a| a.target));
        }
        for id in related {
            let ab = self.abstract_pkg_mut(id);
            if !ab.flags.contains(StateFlags::NEED_DETAIL) {
                debug!("propagating detail flag to related abstract {}", ab.name);
                ab.flags.insert(StateFlags::NEED_DETAIL);
            }
        }
    }

    /// Concrete versions reachable from a name; a purely virtual name
    /// falls back to the versions of its first provider
    pub fn versions_of_name(&self, name: &str) -> Vec<PkgId> {
        let Some(id) = self.lookup(name) else {
            return Vec::new();
        };
        let ab = self.abstract_pkg(id);
        if !ab.versions.is_empty() {
            return ab.versions.clone();
        }
        match ab.provided_by.first() {
            Some(&provider) => self.abstract_pkg(provider).versions.clone(),
            None => Vec::new(),
        }
    }

    /// Best installation candidate for a name (§ selector), preferring a
    /// candidate actually bearing the name
    pub fn fetch_best(&self, name: &str) -> Option<PkgId> {
        let apkg = self.lookup(name)?;
        crate::resolver::best_installation_candidate(
            self,
            apkg,
            |_, pkg| pkg.name == name,
            false,
        )
    }

    /// Concrete package with an exact rendered version string
    pub fn fetch_by_name_version(&self, name: &str, version: &str) -> Option<PkgId> {
        self.versions_of_name(name)
            .into_iter()
            .find(|&id| self.pkg(id).version.to_string() == version)
    }

    /// First installed or unpacked version reachable from a name
    pub fn fetch_installed(&self, name: &str) -> Option<PkgId> {
        self.versions_of_name(name)
            .into_iter()
            .find(|&id| self.pkg(id).is_installed())
    }

    /// Installed or unpacked version on a specific destination
    pub fn fetch_installed_by_dest(&self, name: &str, dest: &str) -> Option<PkgId> {
        self.versions_of_name(name).into_iter().find(|&id| {
            let pkg = self.pkg(id);
            pkg.is_installed() && pkg.dest.as_deref() == Some(dest)
        })
    }

    /// Every concrete package known to the catalog
    pub fn fetch_all_available(&self) -> Vec<PkgId> {
        self.package_ids().collect()
    }

    /// Every installed or unpacked concrete package
    pub fn fetch_all_installed(&self) -> Vec<PkgId> {
        self.package_ids()
            .filter(|&id| self.pkg(id).is_installed())
            .collect()
    }

    /// Whether any provider of the atom's target has a concrete version
    /// satisfying the constraint
    pub fn dependence_satisfiable(&self, dep: &Depend) -> bool {
        self.abstract_pkg(dep.target)
            .provided_by
            .iter()
            .flat_map(|&provider| &self.abstract_pkg(provider).versions)
            .any(|&id| dep.satisfied_by(self.pkg(id)))
    }

    /// Flag a name as requiring full metadata on the next feed reload
    pub fn mark_need_detail(&mut self, name: &str) {
        let id = self.ensure_abstract(name);
        self.abstract_pkg_mut(id)
            .flags
            .insert(StateFlags::NEED_DETAIL);
    }

    /// One sweep of the detail-reload driver: count abstracts still
    /// flagged NEED_DETAIL but not yet seen, marking them seen
    pub fn flag_unmarked_details(&mut self) -> usize {
        let mut count = 0;
        for ab in &mut self.abstracts {
            if !ab.flags.contains(StateFlags::NEED_DETAIL) {
                continue;
            }
            if ab.flags.contains(StateFlags::MARKED) {
                debug!("skipping already seen flagged abstract {}", ab.name);
                continue;
            }
            debug!("found yet incomplete flagged abstract {}", ab.name);
            count += 1;
            ab.flags.insert(StateFlags::MARKED);
        }
        count
    }

    /// Printable form of a dependency atom, e.g. `libfoo (>= 1.2)`
    pub fn depend_str(&self, atom: &Depend) -> String {
        let name = &self.abstract_pkg(atom.target).name;
        match &atom.version {
            None => name.clone(),
            Some(version) => format!("{} ({}{})", name, atom.constraint.op_str(), version),
        }
    }

    /// Printable form of a compound dependency, alternatives joined with
    /// ` | `
    pub fn compound_str(&self, compound: &CompoundDepend) -> String {
        compound
            .possibilities
            .iter()
            .map(|atom| self.depend_str(atom))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}
