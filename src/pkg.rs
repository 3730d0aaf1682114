// src/pkg.rs

//! Concrete package records and their installation state
//!
//! A [`Package`] is one version of one name from one feed or installation
//! root. The state triple (want, flags, status) mirrors the `Status:`
//! line of a status file.

use crate::catalog::AbstractId;
use crate::depend::{CompoundDepend, DependKind};
use crate::version::PkgVersion;
use std::cmp::Ordering;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// What the user wants done with a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateWant {
    #[default]
    Unknown,
    Install,
    Deinstall,
    Purge,
}

impl StateWant {
    pub fn from_str(s: &str) -> Self {
        match s {
            "install" => Self::Install,
            "deinstall" => Self::Deinstall,
            "purge" => Self::Purge,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Install => "install",
            Self::Deinstall => "deinstall",
            Self::Purge => "purge",
        }
    }
}

/// How far installation of a package has progressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateStatus {
    #[default]
    NotInstalled,
    Unpacked,
    HalfConfigured,
    Installed,
    HalfInstalled,
    ConfigFiles,
    PostInstFailed,
    RemovalFailed,
}

impl StateStatus {
    pub fn from_str(s: &str) -> Self {
        match s {
            "unpacked" => Self::Unpacked,
            "half-configured" => Self::HalfConfigured,
            "installed" => Self::Installed,
            "half-installed" => Self::HalfInstalled,
            "config-files" => Self::ConfigFiles,
            "post-inst-failed" => Self::PostInstFailed,
            "removal-failed" => Self::RemovalFailed,
            _ => Self::NotInstalled,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotInstalled => "not-installed",
            Self::Unpacked => "unpacked",
            Self::HalfConfigured => "half-configured",
            Self::Installed => "installed",
            Self::HalfInstalled => "half-installed",
            Self::ConfigFiles => "config-files",
            Self::PostInstFailed => "post-inst-failed",
            Self::RemovalFailed => "removal-failed",
        }
    }
}

/// Per-package flag bits
///
/// The non-volatile set survives metadata merges: a re-parse of the same
/// package never clears a hold or user mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateFlags(u16);

impl StateFlags {
    pub const REINSTREQ: StateFlags = StateFlags(1);
    /// Never upgrade this version
    pub const HOLD: StateFlags = StateFlags(2);
    pub const REPLACE: StateFlags = StateFlags(4);
    /// Do not remove obsolete files
    pub const NOPRUNE: StateFlags = StateFlags(8);
    /// Prefer this version over sort order
    pub const PREFER: StateFlags = StateFlags(16);
    /// Old half of an upgrade pair
    pub const OBSOLETE: StateFlags = StateFlags(32);
    /// Scratch bit for the detail-reload driver
    pub const MARKED: StateFlags = StateFlags(64);
    /// Filelist needs rewriting
    pub const FILELIST_CHANGED: StateFlags = StateFlags(128);
    /// Explicitly requested by the user
    pub const USER: StateFlags = StateFlags(256);
    /// Full metadata required on the next feed reload
    pub const NEED_DETAIL: StateFlags = StateFlags(512);

    /// Flags a merge never overwrites
    pub const NONVOLATILE: StateFlags = StateFlags(2 | 8 | 16 | 32 | 256);

    pub const fn empty() -> Self {
        StateFlags(0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// All bits of `other` are set
    pub const fn contains(self, other: StateFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Any bit of `other` is set
    pub const fn intersects(self, other: StateFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: StateFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: StateFlags) {
        self.0 &= !other.0;
    }

    /// Flag for a single status-file token; `ok` and unknown tokens map
    /// to no flags
    pub fn from_str(s: &str) -> Self {
        match s {
            "reinstreq" => Self::REINSTREQ,
            "hold" => Self::HOLD,
            "replace" => Self::REPLACE,
            "noprune" => Self::NOPRUNE,
            "prefer" => Self::PREFER,
            "obsolete" => Self::OBSOLETE,
            "user" => Self::USER,
            _ => Self::empty(),
        }
    }
}

impl BitOr for StateFlags {
    type Output = StateFlags;
    fn bitor(self, rhs: StateFlags) -> StateFlags {
        StateFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for StateFlags {
    fn bitor_assign(&mut self, rhs: StateFlags) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for StateFlags {
    type Output = StateFlags;
    fn bitand(self, rhs: StateFlags) -> StateFlags {
        StateFlags(self.0 & rhs.0)
    }
}

impl Not for StateFlags {
    type Output = StateFlags;
    fn not(self) -> StateFlags {
        StateFlags(!self.0)
    }
}

/// A configuration file tracked with its expected checksum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conffile {
    pub path: String,
    pub md5: String,
}

/// An update-alternatives-style slot provided by a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative {
    pub prio: i32,
    pub path: String,
    pub altpath: String,
}

/// A concrete package: one version of one name from one source or
/// installation destination
#[derive(Debug, Clone, Default)]
pub struct Package {
    pub name: String,
    /// Back-reference to the abstract package of the same name; set when
    /// the package is inserted into a catalog
    pub parent: Option<AbstractId>,

    pub version: PkgVersion,
    pub architecture: String,
    /// Priority from the configured architecture table; 0 means not
    /// installable on this system
    pub arch_priority: i32,

    /// Feed this record came from
    pub src: Option<String>,
    /// Installation root this record is installed into
    pub dest: Option<String>,

    pub state_want: StateWant,
    pub state_status: StateStatus,
    pub state_flags: StateFlags,

    pub essential: bool,
    /// Introduced by explicit path; the selector always picks it
    pub provided_by_hand: bool,
    /// Pulled in to satisfy another package rather than requested
    pub auto_installed: bool,

    /// Depends, Pre-Depends, Recommends, Suggests, and greedy entries in
    /// parse order; the kind tag distinguishes them
    pub depends: Vec<CompoundDepend>,
    pub conflicts: Vec<CompoundDepend>,
    pub provides: Vec<AbstractId>,
    pub replaces: Vec<AbstractId>,

    pub conffiles: Vec<Conffile>,
    pub alternatives: Vec<Alternative>,

    pub description: Option<String>,
    pub maintainer: Option<String>,
    pub section: Option<String>,
    pub priority: Option<String>,
    pub source: Option<String>,
    pub tags: Option<String>,
    pub filename: Option<String>,
    pub abi_version: Option<String>,
    pub size: u64,
    pub installed_size: u64,
    pub installed_time: u64,
    pub md5sum: Option<String>,
    pub sha256sum: Option<String>,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installed or unpacked on some destination
    pub fn is_installed(&self) -> bool {
        matches!(
            self.state_status,
            StateStatus::Installed | StateStatus::Unpacked
        )
    }

    /// Compounds of one dependency kind, in parse order
    pub fn depends_of_kind(&self, kind: DependKind) -> impl Iterator<Item = &CompoundDepend> {
        self.depends.iter().filter(move |c| c.kind == kind)
    }

    /// Hard requirements: Depends and Pre-Depends compounds
    pub fn hard_depends(&self) -> impl Iterator<Item = &CompoundDepend> {
        self.depends
            .iter()
            .filter(|c| matches!(c.kind, DependKind::Depend | DependKind::PreDepend))
    }

    /// Conffile entry for a path, if the package tracks it
    pub fn get_conffile(&self, path: &str) -> Option<&Conffile> {
        self.conffiles.iter().find(|c| c.path == path)
    }

    /// Whether this package's conflicts list names the given abstract
    pub fn conflicts_with_abstract(&self, target: AbstractId) -> bool {
        self.conflicts
            .iter()
            .flat_map(|c| &c.possibilities)
            .any(|atom| atom.target == target)
    }

    /// Merge a newer parse of the same `(name, version, architecture)`
    /// into this record
    ///
    /// The newer parse wins for any metadata it actually carries; the
    /// identifying triple is never touched. State flags are ORed in
    /// except the non-volatile set, which only this record controls.
    /// `set_status` forwards the want/status pair (status-file loads).
    pub fn merge(&mut self, new: Package, set_status: bool) {
        if !new.depends.is_empty() {
            self.depends = new.depends;
        }
        if !new.conflicts.is_empty() {
            self.conflicts = new.conflicts;
        }
        if !new.provides.is_empty() {
            self.provides = new.provides;
        }
        if !new.replaces.is_empty() {
            self.replaces = new.replaces;
        }
        if !new.conffiles.is_empty() {
            self.conffiles = new.conffiles;
        }
        if !new.alternatives.is_empty() {
            self.alternatives = new.alternatives;
        }

        self.description = new.description.or(self.description.take());
        self.maintainer = new.maintainer.or(self.maintainer.take());
        self.section = new.section.or(self.section.take());
        self.priority = new.priority.or(self.priority.take());
        self.source = new.source.or(self.source.take());
        self.tags = new.tags.or(self.tags.take());
        self.filename = new.filename.or(self.filename.take());
        self.abi_version = new.abi_version.or(self.abi_version.take());
        self.md5sum = new.md5sum.or(self.md5sum.take());
        self.sha256sum = new.sha256sum.or(self.sha256sum.take());
        if new.size != 0 {
            self.size = new.size;
        }
        if new.installed_size != 0 {
            self.installed_size = new.installed_size;
        }
        if new.installed_time != 0 {
            self.installed_time = new.installed_time;
        }

        if new.src.is_some() {
            self.src = new.src;
        }
        if new.dest.is_some() {
            self.dest = new.dest;
        }

        self.essential |= new.essential;
        self.provided_by_hand |= new.provided_by_hand;
        self.auto_installed |= new.auto_installed;
        self.state_flags |= new.state_flags & !StateFlags::NONVOLATILE;

        if set_status {
            self.state_want = new.state_want;
            self.state_status = new.state_status;
        }
    }
}

/// Sort key used by the candidate selector: name, then version, then
/// architecture, ascending
pub fn order_by_name_version_arch(a: &Package, b: &Package) -> Ordering {
    a.name
        .cmp(&b.name)
        .then_with(|| a.version.cmp(&b.version))
        .then_with(|| a.architecture.cmp(&b.architecture))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trip() {
        for s in ["unknown", "install", "deinstall", "purge"] {
            assert_eq!(StateWant::from_str(s).as_str(), s);
        }
        for s in ["not-installed", "unpacked", "installed", "config-files"] {
            assert_eq!(StateStatus::from_str(s).as_str(), s);
        }
        assert_eq!(StateWant::from_str("bogus"), StateWant::Unknown);
        assert_eq!(StateStatus::from_str("bogus"), StateStatus::NotInstalled);
    }

    #[test]
    fn test_flags_bit_ops() {
        let mut f = StateFlags::empty();
        f.insert(StateFlags::HOLD);
        f |= StateFlags::NEED_DETAIL;
        assert!(f.contains(StateFlags::HOLD));
        assert!(f.intersects(StateFlags::HOLD | StateFlags::PREFER));
        assert!(!f.contains(StateFlags::HOLD | StateFlags::PREFER));
        f.remove(StateFlags::HOLD);
        assert!(!f.intersects(StateFlags::HOLD));
    }

    #[test]
    fn test_merge_preserves_nonvolatile_flags() {
        let mut old = Package::new();
        old.state_flags = StateFlags::HOLD | StateFlags::USER;

        let mut new = Package::new();
        new.state_flags = StateFlags::OBSOLETE | StateFlags::FILELIST_CHANGED;
        old.merge(new, false);

        // volatile bits ORed in, non-volatile bits from the new parse dropped
        assert!(old.state_flags.contains(StateFlags::HOLD));
        assert!(old.state_flags.contains(StateFlags::USER));
        assert!(old.state_flags.contains(StateFlags::FILELIST_CHANGED));
        assert!(!old.state_flags.contains(StateFlags::OBSOLETE));
    }

    #[test]
    fn test_merge_newer_metadata_wins() {
        let mut old = Package::new();
        old.description = Some("old".into());
        old.size = 100;

        let mut new = Package::new();
        new.description = Some("new".into());
        new.maintainer = Some("someone".into());
        old.merge(new, false);

        assert_eq!(old.description.as_deref(), Some("new"));
        assert_eq!(old.maintainer.as_deref(), Some("someone"));
        assert_eq!(old.size, 100);
    }

    #[test]
    fn test_merge_set_status() {
        let mut old = Package::new();
        let mut new = Package::new();
        new.state_want = StateWant::Install;
        new.state_status = StateStatus::Installed;

        old.merge(new.clone(), false);
        assert_eq!(old.state_status, StateStatus::NotInstalled);

        old.merge(new, true);
        assert_eq!(old.state_want, StateWant::Install);
        assert_eq!(old.state_status, StateStatus::Installed);
    }
}
