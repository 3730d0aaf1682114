// src/lib.rs

//! Granary
//!
//! Dependency-resolution core of a lightweight package manager for
//! embedded Linux. Feeds (package indexes) and status files in stanza
//! format are parsed into an in-memory catalog of abstract names and
//! concrete versions; the catalog then answers which installed or
//! installable packages satisfy a request's dependency closure, which
//! conflict with it, and in what order to install.
//!
//! # Architecture
//!
//! - Catalog-first: one arena-backed graph of abstract packages (names)
//!   and concrete packages (versions), all cross-references by stable id
//! - Virtual packages: `Provides` registers capability names; the
//!   selector enumerates providers transparently
//! - Greedy resolution: deterministic candidate selection and transitive
//!   expansion, no backtracking; unresolvable names return as data
//! - Lazy detail: feed stanzas are only retained once something needs
//!   them, with a reload driver that iterates to a fixed point
//!
//! Fetching feeds, unpacking archives, and touching the filesystem are
//! collaborator concerns; this crate owns parsing and resolution only.

pub mod catalog;
pub mod checksum;
pub mod config;
pub mod depend;
mod error;
pub mod feeds;
pub mod parse;
pub mod pkg;
pub mod resolver;
pub mod version;

pub use catalog::{AbstractId, AbstractPackage, Catalog, PkgId};
pub use config::{ArchTable, Config};
pub use depend::{parse_compound, parse_deplist, CompoundDepend, Depend, DependKind};
pub use error::{Error, Result};
pub use feeds::{add_from_file, add_from_stream, Dest, Feed, FeedSet};
pub use parse::{parse_one, parse_stream, FieldMask, ParseContext};
pub use pkg::{
    order_by_name_version_arch, Alternative, Conffile, Package, StateFlags, StateStatus, StateWant,
};
pub use resolver::{
    best_installation_candidate, fetch_conflicts, fetch_unsatisfied, pkg_conflicts, pkg_replaces,
    WalkState,
};
pub use version::{PkgVersion, VersionConstraint};
