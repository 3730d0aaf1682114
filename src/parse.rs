// src/parse.rs

//! Stanza (control-file) parsing
//!
//! Feeds and status files are streams of RFC-822-style stanzas separated
//! by blank lines: `Field: value` lines plus space-indented continuation
//! lines. Each completed stanza yields one populated [`Package`] through
//! a callback. Parsing is best-effort; malformed fields are logged and
//! skipped, and a stanza without a `Package:` name is discarded silently.

use crate::catalog::Catalog;
use crate::depend::{parse_deplist, DependKind};
use crate::pkg::{Alternative, Conffile, Package, StateFlags, StateStatus, StateWant};
use crate::version::PkgVersion;
use std::io::BufRead;
use tracing::{debug, error};

/// Bit mask of stanza fields to suppress during a parse
///
/// The per-call mask is ORed with the catalog's global mask
/// ([`crate::Config::field_mask`]); a set bit means the field is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldMask(u32);

impl FieldMask {
    pub const PACKAGE: FieldMask = FieldMask(1);
    pub const VERSION: FieldMask = FieldMask(1 << 1);
    pub const ARCHITECTURE: FieldMask = FieldMask(1 << 2);
    pub const DEPENDS: FieldMask = FieldMask(1 << 3);
    pub const PRE_DEPENDS: FieldMask = FieldMask(1 << 4);
    pub const RECOMMENDS: FieldMask = FieldMask(1 << 5);
    pub const SUGGESTS: FieldMask = FieldMask(1 << 6);
    pub const CONFLICTS: FieldMask = FieldMask(1 << 7);
    pub const REPLACES: FieldMask = FieldMask(1 << 8);
    pub const PROVIDES: FieldMask = FieldMask(1 << 9);
    pub const SECTION: FieldMask = FieldMask(1 << 10);
    pub const PRIORITY: FieldMask = FieldMask(1 << 11);
    pub const SOURCE: FieldMask = FieldMask(1 << 12);
    pub const MAINTAINER: FieldMask = FieldMask(1 << 13);
    pub const FILENAME: FieldMask = FieldMask(1 << 14);
    pub const SIZE: FieldMask = FieldMask(1 << 15);
    pub const INSTALLED_SIZE: FieldMask = FieldMask(1 << 16);
    pub const INSTALLED_TIME: FieldMask = FieldMask(1 << 17);
    pub const MD5SUM: FieldMask = FieldMask(1 << 18);
    pub const SHA256SUM: FieldMask = FieldMask(1 << 19);
    pub const DESCRIPTION: FieldMask = FieldMask(1 << 20);
    pub const CONFFILES: FieldMask = FieldMask(1 << 21);
    pub const ALTERNATIVES: FieldMask = FieldMask(1 << 22);
    pub const TAGS: FieldMask = FieldMask(1 << 23);
    pub const ESSENTIAL: FieldMask = FieldMask(1 << 24);
    pub const AUTO_INSTALLED: FieldMask = FieldMask(1 << 25);
    pub const STATUS: FieldMask = FieldMask(1 << 26);
    pub const ABIVERSION: FieldMask = FieldMask(1 << 27);

    pub const fn empty() -> Self {
        FieldMask(0)
    }

    pub const fn contains(self, other: FieldMask) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for FieldMask {
    type Output = FieldMask;
    fn bitor(self, rhs: FieldMask) -> FieldMask {
        FieldMask(self.0 | rhs.0)
    }
}

/// Per-call context for a stanza parse
#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    /// Fields to skip, ORed with the catalog's global mask
    pub mask: FieldMask,
    /// Feed name stamped onto every emitted package
    pub src: Option<String>,
    /// Destination name stamped onto every emitted package
    pub dest: Option<String>,
    /// State flags seeded onto every emitted package before parsing
    pub seed_flags: StateFlags,
}

struct StanzaState {
    pkg: Package,
    description: String,
    reading_description: bool,
    reading_conffiles: bool,
}

impl StanzaState {
    fn new(ctx: &ParseContext) -> Self {
        let mut pkg = Package::new();
        pkg.src = ctx.src.clone();
        pkg.dest = ctx.dest.clone();
        pkg.state_flags = ctx.seed_flags;
        Self {
            pkg,
            description: String::new(),
            reading_description: false,
            reading_conffiles: false,
        }
    }

    fn finish(mut self) -> Option<Package> {
        if self.pkg.name.is_empty() {
            // probably just a blank stanza
            return None;
        }
        if !self.description.is_empty() {
            self.pkg.description = Some(std::mem::take(&mut self.description));
        }
        Some(self.pkg)
    }
}

/// Parse a stream of stanzas, invoking `emit` once per completed package
///
/// The catalog is threaded through so dependency and provides parsing can
/// create placeholder abstract packages as names are first referenced.
pub fn parse_stream<R: BufRead>(
    catalog: &mut Catalog,
    reader: R,
    ctx: &ParseContext,
    emit: &mut dyn FnMut(&mut Catalog, Package),
) -> crate::Result<()> {
    let mask = ctx.mask | catalog.config().field_mask;
    let mut state = StanzaState::new(ctx);

    for line in reader.lines() {
        let line = line?;

        if line.trim().is_empty() {
            if let Some(pkg) = state.finish() {
                emit(catalog, pkg);
            }
            state = StanzaState::new(ctx);
            continue;
        }

        if let Some(rest) = line.strip_prefix(' ') {
            parse_continuation(&mut state, rest, catalog.config().description_newlines);
            continue;
        }

        // any field line ends a running Description/Conffiles block
        if state.reading_description && !state.description.is_empty() {
            state.pkg.description = Some(std::mem::take(&mut state.description));
        }
        state.reading_description = false;
        state.reading_conffiles = false;

        let Some((field, value)) = line.split_once(':') else {
            debug!("ignoring malformed stanza line {:?}", line);
            continue;
        };
        parse_field(catalog, &mut state, mask, field, value.trim());
    }

    if let Some(pkg) = state.finish() {
        emit(catalog, pkg);
    }

    Ok(())
}

fn parse_continuation(state: &mut StanzaState, rest: &str, keep_newlines: bool) {
    if state.reading_description {
        if keep_newlines {
            state.description.push('\n');
            state.description.push_str(rest);
        } else {
            state.description.push(' ');
            state.description.push_str(rest);
        }
    } else if state.reading_conffiles {
        parse_conffile_line(state, rest);
    }
}

fn parse_conffile_line(state: &mut StanzaState, line: &str) {
    let mut tokens = line.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(path), Some(md5)) => state.pkg.conffiles.push(Conffile {
            path: path.to_string(),
            md5: md5.to_string(),
        }),
        _ => error!("Failed to parse Conffiles line for {}", state.pkg.name),
    }
}

fn parse_status(state: &mut StanzaState, value: &str) {
    let mut tokens = value.split_whitespace();
    let (Some(want), Some(flag), Some(status)) = (tokens.next(), tokens.next(), tokens.next())
    else {
        error!("Failed to parse Status line for {}", state.pkg.name);
        return;
    };
    state.pkg.state_want = StateWant::from_str(want);
    state.pkg.state_flags |= StateFlags::from_str(flag);
    state.pkg.state_status = StateStatus::from_str(status);
}

/// Comma-separated `prio:path:altpath` items; a path that is not absolute
/// or an empty altpath invalidates the item
fn parse_alternatives(state: &mut StanzaState, value: &str) {
    for item in value.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let mut parts = item.splitn(3, ':');
        let (Some(prio), Some(path), Some(altpath)) = (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        if !path.starts_with('/') || altpath.is_empty() {
            continue;
        }
        state.pkg.alternatives.push(Alternative {
            prio: prio.trim().parse().unwrap_or(0),
            path: path.to_string(),
            altpath: altpath.to_string(),
        });
    }
}

/// Comma- or space-separated name list (`Provides`, `Replaces`)
fn parse_name_list(catalog: &mut Catalog, value: &str) -> Vec<crate::AbstractId> {
    let mut ids = Vec::new();
    for name in value.split([',', ' ']).filter(|s| !s.is_empty()) {
        let id = catalog.ensure_abstract(name);
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

fn parse_field(
    catalog: &mut Catalog,
    state: &mut StanzaState,
    mask: FieldMask,
    field: &str,
    value: &str,
) {
    let pkg = &mut state.pkg;
    match field {
        "Package" if !mask.contains(FieldMask::PACKAGE) => {
            pkg.name = value.to_string();
            if let Some(id) = catalog.lookup(value) {
                if catalog
                    .abstract_pkg(id)
                    .flags
                    .contains(StateFlags::NEED_DETAIL)
                    && !pkg.state_flags.contains(StateFlags::NEED_DETAIL)
                {
                    debug!("propagating detail flag to package {}", pkg.name);
                    pkg.state_flags.insert(StateFlags::NEED_DETAIL);
                }
            }
        }
        "Version" if !mask.contains(FieldMask::VERSION) => {
            pkg.version = PkgVersion::parse(value);
        }
        "Architecture" if !mask.contains(FieldMask::ARCHITECTURE) => {
            pkg.architecture = value.to_string();
            pkg.arch_priority = catalog.config().arch_priority(value);
        }
        "Depends" if !mask.contains(FieldMask::DEPENDS) => {
            let deps = parse_deplist(catalog, DependKind::Depend, value);
            state.pkg.depends.extend(deps);
        }
        "Pre-Depends" if !mask.contains(FieldMask::PRE_DEPENDS) => {
            let deps = parse_deplist(catalog, DependKind::PreDepend, value);
            state.pkg.depends.extend(deps);
        }
        "Recommends" if !mask.contains(FieldMask::RECOMMENDS) => {
            let deps = parse_deplist(catalog, DependKind::Recommend, value);
            state.pkg.depends.extend(deps);
        }
        "Suggests" if !mask.contains(FieldMask::SUGGESTS) => {
            let deps = parse_deplist(catalog, DependKind::Suggest, value);
            state.pkg.depends.extend(deps);
        }
        "Conflicts" if !mask.contains(FieldMask::CONFLICTS) => {
            let deps = parse_deplist(catalog, DependKind::Conflicts, value);
            state.pkg.conflicts.extend(deps);
        }
        "Provides" if !mask.contains(FieldMask::PROVIDES) => {
            let ids = parse_name_list(catalog, value);
            // a provider of a name needing detail needs detail itself
            if !state.pkg.name.is_empty()
                && ids.iter().any(|&id| {
                    catalog
                        .abstract_pkg(id)
                        .flags
                        .contains(StateFlags::NEED_DETAIL)
                })
            {
                let name = state.pkg.name.clone();
                catalog.mark_need_detail(&name);
                state.pkg.state_flags.insert(StateFlags::NEED_DETAIL);
            }
            state.pkg.provides.extend(ids);
        }
        "Replaces" if !mask.contains(FieldMask::REPLACES) => {
            let ids = parse_name_list(catalog, value);
            state.pkg.replaces.extend(ids);
        }
        "Section" if !mask.contains(FieldMask::SECTION) => {
            pkg.section = Some(value.to_string());
        }
        "Priority" if !mask.contains(FieldMask::PRIORITY) => {
            pkg.priority = Some(value.to_string());
        }
        "Source" if !mask.contains(FieldMask::SOURCE) => {
            pkg.source = Some(value.to_string());
        }
        "Maintainer" if !mask.contains(FieldMask::MAINTAINER) => {
            pkg.maintainer = Some(value.to_string());
        }
        "Filename" if !mask.contains(FieldMask::FILENAME) => {
            pkg.filename = Some(value.to_string());
        }
        "Size" if !mask.contains(FieldMask::SIZE) => {
            pkg.size = value.parse().unwrap_or(0);
        }
        "Installed-Size" if !mask.contains(FieldMask::INSTALLED_SIZE) => {
            pkg.installed_size = value.parse().unwrap_or(0);
        }
        "Installed-Time" if !mask.contains(FieldMask::INSTALLED_TIME) => {
            pkg.installed_time = value.parse().unwrap_or(0);
        }
        "MD5sum" | "MD5Sum" if !mask.contains(FieldMask::MD5SUM) => {
            pkg.md5sum = Some(value.to_string());
        }
        "SHA256sum" if !mask.contains(FieldMask::SHA256SUM) => {
            pkg.sha256sum = Some(value.to_string());
        }
        "Description" if !mask.contains(FieldMask::DESCRIPTION) => {
            state.description = value.to_string();
            state.reading_description = true;
        }
        "Conffiles" if !mask.contains(FieldMask::CONFFILES) => {
            state.reading_conffiles = true;
        }
        "Alternatives" if !mask.contains(FieldMask::ALTERNATIVES) => {
            parse_alternatives(state, value);
        }
        "Tags" if !mask.contains(FieldMask::TAGS) => {
            pkg.tags = Some(value.to_string());
        }
        "Essential" if !mask.contains(FieldMask::ESSENTIAL) => {
            pkg.essential = value == "yes";
        }
        "Auto-Installed" if !mask.contains(FieldMask::AUTO_INSTALLED) => {
            pkg.auto_installed = value == "yes";
        }
        "Status" if !mask.contains(FieldMask::STATUS) => {
            parse_status(state, value);
        }
        "ABIVersion" if !mask.contains(FieldMask::ABIVERSION) => {
            pkg.abi_version = Some(value.to_string());
        }
        _ => {}
    }
}

/// Parse exactly one stanza from a reader into a package
///
/// Returns `None` for a blank stanza (no `Package:` field).
pub fn parse_one<R: BufRead>(
    catalog: &mut Catalog,
    reader: R,
    ctx: &ParseContext,
) -> crate::Result<Option<Package>> {
    let mut out = None;
    parse_stream(catalog, reader, ctx, &mut |_, pkg| {
        if out.is_none() {
            out = Some(pkg);
        }
    })?;
    Ok(out)
}
