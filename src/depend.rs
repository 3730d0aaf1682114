// src/depend.rs

//! Dependency expressions
//!
//! A raw field value like `"libfoo (>= 1.2) | foo-compat, bar"` becomes a
//! sequence of compound dependencies: one compound per comma-separated
//! entry, each a disjunction of atoms. Atom targets are resolved through
//! the catalog as they are parsed, so parsing also creates placeholder
//! abstract packages for names nothing concrete bears yet.

use crate::catalog::{AbstractId, Catalog};
use crate::error::{Error, Result};
use crate::pkg::Package;
use crate::version::{PkgVersion, VersionConstraint};
use tracing::error;

/// The relationship a compound dependency expresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependKind {
    Depend,
    PreDepend,
    Recommend,
    Suggest,
    /// Opportunistic: install any provider whose own dependencies are
    /// already satisfiable, never fail when none is
    GreedyDepend,
    Conflicts,
}

/// A single dependency atom: a target name plus an optional version bound
#[derive(Debug, Clone, PartialEq)]
pub struct Depend {
    pub target: AbstractId,
    pub constraint: VersionConstraint,
    pub version: Option<PkgVersion>,
}

impl Depend {
    /// Atom satisfied by any version of the target
    pub fn unversioned(target: AbstractId) -> Self {
        Self {
            target,
            constraint: VersionConstraint::None,
            version: None,
        }
    }

    /// Whether the given concrete package's version satisfies this atom
    pub fn satisfied_by(&self, pkg: &Package) -> bool {
        match &self.version {
            None => true,
            Some(version) => self.constraint.satisfied(pkg.version.cmp(version)),
        }
    }
}

/// A disjunction of atoms, any one of which satisfies the dependency
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundDepend {
    pub kind: DependKind,
    pub possibilities: Vec<Depend>,
}

/// Parse a comma-separated dependency field value
///
/// Malformed compounds are logged and skipped; a compound is never
/// partially committed.
pub fn parse_deplist(catalog: &mut Catalog, kind: DependKind, value: &str) -> Vec<CompoundDepend> {
    let mut compounds = Vec::new();
    for item in value.split(',') {
        if item.trim().is_empty() {
            continue;
        }
        match parse_compound(catalog, kind, item) {
            Ok(compound) => compounds.push(compound),
            Err(e) => error!("{}", e),
        }
    }
    compounds
}

/// Parse one compound (`atom ( "|" atom )* [ "*" ]`)
///
/// A trailing `*` on the final atom promotes the compound to
/// [`DependKind::GreedyDepend`].
pub fn parse_compound(catalog: &mut Catalog, kind: DependKind, s: &str) -> Result<CompoundDepend> {
    let mut possibilities = Vec::new();
    let mut greedy = false;

    for part in s.split('|') {
        let (atom, starred) = parse_atom(catalog, part)?;
        possibilities.push(atom);
        greedy = starred;
    }

    if possibilities.is_empty() {
        return Err(Error::ParseDepExpr(s.trim().to_string()));
    }

    Ok(CompoundDepend {
        kind: if greedy { DependKind::GreedyDepend } else { kind },
        possibilities,
    })
}

fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'.' || b == b'-')
}

/// Parse a single atom (`NAME [ "(" OP VERSION ")" ]`), returning whether
/// it carried a trailing `*`
fn parse_atom(catalog: &mut Catalog, s: &str) -> Result<(Depend, bool)> {
    let s = s.trim();
    let (name, mut rest) = match s.find(|c: char| c.is_whitespace() || c == '(') {
        Some(i) => (&s[..i], s[i..].trim_start()),
        None => (s, ""),
    };

    if !valid_name(name) {
        return Err(Error::ParseDepExpr(s.to_string()));
    }

    let target = catalog.ensure_abstract(name);
    let mut constraint = VersionConstraint::None;
    let mut version = None;

    if let Some(stripped) = rest.strip_prefix('(') {
        let close = stripped
            .find(')')
            .ok_or_else(|| Error::ParseDepExpr(s.to_string()))?;
        let inner = stripped[..close].trim();

        let (op, vstr) = if let Some(v) = inner.strip_prefix("<<") {
            (VersionConstraint::Earlier, v)
        } else if let Some(v) = inner.strip_prefix("<=") {
            (VersionConstraint::EarlierEqual, v)
        } else if let Some(v) = inner.strip_prefix(">=") {
            (VersionConstraint::LaterEqual, v)
        } else if let Some(v) = inner.strip_prefix(">>") {
            (VersionConstraint::Later, v)
        } else if let Some(v) = inner.strip_prefix('=') {
            (VersionConstraint::Equal, v)
        } else if let Some(v) = inner.strip_prefix('<') {
            // deprecated alias, kept for compatibility with old feeds
            (VersionConstraint::EarlierEqual, v)
        } else if let Some(v) = inner.strip_prefix('>') {
            (VersionConstraint::LaterEqual, v)
        } else {
            return Err(Error::ParseDepExpr(inner.to_string()));
        };

        let vstr = vstr.trim();
        if vstr.is_empty() {
            return Err(Error::ParseDepExpr(inner.to_string()));
        }
        constraint = op;
        version = Some(PkgVersion::parse(vstr));
        rest = stripped[close + 1..].trim_start();
    }

    let starred = match rest.trim() {
        "" => false,
        "*" => true,
        other => return Err(Error::ParseDepExpr(other.to_string())),
    };

    Ok((
        Depend {
            target,
            constraint,
            version,
        },
        starred,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn catalog() -> Catalog {
        Catalog::new(Config::default())
    }

    #[test]
    fn test_parse_plain_atom() {
        let mut cat = catalog();
        let deps = parse_deplist(&mut cat, DependKind::Depend, "libfoo");
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].kind, DependKind::Depend);
        assert_eq!(deps[0].possibilities.len(), 1);
        let atom = &deps[0].possibilities[0];
        assert_eq!(cat.abstract_pkg(atom.target).name, "libfoo");
        assert_eq!(atom.constraint, VersionConstraint::None);
    }

    #[test]
    fn test_parse_versioned_atom() {
        let mut cat = catalog();
        let deps = parse_deplist(&mut cat, DependKind::Depend, "libfoo (>= 1.2)");
        let atom = &deps[0].possibilities[0];
        assert_eq!(atom.constraint, VersionConstraint::LaterEqual);
        assert_eq!(atom.version.as_ref().unwrap().to_string(), "1.2");
    }

    #[test]
    fn test_parse_alternatives_and_commas() {
        let mut cat = catalog();
        let deps = parse_deplist(
            &mut cat,
            DependKind::Depend,
            "libfoo (>= 1.2) | bar, baz (<< 2)",
        );
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].possibilities.len(), 2);
        assert_eq!(deps[1].possibilities.len(), 1);
        assert_eq!(
            deps[1].possibilities[0].constraint,
            VersionConstraint::Earlier
        );
    }

    #[test]
    fn test_legacy_operator_aliases() {
        let mut cat = catalog();
        let deps = parse_deplist(&mut cat, DependKind::Depend, "a (< 1), b (> 2)");
        assert_eq!(
            deps[0].possibilities[0].constraint,
            VersionConstraint::EarlierEqual
        );
        assert_eq!(
            deps[1].possibilities[0].constraint,
            VersionConstraint::LaterEqual
        );
    }

    #[test]
    fn test_trailing_star_promotes_to_greedy() {
        let mut cat = catalog();
        let deps = parse_deplist(&mut cat, DependKind::Depend, "plugin *");
        assert_eq!(deps[0].kind, DependKind::GreedyDepend);

        let deps = parse_deplist(&mut cat, DependKind::Depend, "a | plugin (>= 1) *");
        assert_eq!(deps[0].kind, DependKind::GreedyDepend);
        assert_eq!(deps[0].possibilities.len(), 2);
    }

    #[test]
    fn test_malformed_compound_is_skipped() {
        let mut cat = catalog();
        // missing closing paren, unknown operator, bad name
        let deps = parse_deplist(
            &mut cat,
            DependKind::Depend,
            "broken (>= 1.2, weird (~> 1), b@d, good",
        );
        assert_eq!(deps.len(), 1);
        assert_eq!(
            cat.abstract_pkg(deps[0].possibilities[0].target).name,
            "good"
        );
    }

    #[test]
    fn test_parsing_creates_placeholder_abstracts() {
        let mut cat = catalog();
        parse_deplist(&mut cat, DependKind::Depend, "ghost (>= 1)");
        assert!(cat.lookup("ghost").is_some());
    }
}
