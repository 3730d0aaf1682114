// src/version.rs

//! Version handling and constraint satisfaction for package dependencies
//!
//! Versions have the form `[epoch:]upstream[-revision]`. Comparison uses
//! the standard package-version collation: alternating runs of non-digits
//! and digits, where `~` sorts before the end of the string, letters sort
//! before other characters, and digit runs compare numerically with
//! leading zeros ignored.

use std::cmp::Ordering;
use std::fmt;
use tracing::error;

/// A parsed package version with epoch, upstream, and revision components
#[derive(Debug, Clone, Default)]
pub struct PkgVersion {
    pub epoch: u32,
    pub upstream: String,
    pub revision: String,
}

impl PkgVersion {
    /// Parse a version string
    ///
    /// The epoch is the run of leading ASCII digits before a `:` (missing
    /// means 0). The revision is everything after the rightmost `-`
    /// (missing means empty). Parsing is total; an out-of-range epoch is
    /// logged and treated as 0.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();

        let (epoch, rest) = match s.split_once(':') {
            Some((e, r)) if !e.is_empty() && e.bytes().all(|b| b.is_ascii_digit()) => {
                match e.parse::<u32>() {
                    Ok(epoch) => (epoch, r),
                    Err(_) => {
                        error!("invalid epoch in version {:?}", s);
                        (0, r)
                    }
                }
            }
            _ => (0, s),
        };

        let (upstream, revision) = match rest.rsplit_once('-') {
            Some((u, r)) => (u, r),
            None => (rest, ""),
        };

        Self {
            epoch,
            upstream: upstream.to_string(),
            revision: revision.to_string(),
        }
    }
}

impl fmt::Display for PkgVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch > 0 {
            write!(f, "{}:", self.epoch)?;
        }
        write!(f, "{}", self.upstream)?;
        if !self.revision.is_empty() {
            write!(f, "-{}", self.revision)?;
        }
        Ok(())
    }
}

impl Ord for PkgVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| verrevcmp(&self.upstream, &other.upstream))
            .then_with(|| verrevcmp(&self.revision, &other.revision))
    }
}

impl PartialOrd for PkgVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Equality must agree with the comparison algorithm ("1.0" == "1.00"), so
// it cannot be derived field-wise.
impl PartialEq for PkgVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PkgVersion {}

/// Collation weight of a single byte inside a non-digit run; digits weigh
/// the same as end-of-string so a digit run sorts before any letter
fn char_order(c: u8) -> i32 {
    if c == b'~' {
        -1
    } else if c.is_ascii_digit() {
        0
    } else if c.is_ascii_alphabetic() {
        c as i32
    } else {
        c as i32 + 256
    }
}

/// Compare two version fragments by the package-version algorithm
fn verrevcmp(a: &str, b: &str) -> Ordering {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let (mut i, mut j) = (0, 0);

    while i < a.len() || j < b.len() {
        // Non-digit runs compare byte-wise; end-of-string weighs 0, which
        // puts it after `~` and before everything else.
        while (i < a.len() && !a[i].is_ascii_digit()) || (j < b.len() && !b[j].is_ascii_digit()) {
            let wa = a.get(i).map_or(0, |&c| char_order(c));
            let wb = b.get(j).map_or(0, |&c| char_order(c));
            if wa != wb {
                return wa.cmp(&wb);
            }
            i += 1;
            j += 1;
        }

        // Digit runs compare numerically, leading zeros ignored.
        while a.get(i) == Some(&b'0') {
            i += 1;
        }
        while b.get(j) == Some(&b'0') {
            j += 1;
        }

        let mut first_diff = Ordering::Equal;
        while i < a.len() && j < b.len() && a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            if first_diff == Ordering::Equal {
                first_diff = a[i].cmp(&b[j]);
            }
            i += 1;
            j += 1;
        }
        if i < a.len() && a[i].is_ascii_digit() {
            return Ordering::Greater;
        }
        if j < b.len() && b[j].is_ascii_digit() {
            return Ordering::Less;
        }
        if first_diff != Ordering::Equal {
            return first_diff;
        }
    }

    Ordering::Equal
}

/// Version constraint operators for a dependency atom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionConstraint {
    /// Any version satisfies
    #[default]
    None,
    /// Strictly earlier (`<<`)
    Earlier,
    /// Earlier or equal (`<=`, legacy `<`)
    EarlierEqual,
    /// Exactly equal (`=`)
    Equal,
    /// Later or equal (`>=`, legacy `>`)
    LaterEqual,
    /// Strictly later (`>>`)
    Later,
}

impl VersionConstraint {
    /// Whether a comparison result between a candidate and the reference
    /// version satisfies this constraint
    pub fn satisfied(self, cmp: Ordering) -> bool {
        match self {
            Self::None => true,
            Self::Earlier => cmp == Ordering::Less,
            Self::EarlierEqual => cmp != Ordering::Greater,
            Self::Equal => cmp == Ordering::Equal,
            Self::LaterEqual => cmp != Ordering::Less,
            Self::Later => cmp == Ordering::Greater,
        }
    }

    /// Operator text used in printable dependency strings, with the
    /// trailing space expected before the version
    pub fn op_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Earlier => "<< ",
            Self::EarlierEqual => "<= ",
            Self::Equal => "= ",
            Self::LaterEqual => ">= ",
            Self::Later => ">> ",
        }
    }
}
