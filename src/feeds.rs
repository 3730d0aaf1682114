// src/feeds.rs

//! Feed and status-file loading
//!
//! Feeds are cached package indexes named after their source under a
//! lists directory; status files record the installed set of one
//! installation root. Both are stanza streams fed through the parser into
//! the catalog. Packages are only retained once something needs their
//! detail, so the driver in [`FeedSet::load_package_details`] re-reads
//! feeds until every name reachable through `Provides` or dependencies
//! has been filled in.

use crate::catalog::Catalog;
use crate::error::Result;
use crate::parse::{parse_stream, ParseContext};
use crate::pkg::StateFlags;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// A package feed; its cached index lives under the lists directory
/// under this name
#[derive(Debug, Clone)]
pub struct Feed {
    pub name: String,
}

impl Feed {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// An installation root with its status file
#[derive(Debug, Clone)]
pub struct Dest {
    pub name: String,
    pub status_file: PathBuf,
}

impl Dest {
    pub fn new(name: impl Into<String>, status_file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            status_file: status_file.into(),
        }
    }
}

/// The configured feeds and destinations of one catalog
#[derive(Debug, Clone, Default)]
pub struct FeedSet {
    pub lists_dir: PathBuf,
    pub feeds: Vec<Feed>,
    pub dests: Vec<Dest>,
}

impl FeedSet {
    pub fn new(lists_dir: impl Into<PathBuf>) -> Self {
        Self {
            lists_dir: lists_dir.into(),
            feeds: Vec::new(),
            dests: Vec::new(),
        }
    }

    pub fn add_feed(&mut self, name: impl Into<String>) {
        self.feeds.push(Feed::new(name));
    }

    pub fn add_dest(&mut self, name: impl Into<String>, status_file: impl Into<PathBuf>) {
        self.dests.push(Dest::new(name, status_file));
    }

    /// Load every cached feed index that exists
    ///
    /// A missing index is not an error (the feed was never fetched). An
    /// unreadable one fails the batch, but the remaining feeds are still
    /// attempted first.
    pub fn load_feeds(&self, catalog: &mut Catalog, seed_flags: StateFlags) -> Result<()> {
        info!("loading {} feed lists", self.feeds.len());
        let mut first_err = None;

        for feed in &self.feeds {
            let list_file = self.lists_dir.join(&feed.name);
            if !list_file.exists() {
                continue;
            }
            if let Err(e) = add_from_file(
                catalog,
                &list_file,
                Some(&feed.name),
                None,
                false,
                seed_flags,
            ) {
                error!("Failed to open {}: {}", list_file.display(), e);
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Load the status file of every configured destination
    ///
    /// Installed packages always carry full detail, so their stanzas are
    /// seeded with the NEED_DETAIL flag and retained unconditionally.
    pub fn load_status_files(&self, catalog: &mut Catalog) -> Result<()> {
        info!("loading {} status files", self.dests.len());
        let mut first_err = None;

        for dest in &self.dests {
            if !dest.status_file.exists() {
                continue;
            }
            if let Err(e) = add_from_file(
                catalog,
                &dest.status_file,
                None,
                Some(&dest.name),
                true,
                StateFlags::NEED_DETAIL,
            ) {
                error!("Failed to open {}: {}", dest.status_file.display(), e);
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Re-read feeds until every abstract package flagged NEED_DETAIL has
    /// been seen by a reload pass
    ///
    /// Terminates because the seen mark is monotone within one call.
    pub fn load_package_details(&self, catalog: &mut Catalog) -> Result<()> {
        loop {
            self.load_feeds(catalog, StateFlags::empty())?;

            let remaining = catalog.flag_unmarked_details();
            if remaining == 0 {
                return Ok(());
            }
            debug!(
                "Found {} packages requiring details, reloading feeds",
                remaining
            );
        }
    }
}

/// Load one stanza file into the catalog
pub fn add_from_file(
    catalog: &mut Catalog,
    path: &Path,
    src: Option<&str>,
    dest: Option<&str>,
    is_status_file: bool,
    seed_flags: StateFlags,
) -> Result<()> {
    let file = File::open(path)?;
    add_from_stream(
        catalog,
        BufReader::new(file),
        src,
        dest,
        is_status_file,
        seed_flags,
    )
}

/// Load a stanza stream into the catalog
///
/// Discards stanzas nothing has asked detail for, and stanzas without a
/// usable architecture.
pub fn add_from_stream<R: BufRead>(
    catalog: &mut Catalog,
    reader: R,
    src: Option<&str>,
    dest: Option<&str>,
    is_status_file: bool,
    seed_flags: StateFlags,
) -> Result<()> {
    let ctx = ParseContext {
        mask: Default::default(),
        src: src.map(str::to_string),
        dest: dest.map(str::to_string),
        seed_flags,
    };

    parse_stream(catalog, reader, &ctx, &mut |catalog, pkg| {
        if !pkg.state_flags.contains(StateFlags::NEED_DETAIL) {
            debug!("package {} is unrelated, ignoring", pkg.name);
            return;
        }
        if pkg.architecture.is_empty() || pkg.arch_priority == 0 {
            warn!(
                "Package {} version {} has no valid architecture, ignoring.",
                pkg.name, pkg.version
            );
            return;
        }
        catalog.insert(pkg, is_status_file);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn catalog() -> Catalog {
        Catalog::new(Config::default())
    }

    #[test]
    fn test_status_stream_is_kept_without_marking() {
        let mut cat = catalog();
        add_from_stream(
            &mut cat,
            "Package: base\nVersion: 1\nArchitecture: all\nStatus: install ok installed\n"
                .as_bytes(),
            None,
            Some("root"),
            true,
            StateFlags::NEED_DETAIL,
        )
        .unwrap();

        let id = cat.fetch_installed("base").unwrap();
        assert_eq!(cat.pkg(id).dest.as_deref(), Some("root"));
    }

    #[test]
    fn test_feed_stream_discards_unrequested_packages() {
        let mut cat = catalog();
        add_from_stream(
            &mut cat,
            "Package: stranger\nVersion: 1\nArchitecture: all\n".as_bytes(),
            Some("base"),
            None,
            false,
            StateFlags::empty(),
        )
        .unwrap();

        // the abstract exists from parsing, but no concrete version was kept
        assert!(cat.versions_of_name("stranger").is_empty());
    }

    #[test]
    fn test_feed_stream_keeps_requested_packages() {
        let mut cat = catalog();
        cat.mark_need_detail("wanted");
        add_from_stream(
            &mut cat,
            "Package: wanted\nVersion: 1\nArchitecture: all\n".as_bytes(),
            Some("base"),
            None,
            false,
            StateFlags::empty(),
        )
        .unwrap();

        assert_eq!(cat.versions_of_name("wanted").len(), 1);
    }

    #[test]
    fn test_package_without_architecture_discarded() {
        let mut cat = catalog();
        cat.mark_need_detail("noarch-pkg");
        cat.mark_need_detail("alien");
        add_from_stream(
            &mut cat,
            "Package: noarch-pkg\nVersion: 1\n\
             \n\
             Package: alien\nVersion: 1\nArchitecture: m68k\n"
                .as_bytes(),
            Some("base"),
            None,
            false,
            StateFlags::empty(),
        )
        .unwrap();

        assert!(cat.versions_of_name("noarch-pkg").is_empty());
        assert!(cat.versions_of_name("alien").is_empty());
    }
}
