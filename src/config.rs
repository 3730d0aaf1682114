// src/config.rs

//! Catalog configuration
//!
//! Everything the resolution core would otherwise reach into process
//! globals for is carried here and passed into the catalog explicitly:
//! the architecture-priority table, the global field mask for stanza
//! parsing, and the list of names the user asked for on the command line
//! (consulted by the candidate selector's scoring pass).

use crate::parse::FieldMask;
use std::collections::HashMap;
use std::env;
use std::io::IsTerminal;

/// Architecture priority table
///
/// Maps architecture names to a positive priority. A priority of zero
/// means the architecture is not installable on this system; packages for
/// such architectures are discarded at load time and filtered by the
/// candidate selector.
#[derive(Debug, Clone)]
pub struct ArchTable {
    priorities: HashMap<String, i32>,
}

impl ArchTable {
    /// Empty table; every architecture is unsupported
    pub fn new() -> Self {
        Self {
            priorities: HashMap::new(),
        }
    }

    /// Table preloaded for the running host: `all` and `noarch` at
    /// priority 1, the host architecture at priority 10
    pub fn detect() -> Self {
        let mut table = Self::default();
        table.insert(env::consts::ARCH, 10);
        table
    }

    /// Register an architecture with the given priority
    pub fn insert(&mut self, arch: impl Into<String>, priority: i32) {
        self.priorities.insert(arch.into(), priority);
    }

    /// Priority for an architecture; 0 means unsupported
    pub fn priority(&self, arch: &str) -> i32 {
        self.priorities.get(arch).copied().unwrap_or(0)
    }
}

impl Default for ArchTable {
    fn default() -> Self {
        let mut table = Self::new();
        table.insert("all", 1);
        table.insert("noarch", 1);
        table
    }
}

/// Configuration context owned by a catalog
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Architecture priority table
    pub arch_table: ArchTable,
    /// Fields suppressed for every parse, ORed into each per-call mask
    pub field_mask: FieldMask,
    /// Names given on the command line; the selector scores candidates
    /// whose name appears here above other providers
    pub requested: Vec<String>,
    /// Preserve newlines when joining `Description` continuation lines
    /// (the behavior an interactive consumer sees)
    pub description_newlines: bool,
}

impl Config {
    /// Configuration with everything off and an empty arch table
    pub fn new() -> Self {
        Self {
            arch_table: ArchTable::new(),
            ..Self::default()
        }
    }

    /// Configuration for the running host: detected architecture table,
    /// newline joining when stdout is a terminal
    pub fn detect() -> Self {
        Self {
            arch_table: ArchTable::detect(),
            field_mask: FieldMask::empty(),
            requested: Vec::new(),
            description_newlines: std::io::stdout().is_terminal(),
        }
    }

    /// Priority for an architecture; 0 means unsupported
    pub fn arch_priority(&self, arch: &str) -> i32 {
        self.arch_table.priority(arch)
    }
}
