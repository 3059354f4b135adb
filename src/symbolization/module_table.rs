//! Module address table built from the process's own memory maps.
//!
//! Symbolication here is module-granular: a raw instruction pointer is
//! resolved to the name of the loaded binary image containing it, not to a
//! function. That is enough to tell whose code a drop was executing, and it
//! requires nothing but each image's load base, extracted once from
//! `/proc/self/maps` by recording the base of every executable, file-backed
//! mapping. Built once, off the foreground path, read-only afterwards.

use std::collections::BTreeMap;
use std::fs;

use anyhow::{Context, Result};
use log::info;

/// Marker reported for addresses below every recorded module base.
pub const UNKNOWN_MODULE: &str = "???";

/// Ordered map from image load address to module name.
///
/// Lookup is "greatest recorded base not exceeding the query address":
/// an address belongs to the nearest module loaded at or below it.
pub struct ModuleTable {
    modules: BTreeMap<u64, String>,
}

impl ModuleTable {
    /// Build the table from `/proc/self/maps`.
    ///
    /// # Errors
    /// Returns an error if the maps file cannot be read. Callers degrade to
    /// an empty table; every lookup then reports [`UNKNOWN_MODULE`].
    pub fn load() -> Result<Self> {
        let maps =
            fs::read_to_string("/proc/self/maps").context("Failed to read /proc/self/maps")?;
        let table = Self::parse(&maps);
        info!("Module table built: {} executable mappings", table.len());
        Ok(table)
    }

    /// A table with no entries; every lookup misses.
    #[must_use]
    pub fn empty() -> Self {
        Self { modules: BTreeMap::new() }
    }

    /// Parse maps content: one `start-end perms offset dev inode pathname`
    /// line per mapping. Only executable, file-backed mappings are
    /// recorded; the module name is the trailing path component.
    pub(crate) fn parse(maps: &str) -> Self {
        let mut modules = BTreeMap::new();

        for line in maps.lines() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 6 {
                continue;
            }

            let perms = parts[1];
            if !perms.contains('x') {
                continue;
            }

            // Pseudo-entries ([vdso], [stack]) and anonymous mappings have
            // no on-disk image to attribute code to.
            let path = parts[5];
            if !path.starts_with('/') {
                continue;
            }

            let range_parts: Vec<&str> = parts[0].split('-').collect();
            if range_parts.len() != 2 {
                continue;
            }
            let Ok(base) = u64::from_str_radix(range_parts[0], 16) else {
                continue;
            };

            let name = path.rsplit('/').next().unwrap_or(path).to_string();
            modules.insert(base, name);
        }

        Self { modules }
    }

    /// Resolve an instruction pointer to the name of the module loaded at
    /// or below it, or [`UNKNOWN_MODULE`] if there is none.
    #[must_use]
    pub fn resolve(&self, addr: u64) -> &str {
        self.modules
            .range(..=addr)
            .next_back()
            .map_or(UNKNOWN_MODULE, |(_, name)| name.as_str())
    }

    /// Number of recorded mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
