use indexmap::IndexMap;
use std::path::Path;

use crate::interp::Location;

/// A source breakpoint, identified by `(file, line)`.
///
/// `condition` is reserved for conditional breakpoints: it is accepted and
/// stored but never evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    pub file: String,
    pub line: u32,
    pub enabled: bool,
    pub condition: Option<String>,
}

/// Canonical form used for breakpoint matching: the basename of the path,
/// so `src/main.ez` and `main.ez` address the same file.
pub fn canon_file(file: &str) -> String {
    Path::new(file)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string())
}

/// Breakpoints keyed by canonical file, then line.
#[derive(Debug, Default)]
pub struct BreakpointRegistry {
    files: IndexMap<String, IndexMap<u32, Breakpoint>>,
}

impl BreakpointRegistry {
    /// Insert a breakpoint or return the existing one; setting twice is
    /// idempotent and never fails.
    pub fn add(&mut self, file: &str, line: u32, condition: Option<String>) -> Breakpoint {
        let file = canon_file(file);
        let lines = self.files.entry(file.clone()).or_default();
        lines
            .entry(line)
            .or_insert_with(|| Breakpoint {
                file,
                line,
                enabled: true,
                condition,
            })
            .clone()
    }

    /// Remove a breakpoint; removing a non-existent one is a no-op success
    /// reported as `false`.
    pub fn remove(&mut self, file: &str, line: u32) -> bool {
        let file = canon_file(file);
        match self.files.get_mut(&file) {
            Some(lines) => lines.shift_remove(&line).is_some(),
            None => false,
        }
    }

    /// Flip a breakpoint on or off, keeping it registered.
    pub fn set_enabled(&mut self, file: &str, line: u32, enabled: bool) -> bool {
        let file = canon_file(file);
        if let Some(bp) = self.files.get_mut(&file).and_then(|lines| lines.get_mut(&line)) {
            bp.enabled = enabled;
            true
        } else {
            false
        }
    }

    /// Whether an enabled breakpoint covers this location.
    pub fn hit(&self, loc: &Location) -> bool {
        self.files
            .get(&canon_file(&loc.file))
            .and_then(|lines| lines.get(&loc.line))
            .is_some_and(|bp| bp.enabled)
    }

    /// All registered breakpoints in insertion order, any enabled state.
    pub fn list(&self) -> Vec<Breakpoint> {
        self.files
            .values()
            .flat_map(|lines| lines.values().cloned())
            .collect()
    }
}
