//! Architectural Enforcement
//!
//! Source scans that keep the display's production code honest:
//! - No `sleep()` in production code; timers are polled or driven by
//!   `tokio::time::interval`
//!
//! The scans live under `tests/`. This library only resolves where the
//! workspace sources are.

use std::path::{Path, PathBuf};

/// Source trees scanned by the enforcement tests, relative to the workspace root
pub const SOURCE_TREES: &[&str] = &["countdown/core/src", "tui/src"];

/// Workspace root, resolved from this crate's manifest directory
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// Absolute path of a workspace-relative source tree
pub fn source_tree(relative: &str) -> PathBuf {
    workspace_root().join(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_trees_exist() {
        for tree in SOURCE_TREES {
            assert!(source_tree(tree).is_dir(), "missing source tree: {tree}");
        }
    }
}
