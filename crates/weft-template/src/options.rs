/*
 * options.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Options shared by the tree walkers.

use serde::{Deserialize, Serialize};

/// Default nesting limit for every recursive walk.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Options for rendering, merging and snippet application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RenderOptions {
    /// Deepest element nesting a walk descends into before failing.
    pub max_depth: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl RenderOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_kebab_case() {
        let options: RenderOptions = serde_json::from_str(r#"{"max-depth": 8}"#).unwrap();
        assert_eq!(options.max_depth, 8);
        let options: RenderOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, RenderOptions::default());
    }
}
