//! Configuration

use serde::{Deserialize, Serialize};
use std::env;

use crate::DEFAULT_DEPTH;

/// Tree configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Number of levels below the root; the tree holds `2^depth` leaves
    pub depth: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self { depth: DEFAULT_DEPTH }
    }
}

impl TreeConfig {
    /// Load from environment variables
    ///
    /// `IMT_DEPTH` sets the depth; a missing or unparsable value falls back to
    /// the default. Range checks happen when the tree is built.
    pub fn from_env() -> Self {
        Self {
            depth: env::var("IMT_DEPTH")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(DEFAULT_DEPTH),
        }
    }
}
