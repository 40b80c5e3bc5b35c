//! `[batch]` section configuration.
//!
//! ```toml
//! [batch]
//! parallel = false   # Process assets on the rayon pool
//! threads = 0        # Pool size, 0 = one per core
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Run assets concurrently. Completion order is then unspecified.
    pub parallel: bool,

    pub threads: usize,
}
