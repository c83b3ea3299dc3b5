use serde::{Deserialize, Serialize};

use crate::error::DingdexError;
use crate::Result;

/// Engine configuration
///
/// The depth/minimum pair is baked into an installed index; `Lookup::open`
/// refuses an index built with different values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum prefix length in Unicode characters
    pub indexing_depth: usize,
    /// Minimum token length in Unicode characters for a token to be indexed
    /// or admitted as a query keyword
    pub indexing_min: usize,
    /// Run the umlaut-recovery retry when a lookup returns fewer results
    /// than this
    pub adjust_retry_minimum: usize,
    /// Block size for the streaming word reader at install time
    pub read_block_size: usize,
    /// Buffer size for copying the dictionary file into the install root
    pub copy_buffer_size: usize,
    /// Emit a trace line with the prefix bag flushed for every indexed line
    pub log_flushed_prefixes: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            indexing_depth: 3,
            indexing_min: 3,
            adjust_retry_minimum: 1,
            read_block_size: 16 * 1024,
            copy_buffer_size: 4 * 1024,
            log_flushed_prefixes: false,
        }
    }
}

impl EngineConfig {
    /// Set the indexing depth and minimum together
    pub fn with_indexing(mut self, depth: usize, min: usize) -> Self {
        self.indexing_depth = depth;
        self.indexing_min = min;
        self
    }

    /// Enable or disable per-line prefix-bag trace logging
    pub fn with_prefix_logging(mut self, enabled: bool) -> Self {
        self.log_flushed_prefixes = enabled;
        self
    }

    /// Validate the configuration before it drives an install or lookup
    pub fn validate(&self) -> Result<()> {
        if self.indexing_min == 0 {
            return Err(DingdexError::Config(
                "indexing minimum must be at least 1".to_string(),
            ));
        }
        if self.indexing_min > self.indexing_depth {
            return Err(DingdexError::Config(format!(
                "indexing minimum {} exceeds indexing depth {}",
                self.indexing_min, self.indexing_depth
            )));
        }
        if self.read_block_size == 0 || self.copy_buffer_size == 0 {
            return Err(DingdexError::Config(
                "buffer sizes must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
