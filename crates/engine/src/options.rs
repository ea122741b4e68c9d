//! Engine configuration

use terrane_core::{Error, Result};

/// Default maximum entries per snapshot segment
pub const DEFAULT_KEYS_PER_SEGMENT: usize = 4096;

/// Configuration for a `RawStore`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreOptions {
    /// Maximum entries per primary-store segment in a region checkpoint
    pub keys_per_segment: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            keys_per_segment: DEFAULT_KEYS_PER_SEGMENT,
        }
    }
}

impl StoreOptions {
    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.keys_per_segment == 0 {
            return Err(Error::InvalidArgument(
                "keys_per_segment must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let opts = StoreOptions::default();
        assert_eq!(opts.keys_per_segment, DEFAULT_KEYS_PER_SEGMENT);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_zero_segment_size_rejected() {
        let opts = StoreOptions {
            keys_per_segment: 0,
        };
        assert!(opts.validate().unwrap_err().is_invalid_argument());
    }
}
