//! Limits for codec-level decoding.

/// Codec-specific limits enforced while decoding control information fields.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct CodecLimits {
    /// Maximum number of entries in a NAK loss list.
    pub max_loss_entries: usize,
    /// Maximum number of blocks in a handshake extension chain.
    pub max_extension_blocks: usize,
    /// Maximum decoded Stream ID length in bytes. Values above 512 act as 512.
    pub max_stream_id_bytes: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            // one entry per word of a maximum-size CIF
            max_loss_entries: 371,
            max_extension_blocks: 16,
            max_stream_id_bytes: 512,
        }
    }
}

impl CodecLimits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_loss_entries: 32,
            max_extension_blocks: 4,
            max_stream_id_bytes: 64,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_loss_entries: usize::MAX,
            max_extension_blocks: usize::MAX,
            max_stream_id_bytes: usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_are_reasonable() {
        let limits = CodecLimits::default();
        assert!(limits.max_loss_entries >= 256);
        assert!(limits.max_extension_blocks >= 8);
        assert_eq!(limits.max_stream_id_bytes, 512);
    }

    #[test]
    fn testing_limits_smaller() {
        let test_limits = CodecLimits::for_testing();
        let default_limits = CodecLimits::default();
        assert!(test_limits.max_loss_entries < default_limits.max_loss_entries);
        assert!(test_limits.max_extension_blocks < default_limits.max_extension_blocks);
        assert!(test_limits.max_stream_id_bytes < default_limits.max_stream_id_bytes);
    }

    #[test]
    fn unlimited_limits() {
        let limits = CodecLimits::unlimited();
        assert_eq!(limits.max_loss_entries, usize::MAX);
        assert_eq!(limits.max_extension_blocks, usize::MAX);
    }
}
