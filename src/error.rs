//! Error types for route origin validation.
//!
//! The validation core has exactly two failure kinds: malformed input, which is
//! rejected before any lookup runs, and storage failures, which are propagated
//! unchanged from the lookup collaborator. "No match" is never an error; it
//! resolves to the `Unknown` validity state.

use thiserror::Error;

use crate::storage::StorageError;

/// Input validation errors (the `MalformedInput` family).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("ASN {value} is out of range [0, 4294967295]")]
    AsnOutOfRange {
        value: u64,
    },

    #[error("Address has {actual} bytes, expected 4 (IPv4) or 16 (IPv6)")]
    AddressLength {
        actual: usize,
    },

    #[error("Prefix length {length} exceeds the {width}-bit address width")]
    PrefixLengthOutOfRange {
        length: u8,
        width: u8,
    },

    #[error("Prefix {address}/{length} has host bits set past the prefix length")]
    HostBitsSet {
        address: String,
        length: u8,
    },

    #[error("Max length {max_length} must lie within [{length}, {width}]")]
    MaxLengthOutOfRange {
        max_length: u8,
        length: u8,
        width: u8,
    },

    #[error("SLURM filter must carry an ASN, a prefix, or both")]
    EmptyFilter,

    #[error("Invalid prefix '{input}': {reason}")]
    InvalidPrefix {
        input: String,
        reason: String,
    },

    #[error("Invalid ASN '{input}'")]
    InvalidAsn {
        input: String,
    },
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Top-level error type returned by the validator.
#[derive(Debug, Error)]
pub enum RpkiError {
    #[error("Malformed input: {0}")]
    MalformedInput(#[from] ValidationError),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
}

impl RpkiError {
    /// Returns true if the input was rejected before any lookup.
    #[must_use]
    pub const fn is_malformed_input(&self) -> bool {
        matches!(self, Self::MalformedInput(_))
    }

    /// Returns true if a store lookup failed.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }

    /// Returns true if the caller may reasonably retry the same request.
    ///
    /// The validator never retries on its own.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::MalformedInput(_) => false,
            Self::StorageUnavailable(e) => matches!(
                e,
                StorageError::Unavailable(_) | StorageError::Timeout { .. }
            ),
        }
    }
}

/// Result type alias for validator operations.
pub type RpkiResult<T> = Result<T, RpkiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asn_out_of_range_message() {
        let err = ValidationError::AsnOutOfRange { value: 1 << 33 };
        let msg = format!("{err}");
        assert!(msg.contains("8589934592"));
        assert!(msg.contains("out of range"));
    }

    #[test]
    fn test_max_length_message() {
        let err = ValidationError::MaxLengthOutOfRange {
            max_length: 20,
            length: 24,
            width: 32,
        };
        let msg = format!("{err}");
        assert!(msg.contains("20"));
        assert!(msg.contains("[24, 32]"));
    }

    #[test]
    fn test_from_validation() {
        let err: RpkiError = ValidationError::EmptyFilter.into();
        assert!(err.is_malformed_input());
        assert!(!err.is_storage());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_from_storage() {
        let err: RpkiError = StorageError::Timeout { duration_ms: 250 }.into();
        assert!(err.is_storage());
        assert!(err.is_retryable());
        assert!(format!("{err}").contains("250ms"));

        let err: RpkiError = StorageError::Backend("corrupt row".to_string()).into();
        assert!(err.is_storage());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_config_error_from_json() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: ConfigError = json_err.into();
        assert!(format!("{err}").contains("Failed to parse config"));
    }
}
