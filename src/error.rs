//! Error kinds reported by parameter setup, the HE engine and the retrieval protocol.

use std::fmt;

/// Every failure the crate can report. Variants are distinct so callers can match on the kind
/// instead of parsing messages; none of them are retried internally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PirError {
    /// Scheme parameters are mutually incompatible or unsupported. Fatal at startup.
    Config(String),
    /// Matrix retrieval was requested for a database whose length is not a perfect square.
    NonSquareDatabase { len: usize },
    /// The requested index does not address an element of the database.
    IndexOutOfRange { index: i64, len: usize },
    /// Two sequences that must be zipped together have different lengths.
    LengthMismatch { expected: usize, actual: usize },
    /// A reduction or vector construction was asked to work on zero elements.
    EmptyInput,
    /// A ciphertext has no noise budget left after `step`; its decryption is not trustworthy.
    NoiseBudgetExhausted { step: &'static str, size: usize },
    /// The decrypted result disagrees with the known plaintext.
    Mismatch { expected: u64, actual: u64 },
    /// The HE engine rejected an operation (e.g. relinearizing a ciphertext of size > 3).
    Engine(String),
}

impl PirError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Process exit status used by the binaries. Configuration and contract errors share one
    /// status, while outcomes that indicate a wrong or untrustworthy decryption get another.
    pub fn exit_code(&self) -> i32 {
        match self {
            PirError::NoiseBudgetExhausted { .. } | PirError::Mismatch { .. } => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for PirError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PirError::Config(msg) => write!(f, "invalid scheme parameters: {}", msg),
            PirError::NonSquareDatabase { len } => {
                write!(f, "database length {} is not a perfect square", len)
            }
            PirError::IndexOutOfRange { index, len } => {
                write!(f, "index {} is out of range for length {}", index, len)
            }
            PirError::LengthMismatch { expected, actual } => {
                write!(f, "length mismatch: expected {}, got {}", expected, actual)
            }
            PirError::EmptyInput => write!(f, "input must contain at least one element"),
            PirError::NoiseBudgetExhausted { step, size } => write!(
                f,
                "noise budget exhausted after {} (ciphertext size {})",
                step, size
            ),
            PirError::Mismatch { expected, actual } => write!(
                f,
                "retrieved incorrect value: expected 0x{:x}, got 0x{:x}",
                expected, actual
            ),
            PirError::Engine(msg) => write!(f, "HE engine error: {}", msg),
        }
    }
}

impl std::error::Error for PirError {}

pub type Result<T> = std::result::Result<T, PirError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_for_wrong_answers() {
        let config = PirError::config("bad degree");
        let range = PirError::IndexOutOfRange { index: 4, len: 4 };
        let square = PirError::NonSquareDatabase { len: 5 };
        let mismatch = PirError::Mismatch {
            expected: 3,
            actual: 4,
        };
        let exhausted = PirError::NoiseBudgetExhausted {
            step: "multiply",
            size: 3,
        };
        assert_eq!(config.exit_code(), 1);
        assert_eq!(range.exit_code(), 1);
        assert_eq!(square.exit_code(), 1);
        assert_eq!(mismatch.exit_code(), 2);
        assert_eq!(exhausted.exit_code(), 2);
    }

    #[test]
    fn test_display_mentions_both_values() {
        let msg = PirError::Mismatch {
            expected: 0x2a,
            actual: 0x2b,
        }
        .to_string();
        assert!(msg.contains("0x2a"));
        assert!(msg.contains("0x2b"));
    }
}
