//! Error types for the RSS client engine

use thiserror::Error;

/// Result type alias for RSS client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving the RSS protocol
#[derive(Debug, Error)]
pub enum Error {
    // ============ Input Invariants ============
    /// Caller supplied inconsistent options (bad indices, unknown key type, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Two collections that must match in length do not
    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// A Lagrange coefficient was requested over an index set containing a
    /// duplicate of the evaluation index
    #[error("Zero denominator in Lagrange coefficient for index {index}")]
    ZeroDenominator { index: u64 },

    // ============ Encoding ============
    /// Point coordinates did not decode to a curve point
    #[error("Invalid point encoding: {0}")]
    InvalidPoint(String),

    /// Scalar hex did not decode to a field element
    #[error("Invalid scalar encoding: {0}")]
    InvalidScalar(String),

    // ============ Commitment Checks ============
    /// A co-dealer returned commitment vectors of the wrong length
    #[error("Invalid {what} shape: expected {expected} commitments, got {actual}")]
    InvalidCommitShape {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// Aggregated commitments do not reconstruct the known TSS public key
    #[error("Aggregated commitments do not bind to the TSS public key (target {target})")]
    TssPubKeyMismatch { target: u64 },

    /// The aggregated server sharing disagrees with the master sharing at x = 1
    #[error("Master and server sharings disagree at the join point (target {target})")]
    ServerMasterCommitMismatch { target: u64 },

    /// The summed decrypted user share does not match the master commitments
    #[error("Decrypted user share does not match commitments (target {target})")]
    UserShareMismatch { target: u64 },

    // ============ Cryptographic Errors ============
    /// ECIES MAC mismatch or malformed ciphertext
    #[error("Decryption failed: {0}")]
    Decrypt(String),

    /// Generic verification failure (peer returned inconsistent data)
    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    // ============ Availability / Transport ============
    /// Fewer than the threshold of servers returned usable Round 2 responses
    #[error("Insufficient server responses: required {required}, got {actual}")]
    InsufficientServerResponses { required: usize, actual: usize },

    /// Opaque error from the HTTP layer, carried through for diagnostics
    #[error("Transport error: {0}")]
    Transport(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
