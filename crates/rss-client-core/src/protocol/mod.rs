//! RSS client engine
//!
//! [`RssClient`] drives the two-round refresh/import protocol against a
//! server committee and produces factor-encrypted output shares;
//! [`recover`] turns those outputs back into the refreshed TSS share.

use std::fmt;

use k256::elliptic_curve::{bigint::U256, ops::Reduce};
use k256::{NonZeroScalar, ProjectivePoint, Scalar};
use rand::rngs::OsRng;
use tracing::instrument;

use crate::curve::{Curve, CurveScalar, Ed25519, HexPoint, KeyType, Secp256k1};
use crate::error::{Error, Result};
use crate::transport::Endpoint;
use crate::types::{ImportOptions, RefreshOptions, RefreshResponse};

pub mod messages;
pub(crate) mod refresh;
mod recover;

pub use recover::recover;

/// Configuration for an [`RssClient`] instance
#[derive(Clone)]
pub struct RssClientConfig {
    /// The (unchanging) TSS public key every refresh must rebind to
    pub tss_pub_key: HexPoint,
    /// One endpoint per committee member, in committee order
    pub server_endpoints: Vec<Endpoint>,
    /// Reconstruction threshold T of the server-side sharing
    pub server_threshold: u32,
    /// Long-term secp256k1 server keys, in committee order
    pub server_pubkeys: Vec<HexPoint>,
    /// Curve of the TSS key being refreshed
    pub key_type: KeyType,
    /// Optional fixed ephemeral key (hex secp256k1 scalar); random otherwise
    pub temp_key: Option<String>,
}

/// Client side of the RSS protocol
///
/// Owns one ephemeral secp256k1 keypair for the duration of the instance;
/// the ephemeral key wraps the user shares the servers return in Round 1,
/// irrespective of the TSS curve.
pub struct RssClient {
    pub(crate) config: RssClientConfig,
    pub(crate) temp_private_key: Scalar,
    pub(crate) temp_public_key: HexPoint,
}

impl RssClient {
    /// Validate the configuration and generate the ephemeral keypair
    pub fn new(config: RssClientConfig) -> Result<Self> {
        let node_count = config.server_pubkeys.len();
        if node_count == 0 {
            return Err(Error::InvalidInput("no servers configured".into()));
        }
        if config.server_endpoints.len() != node_count {
            return Err(Error::LengthMismatch {
                expected: node_count,
                actual: config.server_endpoints.len(),
            });
        }
        let threshold = config.server_threshold as usize;
        if threshold == 0 || threshold > node_count {
            return Err(Error::InvalidInput(format!(
                "threshold must be in 1..={node_count}, got {threshold}"
            )));
        }

        let temp_private_key = match &config.temp_key {
            Some(hex_key) => {
                let bytes = decode_secp_scalar_hex(hex_key)?;
                let scalar = <Scalar as Reduce<U256>>::reduce_bytes(&bytes.into());
                if scalar == Scalar::ZERO {
                    return Err(Error::InvalidInput("temp key must be nonzero".into()));
                }
                scalar
            }
            None => *NonZeroScalar::random(&mut OsRng),
        };
        let temp_public_key =
            Secp256k1::to_hex_point(&(ProjectivePoint::GENERATOR * temp_private_key));

        Ok(Self {
            config,
            temp_private_key,
            temp_public_key,
        })
    }

    /// The ephemeral public key Round 1 user shares are encrypted to
    pub fn temp_public_key(&self) -> &HexPoint {
        &self.temp_public_key
    }

    /// Proactively refresh the server-held sharing and re-encrypt the user's
    /// resulting share under the supplied factor keys
    #[instrument(skip(self, options), fields(key_type = %self.config.key_type))]
    pub async fn refresh(&self, options: RefreshOptions) -> Result<Vec<RefreshResponse>> {
        match self.config.key_type {
            KeyType::Secp256k1 => refresh::run::<Secp256k1>(self, refresh::Mode::Refresh(options)).await,
            KeyType::Ed25519 => refresh::run::<Ed25519>(self, refresh::Mode::Refresh(options)).await,
        }
    }

    /// Import an externally generated secret into the sharing scheme
    #[instrument(skip(self, options), fields(key_type = %self.config.key_type))]
    pub async fn import(&self, options: ImportOptions) -> Result<Vec<RefreshResponse>> {
        match self.config.key_type {
            KeyType::Secp256k1 => refresh::run::<Secp256k1>(self, refresh::Mode::Import(options)).await,
            KeyType::Ed25519 => refresh::run::<Ed25519>(self, refresh::Mode::Import(options)).await,
        }
    }
}

impl fmt::Debug for RssClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RssClientConfig")
            .field("tss_pub_key", &self.tss_pub_key)
            .field("server_endpoints", &self.server_endpoints)
            .field("server_threshold", &self.server_threshold)
            .field("server_pubkeys", &self.server_pubkeys.len())
            .field("key_type", &self.key_type)
            .field("temp_key", &self.temp_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl fmt::Debug for RssClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RssClient")
            .field("key_type", &self.config.key_type)
            .field("server_threshold", &self.config.server_threshold)
            .field("servers", &self.config.server_pubkeys.len())
            .field("temp_private_key", &"[REDACTED]")
            .field("temp_public_key", &self.temp_public_key)
            .finish()
    }
}

/// Decode a hex secp256k1 scalar (up to 64 chars, left-padded)
pub(crate) fn decode_secp_scalar_hex(hex_key: &str) -> Result<[u8; 32]> {
    let s = hex_key.strip_prefix("0x").unwrap_or(hex_key);
    if s.is_empty() || s.len() > 64 {
        return Err(Error::InvalidScalar(format!(
            "scalar must be 1..=64 hex chars, got {}",
            s.len()
        )));
    }
    let padded = format!("{s:0>64}");
    let mut out = [0u8; 32];
    hex::decode_to_slice(&padded, &mut out)
        .map_err(|e| Error::InvalidScalar(format!("bad scalar hex: {e}")))?;
    Ok(out)
}

/// Decode a 32-byte big-endian share plaintext into a field element
pub(crate) fn scalar_from_plaintext<C: Curve>(plaintext: &[u8]) -> Result<C::Scalar> {
    let bytes: [u8; 32] = plaintext
        .try_into()
        .map_err(|_| Error::Decrypt("share plaintext must be 32 bytes".into()))?;
    Ok(C::Scalar::from_be_bytes(bytes))
}
