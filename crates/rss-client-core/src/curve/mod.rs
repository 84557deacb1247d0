//! Curve adapter
//!
//! The protocol equations are curve-agnostic: all they need is a prime-order
//! group with a generator, its scalar field, and a stable affine hex
//! encoding. This module exposes that surface behind a pair of capability
//! traits with one backend per supported curve (secp256k1 via `k256`,
//! ed25519 via `curve25519-dalek`). The concrete curve is selected at the
//! public API boundary from the runtime [`KeyType`] value.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

mod ed25519;
mod secp;

pub use ed25519::Ed25519;
pub use secp::Secp256k1;

/// Curve selector carried in configuration and on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    /// secp256k1 (the ECIES layer always uses this curve)
    Secp256k1,
    /// ed25519 (twisted Edwards form of Curve25519)
    Ed25519,
}

impl KeyType {
    /// Wire name of the curve
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Secp256k1 => "secp256k1",
            KeyType::Ed25519 => "ed25519",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "secp256k1" => Ok(KeyType::Secp256k1),
            "ed25519" => Ok(KeyType::Ed25519),
            other => Err(Error::InvalidInput(format!("unknown key type: {other}"))),
        }
    }
}

/// Affine point on the wire
///
/// Coordinates are lowercase hex, zero-padded to 64 characters. The group
/// identity is the `{null, null}` sentinel on both curves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexPoint {
    pub x: Option<String>,
    pub y: Option<String>,
}

impl HexPoint {
    /// Build a point from already-padded coordinate hex
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            x: Some(x.into()),
            y: Some(y.into()),
        }
    }

    /// The identity sentinel
    pub fn identity() -> Self {
        Self { x: None, y: None }
    }

    /// True when either coordinate is the null sentinel
    pub fn is_identity(&self) -> bool {
        self.x.is_none() || self.y.is_none()
    }

    /// SEC1 uncompressed encoding `04 ‖ x ‖ y` (65 bytes), as handed to the
    /// ECIES layer. Only meaningful for secp256k1 points.
    pub fn to_uncompressed_bytes(&self) -> Result<[u8; 65]> {
        let x = self
            .x
            .as_deref()
            .ok_or_else(|| Error::InvalidPoint("identity has no uncompressed encoding".into()))?;
        let y = self
            .y
            .as_deref()
            .ok_or_else(|| Error::InvalidPoint("identity has no uncompressed encoding".into()))?;
        let mut out = [0u8; 65];
        out[0] = 0x04;
        out[1..33].copy_from_slice(&decode_coord(x)?);
        out[33..65].copy_from_slice(&decode_coord(y)?);
        Ok(out)
    }
}

/// Decode one 64-hex coordinate (shorter input is left-padded with zeros)
pub(crate) fn decode_coord(s: &str) -> Result<[u8; 32]> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    if s.is_empty() || s.len() > 64 {
        return Err(Error::InvalidPoint(format!(
            "coordinate must be 1..=64 hex chars, got {}",
            s.len()
        )));
    }
    let padded = format!("{s:0>64}");
    let mut out = [0u8; 32];
    hex::decode_to_slice(&padded, &mut out)
        .map_err(|e| Error::InvalidPoint(format!("bad coordinate hex: {e}")))?;
    Ok(out)
}

/// Scalar-field element of a supported curve
pub trait CurveScalar:
    Copy
    + Clone
    + fmt::Debug
    + PartialEq
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
{
    /// The additive identity
    fn zero() -> Self;

    /// The multiplicative identity
    fn one() -> Self;

    /// Embed a small integer into the field
    fn from_u64(value: u64) -> Self;

    /// Uniformly random nonzero field element
    fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self;

    /// Multiplicative inverse; `None` for zero
    fn invert(&self) -> Option<Self>;

    /// Canonical 32-byte big-endian encoding
    fn to_be_bytes(&self) -> [u8; 32];

    /// Decode 32 big-endian bytes, reduced mod the group order
    fn from_be_bytes(bytes: [u8; 32]) -> Self;

    /// Lowercase hex, zero-padded to 64 characters
    fn to_hex(&self) -> String {
        hex::encode(self.to_be_bytes())
    }

    /// Decode hex of up to 64 characters (left-padded), reduced mod the order
    fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
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
        Ok(Self::from_be_bytes(out))
    }
}

/// A supported curve: scalar field plus prime-order group
pub trait Curve: Copy + Clone + fmt::Debug + Send + Sync + 'static {
    /// Runtime tag matching this backend
    const KEY_TYPE: KeyType;

    /// Scalar field element type
    type Scalar: CurveScalar;

    /// Group element type
    type Point: Copy
        + Clone
        + fmt::Debug
        + PartialEq
        + Send
        + Sync
        + Add<Output = Self::Point>
        + Mul<Self::Scalar, Output = Self::Point>
        + Sum<Self::Point>;

    /// The fixed generator `G`
    fn generator() -> Self::Point;

    /// The group identity
    fn identity() -> Self::Point;

    /// Encode a point as affine hex coordinates
    fn to_hex_point(point: &Self::Point) -> HexPoint;

    /// Decode affine hex coordinates into a point; `{null, null}` decodes to
    /// the identity
    fn from_hex_point(hex: &HexPoint) -> Result<Self::Point>;
}
