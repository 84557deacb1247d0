//! ed25519 backend over `curve25519-dalek`
//!
//! The wire format carries affine Edwards coordinates as big-endian hex.
//! `curve25519-dalek` only exposes the compressed encoding (little-endian y
//! with the parity of x in the top bit), so encoding recovers x from the
//! curve equation x² = (y² − 1)/(d·y² + 1) over GF(2²⁵⁵ − 19), and decoding
//! rebuilds the compressed form from y and the parity of the supplied x.

use crypto_bigint::modular::runtime_mod::{DynResidue, DynResidueParams};
use crypto_bigint::{Encoding, Integer, U256};
use curve25519_dalek::constants::ED25519_BASEPOINT_POINT;
use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::Identity;
use rand::{CryptoRng, RngCore};

use super::{decode_coord, Curve, CurveScalar, HexPoint, KeyType};
use crate::error::{Error, Result};

/// Base field prime 2²⁵⁵ − 19
const FIELD_P: U256 =
    U256::from_be_hex("7fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffed");

/// Twisted Edwards constant d = −121665/121666
const EDWARDS_D: U256 =
    U256::from_be_hex("52036cee2b6ffe738cc740797779e89800700a4d4141d8ab75eb4dca135978a3");

/// √−1 mod p
const SQRT_M1: U256 =
    U256::from_be_hex("2b8324804fc1df0b2b4d00993dfbd7a72f431806ad2fe478c4ee1b274a0ea0b0");

/// Square-root exponent (p + 3)/8
const SQRT_EXP: U256 =
    U256::from_be_hex("0ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffe");

/// Fermat inversion exponent p − 2
const INV_EXP: U256 =
    U256::from_be_hex("7fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffeb");

/// The ed25519 curve
#[derive(Debug, Clone, Copy)]
pub struct Ed25519;

impl CurveScalar for Scalar {
    fn zero() -> Self {
        Scalar::ZERO
    }

    fn one() -> Self {
        Scalar::ONE
    }

    fn from_u64(value: u64) -> Self {
        Scalar::from(value)
    }

    fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Scalar::random(rng)
    }

    fn invert(&self) -> Option<Self> {
        if self == &Scalar::ZERO {
            None
        } else {
            Some(Scalar::invert(self))
        }
    }

    fn to_be_bytes(&self) -> [u8; 32] {
        let mut bytes = self.to_bytes();
        bytes.reverse();
        bytes
    }

    fn from_be_bytes(bytes: [u8; 32]) -> Self {
        let mut le = bytes;
        le.reverse();
        Scalar::from_bytes_mod_order(le)
    }
}

impl Curve for Ed25519 {
    const KEY_TYPE: KeyType = KeyType::Ed25519;

    type Scalar = Scalar;
    type Point = EdwardsPoint;

    fn generator() -> EdwardsPoint {
        ED25519_BASEPOINT_POINT
    }

    fn identity() -> EdwardsPoint {
        EdwardsPoint::identity()
    }

    fn to_hex_point(point: &EdwardsPoint) -> HexPoint {
        if point == &EdwardsPoint::identity() {
            return HexPoint::identity();
        }
        let compressed = point.compress().to_bytes();
        let sign = compressed[31] >> 7;
        let mut y_be = compressed;
        y_be[31] &= 0x7f;
        y_be.reverse();
        let y = U256::from_be_slice(&y_be);
        let x = recover_x(&y, sign)
            .expect("a decompressible point always has a square x-coordinate");
        HexPoint::new(hex::encode(x.to_be_bytes()), hex::encode(y.to_be_bytes()))
    }

    fn from_hex_point(hex: &HexPoint) -> Result<EdwardsPoint> {
        if hex.is_identity() {
            return Ok(EdwardsPoint::identity());
        }
        // is_identity() returned false, so both coordinates are present
        let x_be = decode_coord(hex.x.as_deref().unwrap_or_default())?;
        let y_be = decode_coord(hex.y.as_deref().unwrap_or_default())?;
        let x = U256::from_be_slice(&x_be);
        let y = U256::from_be_slice(&y_be);
        if x >= FIELD_P || y >= FIELD_P {
            return Err(Error::InvalidPoint("coordinate exceeds field prime".into()));
        }
        let sign = u8::from(bool::from(x.is_odd()));
        let expected_x = recover_x(&y, sign)
            .ok_or_else(|| Error::InvalidPoint("y-coordinate is not on ed25519".into()))?;
        if expected_x != x {
            return Err(Error::InvalidPoint("x does not match the curve equation".into()));
        }
        let mut compressed = y_be;
        compressed.reverse();
        compressed[31] |= sign << 7;
        CompressedEdwardsY(compressed)
            .decompress()
            .ok_or_else(|| Error::InvalidPoint("coordinates are not on ed25519".into()))
    }
}

/// Solve the curve equation for x given y and the parity of x
fn recover_x(y: &U256, sign: u8) -> Option<U256> {
    if y >= &FIELD_P {
        return None;
    }
    let params = DynResidueParams::new(&FIELD_P);
    let one = DynResidue::one(params);
    let y = DynResidue::new(y, params);
    let yy = y * y;
    let u = yy - one;
    let v = yy * DynResidue::new(&EDWARDS_D, params) + one;
    // x² = u/v; candidate root via the (p+3)/8 exponent, fixed up by √−1
    let x_sq = u * v.pow(&INV_EXP);
    let mut x = x_sq.pow(&SQRT_EXP);
    if (x * x).retrieve() != x_sq.retrieve() {
        x = x * DynResidue::new(&SQRT_M1, params);
    }
    if (x * x).retrieve() != x_sq.retrieve() {
        return None;
    }
    let mut x = x.retrieve();
    if x == U256::ZERO && sign == 1 {
        return None;
    }
    if bool::from(x.is_odd()) != (sign == 1) {
        x = FIELD_P.wrapping_sub(&x);
    }
    Some(x)
}
