//! secp256k1 backend over `k256`

use k256::elliptic_curve::{
    bigint::U256,
    ops::Reduce,
    sec1::{FromEncodedPoint, ToEncodedPoint},
    Field,
};
use k256::{AffinePoint, EncodedPoint, ProjectivePoint, Scalar};
use rand::{CryptoRng, RngCore};

use super::{decode_coord, Curve, CurveScalar, HexPoint, KeyType};
use crate::error::{Error, Result};

/// The secp256k1 curve
#[derive(Debug, Clone, Copy)]
pub struct Secp256k1;

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
        <Scalar as Field>::random(rng)
    }

    fn invert(&self) -> Option<Self> {
        Option::from(Field::invert(self))
    }

    fn to_be_bytes(&self) -> [u8; 32] {
        self.to_bytes().into()
    }

    fn from_be_bytes(bytes: [u8; 32]) -> Self {
        <Scalar as Reduce<U256>>::reduce_bytes(&bytes.into())
    }
}

impl Curve for Secp256k1 {
    const KEY_TYPE: KeyType = KeyType::Secp256k1;

    type Scalar = Scalar;
    type Point = ProjectivePoint;

    fn generator() -> ProjectivePoint {
        ProjectivePoint::GENERATOR
    }

    fn identity() -> ProjectivePoint {
        ProjectivePoint::IDENTITY
    }

    fn to_hex_point(point: &ProjectivePoint) -> HexPoint {
        let encoded = point.to_affine().to_encoded_point(false);
        match (encoded.x(), encoded.y()) {
            (Some(x), Some(y)) => HexPoint::new(hex::encode(x), hex::encode(y)),
            _ => HexPoint::identity(),
        }
    }

    fn from_hex_point(hex: &HexPoint) -> Result<ProjectivePoint> {
        if hex.is_identity() {
            return Ok(ProjectivePoint::IDENTITY);
        }
        // is_identity() returned false, so both coordinates are present
        let x = decode_coord(hex.x.as_deref().unwrap_or_default())?;
        let y = decode_coord(hex.y.as_deref().unwrap_or_default())?;
        let encoded = EncodedPoint::from_affine_coordinates(&x.into(), &y.into(), false);
        let affine = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
            .ok_or_else(|| Error::InvalidPoint("coordinates are not on secp256k1".into()))?;
        Ok(ProjectivePoint::from(affine))
    }
}
