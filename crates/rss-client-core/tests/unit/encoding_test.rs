//! Hex encoding contracts: 64-character zero-padded coordinates, the
//! `{null, null}` identity sentinel, and cross-curve rejection.

use rss_client_core::curve::{Curve, CurveScalar, Ed25519, Secp256k1};
use rss_client_core::HexPoint;

#[test]
fn test_coordinates_are_zero_padded_to_64() {
    // Small multiples keep leading zeros in at least one coordinate often
    // enough; the contract is on the length, not the content
    for k in 1u64..=16 {
        let secp = Secp256k1::to_hex_point(
            &(Secp256k1::generator() * <Secp256k1 as Curve>::Scalar::from_u64(k)),
        );
        assert_eq!(secp.x.as_ref().unwrap().len(), 64);
        assert_eq!(secp.y.as_ref().unwrap().len(), 64);

        let ed =
            Ed25519::to_hex_point(&(Ed25519::generator() * <Ed25519 as Curve>::Scalar::from_u64(k)));
        assert_eq!(ed.x.as_ref().unwrap().len(), 64);
        assert_eq!(ed.y.as_ref().unwrap().len(), 64);
    }
}

#[test]
fn test_identity_sentinel_decodes_on_both_curves() {
    assert_eq!(
        Secp256k1::from_hex_point(&HexPoint::identity()).unwrap(),
        Secp256k1::identity()
    );
    assert_eq!(
        Ed25519::from_hex_point(&HexPoint::identity()).unwrap(),
        Ed25519::identity()
    );
}

#[test]
fn test_half_identity_is_treated_as_identity() {
    // One null coordinate is enough for the sentinel
    let half = HexPoint {
        x: Some("00".repeat(32)),
        y: None,
    };
    assert!(half.is_identity());
    assert_eq!(
        Secp256k1::from_hex_point(&half).unwrap(),
        Secp256k1::identity()
    );
}

#[test]
fn test_secp_point_rejected_by_ed25519_backend() {
    let secp = Secp256k1::to_hex_point(&Secp256k1::generator());
    assert!(Ed25519::from_hex_point(&secp).is_err());
}

#[test]
fn test_ed25519_point_rejected_by_secp_backend() {
    let ed = Ed25519::to_hex_point(&Ed25519::generator());
    assert!(Secp256k1::from_hex_point(&ed).is_err());
}

#[test]
fn test_scalar_hex_is_stable() {
    let scalar = <Secp256k1 as Curve>::Scalar::from_u64(0xdead_beef);
    let hex = scalar.to_hex();
    assert_eq!(hex.len(), 64);
    assert_eq!(
        <Secp256k1 as Curve>::Scalar::from_hex(&hex).unwrap(),
        scalar
    );
}
