//! Property-based tests for encoding idempotence and the polynomial algebra

use proptest::prelude::*;

use rss_client_core::curve::{Curve, CurveScalar, Ed25519, Secp256k1};
use rss_client_core::poly;

fn bytes32() -> impl Strategy<Value = [u8; 32]> {
    prop::array::uniform32(any::<u8>())
}

proptest! {
    /// hexPoint(ecPoint(p)) == p for arbitrary secp256k1 points
    #[test]
    fn point_encoding_round_trips_secp256k1(bytes in bytes32()) {
        let scalar = <Secp256k1 as Curve>::Scalar::from_be_bytes(bytes);
        let point = Secp256k1::generator() * scalar;
        let hex = Secp256k1::to_hex_point(&point);
        let decoded = Secp256k1::from_hex_point(&hex).unwrap();
        prop_assert_eq!(decoded, point);
    }

    /// hexPoint(ecPoint(p)) == p for arbitrary ed25519 points
    #[test]
    fn point_encoding_round_trips_ed25519(bytes in bytes32()) {
        let scalar = <Ed25519 as Curve>::Scalar::from_be_bytes(bytes);
        let point = Ed25519::generator() * scalar;
        let hex = Ed25519::to_hex_point(&point);
        let decoded = Ed25519::from_hex_point(&hex).unwrap();
        prop_assert_eq!(decoded, point);
    }

    /// Scalar hex encoding round trips on both curves
    #[test]
    fn scalar_encoding_round_trips(bytes in bytes32()) {
        let secp = <Secp256k1 as Curve>::Scalar::from_be_bytes(bytes);
        prop_assert_eq!(
            <Secp256k1 as Curve>::Scalar::from_hex(&secp.to_hex()).unwrap(),
            secp
        );
        let ed = <Ed25519 as Curve>::Scalar::from_be_bytes(bytes);
        prop_assert_eq!(
            <Ed25519 as Curve>::Scalar::from_hex(&ed.to_hex()).unwrap(),
            ed
        );
    }

    /// Lagrange interpolation over any 3 of 5 shares recovers the secret
    #[test]
    fn lagrange_reconstructs_from_any_threshold_subset(
        secret in bytes32(),
        subset in prop::sample::subsequence(vec![1u64, 2, 3, 4, 5], 3),
    ) {
        type S = <Secp256k1 as Curve>::Scalar;
        let intercept = S::from_be_bytes(secret);
        let mut rng = rand::rngs::OsRng;
        let poly_coeffs =
            poly::generate_polynomial::<Secp256k1, _>(2, Some(intercept), &mut rng);
        let mut reconstructed = S::zero();
        for &i in &subset {
            let share = poly::eval_polynomial_at::<Secp256k1>(&poly_coeffs, i);
            let coeff = poly::lagrange_coefficient::<Secp256k1>(&subset, i, 0).unwrap();
            reconstructed = reconstructed + share * coeff;
        }
        prop_assert_eq!(reconstructed, intercept);
    }

    /// Re-sharing through a target index composes with direct evaluation
    #[test]
    fn resharing_line_matches_direct_evaluation(a in bytes32(), b in bytes32(), target in 2u64..10) {
        type S = <Secp256k1 as Curve>::Scalar;
        let line = vec![S::from_be_bytes(a), S::from_be_bytes(b)];
        let at_zero = poly::eval_polynomial_at::<Secp256k1>(&line, 0);
        let at_one = poly::eval_polynomial_at::<Secp256k1>(&line, 1);
        let c0 = poly::lagrange_coefficient::<Secp256k1>(&[0, 1], 0, target).unwrap();
        let c1 = poly::lagrange_coefficient::<Secp256k1>(&[0, 1], 1, target).unwrap();
        prop_assert_eq!(
            at_zero * c0 + at_one * c1,
            poly::eval_polynomial_at::<Secp256k1>(&line, target)
        );
    }
}
