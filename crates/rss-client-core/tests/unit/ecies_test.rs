//! Hybrid-encryption wire format seen from the outside

use rss_client_core::curve::{Curve, CurveScalar, Secp256k1};
use rss_client_core::{ecies, EncryptedMessage};

fn keypair() -> (String, [u8; 65]) {
    let secret = <Secp256k1 as Curve>::Scalar::random(&mut rand::rngs::OsRng);
    let point = Secp256k1::generator() * secret;
    let hex_point = Secp256k1::to_hex_point(&point);
    (secret.to_hex(), hex_point.to_uncompressed_bytes().unwrap())
}

fn secret_bytes(hex: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    hex::decode_to_slice(hex, &mut out).unwrap();
    out
}

#[test]
fn test_round_trip_through_json() {
    let (secret, public) = keypair();
    let encrypted = ecies::encrypt(&public, &[7u8; 32]).unwrap();

    let json = serde_json::to_string(&encrypted).unwrap();
    assert!(json.contains("\"ephemPublicKey\""));
    assert!(json.contains("\"ciphertext\""));
    assert!(json.contains("\"iv\""));
    assert!(json.contains("\"mac\""));

    let parsed: EncryptedMessage = serde_json::from_str(&json).unwrap();
    let decrypted = ecies::decrypt(&secret_bytes(&secret), &parsed).unwrap();
    assert_eq!(&*decrypted, &[7u8; 32]);
}

#[test]
fn test_wrong_factor_key_fails() {
    let (_, public) = keypair();
    let (other_secret, _) = keypair();
    let encrypted = ecies::encrypt(&public, &[9u8; 32]).unwrap();
    assert!(ecies::decrypt(&secret_bytes(&other_secret), &encrypted).is_err());
}

#[test]
fn test_each_encryption_is_randomized() {
    let (_, public) = keypair();
    let a = ecies::encrypt(&public, &[1u8; 32]).unwrap();
    let b = ecies::encrypt(&public, &[1u8; 32]).unwrap();
    assert_ne!(a.ephem_public_key, b.ephem_public_key);
    assert_ne!(a.ciphertext, b.ciphertext);
}
