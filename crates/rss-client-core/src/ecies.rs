//! Hybrid encryption
//!
//! ECIES wrapper used to move scalar shares between the parties. The layer
//! is pinned to secp256k1 regardless of the TSS curve: server public keys,
//! factor public keys, and the client's ephemeral key all live here.
//!
//! Construction (eccrypto wire layout): ephemeral ECDH on secp256k1, SHA-512
//! of the shared x-coordinate split into an AES-256-CBC key and an
//! HMAC-SHA-256 key, MAC over `iv ‖ ephemPublicKey ‖ ciphertext`. All fields
//! are hex on the wire.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use k256::elliptic_curve::{
    bigint::U256,
    ops::Reduce,
    sec1::{FromEncodedPoint, ToEncodedPoint},
};
use k256::{AffinePoint, EncodedPoint, NonZeroScalar, ProjectivePoint, Scalar};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// One ECIES ciphertext, hex-serialized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedMessage {
    /// AES-256-CBC body
    pub ciphertext: String,
    /// Uncompressed (65-byte) ephemeral secp256k1 public key
    #[serde(rename = "ephemPublicKey")]
    pub ephem_public_key: String,
    /// 16-byte CBC initialization vector
    pub iv: String,
    /// HMAC-SHA-256 over `iv ‖ ephemPublicKey ‖ ciphertext`
    pub mac: String,
}

/// Encrypt `plaintext` to a SEC1-encoded secp256k1 public key
pub fn encrypt(public_key: &[u8], plaintext: &[u8]) -> Result<EncryptedMessage> {
    let receiver = decode_public_key(public_key)
        .map_err(|e| Error::InvalidPoint(format!("bad recipient key: {e}")))?;

    let ephem_secret = NonZeroScalar::random(&mut OsRng);
    let ephem_public = (ProjectivePoint::GENERATOR * *ephem_secret)
        .to_affine()
        .to_encoded_point(false);

    let (enc_key, mac_key) = derive_keys(&receiver, &ephem_secret)?;

    let mut iv = [0u8; 16];
    OsRng.fill_bytes(&mut iv);

    let ciphertext =
        Aes256CbcEnc::new(&(*enc_key).into(), &iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    let mac = compute_mac(mac_key.as_slice(), &iv, ephem_public.as_bytes(), &ciphertext)?;

    Ok(EncryptedMessage {
        ciphertext: hex::encode(ciphertext),
        ephem_public_key: hex::encode(ephem_public.as_bytes()),
        iv: hex::encode(iv),
        mac: hex::encode(mac),
    })
}

/// Decrypt with a 32-byte secp256k1 private scalar
pub fn decrypt(private_key: &[u8; 32], message: &EncryptedMessage) -> Result<Zeroizing<Vec<u8>>> {
    let scalar = <Scalar as Reduce<U256>>::reduce_bytes(private_key.into());
    if scalar == Scalar::ZERO {
        return Err(Error::Decrypt("zero private key".into()));
    }

    let ephem_bytes = decode_field(&message.ephem_public_key, "ephemPublicKey")?;
    let iv_bytes = decode_field(&message.iv, "iv")?;
    let ciphertext = decode_field(&message.ciphertext, "ciphertext")?;
    let tag = decode_field(&message.mac, "mac")?;

    let iv: [u8; 16] = iv_bytes
        .as_slice()
        .try_into()
        .map_err(|_| Error::Decrypt("iv must be 16 bytes".into()))?;
    let ephem = decode_public_key(&ephem_bytes)
        .map_err(|e| Error::Decrypt(format!("bad ephemeral key: {e}")))?;

    let (enc_key, mac_key) = derive_shared_keys(&ephem, &scalar)?;

    let mut mac = HmacSha256::new_from_slice(&*mac_key)
        .map_err(|e| Error::Decrypt(e.to_string()))?;
    mac.update(&iv);
    mac.update(&ephem_bytes);
    mac.update(&ciphertext);
    mac.verify_slice(&tag)
        .map_err(|_| Error::Decrypt("mac mismatch".into()))?;

    let plaintext = Aes256CbcDec::new(&(*enc_key).into(), &iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| Error::Decrypt("invalid padding".into()))?;

    Ok(Zeroizing::new(plaintext))
}

/// Uncompressed SEC1 bytes of a secp256k1 point, as fed into [`encrypt`]
pub fn public_key_bytes(point: &ProjectivePoint) -> Result<[u8; 65]> {
    let encoded = point.to_affine().to_encoded_point(false);
    encoded
        .as_bytes()
        .try_into()
        .map_err(|_| Error::InvalidPoint("identity has no uncompressed encoding".into()))
}

fn decode_field(hex_str: &str, what: &str) -> Result<Vec<u8>> {
    hex::decode(hex_str).map_err(|e| Error::Decrypt(format!("bad {what} hex: {e}")))
}

fn decode_public_key(bytes: &[u8]) -> Result<ProjectivePoint> {
    let encoded =
        EncodedPoint::from_bytes(bytes).map_err(|e| Error::InvalidPoint(e.to_string()))?;
    let affine = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
        .ok_or_else(|| Error::InvalidPoint("not a secp256k1 point".into()))?;
    Ok(ProjectivePoint::from(affine))
}

fn derive_keys(
    receiver: &ProjectivePoint,
    ephem_secret: &NonZeroScalar,
) -> Result<(Zeroizing<[u8; 32]>, Zeroizing<[u8; 32]>)> {
    derive_shared_keys(receiver, &**ephem_secret)
}

/// SHA-512 of the ECDH x-coordinate, split into cipher and MAC keys
fn derive_shared_keys(
    peer: &ProjectivePoint,
    secret: &Scalar,
) -> Result<(Zeroizing<[u8; 32]>, Zeroizing<[u8; 32]>)> {
    let shared = (*peer * *secret).to_affine().to_encoded_point(false);
    let x = shared
        .x()
        .ok_or_else(|| Error::Decrypt("shared secret is the point at infinity".into()))?;
    let digest = Sha512::digest(x);
    let mut enc_key = Zeroizing::new([0u8; 32]);
    let mut mac_key = Zeroizing::new([0u8; 32]);
    enc_key.copy_from_slice(&digest[..32]);
    mac_key.copy_from_slice(&digest[32..]);
    Ok((enc_key, mac_key))
}

fn compute_mac(mac_key: &[u8], iv: &[u8], ephem: &[u8], ciphertext: &[u8]) -> Result<[u8; 32]> {
    let mut mac =
        HmacSha256::new_from_slice(mac_key).map_err(|e| Error::Decrypt(e.to_string()))?;
    mac.update(iv);
    mac.update(ephem);
    mac.update(ciphertext);
    Ok(mac.finalize().into_bytes().into())
}
