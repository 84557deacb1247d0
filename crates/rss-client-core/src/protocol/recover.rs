//! Share recovery
//!
//! Inverse of the factor-encryption step: from one factor key, the user's
//! factor encryption, and a threshold of server factor encryptions,
//! interpolate the refreshed TSS share back out. The user's value sits at
//! the fixed master index, the server-side sum at x = 1; both are lifted to
//! x = 0.

use tracing::{debug, instrument, warn};

use super::{decode_secp_scalar_hex, scalar_from_plaintext};
use crate::curve::{Curve, CurveScalar, Ed25519, KeyType, Secp256k1};
use crate::ecies;
use crate::error::{Error, Result};
use crate::poly;
use crate::types::RecoverOptions;
use crate::USER_SHARE_INDEX;

/// Recover the refreshed TSS share, returned as a hex scalar
///
/// Empty or undecryptable server slots are skipped; the caller is expected
/// to have selected servers whose slots are present.
#[instrument(skip(options), fields(key_type = %options.key_type))]
pub fn recover(options: &RecoverOptions) -> Result<String> {
    match options.key_type {
        KeyType::Secp256k1 => recover_inner::<Secp256k1>(options),
        KeyType::Ed25519 => recover_inner::<Ed25519>(options),
    }
}

fn recover_inner<C: Curve>(options: &RecoverOptions) -> Result<String> {
    if options.selected_servers.is_empty() {
        return Err(Error::InvalidInput("no servers selected".into()));
    }
    if options.selected_servers.contains(&0) {
        return Err(Error::InvalidInput("server indices are 1-based".into()));
    }
    let factor_key = decode_secp_scalar_hex(&options.factor_key)?;

    // The user's own slot is fail-fast
    let user_plain = ecies::decrypt(&factor_key, &options.user_enc)?;
    let user_share = scalar_from_plaintext::<C>(&user_plain)?;

    let indices: Vec<u64> = options
        .selected_servers
        .iter()
        .map(|&i| u64::from(i))
        .collect();
    let mut shares = Vec::with_capacity(indices.len());
    let mut coefficients = Vec::with_capacity(indices.len());
    for &index in &options.selected_servers {
        let Some(enc) = options
            .server_encs
            .get(index as usize - 1)
            .and_then(Option::as_ref)
        else {
            debug!(server_index = index, "No ciphertext for selected server, skipping");
            continue;
        };
        match ecies::decrypt(&factor_key, enc) {
            Ok(plaintext) => {
                shares.push(scalar_from_plaintext::<C>(&plaintext)?);
                coefficients.push(poly::lagrange_coefficient::<C>(&indices, u64::from(index), 0)?);
            }
            Err(error) => {
                warn!(server_index = index, %error, "Undecryptable server slot, skipping");
            }
        }
    }
    let server_recon = poly::dot_product::<C>(&shares, &coefficients)?;

    let user_at_zero = poly::lagrange_coefficient::<C>(&[1, USER_SHARE_INDEX], USER_SHARE_INDEX, 0)?;
    let server_at_zero = poly::lagrange_coefficient::<C>(&[1, USER_SHARE_INDEX], 1, 0)?;
    let tss_share = user_share * user_at_zero + server_recon * server_at_zero;
    Ok(tss_share.to_hex())
}
